//! The editor surface contract.
//!
//! The rich-text surface is an external collaborator: the store only
//! reads and writes its serialized state and never interprets it.

/// Operations the store needs from an editing surface.
pub trait EditorSurface {
    /// Current serialized state, or `None` when the surface is not mounted.
    fn get_content(&self) -> Option<String>;

    /// Hydrate the surface from a previously returned state. A surface that
    /// cannot interpret `content` logs and keeps its current state.
    fn set_content(&mut self, content: &str);

    fn focus(&mut self);
}

/// Plain-text surface held in memory.
#[derive(Debug, Default)]
pub struct BufferEditor {
    buffer: String,
    mounted: bool,
    focused: bool,
}

impl BufferEditor {
    /// A mounted, empty surface.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            mounted: true,
            focused: false,
        }
    }

    /// A surface that has not been mounted yet.
    pub fn unmounted() -> Self {
        Self::default()
    }

    pub fn mount(&mut self) {
        self.mounted = true;
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Replace the buffer as a user edit would. Returns the content to
    /// hand to change listeners.
    pub fn replace(&mut self, text: &str) -> String {
        self.buffer = text.to_string();
        self.buffer.clone()
    }

    /// Append a line as a user edit would. Returns the content to hand to
    /// change listeners.
    pub fn append_line(&mut self, line: &str) -> String {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);
        self.buffer.clone()
    }
}

impl EditorSurface for BufferEditor {
    fn get_content(&self) -> Option<String> {
        if self.mounted {
            Some(self.buffer.clone())
        } else {
            None
        }
    }

    fn set_content(&mut self, content: &str) {
        if !self.mounted {
            tracing::debug!("set_content on unmounted editor ignored");
            return;
        }
        self.buffer = content.to_string();
    }

    fn focus(&mut self) {
        self.focused = self.mounted;
    }
}
