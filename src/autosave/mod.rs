//! Debounced auto-save scheduling.
//!
//! [`Debouncer`] is a single cancellable timer driven by an explicit clock.
//! Each change notification re-arms the deadline; the pending content is
//! released once, after a full quiet window with no further changes.
//! The owner must call [`Debouncer::cancel`] when the editing surface is
//! unmounted or an explicit save supersedes the pending content.

use std::time::Duration;

use tokio::time::Instant;

/// Quiet window between the last edit and the auto-save.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug)]
struct Pending {
    content: String,
    deadline: Instant,
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Option<Pending>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_DELAY)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a change, replacing any pending content and restarting the
    /// quiet window from `now`.
    pub fn notify(&mut self, content: String, now: Instant) {
        self.pending = Some(Pending {
            content,
            deadline: now + self.window,
        });
    }

    /// Release the pending content if its quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let due = matches!(&self.pending, Some(p) if now >= p.deadline);
        if due {
            self.pending.take().map(|p| p.content)
        } else {
            None
        }
    }

    /// Drop pending content. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// When the pending content becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
