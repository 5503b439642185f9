//! The notebook store: the single source of truth for a notebook's pages
//! and active selection.
//!
//! The store mediates between an [`EditorSurface`] and a [`Storage`]
//! backend, both injected at construction. Persistence is best-effort:
//! storage failures are logged and queued as notifications while the
//! in-memory notebook stays authoritative. Only out-of-range navigation
//! is reported to the caller as an error.

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::autosave::Debouncer;
use crate::config::StoreConfig;
use crate::editor::EditorSurface;
use crate::entity::{notebook_key, now_millis, Notebook};
use crate::error::{NotebookError, Result};
use crate::notification::{format_last_saved, Notification};
use crate::storage::Storage;

/// One line of the table of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub index: usize,
    pub page_id: String,
    pub title: String,
    pub current: bool,
}

pub struct NotebookStore<S: Storage, E: EditorSurface> {
    storage: S,
    editor: E,
    notebook: Notebook,
    title_field: String,
    autosave: Debouncer,
    last_saved: Option<DateTime<Utc>>,
    notifications: Vec<Notification>,
}

impl<S: Storage, E: EditorSurface> NotebookStore<S, E> {
    /// Open the notebook `id`, hydrating it from storage when a valid record
    /// exists. Missing, unreadable or malformed records yield a fresh
    /// notebook with one empty page.
    pub fn load(id: &str, storage: S, editor: E, config: &StoreConfig) -> Self {
        let key = notebook_key(id);
        let mut notifications = Vec::new();

        let notebook = match storage.get(&key) {
            Ok(Some(text)) => match Notebook::decode(&text) {
                Ok(notebook) => {
                    tracing::debug!(notebook = %id, pages = notebook.pages.len(), "loaded notebook");
                    Some(notebook)
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "discarding malformed notebook record");
                    notifications.push(Notification::DecodeFailed {
                        key: key.clone(),
                        reason: e.to_string(),
                    });
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "could not read notebook record");
                notifications.push(Notification::PersistFailed {
                    reason: e.to_string(),
                });
                None
            }
        };
        let notebook = notebook
            .unwrap_or_else(|| Notebook::new(id.to_string(), config.default_title(id)));

        let mut store = Self {
            storage,
            editor,
            title_field: notebook.current().title.clone(),
            notebook,
            autosave: Debouncer::new(config.autosave_delay()),
            last_saved: None,
            notifications,
        };
        store.hydrate_editor();
        store
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    pub fn current_page_index(&self) -> usize {
        self.notebook.current_page
    }

    /// The editable title of the current page.
    pub fn title_field(&self) -> &str {
        &self.title_field
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn last_saved_text(&self, now: DateTime<Utc>) -> String {
        format_last_saved(self.last_saved, now)
    }

    /// Drain queued notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn table_of_contents(&self) -> Vec<TocEntry> {
        self.notebook
            .pages
            .iter()
            .enumerate()
            .map(|(index, page)| TocEntry {
                index,
                page_id: page.id.clone(),
                title: page.display_title(index),
                current: index == self.notebook.current_page,
            })
            .collect()
    }

    /// Rename the current page. In memory only.
    pub fn set_page_title(&mut self, title: &str) {
        self.title_field = title.to_string();
        self.notebook.current_mut().title = title.to_string();
    }

    /// Pull the editor's content into the current page and persist the
    /// notebook. Returns whether the write reached storage.
    ///
    /// An unmounted editor leaves the page content untouched; the notebook
    /// is still written.
    pub fn save_current_page(&mut self) -> bool {
        self.capture_editor_content();
        let saved = self.persist();
        if saved {
            self.notifications.push(Notification::Saved);
        }
        saved
    }

    /// Flush the current page, then append an empty page and select it.
    pub fn add_page(&mut self) -> usize {
        self.capture_editor_content();
        let index = self.notebook.push_page();
        tracing::debug!(notebook = %self.notebook.id, page = index, "added page");

        self.title_field.clear();
        self.hydrate_editor();
        self.editor.focus();
        self.persist();
        self.notifications.push(Notification::PageAdded);
        index
    }

    /// Flush the current page and switch to `index`.
    ///
    /// Fails with [`NotebookError::PageOutOfRange`] and leaves the store
    /// untouched when `index` is not a valid page.
    pub fn go_to_page(&mut self, index: usize) -> Result<()> {
        let len = self.notebook.pages.len();
        if index >= len {
            return Err(NotebookError::PageOutOfRange { index, len });
        }

        self.capture_editor_content();
        self.notebook.current_page = index;
        self.title_field = self.notebook.current().title.clone();
        self.hydrate_editor();
        self.editor.focus();
        if self.persist() {
            self.notifications.push(Notification::Saved);
        }
        Ok(())
    }

    /// Write `content` into the current page and persist, without user
    /// action. Supersedes any pending debounced content.
    pub fn auto_save(&mut self, content: String) -> bool {
        self.autosave.cancel();
        let page = self.notebook.current_mut();
        page.content = content;
        page.timestamp = now_millis();
        self.persist()
    }

    /// Change notification from the editor surface. Restarts the auto-save
    /// quiet window.
    pub fn editor_changed(&mut self, content: String, now: Instant) {
        self.autosave.notify(content, now);
    }

    /// Run the auto-save if its quiet window has elapsed. Returns whether
    /// an auto-save happened.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.autosave.poll(now) {
            Some(content) => {
                tracing::debug!(notebook = %self.notebook.id, "auto-saving");
                self.auto_save(content);
                true
            }
            None => false,
        }
    }

    /// When the pending auto-save is due, if one is pending.
    pub fn autosave_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    /// The editor surface is going away: drop any pending auto-save so it
    /// cannot land after a later save.
    pub fn unmount(&mut self) {
        if self.autosave.cancel() {
            tracing::debug!(notebook = %self.notebook.id, "cancelled pending auto-save");
        }
    }

    /// Consume the store, returning its collaborators.
    pub fn into_parts(self) -> (S, E, Notebook) {
        (self.storage, self.editor, self.notebook)
    }

    fn capture_editor_content(&mut self) {
        // The editor holds everything a pending auto-save would write.
        self.autosave.cancel();
        if let Some(content) = self.editor.get_content() {
            let page = self.notebook.current_mut();
            page.content = content;
            page.timestamp = now_millis();
        }
    }

    fn hydrate_editor(&mut self) {
        let content = self.notebook.current().content.clone();
        self.editor.set_content(&content);
    }

    fn persist(&mut self) -> bool {
        let key = notebook_key(&self.notebook.id);
        let result = self
            .notebook
            .encode()
            .and_then(|text| self.storage.set(&key, &text));

        match result {
            Ok(()) => {
                self.last_saved = Some(Utc::now());
                tracing::debug!(key = %key, page = self.notebook.current_page, "persisted notebook");
                true
            }
            Err(e) => {
                if e.is_persistence() {
                    tracing::warn!(key = %key, error = %e, "storage rejected notebook write");
                } else {
                    tracing::error!(key = %key, error = %e, "notebook write failed");
                }
                self.notifications.push(Notification::PersistFailed {
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::editor::BufferEditor;
    use crate::storage::MemoryStorage;

    type TestStore = NotebookStore<MemoryStorage, BufferEditor>;

    fn open(id: &str) -> TestStore {
        NotebookStore::load(
            id,
            MemoryStorage::new(),
            BufferEditor::new(),
            &StoreConfig::default(),
        )
    }

    fn stored(store: &TestStore) -> Notebook {
        let text = store
            .storage()
            .get(&notebook_key(&store.notebook().id))
            .unwrap()
            .expect("record persisted");
        Notebook::decode(&text).unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_load_without_record_yields_default() {
        let store = open("42");
        let notebook = store.notebook();

        assert_eq!(notebook.id, "42");
        assert_eq!(notebook.title, "Notebook 42");
        assert_eq!(notebook.pages.len(), 1);
        assert!(notebook.pages[0].content.is_empty());
        assert_eq!(store.current_page_index(), 0);
        assert_eq!(store.storage().write_count(), 0);
    }

    #[test]
    fn test_load_hydrates_editor_and_title() {
        let mut notebook = Notebook::new("5".to_string(), "Recipes".to_string());
        notebook.pages[0].content = "first".to_string();
        notebook.push_page();
        notebook.pages[1].title = "Soups".to_string();
        notebook.pages[1].content = "{\"soup\":1}".to_string();

        let mut storage = MemoryStorage::new();
        storage
            .set(&notebook_key("5"), &notebook.encode().unwrap())
            .unwrap();

        let store = NotebookStore::load("5", storage, BufferEditor::new(), &StoreConfig::default());
        assert_eq!(store.notebook(), &notebook);
        assert_eq!(store.title_field(), "Soups");
        assert_eq!(store.editor().get_content().as_deref(), Some("{\"soup\":1}"));
    }

    #[test]
    fn test_load_malformed_record_falls_back() {
        let mut storage = MemoryStorage::new();
        storage.set(&notebook_key("3"), "{\"id\":").unwrap();

        let mut store =
            NotebookStore::load("3", storage, BufferEditor::new(), &StoreConfig::default());
        assert_eq!(store.notebook().pages.len(), 1);
        assert_eq!(store.notebook().title, "Notebook 3");

        let notes = store.take_notifications();
        assert_eq!(notes.len(), 1);
        assert!(matches!(notes[0], Notification::DecodeFailed { .. }));
    }

    #[test]
    fn test_load_with_unavailable_storage_falls_back() {
        let mut storage = MemoryStorage::new();
        storage.set_failing(true);

        let mut store =
            NotebookStore::load("8", storage, BufferEditor::new(), &StoreConfig::default());
        assert_eq!(store.notebook().id, "8");
        assert!(matches!(
            store.take_notifications()[0],
            Notification::PersistFailed { .. }
        ));
    }

    #[test]
    fn test_set_page_title_does_not_persist() {
        let mut store = open("1");
        store.set_page_title("Chapter one");

        assert_eq!(store.notebook().pages[0].title, "Chapter one");
        assert_eq!(store.title_field(), "Chapter one");
        assert_eq!(store.storage().write_count(), 0);
    }

    #[test]
    fn test_save_current_page_pulls_editor_content() {
        let mut store = open("1");
        store.editor_mut().replace("hello");

        assert!(store.save_current_page());
        assert_eq!(stored(&store).pages[0].content, "hello");
        assert!(store.last_saved().is_some());
        assert_eq!(store.take_notifications(), vec![Notification::Saved]);
    }

    #[test]
    fn test_save_with_unmounted_editor_keeps_content() {
        let mut store = NotebookStore::load(
            "1",
            MemoryStorage::new(),
            BufferEditor::unmounted(),
            &StoreConfig::default(),
        );
        store.auto_save("kept".to_string());

        assert!(store.save_current_page());
        assert_eq!(stored(&store).pages[0].content, "kept");
    }

    #[test]
    fn test_save_twice_is_idempotent() {
        let mut store = open("1");
        store.editor_mut().replace("same");
        store.save_current_page();
        let mut first = stored(&store);

        store.save_current_page();
        let mut second = stored(&store);

        first.pages[0].timestamp = 0;
        second.pages[0].timestamp = 0;
        assert_eq!(first, second);
    }

    #[test]
    fn test_add_page_sequence() {
        let mut store = open("1");
        for n in 1..=5 {
            let before = store.notebook().pages.len();
            let index = store.add_page();
            assert_eq!(store.notebook().pages.len(), before + 1);
            assert_eq!(index, n);
            assert_eq!(store.current_page_index(), store.notebook().pages.len() - 1);
        }
        let ids: Vec<_> = store.notebook().pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn test_add_page_flushes_outgoing_page_and_clears_editor() {
        let mut store = open("1");
        store.set_page_title("Draft");
        store.editor_mut().replace("page one text");

        store.add_page();

        let persisted = stored(&store);
        assert_eq!(persisted.pages[0].content, "page one text");
        assert_eq!(persisted.pages[0].title, "Draft");
        assert_eq!(persisted.current_page, 1);
        assert_eq!(store.editor().get_content().as_deref(), Some(""));
        assert_eq!(store.title_field(), "");
        assert!(store.editor().is_focused());
        assert!(store.take_notifications().contains(&Notification::PageAdded));
    }

    #[test]
    fn test_go_to_page_then_add_page() {
        let mut store = open("1");
        store.add_page();
        assert_eq!(store.notebook().pages.len(), 2);

        store.go_to_page(1).unwrap();
        store.editor_mut().replace("second page body");
        store.add_page();

        assert_eq!(store.notebook().pages.len(), 3);
        assert_eq!(store.current_page_index(), 2);
        assert_eq!(store.notebook().pages[1].content, "second page body");
        assert_eq!(stored(&store).pages[1].content, "second page body");
    }

    #[test]
    fn test_go_to_page_switches_editor_and_title() {
        let mut store = open("1");
        store.set_page_title("One");
        store.editor_mut().replace("first");
        store.add_page();
        store.set_page_title("Two");
        store.editor_mut().replace("second");

        store.go_to_page(0).unwrap();

        assert_eq!(store.title_field(), "One");
        assert_eq!(store.editor().get_content().as_deref(), Some("first"));
        let persisted = stored(&store);
        assert_eq!(persisted.pages[1].content, "second");
        assert_eq!(persisted.pages[1].title, "Two");
        assert_eq!(persisted.current_page, 0);
    }

    #[test]
    fn test_go_to_page_reports_save() {
        let mut store = open("1");
        store.add_page();
        store.take_notifications();

        store.go_to_page(0).unwrap();
        assert_eq!(store.take_notifications(), vec![Notification::Saved]);

        store.storage_mut().set_failing(true);
        store.go_to_page(1).unwrap();
        let notes = store.take_notifications();
        assert_eq!(notes.len(), 1);
        assert!(matches!(notes[0], Notification::PersistFailed { .. }));
    }

    #[test]
    fn test_go_to_page_out_of_range_leaves_state_unchanged() {
        let mut store = open("1");
        store.add_page();
        store.editor_mut().replace("unsaved");
        let before = store.notebook().clone();
        let writes = store.storage().write_count();

        let err = store.go_to_page(2).unwrap_err();
        assert!(matches!(err, NotebookError::PageOutOfRange { index: 2, len: 2 }));
        assert!(err.is_invalid_argument());

        assert_eq!(store.notebook(), &before);
        assert_eq!(store.storage().write_count(), writes);
        assert_eq!(store.editor().get_content().as_deref(), Some("unsaved"));
    }

    #[test]
    fn test_auto_save_burst_writes_once() {
        let mut store = open("1");
        let t0 = Instant::now();

        store.editor_changed("a".to_string(), t0);
        assert!(!store.tick(t0 + ms(200)));
        store.editor_changed("ab".to_string(), t0 + ms(200));
        assert!(!store.tick(t0 + ms(400)));
        store.editor_changed("abc".to_string(), t0 + ms(400));

        assert!(!store.tick(t0 + ms(1200)));
        assert_eq!(store.storage().write_count(), 0);
        assert_eq!(store.autosave_deadline(), Some(t0 + ms(1400)));

        assert!(store.tick(t0 + ms(1400)));
        assert_eq!(store.storage().write_count(), 1);
        assert_eq!(stored(&store).pages[0].content, "abc");

        assert!(!store.tick(t0 + ms(3000)));
        assert_eq!(store.storage().write_count(), 1);
    }

    #[test]
    fn test_pending_auto_save_cannot_override_explicit_save() {
        let mut store = open("1");
        let t0 = Instant::now();

        store.editor_changed("stale".to_string(), t0);
        store.editor_mut().replace("fresh");
        store.save_current_page();

        assert!(!store.tick(t0 + ms(2000)));
        assert_eq!(stored(&store).pages[0].content, "fresh");
    }

    #[test]
    fn test_unmount_cancels_pending_auto_save() {
        let mut store = open("1");
        let t0 = Instant::now();
        store.editor_changed("typed".to_string(), t0);

        store.unmount();

        assert!(!store.tick(t0 + ms(5000)));
        assert_eq!(store.storage().write_count(), 0);
    }

    #[test]
    fn test_auto_save_after_navigation_targets_new_page() {
        let mut store = open("1");
        let t0 = Instant::now();
        store.editor_changed("for page one".to_string(), t0);
        store.editor_mut().replace("for page one");
        store.add_page();

        store.editor_changed("for page two".to_string(), t0 + ms(100));
        assert!(store.tick(t0 + ms(1100)));

        let persisted = stored(&store);
        assert_eq!(persisted.pages[0].content, "for page one");
        assert_eq!(persisted.pages[1].content, "for page two");
    }

    #[test]
    fn test_persist_failure_is_not_fatal() {
        let mut store = open("1");
        store.storage_mut().set_failing(true);
        store.editor_mut().replace("offline edit");

        assert!(!store.save_current_page());
        assert_eq!(store.notebook().pages[0].content, "offline edit");
        assert!(store.last_saved().is_none());

        store.add_page();
        store.go_to_page(0).unwrap();
        assert_eq!(store.editor().get_content().as_deref(), Some("offline edit"));

        let notes = store.take_notifications();
        assert!(notes.iter().all(|n| !matches!(n, Notification::Saved)));
        assert!(notes
            .iter()
            .any(|n| matches!(n, Notification::PersistFailed { .. })));

        store.storage_mut().set_failing(false);
        assert!(store.save_current_page());
        assert_eq!(stored(&store).pages.len(), 2);
    }

    #[test]
    fn test_table_of_contents() {
        let mut store = open("1");
        store.set_page_title("Intro");
        store.add_page();

        let toc = store.table_of_contents();
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].title, "Intro");
        assert!(!toc[0].current);
        assert_eq!(toc[1].title, "Page 2");
        assert_eq!(toc[1].page_id, "2");
        assert!(toc[1].current);
    }

    #[test]
    fn test_reload_round_trips_content_bytes() {
        let content = "{\"root\":{\"children\":[{\"text\":\"ünïcödé \\n\\t\"}]}}";
        let mut store = open("77");
        store.editor_mut().replace(content);
        store.save_current_page();

        let (storage, _, _) = store.into_parts();
        let store =
            NotebookStore::load("77", storage, BufferEditor::new(), &StoreConfig::default());
        assert_eq!(store.notebook().pages[0].content, content);
        assert_eq!(store.editor().get_content().as_deref(), Some(content));
    }
}
