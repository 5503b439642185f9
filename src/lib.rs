pub mod autosave;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod editor;
pub mod entity;
pub mod error;
pub mod notification;
pub mod session;
pub mod storage;
pub mod store;

pub use config::StoreConfig;
pub use editor::{BufferEditor, EditorSurface};
pub use entity::{Notebook, Page};
pub use error::{NotebookError, Result};
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage};
pub use store::NotebookStore;
