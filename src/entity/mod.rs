mod notebook;
mod page;

pub use notebook::Notebook;
pub use page::Page;

use chrono::Utc;

/// Milliseconds since the Unix epoch, the timestamp unit of persisted pages.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Storage key for a notebook record.
pub fn notebook_key(id: &str) -> String {
    format!("notebook-{}", id)
}
