//! Transient user notifications raised by the notebook store.
//!
//! None of these block editing. The store queues them and the caller
//! drains and displays them.

use chrono::{DateTime, Utc};

/// A transient, non-blocking notice for the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The notebook was written to storage after an explicit save.
    Saved,
    /// A new page was appended and selected.
    PageAdded,
    /// Storage rejected a read or write. The in-memory notebook is still
    /// authoritative.
    PersistFailed { reason: String },
    /// A persisted record could not be decoded and a fresh notebook was
    /// used instead.
    DecodeFailed { key: String, reason: String },
}

impl Notification {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notification::PersistFailed { .. } | Notification::DecodeFailed { .. }
        )
    }
}

/// Format a notification for display.
pub fn format_notification(notification: &Notification) -> String {
    match notification {
        Notification::Saved => "Notebook saved".to_string(),
        Notification::PageAdded => "New page added".to_string(),
        Notification::PersistFailed { reason } => {
            format!("Could not save notebook ({}); changes are kept in memory", reason)
        }
        Notification::DecodeFailed { key, reason } => {
            format!("Ignored unreadable record '{}': {}", key, reason)
        }
    }
}

/// Describe how long ago the last save happened.
pub fn format_last_saved(last_saved: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last_saved else {
        return "Not saved yet".to_string();
    };

    let diff_ms = (now - last).num_milliseconds().max(0);
    let minutes = (diff_ms as f64 / 60_000.0).round() as i64;

    if minutes < 1 {
        return "Saved just now".to_string();
    }
    if minutes == 1 {
        return "Saved 1 minute ago".to_string();
    }
    if minutes < 60 {
        return format!("Saved {} minutes ago", minutes);
    }

    let hours = minutes / 60;
    if hours == 1 {
        "Saved 1 hour ago".to_string()
    } else {
        format!("Saved {} hours ago", hours)
    }
}
