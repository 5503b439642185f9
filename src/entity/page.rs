// src/entity/page.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::now_millis;

/// One page of a notebook.
///
/// `content` is the serialized editor state and is carried through
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub timestamp: i64,
    /// Fields written by newer formats, preserved on save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Page {
    pub fn new(id: String) -> Self {
        Self {
            id,
            title: String::new(),
            content: String::new(),
            timestamp: now_millis(),
            extra: Map::new(),
        }
    }

    /// Title shown in the table of contents. Untitled pages fall back to
    /// their 1-based position.
    pub fn display_title(&self, index: usize) -> String {
        if self.title.is_empty() {
            format!("Page {}", index + 1)
        } else {
            self.title.clone()
        }
    }
}
