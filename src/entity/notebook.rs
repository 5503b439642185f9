// src/entity/notebook.rs
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Page;
use crate::error::{NotebookError, Result};

/// A titled, ordered collection of pages. The unit of persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub id: String,
    pub title: String,
    pub pages: Vec<Page>,
    #[serde(rename = "currentPage")]
    pub current_page: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notebook {
    /// Create a notebook seeded with a single empty page.
    pub fn new(id: String, title: String) -> Self {
        Self {
            id,
            title,
            pages: vec![Page::new("1".to_string())],
            current_page: 0,
            extra: Map::new(),
        }
    }

    /// Parse a persisted record and check its invariants.
    pub fn decode(text: &str) -> Result<Self> {
        let notebook: Notebook =
            serde_json::from_str(text).map_err(|e| NotebookError::Decode(e.to_string()))?;
        notebook.validate()?;
        Ok(notebook)
    }

    /// Serialize to the persisted record layout.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check the structural invariants a persisted record must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.pages.is_empty() {
            return Err(NotebookError::Decode("notebook has no pages".to_string()));
        }
        if self.current_page >= self.pages.len() {
            return Err(NotebookError::Decode(format!(
                "currentPage {} out of range for {} pages",
                self.current_page,
                self.pages.len()
            )));
        }

        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.id.as_str()) {
                return Err(NotebookError::Decode(format!(
                    "duplicate page id '{}'",
                    page.id
                )));
            }
        }
        Ok(())
    }

    pub fn current(&self) -> &Page {
        &self.pages[self.current_page]
    }

    pub fn current_mut(&mut self) -> &mut Page {
        &mut self.pages[self.current_page]
    }

    /// Id for the next appended page: `len + 1`, skipping ids that are
    /// already taken.
    pub fn next_page_id(&self) -> String {
        let mut candidate = self.pages.len() + 1;
        while self.pages.iter().any(|p| p.id == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// Append an empty page and select it. Returns its index.
    pub fn push_page(&mut self) -> usize {
        let page = Page::new(self.next_page_id());
        self.pages.push(page);
        self.current_page = self.pages.len() - 1;
        self.current_page
    }
}
