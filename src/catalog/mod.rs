//! The notebook list: catalog entries created from the "new notebook" and
//! "new category" forms, and search over stored notebooks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{notebook_key, Notebook};
use crate::error::{NotebookError, Result};
use crate::storage::Storage;

pub const CATALOG_KEY: &str = "catalog";
pub const DEFAULT_COLOR: &str = "#3b82f6";
const NOTEBOOK_PREFIX: &str = "notebook-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Studies,
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Personal => write!(f, "personal"),
            Category::Work => write!(f, "work"),
            Category::Studies => write!(f, "studies"),
            Category::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(Category::Personal),
            "work" => Ok(Category::Work),
            "studies" => Ok(Category::Studies),
            "other" => Ok(Category::Other),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

/// Fields shared by catalog entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryBase {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub sequence_number: u32,
}

impl EntryBase {
    fn new(name: String, description: Option<String>, color: Option<String>, seq: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            color: color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            created_at: Utc::now(),
            sequence_number: seq,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookEntry {
    #[serde(flatten)]
    pub base: EntryBase,
    pub category: Category,
}

impl NotebookEntry {
    /// Route id of the notebook this entry describes.
    pub fn notebook_id(&self) -> String {
        self.base.sequence_number.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    #[serde(flatten)]
    pub base: EntryBase,
}

/// What the creation form submits.
#[derive(Debug, Clone)]
pub enum CreateRequest {
    Notebook {
        name: String,
        category: Category,
        description: Option<String>,
        color: Option<String>,
    },
    Category {
        name: String,
        description: Option<String>,
        color: Option<String>,
    },
}

/// Result of applying a [`CreateRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum Created {
    Notebook(NotebookEntry),
    Category(CategoryEntry),
}

/// A stored notebook as shown in the list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotebookSummary {
    pub id: String,
    pub title: String,
    pub pages: usize,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub notebooks: Vec<NotebookEntry>,
    pub categories: Vec<CategoryEntry>,
}

impl Catalog {
    /// Read the catalog record. A missing or unreadable record gives an
    /// empty catalog.
    pub fn load<S: Storage + ?Sized>(storage: &S) -> Result<Self> {
        match storage.get(CATALOG_KEY)? {
            Some(text) => match serde_json::from_str(&text) {
                Ok(catalog) => Ok(catalog),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding malformed catalog record");
                    Ok(Catalog::default())
                }
            },
            None => Ok(Catalog::default()),
        }
    }

    pub fn save<S: Storage + ?Sized>(&self, storage: &mut S) -> Result<()> {
        storage.set(CATALOG_KEY, &serde_json::to_string(self)?)
    }

    /// Next free notebook sequence number, also skipping ids already used
    /// by stored notebook records.
    pub fn next_sequence_number<S: Storage + ?Sized>(&self, storage: &S) -> Result<u32> {
        let from_entries = self
            .notebooks
            .iter()
            .map(|n| n.base.sequence_number)
            .max()
            .unwrap_or(0);
        let from_records = storage
            .keys()?
            .iter()
            .filter_map(|k| k.strip_prefix(NOTEBOOK_PREFIX))
            .filter_map(|id| id.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(from_entries.max(from_records) + 1)
    }

    /// Validate and apply a creation request. New notebooks also get a
    /// seeded notebook record titled with the entry name.
    pub fn apply<S: Storage + ?Sized>(
        &mut self,
        request: CreateRequest,
        storage: &mut S,
    ) -> Result<Created> {
        let created = match request {
            CreateRequest::Notebook {
                name,
                category,
                description,
                color,
            } => {
                let name = validate_name(&name)?;
                let seq = self.next_sequence_number(&*storage)?;
                let entry = NotebookEntry {
                    base: EntryBase::new(name, clean(description), color, seq),
                    category,
                };

                let notebook = Notebook::new(entry.notebook_id(), entry.base.name.clone());
                storage.set(&notebook_key(&notebook.id), &notebook.encode()?)?;

                self.notebooks.push(entry.clone());
                Created::Notebook(entry)
            }
            CreateRequest::Category {
                name,
                description,
                color,
            } => {
                let name = validate_name(&name)?;
                if self
                    .categories
                    .iter()
                    .any(|c| c.base.name.eq_ignore_ascii_case(&name))
                {
                    return Err(NotebookError::InvalidArgument(format!(
                        "category '{}' already exists",
                        name
                    )));
                }
                let seq = self.categories.len() as u32 + 1;
                let entry = CategoryEntry {
                    base: EntryBase::new(name, clean(description), color, seq),
                };
                self.categories.push(entry.clone());
                Created::Category(entry)
            }
        };

        self.save(storage)?;
        Ok(created)
    }

    /// Stored notebooks whose title contains `query`, case-insensitively,
    /// ordered by id.
    pub fn search<S: Storage + ?Sized>(
        &self,
        storage: &S,
        query: Option<&str>,
    ) -> Result<Vec<NotebookSummary>> {
        let needle = query.map(|q| q.to_lowercase());
        let mut summaries = Vec::new();

        for key in storage.keys()? {
            let Some(id) = key.strip_prefix(NOTEBOOK_PREFIX) else {
                continue;
            };
            let Some(text) = storage.get(&key)? else {
                continue;
            };
            let notebook = match Notebook::decode(&text) {
                Ok(notebook) => notebook,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping malformed notebook in listing");
                    continue;
                }
            };

            if let Some(ref needle) = needle {
                if !notebook.title.to_lowercase().contains(needle) {
                    continue;
                }
            }

            let category = self
                .notebooks
                .iter()
                .find(|n| n.notebook_id() == id)
                .map(|n| n.category);
            summaries.push(NotebookSummary {
                id: id.to_string(),
                title: notebook.title,
                pages: notebook.pages.len(),
                category,
            });
        }

        summaries.sort_by(|a, b| match (a.id.parse::<u64>(), b.id.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.id.cmp(&b.id),
        });
        Ok(summaries)
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(NotebookError::InvalidArgument(
            "name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn clean(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
