//! Model catalog
//!
//! Entries are display metadata around a backend model identifier; only
//! `backend_id` is ever sent to the backend.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat:free";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    pub backend_id: String,

    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
    default_id: String,
}

impl ModelCatalog {
    /// Build a catalog; `default_id` is used when a request names no known model
    pub fn new(entries: Vec<ModelEntry>, default_id: impl Into<String>) -> Self {
        let default_id = default_id.into();
        let mut entries = entries;
        if !entries.iter().any(|e| e.backend_id == default_id) {
            entries.insert(
                0,
                ModelEntry {
                    display_name: default_id.clone(),
                    description: "Default research model".into(),
                    backend_id: default_id.clone(),
                    available: true,
                },
            );
        }
        Self { entries, default_id }
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Backend id for a requested model, falling back to the default
    pub fn resolve(&self, requested: Option<&str>) -> &str {
        requested
            .and_then(|id| {
                self.entries
                    .iter()
                    .find(|e| e.available && e.backend_id == id)
            })
            .map(|e| e.backend_id.as_str())
            .unwrap_or(self.default_id.as_str())
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(
            vec![ModelEntry {
                display_name: "DeepSeek Chat".into(),
                description: "Free DeepSeek chat model".into(),
                backend_id: DEFAULT_MODEL.into(),
                available: true,
            }],
            DEFAULT_MODEL,
        )
    }
}
