use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A job posting owned by the external target registry.
///
/// `structured_description` is the parsed form of the posting and takes
/// precedence over the free-text `description` when both are present.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TargetRow {
    pub id: Uuid,
    pub code: Option<String>,
    pub description: Option<String>,
    pub structured_description: Option<Value>,
}

/// The subset of a target echoed back alongside a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub id: Uuid,
    pub code: Option<String>,
    pub description: Option<String>,
}

impl TargetRow {
    /// The text handed to the scorer and fingerprinted for the cache.
    ///
    /// Structured data is serialized as compact JSON. `serde_json` maps keep
    /// their keys sorted, so the same document always yields the same text.
    /// Returns `None` when the target carries no usable description at all.
    pub fn comparison_text(&self) -> Option<String> {
        if let Some(structured) = &self.structured_description {
            if !structured.is_null() {
                return Some(structured.to_string());
            }
        }
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(String::from)
    }

    pub fn summary(&self) -> TargetSummary {
        TargetSummary {
            id: self.id,
            code: self.code.clone(),
            description: self.description.clone(),
        }
    }
}
