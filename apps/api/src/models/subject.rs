use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A resume owned by the external subject registry. The core only reads the id and text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubjectRow {
    pub id: Uuid,
    pub profile_text: Option<String>,
}

impl SubjectRow {
    /// Returns the extracted profile text, or `None` when it is absent or blank.
    pub fn usable_text(&self) -> Option<&str> {
        self.profile_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}
