use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted comparison between one subject text and one target text.
///
/// Rows are cache entries for the exact
/// `(subject_id, target_id, subject_fingerprint, target_fingerprint)` tuple.
/// They are inserted once and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComparisonRecord {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub target_id: Uuid,
    pub subject_fingerprint: String,
    pub target_fingerprint: String,
    pub score: f64,
    pub can_apply: bool,
    pub reasons: Vec<String>,
    pub matches_threshold: bool,
    pub compared_at: DateTime<Utc>,
}

/// Lookup key for a cached comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonKey {
    pub subject_id: Uuid,
    pub target_id: Uuid,
    pub subject_fingerprint: String,
    pub target_fingerprint: String,
}
