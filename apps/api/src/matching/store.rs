//! ComparisonStore: persisted lookup/insert of comparison records.
//!
//! The store performs plain inserts; "at most one record per fingerprint
//! tuple" holds only because `ComparisonCache` calls `find` first. Two
//! concurrent misses on the same tuple may both insert; `find` then returns
//! the earliest row.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::comparison::{ComparisonKey, ComparisonRecord};

/// A record about to be persisted. `id` and `compared_at` are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewComparison {
    pub key: ComparisonKey,
    pub score: f64,
    pub can_apply: bool,
    pub reasons: Vec<String>,
    pub matches_threshold: bool,
}

#[async_trait]
pub trait ComparisonStore: Send + Sync {
    async fn find(&self, key: &ComparisonKey) -> Result<Option<ComparisonRecord>>;

    async fn insert(&self, record: NewComparison) -> Result<ComparisonRecord>;
}

pub struct PgComparisonStore {
    pool: PgPool,
}

impl PgComparisonStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ComparisonStore for PgComparisonStore {
    async fn find(&self, key: &ComparisonKey) -> Result<Option<ComparisonRecord>> {
        Ok(sqlx::query_as::<_, ComparisonRecord>(
            r#"
            SELECT *
            FROM comparison_records
            WHERE subject_id = $1
              AND target_id = $2
              AND subject_fingerprint = $3
              AND target_fingerprint = $4
            ORDER BY compared_at ASC
            LIMIT 1
            "#,
        )
        .bind(key.subject_id)
        .bind(key.target_id)
        .bind(&key.subject_fingerprint)
        .bind(&key.target_fingerprint)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert(&self, record: NewComparison) -> Result<ComparisonRecord> {
        let NewComparison {
            key,
            score,
            can_apply,
            reasons,
            matches_threshold,
        } = record;

        Ok(sqlx::query_as::<_, ComparisonRecord>(
            r#"
            INSERT INTO comparison_records
                (id, subject_id, target_id, subject_fingerprint, target_fingerprint,
                 score, can_apply, reasons, matches_threshold, compared_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(key.subject_id)
        .bind(key.target_id)
        .bind(&key.subject_fingerprint)
        .bind(&key.target_fingerprint)
        .bind(score)
        .bind(can_apply)
        .bind(&reasons)
        .bind(matches_threshold)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?)
    }
}
