//! Read-only access to the external subject (resume) and target (posting)
//! registries. The matching core never writes to either.
//!
//! Postgres layout expected by the `Pg*` implementations:
//! - `subjects(id UUID, profile_text TEXT NULL)`
//! - `targets(id UUID, code TEXT NULL, description TEXT NULL, structured_description JSONB NULL)`

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::subject::SubjectRow;
use crate::models::target::TargetRow;

#[async_trait]
pub trait SubjectRegistry: Send + Sync {
    async fn get_subject(&self, id: Uuid) -> Result<Option<SubjectRow>>;

    async fn list_subjects_with_text(&self) -> Result<Vec<SubjectRow>>;
}

#[async_trait]
pub trait TargetRegistry: Send + Sync {
    async fn list_targets_with_description(&self) -> Result<Vec<TargetRow>>;
}

pub struct PgSubjectRegistry {
    pool: PgPool,
}

impl PgSubjectRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectRegistry for PgSubjectRegistry {
    async fn get_subject(&self, id: Uuid) -> Result<Option<SubjectRow>> {
        Ok(
            sqlx::query_as::<_, SubjectRow>("SELECT id, profile_text FROM subjects WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_subjects_with_text(&self) -> Result<Vec<SubjectRow>> {
        Ok(sqlx::query_as::<_, SubjectRow>(
            r#"
            SELECT id, profile_text
            FROM subjects
            WHERE profile_text IS NOT NULL AND btrim(profile_text) <> ''
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }
}

pub struct PgTargetRegistry {
    pool: PgPool,
}

impl PgTargetRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TargetRegistry for PgTargetRegistry {
    async fn list_targets_with_description(&self) -> Result<Vec<TargetRow>> {
        Ok(sqlx::query_as::<_, TargetRow>(
            r#"
            SELECT id, code, description, structured_description
            FROM targets
            WHERE structured_description IS NOT NULL
               OR (description IS NOT NULL AND btrim(description) <> '')
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
