//! ComparisonCache: get-or-compute for a single subject/target pair.
//!
//! Identical subject and target texts are scored once. A hit is served from
//! the store without calling the scorer. A miss is evaluated and persisted.
//!
//! There is no negative caching: a failed evaluation leaves no record, so the
//! next attempt for the same pair evaluates again instead of replaying the
//! failure.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::matching::evaluator::{EvaluationError, MatchEvaluator};
use crate::matching::fingerprint::fingerprint;
use crate::matching::store::{ComparisonStore, NewComparison};
use crate::models::comparison::ComparisonKey;

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("comparison store error: {0:#}")]
    Store(#[source] anyhow::Error),
}

/// Result of one get-or-compute call.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutcome {
    pub score: f64,
    pub can_apply: bool,
    pub reasons: Vec<String>,
    pub matches_threshold: bool,
    pub cached: bool,
}

pub struct ComparisonCache {
    store: Arc<dyn ComparisonStore>,
    evaluator: MatchEvaluator,
}

impl ComparisonCache {
    pub fn new(store: Arc<dyn ComparisonStore>, evaluator: MatchEvaluator) -> Self {
        Self { store, evaluator }
    }

    pub async fn get_or_compute(
        &self,
        subject_id: Uuid,
        subject_text: &str,
        target_id: Uuid,
        target_text: &str,
    ) -> Result<ComparisonOutcome, ComparisonError> {
        let key = ComparisonKey {
            subject_id,
            target_id,
            subject_fingerprint: fingerprint(subject_text),
            target_fingerprint: fingerprint(target_text),
        };

        if let Some(existing) = self.store.find(&key).await.map_err(ComparisonError::Store)? {
            debug!(
                "Cache hit for subject {} and target {} - already compared",
                subject_id, target_id
            );
            return Ok(ComparisonOutcome {
                score: existing.score,
                can_apply: existing.can_apply,
                reasons: existing.reasons,
                matches_threshold: existing.matches_threshold,
                cached: true,
            });
        }

        let evaluation = self.evaluator.evaluate(subject_text, target_text).await?;

        let stored = self
            .store
            .insert(NewComparison {
                key,
                score: evaluation.score,
                can_apply: evaluation.can_apply,
                reasons: evaluation.reasons,
                matches_threshold: evaluation.matches_threshold,
            })
            .await
            .map_err(ComparisonError::Store)?;

        info!(
            "Scored subject {} against target {}: {}",
            subject_id, target_id, stored.score
        );

        Ok(ComparisonOutcome {
            score: stored.score,
            can_apply: stored.can_apply,
            reasons: stored.reasons,
            matches_threshold: stored.matches_threshold,
            cached: false,
        })
    }
}
