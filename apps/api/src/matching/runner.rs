//! BatchMatchRunner: matches subjects against every target through the
//! comparison cache.
//!
//! Both entry points share `compare_pair`. A failed pair (scorer error,
//! timeout, store error) is logged and skipped and never aborts the batch.
//! Only failing to enumerate subjects or targets is a run-level error.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::matching::cache::{ComparisonCache, ComparisonOutcome};
use crate::matching::registry::{SubjectRegistry, TargetRegistry};
use crate::models::target::{TargetRow, TargetSummary};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to load subjects: {0:#}")]
    Subjects(#[source] anyhow::Error),

    #[error("failed to load targets: {0:#}")]
    Targets(#[source] anyhow::Error),
}

/// One passing target for a single subject, as returned on demand.
#[derive(Debug, Clone, Serialize)]
pub struct TargetMatch {
    pub target: TargetSummary,
    pub score: f64,
    pub can_apply: bool,
    pub reasons: Vec<String>,
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchDetail {
    pub target_id: Uuid,
    pub target_code: Option<String>,
    pub score: f64,
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectMatches {
    pub subject_id: Uuid,
    pub match_count: usize,
    pub match_details: Vec<MatchDetail>,
}

/// Aggregate result of a full cross-product run.
///
/// Every attempted pair is counted exactly once as cached, new or failed,
/// so `total_comparisons == cached_comparisons + new_comparisons + failed_comparisons`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub total_subjects: usize,
    pub total_targets: usize,
    pub total_comparisons: usize,
    pub total_matches: usize,
    pub cached_comparisons: usize,
    pub new_comparisons: usize,
    pub failed_comparisons: usize,
    pub subject_matches: Vec<SubjectMatches>,
}

enum PairOutcome {
    Compared(ComparisonOutcome),
    Failed,
}

#[derive(Debug, Default)]
struct RunTally {
    comparisons: usize,
    matches: usize,
    cached: usize,
    new: usize,
    failed: usize,
}

impl RunTally {
    fn record(&mut self, outcome: &PairOutcome) {
        self.comparisons += 1;
        match outcome {
            PairOutcome::Compared(c) => {
                if c.cached {
                    self.cached += 1;
                } else {
                    self.new += 1;
                }
                if c.matches_threshold {
                    self.matches += 1;
                }
            }
            PairOutcome::Failed => self.failed += 1,
        }
    }
}

/// A target paired with the text it is compared by.
struct Candidate {
    target: TargetRow,
    text: String,
}

pub struct BatchMatchRunner {
    subjects: Arc<dyn SubjectRegistry>,
    targets: Arc<dyn TargetRegistry>,
    cache: ComparisonCache,
}

impl BatchMatchRunner {
    pub fn new(
        subjects: Arc<dyn SubjectRegistry>,
        targets: Arc<dyn TargetRegistry>,
        cache: ComparisonCache,
    ) -> Self {
        Self {
            subjects,
            targets,
            cache,
        }
    }

    /// Returns every target the subject passes, best score first.
    ///
    /// An unknown subject, or one without text, yields an empty list.
    /// Ties keep the order in which targets were listed.
    pub async fn find_matches_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Vec<TargetMatch>, RunError> {
        let subject = self
            .subjects
            .get_subject(subject_id)
            .await
            .map_err(RunError::Subjects)?;
        let Some(subject_text) = subject.as_ref().and_then(|s| s.usable_text()) else {
            return Ok(vec![]);
        };

        let candidates = self.load_candidates().await?;
        let mut matches = Vec::new();

        for candidate in &candidates {
            if let PairOutcome::Compared(outcome) = self
                .compare_pair(subject_id, subject_text, candidate)
                .await
            {
                if outcome.matches_threshold {
                    matches.push(TargetMatch {
                        target: candidate.target.summary(),
                        score: outcome.score,
                        can_apply: outcome.can_apply,
                        reasons: outcome.reasons,
                        cached: outcome.cached,
                    });
                }
            }
        }

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(matches)
    }

    /// Compares every subject with text against every target with a description.
    pub async fn run_all(&self) -> Result<BatchReport, RunError> {
        let subjects: Vec<(Uuid, String)> = self
            .subjects
            .list_subjects_with_text()
            .await
            .map_err(RunError::Subjects)?
            .into_iter()
            .filter_map(|s| Some((s.id, s.usable_text()?.to_string())))
            .collect();
        let candidates = self.load_candidates().await?;

        if subjects.is_empty() || candidates.is_empty() {
            info!(
                "Nothing to compare: {} subjects with text, {} targets with description",
                subjects.len(),
                candidates.len()
            );
            return Ok(BatchReport {
                total_subjects: subjects.len(),
                total_targets: candidates.len(),
                ..BatchReport::default()
            });
        }

        info!(
            "Comparing {} subjects against {} targets",
            subjects.len(),
            candidates.len()
        );

        let mut tally = RunTally::default();
        let mut subject_matches = Vec::with_capacity(subjects.len());

        for (subject_id, subject_text) in &subjects {
            let mut match_details = Vec::new();

            for candidate in &candidates {
                let outcome = self
                    .compare_pair(*subject_id, subject_text, candidate)
                    .await;
                tally.record(&outcome);

                if let PairOutcome::Compared(c) = outcome {
                    if c.matches_threshold {
                        match_details.push(MatchDetail {
                            target_id: candidate.target.id,
                            target_code: candidate.target.code.clone(),
                            score: c.score,
                            cached: c.cached,
                        });
                    }
                }
            }

            subject_matches.push(SubjectMatches {
                subject_id: *subject_id,
                match_count: match_details.len(),
                match_details,
            });
        }

        Ok(BatchReport {
            total_subjects: subjects.len(),
            total_targets: candidates.len(),
            total_comparisons: tally.comparisons,
            total_matches: tally.matches,
            cached_comparisons: tally.cached,
            new_comparisons: tally.new,
            failed_comparisons: tally.failed,
            subject_matches,
        })
    }

    async fn load_candidates(&self) -> Result<Vec<Candidate>, RunError> {
        Ok(self
            .targets
            .list_targets_with_description()
            .await
            .map_err(RunError::Targets)?
            .into_iter()
            .filter_map(|target| {
                let text = target.comparison_text()?;
                Some(Candidate { target, text })
            })
            .collect())
    }

    async fn compare_pair(
        &self,
        subject_id: Uuid,
        subject_text: &str,
        candidate: &Candidate,
    ) -> PairOutcome {
        match self
            .cache
            .get_or_compute(subject_id, subject_text, candidate.target.id, &candidate.text)
            .await
        {
            Ok(outcome) => PairOutcome::Compared(outcome),
            Err(e) => {
                warn!(
                    "Failed to compare target {} for subject {}: {}",
                    candidate.target.id, subject_id, e
                );
                PairOutcome::Failed
            }
        }
    }
}
