//! In-memory fakes for the matching seams, shared by unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::llm_client::LlmError;
use crate::matching::registry::{SubjectRegistry, TargetRegistry};
use crate::matching::scorer::{RawScore, SemanticScorer};
use crate::matching::store::{ComparisonStore, NewComparison};
use crate::models::comparison::{ComparisonKey, ComparisonRecord};
use crate::models::subject::SubjectRow;
use crate::models::target::TargetRow;

pub fn subject(text: Option<&str>) -> SubjectRow {
    SubjectRow {
        id: Uuid::new_v4(),
        profile_text: text.map(String::from),
    }
}

/// A plain-text target whose code is derived from its description.
pub fn target(description: &str) -> TargetRow {
    TargetRow {
        id: Uuid::new_v4(),
        code: Some(format!("JOB-{}", description.len())),
        description: Some(description.to_string()),
        structured_description: None,
    }
}

type ScoreFn = dyn Fn(&str, &str) -> Result<RawScore, LlmError> + Send + Sync;

/// Scorer driven by a closure over `(target_text, subject_text)`; counts calls.
pub struct StubScorer {
    respond: Box<ScoreFn>,
    calls: AtomicUsize,
}

impl StubScorer {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str, &str) -> Result<RawScore, LlmError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails the first `failures` calls with a 503, then answers with `ok()`.
    pub fn failing_first<F>(failures: usize, ok: F) -> Self
    where
        F: Fn() -> RawScore + Send + Sync + 'static,
    {
        let seen = AtomicUsize::new(0);
        Self::new(move |_, _| {
            if seen.fetch_add(1, Ordering::SeqCst) < failures {
                Err(LlmError::Api {
                    status: 503,
                    message: "overloaded".to_string(),
                })
            } else {
                Ok(ok())
            }
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SemanticScorer for StubScorer {
    async fn score(&self, target_text: &str, subject_text: &str) -> Result<RawScore, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(target_text, subject_text)
    }
}

#[derive(Default)]
pub struct InMemoryComparisonStore {
    records: Mutex<Vec<ComparisonRecord>>,
    fail_lookups: AtomicBool,
}

impl InMemoryComparisonStore {
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn records(&self) -> Vec<ComparisonRecord> {
        self.records.lock().unwrap().clone()
    }
}

fn same_key(record: &ComparisonRecord, key: &ComparisonKey) -> bool {
    record.subject_id == key.subject_id
        && record.target_id == key.target_id
        && record.subject_fingerprint == key.subject_fingerprint
        && record.target_fingerprint == key.target_fingerprint
}

#[async_trait]
impl ComparisonStore for InMemoryComparisonStore {
    async fn find(&self, key: &ComparisonKey) -> Result<Option<ComparisonRecord>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| same_key(r, key))
            .cloned())
    }

    async fn insert(&self, record: NewComparison) -> Result<ComparisonRecord> {
        let stored = ComparisonRecord {
            id: Uuid::new_v4(),
            subject_id: record.key.subject_id,
            target_id: record.key.target_id,
            subject_fingerprint: record.key.subject_fingerprint,
            target_fingerprint: record.key.target_fingerprint,
            score: record.score,
            can_apply: record.can_apply,
            reasons: record.reasons,
            matches_threshold: record.matches_threshold,
            compared_at: Utc::now(),
        };
        self.records.lock().unwrap().push(stored.clone());
        Ok(stored)
    }
}

pub struct InMemorySubjectRegistry {
    subjects: Vec<SubjectRow>,
    fail: bool,
}

impl InMemorySubjectRegistry {
    pub fn new(subjects: Vec<SubjectRow>) -> Self {
        Self {
            subjects,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            subjects: vec![],
            fail: true,
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(anyhow!("subject registry unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SubjectRegistry for InMemorySubjectRegistry {
    async fn get_subject(&self, id: Uuid) -> Result<Option<SubjectRow>> {
        self.check()?;
        Ok(self.subjects.iter().find(|s| s.id == id).cloned())
    }

    /// Returns every subject, blank ones included, so callers' filtering is exercised.
    async fn list_subjects_with_text(&self) -> Result<Vec<SubjectRow>> {
        self.check()?;
        Ok(self.subjects.clone())
    }
}

pub struct InMemoryTargetRegistry {
    targets: Vec<TargetRow>,
    fail: bool,
}

impl InMemoryTargetRegistry {
    pub fn new(targets: Vec<TargetRow>) -> Self {
        Self {
            targets,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            targets: vec![],
            fail: true,
        }
    }
}

#[async_trait]
impl TargetRegistry for InMemoryTargetRegistry {
    async fn list_targets_with_description(&self) -> Result<Vec<TargetRow>> {
        if self.fail {
            return Err(anyhow!("target registry unavailable"));
        }
        Ok(self.targets.clone())
    }
}
