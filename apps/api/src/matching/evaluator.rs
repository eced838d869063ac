//! MatchEvaluator: wraps the external scorer, normalizes its reply and
//! applies the pass/fail threshold.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::llm_client::LlmError;
use crate::matching::scorer::{RawScore, SemanticScorer};

pub const DEFAULT_THRESHOLD: u32 = 70;
const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("scorer failed: {0}")]
    Scorer(#[from] LlmError),

    #[error("scorer did not answer within {}s", .0.as_secs())]
    Timeout(Duration),
}

/// A normalized scorer verdict for one subject/target pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub score: f64,
    pub can_apply: bool,
    pub reasons: Vec<String>,
    pub matches_threshold: bool,
}

pub struct MatchEvaluator {
    scorer: Arc<dyn SemanticScorer>,
    threshold: u32,
    timeout: Duration,
}

impl MatchEvaluator {
    pub fn new(scorer: Arc<dyn SemanticScorer>, threshold: u32, timeout: Duration) -> Self {
        Self {
            scorer,
            threshold,
            timeout,
        }
    }

    /// Scores `subject_text` against `target_text`.
    ///
    /// Errors from the scorer (transport, unparseable reply) and timeouts are
    /// returned as-is. A failed call is never reported as a zero score.
    pub async fn evaluate(
        &self,
        subject_text: &str,
        target_text: &str,
    ) -> Result<Evaluation, EvaluationError> {
        let raw = tokio::time::timeout(self.timeout, self.scorer.score(target_text, subject_text))
            .await
            .map_err(|_| EvaluationError::Timeout(self.timeout))??;

        Ok(normalize(raw, self.threshold))
    }
}

fn normalize(raw: RawScore, threshold: u32) -> Evaluation {
    let score = raw
        .score
        .filter(|s| (0.0..=MAX_SCORE).contains(s))
        .unwrap_or(0.0);

    Evaluation {
        score,
        can_apply: raw.can_apply.unwrap_or(false),
        reasons: raw.reasons.unwrap_or_default(),
        matches_threshold: score >= f64::from(threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubScorer;
    use async_trait::async_trait;
    use serde_json::json;

    fn raw(score: Option<f64>) -> RawScore {
        RawScore {
            score,
            can_apply: Some(true),
            reasons: Some(vec!["reason".to_string()]),
        }
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        assert!(normalize(raw(Some(70.0)), DEFAULT_THRESHOLD).matches_threshold);
        assert!(!normalize(raw(Some(69.0)), DEFAULT_THRESHOLD).matches_threshold);
        assert!(!normalize(raw(Some(69.99)), DEFAULT_THRESHOLD).matches_threshold);
    }

    #[test]
    fn test_missing_fields_are_normalized() {
        let evaluation = normalize(RawScore::default(), DEFAULT_THRESHOLD);
        assert_eq!(evaluation.score, 0.0);
        assert!(!evaluation.can_apply);
        assert!(evaluation.reasons.is_empty());
        assert!(!evaluation.matches_threshold);
    }

    #[test]
    fn test_out_of_range_score_becomes_zero() {
        assert_eq!(normalize(raw(Some(150.0)), DEFAULT_THRESHOLD).score, 0.0);
        assert_eq!(normalize(raw(Some(-3.0)), DEFAULT_THRESHOLD).score, 0.0);
        assert_eq!(normalize(raw(Some(100.0)), DEFAULT_THRESHOLD).score, 100.0);
    }

    #[test]
    fn test_custom_threshold() {
        assert!(normalize(raw(Some(55.0)), 50).matches_threshold);
        assert!(!normalize(raw(Some(55.0)), 60).matches_threshold);
    }

    #[tokio::test]
    async fn test_evaluate_passes_texts_in_scorer_order() {
        let scorer = Arc::new(StubScorer::new(|target, subject| {
            assert_eq!(target, "Looking for Java developer");
            assert_eq!(subject, "Java developer, 5 years");
            Ok(RawScore {
                score: Some(85.0),
                can_apply: Some(true),
                reasons: Some(vec!["skills match".to_string()]),
            })
        }));
        let evaluator = MatchEvaluator::new(scorer.clone(), 70, Duration::from_secs(5));

        let evaluation = evaluator
            .evaluate("Java developer, 5 years", "Looking for Java developer")
            .await
            .unwrap();

        assert_eq!(evaluation.score, 85.0);
        assert!(evaluation.can_apply);
        assert!(evaluation.matches_threshold);
        assert_eq!(scorer.calls(), 1);
    }

    #[tokio::test]
    async fn test_scorer_error_propagates() {
        let scorer = Arc::new(StubScorer::new(|_, _| {
            Err(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            })
        }));
        let evaluator = MatchEvaluator::new(scorer, 70, Duration::from_secs(5));

        let err = evaluator.evaluate("cv", "jd").await.unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Scorer(LlmError::Api { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_an_error_not_zero() {
        let scorer = Arc::new(StubScorer::new(|_, _| {
            let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
            Err(LlmError::Parse(parse_err))
        }));
        let evaluator = MatchEvaluator::new(scorer, 70, Duration::from_secs(5));

        let err = evaluator.evaluate("cv", "jd").await.unwrap_err();
        assert!(matches!(err, EvaluationError::Scorer(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_string_typed_reply_is_scored_not_failed() {
        let scorer = Arc::new(StubScorer::new(|_, _| {
            RawScore::from_reply(json!({
                "score": "85",
                "canApply": "true",
                "reasons": "skills match"
            }))
        }));
        let evaluator = MatchEvaluator::new(scorer, 70, Duration::from_secs(5));

        let evaluation = evaluator.evaluate("cv", "jd").await.unwrap();
        assert_eq!(evaluation.score, 85.0);
        assert!(evaluation.can_apply);
        assert!(evaluation.reasons.is_empty());
        assert!(evaluation.matches_threshold);
    }

    #[tokio::test]
    async fn test_non_numeric_string_score_normalizes_to_zero() {
        let scorer = Arc::new(StubScorer::new(|_, _| {
            RawScore::from_reply(json!({"score": "excellent", "canApply": true}))
        }));
        let evaluator = MatchEvaluator::new(scorer, 70, Duration::from_secs(5));

        let evaluation = evaluator.evaluate("cv", "jd").await.unwrap();
        assert_eq!(evaluation.score, 0.0);
        assert!(!evaluation.matches_threshold);
    }

    struct HangingScorer;

    #[async_trait]
    impl SemanticScorer for HangingScorer {
        async fn score(&self, _: &str, _: &str) -> Result<RawScore, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(RawScore::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_scorer_times_out() {
        let evaluator = MatchEvaluator::new(Arc::new(HangingScorer), 70, Duration::from_secs(30));

        let err = evaluator.evaluate("cv", "jd").await.unwrap_err();
        match err {
            EvaluationError::Timeout(limit) => assert_eq!(limit, Duration::from_secs(30)),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
