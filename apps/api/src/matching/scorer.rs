//! Semantic scorer seam. The scorer is an external collaborator: given a
//! posting and a resume it returns a score with reasons. It is consumed only
//! through `SemanticScorer`, so tests and alternative backends plug in
//! without touching the cache or runner.

use async_trait::async_trait;
use serde::de::Error as _;
use serde_json::Value;

use crate::llm_client::{LlmClient, LlmError};
use crate::matching::prompts::{MATCH_PROMPT_TEMPLATE, MATCH_SYSTEM};

/// The scorer's reply, before normalization.
///
/// A field that is missing or has an unusable value is `None` and gets its
/// default from the evaluator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawScore {
    pub score: Option<f64>,
    pub can_apply: Option<bool>,
    pub reasons: Option<Vec<String>>,
}

impl RawScore {
    /// Reads `{score, canApply, reasons}` from a model reply.
    ///
    /// Numeric strings count as numbers and `"true"`/`"false"` as booleans.
    /// Non-string items in `reasons` are dropped. Only a reply that is not a
    /// JSON object is an error.
    pub fn from_reply(reply: Value) -> Result<Self, LlmError> {
        let Value::Object(fields) = reply else {
            return Err(LlmError::Parse(serde_json::Error::custom(
                "scorer reply is not a JSON object",
            )));
        };

        Ok(Self {
            score: fields.get("score").and_then(lenient_number),
            can_apply: fields.get("canApply").and_then(lenient_bool),
            reasons: fields.get("reasons").and_then(|v| v.as_array()).map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(String::from))
                    .collect()
            }),
        })
    }
}

fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

#[async_trait]
pub trait SemanticScorer: Send + Sync {
    async fn score(&self, target_text: &str, subject_text: &str) -> Result<RawScore, LlmError>;
}

/// Scores a pair by prompting the model through the shared `LlmClient`.
pub struct LlmScorer(pub LlmClient);

#[async_trait]
impl SemanticScorer for LlmScorer {
    async fn score(&self, target_text: &str, subject_text: &str) -> Result<RawScore, LlmError> {
        let prompt = build_match_prompt(target_text, subject_text);
        let reply: Value = self.0.complete_json(&prompt, MATCH_SYSTEM).await?;
        RawScore::from_reply(reply)
    }
}

/// Fills both placeholders in one pass. Inserted texts are never rescanned,
/// so a placeholder appearing inside a posting or resume stays literal.
fn build_match_prompt(target_text: &str, subject_text: &str) -> String {
    MATCH_PROMPT_TEMPLATE
        .split("{subject_text}")
        .map(|part| part.replace("{target_text}", target_text))
        .collect::<Vec<_>>()
        .join(subject_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_reply_is_read() {
        let raw = RawScore::from_reply(json!({
            "canApply": true,
            "score": 85,
            "reasons": ["skills match"]
        }))
        .unwrap();
        assert_eq!(raw.score, Some(85.0));
        assert_eq!(raw.can_apply, Some(true));
        assert_eq!(raw.reasons, Some(vec!["skills match".to_string()]));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let raw = RawScore::from_reply(json!({})).unwrap();
        assert_eq!(raw, RawScore::default());
    }

    #[test]
    fn test_string_typed_fields_are_coerced() {
        let raw = RawScore::from_reply(json!({
            "score": " 85 ",
            "canApply": "TRUE",
            "reasons": ["skills match", 3, null, "remote ok"]
        }))
        .unwrap();
        assert_eq!(raw.score, Some(85.0));
        assert_eq!(raw.can_apply, Some(true));
        assert_eq!(
            raw.reasons,
            Some(vec!["skills match".to_string(), "remote ok".to_string()])
        );
    }

    #[test]
    fn test_unusable_fields_become_none() {
        let raw = RawScore::from_reply(json!({
            "score": "high",
            "canApply": "yes",
            "reasons": "skills match"
        }))
        .unwrap();
        assert_eq!(raw, RawScore::default());
    }

    #[test]
    fn test_non_object_reply_is_rejected() {
        let err = RawScore::from_reply(json!([85, true, ["skills match"]])).unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
        assert!(RawScore::from_reply(json!("85")).is_err());
    }

    #[test]
    fn test_prompt_embeds_both_texts() {
        let prompt = build_match_prompt("Looking for Java developer", "Java developer, 5 years");
        assert!(prompt.contains("\"\"\"Looking for Java developer\"\"\""));
        assert!(prompt.contains("\"\"\"Java developer, 5 years\"\"\""));
        assert!(!prompt.contains("{target_text}"));
        assert!(!prompt.contains("{subject_text}"));
    }

    #[test]
    fn test_placeholders_inside_texts_stay_literal() {
        let prompt = build_match_prompt(
            "Posting mentions {subject_text}",
            "Resume mentions {target_text}",
        );
        assert!(prompt.contains("\"\"\"Posting mentions {subject_text}\"\"\""));
        assert!(prompt.contains("\"\"\"Resume mentions {target_text}\"\"\""));
        assert_eq!(prompt.matches("Resume mentions").count(), 1);
        assert_eq!(prompt.matches("Posting mentions").count(), 1);
    }
}
