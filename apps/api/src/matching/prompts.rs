// Prompt constants for resume/posting comparison.

pub const MATCH_SYSTEM: &str = "You are an experienced recruiter screening candidates. \
    You compare a job description with a candidate resume and judge whether the candidate \
    meets the requirements. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Comparison prompt. Replace `{target_text}` and `{subject_text}` before sending.
pub const MATCH_PROMPT_TEMPLATE: &str = r#"Given the job description and the resume below, decide whether the candidate meets the requirements.

Return a JSON object with this EXACT schema:
{
  "canApply": true,
  "score": 0,
  "reasons": ["short match or gap", "..."]
}

Rules:
- "score" is a number between 0 and 100
- "canApply" is true only if every hard requirement is met
- "reasons" is a short list of concrete matches or gaps, most important first

JOB DESCRIPTION:
"""{target_text}"""

RESUME:
"""{subject_text}""""#;
