//! Turns untrusted classifier output into a bounded, internally consistent [`Score`].
//!
//! Out-of-range numbers are clamped silently. Missing or non-numeric fields are
//! structural failures and never become a default score.

mod rules;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::domain::{Category, Score, MAX_TOTAL_SCORE};
use rules::{apply_disqualification, clamp_to_category, coerce_number, Coerced};

/// Key carrying the classifier's free-text commentary.
pub const FEEDBACK_KEY: &str = "feedback";

/// Untyped object returned by the classifier. Nothing inside is trusted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawModelOutput(pub Map<String, Value>);

impl RawModelOutput {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl TryFrom<Value> for RawModelOutput {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ValidationError::NotAnObject {
                kind: json_kind(&other),
            }),
        }
    }
}

/// Validated classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedAssessment {
    pub score: Score,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields in evaluation: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },
    #[error("invalid score for {field}: expected a number, got {found}")]
    NotNumeric { field: &'static str, found: String },
    #[error("invalid feedback: expected a string, got {kind}")]
    FeedbackNotText { kind: &'static str },
    #[error("expected a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

/// Validates presence and type of all six fields, clamps the five scores and
/// enforces the disqualification rule.
pub fn validate_and_normalize(raw: &RawModelOutput) -> Result<NormalizedAssessment, ValidationError> {
    let missing: Vec<&'static str> = Category::ordered()
        .iter()
        .map(|category| category.raw_key())
        .chain(std::iter::once(FEEDBACK_KEY))
        .filter(|key| raw.get(key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields { fields: missing });
    }

    let mut score = Score::default();
    for category in Category::ordered() {
        let field = category.raw_key();
        let value = raw.get(field).unwrap_or(&Value::Null);
        match coerce_number(value) {
            Coerced::Value(number) => score.set(category, clamp_to_category(category, number)),
            Coerced::NotNumeric => {
                return Err(ValidationError::NotNumeric {
                    field,
                    found: truncate_for_error(value),
                })
            }
        }
    }

    let feedback = match raw.get(FEEDBACK_KEY) {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => {
            return Err(ValidationError::FeedbackNotText {
                kind: json_kind(other),
            })
        }
        None => {
            return Err(ValidationError::MissingFields {
                fields: vec![FEEDBACK_KEY],
            })
        }
    };

    if apply_disqualification(&mut score) {
        debug!(
            base_score = score.base_score(),
            "foundation below threshold, standardize and sustain forced to zero"
        );
    }

    Ok(NormalizedAssessment { score, feedback })
}

/// Re-applies the disqualification rule to a score that may predate it.
/// Ranges are left untouched.
pub fn adjusted_scores(score: &Score) -> Score {
    let mut adjusted = *score;
    apply_disqualification(&mut adjusted);
    adjusted
}

/// Sum of all categories after adjustment.
pub fn total_score(score: &Score) -> u32 {
    adjusted_scores(score).raw_sum()
}

/// `round(total / 50 * 100)`, clamped to `[0, 100]`.
pub fn percentage_score(total: u32) -> u8 {
    let ratio = f64::from(total) / f64::from(MAX_TOTAL_SCORE);
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate_for_error(value: &Value) -> String {
    let rendered = value.to_string();
    match rendered.char_indices().nth(40) {
        Some((cut, _)) => format!("{}...", &rendered[..cut]),
        None => rendered,
    }
}
