use serde_json::Value;

use super::super::domain::{Category, Score, BASE_SCORE_THRESHOLD};

/// Outcome of coercing one untrusted field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Coerced {
    Value(f64),
    NotNumeric,
}

/// Numbers pass through; numeric strings are parsed after trimming.
/// Booleans, null, arrays, objects and blank strings are not numeric.
pub(crate) fn coerce_number(value: &Value) -> Coerced {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };

    match number {
        Some(number) if number.is_finite() => Coerced::Value(number),
        _ => Coerced::NotNumeric,
    }
}

/// Rounds to the nearest integer, then clamps into the category range.
pub(crate) fn clamp_to_category(category: Category, value: f64) -> u8 {
    let range = category.range();
    let low = f64::from(*range.start());
    let high = f64::from(*range.end());
    value.round().clamp(low, high) as u8
}

/// The only place the disqualification rule lives.
pub(crate) fn apply_disqualification(score: &mut Score) -> bool {
    if score.base_score() < BASE_SCORE_THRESHOLD {
        score.standardize = 0;
        score.sustain = 0;
        true
    } else {
        false
    }
}
