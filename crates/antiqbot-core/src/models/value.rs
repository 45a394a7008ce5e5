//! Lenient readers for backend fields whose JSON type is not guaranteed.
//!
//! Models keep such fields as raw `Value`s so they survive a round-trip
//! untouched; these helpers give the typed view used for display and checks.

use serde_json::Value;

/// Text form of a scalar: strings as-is, numbers and booleans formatted.
/// `null` and blank strings read as absent.
pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Whole-number form of a count such as a credit balance. Floats are
/// truncated, numeric strings parsed. Anything else reads as absent.
pub fn count(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}
