use serde_json::Value;

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 630;

/// Coerces a number into an image dimension.
///
/// Only finite, strictly positive values whose integer part fits a `u32` and
/// is at least one are accepted. Fractions are truncated.
#[must_use]
pub fn dimension_from_number(value: f64) -> Option<u32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let truncated = value.trunc();

    if truncated < 1.0 || truncated > f64::from(u32::MAX) {
        return None;
    }

    Some(truncated as u32)
}

#[must_use]
pub fn dimension_from_str(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(dimension_from_number)
}

/// Numbers and numeric strings are coerced alike; anything else is absent.
#[must_use]
pub fn dimension_from_json(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_f64().and_then(dimension_from_number),
        Value::String(string) => dimension_from_str(string),
        _ => None,
    }
}
