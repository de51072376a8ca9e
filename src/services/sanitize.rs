//! Normalizes values that would break JSON serialization or that stand for "missing".

/// Text placeholders that mean "no value" in exported catalog data
const NULL_TOKENS: &[&str] = &["", "nan", "none", "null", "<na>", "nat"];

/// Finite numbers pass through; NaN and infinities become `None`.
pub fn sanitize_f64(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub fn sanitize_opt_f64(value: Option<f64>) -> Option<f64> {
    value.and_then(sanitize_f64)
}

/// Trimmed text, or `None` when the cell is blank or a null token.
pub fn sanitize_text(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if NULL_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
