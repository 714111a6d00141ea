//! Shared range-validation helpers used by all section validators.

/// Push an error if `value` is outside `[min, max]` (integer).
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if `value` is outside `[min, max]` (float).
pub(crate) fn validate_range_f64(
    errors: &mut Vec<String>,
    name: &str,
    value: f64,
    min: f64,
    max: f64,
) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if `value` is empty or whitespace.
pub(crate) fn validate_non_blank(errors: &mut Vec<String>, name: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{name} must not be empty"));
    }
}

/// Push an error for every entry that doesn't look like `<prefix>/<subtype>`.
pub(crate) fn validate_mime_list(errors: &mut Vec<String>, name: &str, values: &[String], prefix: &str) {
    if values.is_empty() {
        errors.push(format!("{name} must list at least one type"));
    }
    for value in values {
        let valid = value
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|subtype| !subtype.is_empty());
        if !valid {
            errors.push(format!("{name} entry '{value}' is not a {prefix}/* type"));
        }
    }
}
