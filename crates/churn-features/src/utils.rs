//! Shared utilities for the feature pipeline.
//!
//! This module contains helpers used across stages: dtype checks for polars
//! ingestion, numeric string parsing, and the batch statistics (median, mode)
//! the imputers and coercion stages share.

use polars::prelude::DataType;
use std::collections::BTreeMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is boolean.
#[inline]
pub fn is_boolean_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Boolean)
}

// =============================================================================
// String Utilities
// =============================================================================

/// Parse trimmed text as a finite `f64`.
///
/// Formatted values such as `"$70"` or `"4,500.10"` do not parse; `"nan"` and
/// `"inf"` are rejected so they end up missing instead.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lower-case and keep ASCII alphanumerics only.
pub fn alphanumeric_key(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Lower-case, trim, and drop every whitespace character.
pub fn collapse_spaces(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Render a number the way it would be written in a CSV cell: integral
/// values have no fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// =============================================================================
// Batch Statistics
// =============================================================================

/// Median of the given values; the mean of the two middle values for even
/// counts. `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent value; ties go to the smallest value.
pub fn numeric_mode(values: &[f64]) -> Option<f64> {
    let mut counts: BTreeMap<u64, (f64, usize)> = BTreeMap::new();
    for &v in values {
        // -0.0 and 0.0 share a bucket
        let v = if v == 0.0 { 0.0 } else { v };
        counts.entry(v.to_bits()).or_insert((v, 0)).1 += 1;
    }
    counts
        .into_values()
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| b.total_cmp(a)))
        .map(|(v, _)| v)
}

/// Most frequent string; ties go to the lexicographically smallest.
pub fn string_mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| b.cmp(a)))
        .map(|(v, _)| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string(" 29.85 "), Some(29.85));
        assert_eq!(parse_numeric_string("-100"), Some(-100.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("   "), None);
        assert_eq!(parse_numeric_string("hello"), None);
        assert_eq!(parse_numeric_string("NaN"), None);
        assert_eq!(parse_numeric_string("inf"), None);
        assert_eq!(parse_numeric_string("$70"), None);
        assert_eq!(parse_numeric_string("4,500.10"), None);
    }

    #[test]
    fn test_alphanumeric_key() {
        assert_eq!(alphanumeric_key("Month-to-month"), "monthtomonth");
        assert_eq!(alphanumeric_key("Senior_Citizen"), "seniorcitizen");
        assert_eq!(alphanumeric_key("  Tenure (Years) "), "tenureyears");
        assert_eq!(alphanumeric_key("Ünïcode"), "ncode");
    }

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(collapse_spaces(" No internet service "), "nointernetservice");
        assert_eq!(collapse_spaces("N A"), "na");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.5), "0.5");
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[7.0]), Some(7.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_numeric_mode_ties_prefer_smallest() {
        assert_eq!(numeric_mode(&[2.0, 1.0, 2.0, 1.0]), Some(1.0));
        assert_eq!(numeric_mode(&[2.0, 2.0, 1.0]), Some(2.0));
        assert_eq!(numeric_mode(&[]), None);
    }

    #[test]
    fn test_string_mode_ties_prefer_smallest() {
        assert_eq!(string_mode(["b", "a", "b", "a"]), Some("a".to_string()));
        assert_eq!(string_mode(["dsl", "fiber", "fiber"]), Some("fiber".to_string()));
        assert_eq!(string_mode(std::iter::empty()), None);
    }
}
