//! Shared utilities for reading columns and computing simple statistics.
//!
//! This module contains helpers used by both the imputer and the analyses
//! to reduce code duplication and keep missing-value handling consistent.

use crate::error::{InsightsError, Result};
use polars::prelude::*;
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

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Common missing value markers found in numeric columns.
pub const ERROR_MARKERS: [&str; 9] = [
    "error", "unknown", "n/a", "na", "nan", "null", "missing", "none", "#n/a",
];

/// Tokens read as missing in any column, matched case-sensitively after
/// trimming. The `"Unknown"` placeholder is not a marker.
pub const MISSING_MARKERS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "Null",
];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// # Example
///
/// ```rust,ignore
/// use customer_insights::utils::clean_numeric_string;
///
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Check if a categorical value is a blank or a missing marker.
pub fn is_missing_marker(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed)
}

/// Try to parse a string as a finite numeric value (f64).
///
/// Handles currency symbols, percentages and thousands separators.
/// Missing markers and non-finite results yield `None`.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    if is_error_marker(s) {
        return None;
    }
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Column Extraction Utilities
// =============================================================================

/// Read a Series as optional strings.
///
/// Nulls, blank strings and [`MISSING_MARKERS`] become `None`; other values
/// are kept verbatim.
/// Non-string columns are cast to their string representation.
pub fn string_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    let values = casted
        .str()?
        .into_iter()
        .map(|v| {
            v.filter(|s| !is_missing_marker(s))
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

/// Read a Series as optional finite floats.
///
/// Numeric columns are cast directly; string columns are parsed with
/// [`parse_numeric_string`]. NaN and infinities become `None`.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let dtype = series.dtype();

    if is_numeric_dtype(dtype) {
        let casted = series.cast(&DataType::Float64)?;
        let values = casted
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        return Ok(values);
    }

    match dtype {
        DataType::String => {
            let mut values = Vec::with_capacity(series.len());
            for raw in series.str()?.into_iter() {
                values.push(raw.and_then(parse_numeric_string));
            }
            Ok(values)
        }
        DataType::Null => Ok(vec![None; series.len()]),
        other => Err(InsightsError::TypeConversionFailed {
            column: series.name().to_string(),
            target_type: "Float64".to_string(),
            reason: format!("unsupported source type {}", other),
        }),
    }
}

// =============================================================================
// Statistics Utilities
// =============================================================================

/// Most frequent value among the given observations.
///
/// Ties are broken by choosing the lexicographically smallest value
/// (byte order), so the result is stable across runs.
pub fn mode_of<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&'a str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    // BTreeMap iterates in ascending order, so strict `>` keeps the smallest tie.
    for (value, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}

/// Arithmetic mean, or `None` for an empty input.
pub fn mean_of<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Count missing entries in an optional column.
pub fn count_missing<T>(values: &[Option<T>]) -> usize {
    values.iter().filter(|v| v.is_none()).count()
}

// =============================================================================
// Tests
// =============================================================================

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
    fn test_clean_numeric_string() {
        assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
        assert_eq!(clean_numeric_string("  42%  "), "42");
        assert_eq!(clean_numeric_string("€100"), "100");
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("$50,000"), Some(50000.0));
        assert_eq!(parse_numeric_string("-4.61"), Some(-4.61));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("N/A"), None);
        assert_eq!(parse_numeric_string("NaN"), None);
        assert_eq!(parse_numeric_string("hello"), None);
    }

    #[test]
    fn test_mode_of_picks_most_frequent() {
        let values = ["b", "a", "b", "c"];
        assert_eq!(mode_of(values), Some("b".to_string()));
    }

    #[test]
    fn test_mode_of_tie_breaks_lexicographically() {
        let values = ["Masculino", "Femenino", "Masculino", "Femenino"];
        assert_eq!(mode_of(values), Some("Femenino".to_string()));

        // Order of appearance does not matter
        let reversed = ["Femenino", "Masculino", "Femenino", "Masculino"];
        assert_eq!(mode_of(reversed), Some("Femenino".to_string()));
    }

    #[test]
    fn test_mode_of_empty() {
        assert_eq!(mode_of(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_mean_of() {
        assert_eq!(mean_of([1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean_of(Vec::<f64>::new()), None);
    }

    #[test]
    fn test_string_values_blank_is_missing() {
        let series = Series::new("g".into(), &[Some("F"), Some("  "), None, Some(" M ")]);
        let values = string_values(&series).unwrap();
        assert_eq!(
            values,
            vec![Some("F".to_string()), None, None, Some(" M ".to_string())]
        );
    }

    #[test]
    fn test_string_values_markers_are_missing() {
        let series = Series::new(
            "g".into(),
            &[Some("NA"), Some("F"), Some(" null "), Some("N/A"), Some("Unknown"), Some("Nash")],
        );
        let values = string_values(&series).unwrap();
        assert_eq!(
            values,
            vec![
                None,
                Some("F".to_string()),
                None,
                None,
                Some("Unknown".to_string()),
                Some("Nash".to_string()),
            ]
        );
    }

    #[test]
    fn test_numeric_values_infinite_is_missing() {
        let series = Series::new("lat".into(), &[4.6, f64::INFINITY, f64::NEG_INFINITY]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(4.6), None, None]);
    }

    #[test]
    fn test_numeric_values_from_integers() {
        let series = Series::new("age".into(), &[Some(30_i64), None, Some(45)]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(30.0), None, Some(45.0)]);
    }

    #[test]
    fn test_numeric_values_nan_is_missing() {
        let series = Series::new("x".into(), &[1.0, f64::NAN, 3.0]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_numeric_values_from_formatted_strings() {
        let series = Series::new("income".into(), &[Some("$1,000"), Some("n/a"), None]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(1000.0), None, None]);
    }

    #[test]
    fn test_numeric_values_rejects_boolean() {
        let series = Series::new("flag".into(), &[true, false]);
        let err = numeric_values(&series).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
    }

    #[test]
    fn test_count_missing() {
        assert_eq!(count_missing(&[Some(1), None, None]), 2);
    }
}
