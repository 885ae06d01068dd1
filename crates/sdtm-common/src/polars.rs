//! Polars AnyValue utility functions.
//!
//! This module provides helper functions for turning Polars `AnyValue`s into
//! canonical text and classifying column storage types.

use polars::prelude::*;

/// Converts a Polars `AnyValue` to its canonical `String` representation.
///
/// Returns an empty string for `Null` and formats floating-point values
/// without trailing zeros, so `42`, `42.0` and `"42"` all normalize to `"42"`.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use sdtm_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
/// assert_eq!(any_to_string(AnyValue::Float64(42.0)), "42");
/// assert_eq!(any_to_string(AnyValue::String("hello")), "hello");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => if b { "Y" } else { "N" }.to_string(),
        other => other.to_string(),
    }
}

/// Formats a floating-point number as a string without trailing zeros.
///
/// # Examples
///
/// ```
/// use sdtm_common::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(10.0), "10");
/// assert_eq!(format_numeric(0.0), "0");
/// assert_eq!(format_numeric(-0.0), "0");
/// ```
pub fn format_numeric(v: f64) -> String {
    // Negative zero prints as "-0"; it must agree with integer 0.
    if v == 0.0 {
        return "0".to_string();
    }
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Returns true for nulls and for strings that are empty after trimming.
pub fn is_missing_value(value: &AnyValue<'_>) -> bool {
    match value {
        AnyValue::Null => true,
        AnyValue::String(s) => s.trim().is_empty(),
        AnyValue::StringOwned(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Returns true when the column storage type is an integer or float type.
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

/// Reads a whole column as canonical text, or `None` if the column is absent.
pub fn column_text(df: &DataFrame, name: &str) -> Option<Vec<String>> {
    let column = df.column(name).ok()?;
    let values = (0..column.len())
        .map(|idx| any_to_string(column.get(idx).unwrap_or(AnyValue::Null)))
        .collect();
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_string_null() {
        assert_eq!(any_to_string(AnyValue::Null), "");
    }

    #[test]
    fn test_any_to_string_integers() {
        assert_eq!(any_to_string(AnyValue::Int64(-7)), "-7");
        assert_eq!(any_to_string(AnyValue::UInt8(3)), "3");
    }

    #[test]
    fn test_any_to_string_floats() {
        assert_eq!(any_to_string(AnyValue::Float64(1.5)), "1.5");
        assert_eq!(any_to_string(AnyValue::Float64(1.0)), "1");
        assert_eq!(any_to_string(AnyValue::Float64(100.0)), "100");
        assert_eq!(any_to_string(AnyValue::Float32(2.25)), "2.25");
    }

    #[test]
    fn test_any_to_string_boolean() {
        assert_eq!(any_to_string(AnyValue::Boolean(true)), "Y");
        assert_eq!(any_to_string(AnyValue::Boolean(false)), "N");
    }

    #[test]
    fn test_format_numeric_keeps_integral_zeros() {
        assert_eq!(format_numeric(10.0), "10");
        assert_eq!(format_numeric(2500.0), "2500");
        assert_eq!(format_numeric(0.10), "0.1");
    }

    #[test]
    fn test_negative_zero_matches_integer_zero() {
        assert_eq!(format_numeric(-0.0), "0");
        assert_eq!(
            any_to_string(AnyValue::Float64(-0.0)),
            any_to_string(AnyValue::Int64(0))
        );
    }

    #[test]
    fn test_is_missing_value() {
        assert!(is_missing_value(&AnyValue::Null));
        assert!(is_missing_value(&AnyValue::String("   ")));
        assert!(!is_missing_value(&AnyValue::String("A")));
        assert!(!is_missing_value(&AnyValue::Int32(0)));
    }

    #[test]
    fn test_column_text() {
        let df = DataFrame::new(vec![
            Series::new("AGE".into(), vec![Some(30.0), None, Some(41.5)]).into(),
        ])
        .unwrap();
        assert_eq!(
            column_text(&df, "AGE"),
            Some(vec!["30".to_string(), String::new(), "41.5".to_string()])
        );
        assert_eq!(column_text(&df, "SEX"), None);
    }

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float32));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }
}
