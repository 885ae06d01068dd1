use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use polars::prelude::DataFrame;
use sdtm_common::column_text;
use sdtm_ingest::read_dataset;
use sdtm_model::{ColumnDiscrepancy, ComparisonResult, SchemaPolicy};
use tracing::debug;

use crate::error::{CompareError, Result, Side};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareOptions {
    /// Column used to align rows; ignored unless both datasets have it.
    pub key_column: Option<String>,
    pub schema_policy: SchemaPolicy,
}

impl CompareOptions {
    pub fn new(schema_policy: SchemaPolicy) -> Self {
        Self {
            key_column: None,
            schema_policy,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key_column = Some(key.into());
        self
    }
}

/// Reads both datasets and compares them.
///
/// Read failures are returned as errors and never retried.
pub fn compare_datasets(
    production: &Path,
    qc: &Path,
    options: &CompareOptions,
) -> Result<ComparisonResult> {
    let left = read_dataset(production).map_err(|source| CompareError::Read {
        side: Side::Production,
        source,
    })?;
    let right = read_dataset(qc).map_err(|source| CompareError::Read {
        side: Side::Qc,
        source,
    })?;
    Ok(compare_frames(&left, &right, options))
}

/// Compares two frames column by column.
///
/// Only columns present on both sides are compared, in `left`'s order.
/// Rows beyond the shorter frame count as differing in every compared column.
pub fn compare_frames(
    left: &DataFrame,
    right: &DataFrame,
    options: &CompareOptions,
) -> ComparisonResult {
    let start = Instant::now();

    let left_names = column_names(left);
    let right_names = column_names(right);
    let left_set: BTreeSet<&str> = left_names.iter().map(String::as_str).collect();
    let right_set: BTreeSet<&str> = right_names.iter().map(String::as_str).collect();

    let compared_columns: Vec<String> = left_names
        .iter()
        .filter(|name| right_set.contains(name.as_str()))
        .cloned()
        .collect();
    let only_in_left: Vec<String> = left_names
        .iter()
        .filter(|name| !right_set.contains(name.as_str()))
        .cloned()
        .collect();
    let only_in_right: Vec<String> = right_names
        .iter()
        .filter(|name| !left_set.contains(name.as_str()))
        .cloned()
        .collect();

    let key_index = options
        .key_column
        .as_deref()
        .and_then(|key| compared_columns.iter().position(|name| name == key));

    let left_table = aligned_text(left, &compared_columns, key_index);
    let right_table = aligned_text(right, &compared_columns, key_index);

    let discrepancies: Vec<ColumnDiscrepancy> = compared_columns
        .iter()
        .enumerate()
        .filter_map(|(col, name)| {
            let differing_rows = count_differences(&left_table, &right_table, col);
            (differing_rows > 0).then(|| ColumnDiscrepancy {
                column: name.clone(),
                differing_rows,
            })
        })
        .collect();

    let schema_ok = match options.schema_policy {
        SchemaPolicy::Intersection => true,
        SchemaPolicy::Strict => only_in_left.is_empty() && only_in_right.is_empty(),
    };
    let is_match = discrepancies.is_empty() && schema_ok;

    debug!(
        is_match,
        compared = compared_columns.len(),
        differing = discrepancies.len(),
        aligned_by_key = key_index.is_some(),
        duration_ms = start.elapsed().as_millis(),
        "compared datasets"
    );

    ComparisonResult {
        is_match,
        discrepancies,
        compared_columns,
        only_in_left,
        only_in_right,
        left_rows: left.height(),
        right_rows: right.height(),
        schema_policy: options.schema_policy,
    }
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Normalized rows restricted to `columns`, ordered by the key column when
/// given. Ties on the key break on the remaining cells so equal multisets of
/// rows always line up.
fn aligned_text(df: &DataFrame, columns: &[String], key_index: Option<usize>) -> Vec<Vec<String>> {
    let column_values: Vec<Vec<String>> = columns
        .iter()
        .map(|name| column_text(df, name).unwrap_or_default())
        .collect();

    let mut rows: Vec<Vec<String>> = (0..df.height())
        .map(|row| {
            column_values
                .iter()
                .map(|values| values.get(row).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    if let Some(key) = key_index {
        rows.sort_by(|a, b| a[key].cmp(&b[key]).then_with(|| a.cmp(b)));
    }
    rows
}

fn count_differences(left: &[Vec<String>], right: &[Vec<String>], column: usize) -> usize {
    let rows = left.len().max(right.len());
    (0..rows)
        .filter(|&row| {
            let l = left.get(row).map(|cells| cells[column].as_str());
            let r = right.get(row).map(|cells| cells[column].as_str());
            l != r
        })
        .count()
}
