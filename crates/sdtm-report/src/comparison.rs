//! Flat-text comparison report.

use std::fmt::Display;
use std::fmt::Write as _;

use sdtm_model::{ComparisonResult, SchemaPolicy};

/// Run context printed above the findings.
#[derive(Debug, Clone)]
pub struct ComparisonHeader {
    pub domain: String,
    pub iteration: u32,
    pub key_column: Option<String>,
}

pub fn render_comparison_report(header: &ComparisonHeader, result: &ComparisonResult) -> String {
    let mut out = String::new();
    if result.is_match {
        out.push_str("Comparison: MATCH. No differences between production and QC datasets.\n");
    } else {
        out.push_str("Comparison: MISMATCH. Differences found.\n");
    }

    let _ = writeln!(out, "Domain: {}", header.domain);
    let _ = writeln!(out, "Iteration: {}", header.iteration);
    let key = header.key_column.as_deref().unwrap_or("none");
    let policy = match result.schema_policy {
        SchemaPolicy::Intersection => "intersection",
        SchemaPolicy::Strict => "strict",
    };
    let _ = writeln!(
        out,
        "Compared columns: {} (key: {key}, schema policy: {policy})",
        result.compared_columns.len()
    );
    let _ = writeln!(
        out,
        "Rows: {} production, {} qc",
        result.left_rows, result.right_rows
    );
    if result.schema_policy == SchemaPolicy::Intersection && result.has_schema_drift() {
        if !result.only_in_left.is_empty() {
            let _ = writeln!(
                out,
                "Ignored (production only): {}",
                result.only_in_left.join(", ")
            );
        }
        if !result.only_in_right.is_empty() {
            let _ = writeln!(out, "Ignored (qc only): {}", result.only_in_right.join(", "));
        }
    }

    let lines = result.report_lines();
    if !lines.is_empty() {
        out.push('\n');
        for line in lines {
            let _ = writeln!(out, "  {line}");
        }
    }
    out
}

/// Report written when a dataset could not be read.
pub fn render_comparison_error(error: &impl Display) -> String {
    format!("Comparison error: {error}\n")
}
