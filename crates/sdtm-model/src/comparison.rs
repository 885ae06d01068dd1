//! Comparison results between two independently produced datasets.

use serde::{Deserialize, Serialize};

/// How columns present on only one side are treated.
///
/// There is deliberately no default: every configuration states which
/// policy it runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPolicy {
    /// Compare the common columns only; one-sided columns are ignored.
    Intersection,
    /// One-sided columns make the comparison a mismatch.
    Strict,
}

/// A column whose values disagree, with the number of differing rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDiscrepancy {
    pub column: String,
    pub differing_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub is_match: bool,
    pub discrepancies: Vec<ColumnDiscrepancy>,
    /// Columns compared, in the left dataset's order.
    pub compared_columns: Vec<String>,
    pub only_in_left: Vec<String>,
    pub only_in_right: Vec<String>,
    pub left_rows: usize,
    pub right_rows: usize,
    pub schema_policy: SchemaPolicy,
}

impl ComparisonResult {
    /// Names of the columns flagged as differing.
    pub fn flagged_columns(&self) -> Vec<&str> {
        self.discrepancies
            .iter()
            .map(|discrepancy| discrepancy.column.as_str())
            .collect()
    }

    pub fn has_schema_drift(&self) -> bool {
        !self.only_in_left.is_empty() || !self.only_in_right.is_empty()
    }

    /// One line per finding; empty when the datasets match.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .discrepancies
            .iter()
            .map(|d| format!("{}: {} row(s) differ.", d.column, d.differing_rows))
            .collect();
        if self.left_rows != self.right_rows {
            lines.push(format!(
                "Row count differs: {} vs {}.",
                self.left_rows, self.right_rows
            ));
        }
        if self.schema_policy == SchemaPolicy::Strict {
            for column in &self.only_in_left {
                lines.push(format!("{column}: only in first dataset."));
            }
            for column in &self.only_in_right {
                lines.push(format!("{column}: only in second dataset."));
            }
        }
        lines
    }
}
