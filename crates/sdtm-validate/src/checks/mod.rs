//! Validation check modules.
//!
//! Each module runs one family of checks and returns one outcome per named
//! check. Checks never read each other's results, so the order here only
//! affects the order of issues in the report.

mod completeness;
mod datatype;
pub mod dates;
mod identifier;
mod required;
mod vocabulary;

use polars::prelude::{AnyValue, DataFrame};
use sdtm_common::any_to_string;
use sdtm_model::{CheckDetail, Specification, ValidationReport};
use sdtm_standards::VocabularyTable;

use crate::ValidationOptions;
use crate::util::CaseInsensitiveSet;

/// Inputs shared by every check.
pub(crate) struct CheckContext<'a> {
    pub df: &'a DataFrame,
    pub spec: &'a Specification,
    pub vocabulary: &'a VocabularyTable,
    pub options: &'a ValidationOptions,
    pub columns: CaseInsensitiveSet,
}

impl CheckContext<'_> {
    /// Canonical text of every cell in `column`; `None` when absent.
    pub fn values(&self, column: &str) -> Option<Vec<String>> {
        let name = self.columns.get(column)?;
        let series = self.df.column(name).ok()?;
        Some(
            (0..series.len())
                .map(|idx| any_to_string(series.get(idx).unwrap_or(AnyValue::Null)))
                .collect(),
        )
    }
}

/// Result of one named check.
pub(crate) struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub advisory: bool,
    pub issues: Vec<String>,
}

impl CheckOutcome {
    pub fn new(name: impl Into<String>, issues: Vec<String>) -> Self {
        Self {
            name: name.into(),
            passed: issues.is_empty(),
            advisory: false,
            issues,
        }
    }

    pub fn advisory(mut self, advisory: bool) -> Self {
        self.advisory = advisory;
        self
    }
}

/// Runs every check and folds the outcomes into a report.
pub(crate) fn run_all(ctx: &CheckContext<'_>) -> ValidationReport {
    let mut report = ValidationReport::new();

    let outcomes = [
        required::check(ctx),
        vocabulary::check(ctx),
        dates::check(ctx),
        identifier::check(ctx),
        datatype::check(ctx),
        completeness::check(ctx),
    ];

    for outcome in outcomes.into_iter().flatten() {
        for issue in &outcome.issues {
            report.add_issue(issue.clone());
        }
        report.record(CheckDetail {
            name: outcome.name,
            passed: outcome.passed,
            advisory: outcome.advisory,
            detail: outcome.issues.join("; "),
        });
    }

    report
}

pub(crate) fn build_column_lookup(df: &DataFrame) -> CaseInsensitiveSet {
    CaseInsensitiveSet::from_names(df.get_column_names_owned())
}
