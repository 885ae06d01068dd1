//! Dataset validation and specification review.
//!
//! [`validate_dataset`] runs six independent check families against a
//! produced dataset and accumulates every finding. [`review_spec`] checks a
//! draft specification before any program is generated.

mod checks;
pub mod review;
pub mod util;

use std::path::Path;
use std::time::Instant;

use polars::prelude::DataFrame;
use sdtm_ingest::{IngestError, read_dataset};
use sdtm_model::{Specification, ValidationReport};
use sdtm_standards::VocabularyTable;

pub use checks::dates::is_canonical_date;
pub use review::{DerivationDependency, ReviewRules, review_spec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Column checked for uniqueness and study prefix.
    pub subject_id_field: String,
    /// Make storage-type mismatches fail the report.
    pub strict_types: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            subject_id_field: "USUBJID".to_string(),
            strict_types: false,
        }
    }
}

pub fn validate_dataset(
    df: &DataFrame,
    spec: &Specification,
    vocabulary: &VocabularyTable,
    options: &ValidationOptions,
) -> ValidationReport {
    let start = Instant::now();
    let ctx = checks::CheckContext {
        df,
        spec,
        vocabulary,
        options,
        columns: checks::build_column_lookup(df),
    };
    let report = checks::run_all(&ctx);
    tracing::debug!(
        domain = %spec.domain,
        pass = report.pass,
        checks = report.checks.len(),
        issues = report.issues.len(),
        vocabulary = vocabulary.version(),
        duration_ms = start.elapsed().as_millis(),
        "validated dataset"
    );
    report
}

/// Loads and validates a dataset file.
///
/// A missing or unreadable file yields a failed report with a single issue
/// rather than an error.
pub fn validate_dataset_file(
    path: &Path,
    spec: &Specification,
    vocabulary: &VocabularyTable,
    options: &ValidationOptions,
) -> ValidationReport {
    match read_dataset(path) {
        Ok(df) => validate_dataset(&df, spec, vocabulary, options),
        Err(IngestError::FileNotFound { path }) => {
            ValidationReport::unreadable(format!("Dataset not found: {}", path.display()))
        }
        Err(err) => ValidationReport::unreadable(format!("Could not read dataset: {err}")),
    }
}
