//! Validation report rendering.

use std::fmt::Write as _;

use sdtm_model::ValidationReport;
use serde::{Deserialize, Serialize};

/// JSON document written next to the text report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDocument {
    pub study_id: String,
    pub domain: String,
    pub vocabulary_version: String,
    #[serde(flatten)]
    pub report: ValidationReport,
}

pub fn render_validation_report(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Validation pass: {}", report.pass);
    out.push('\n');

    if report.issues.is_empty() {
        out.push_str("No issues found.\n");
    } else {
        out.push_str("Issues:\n");
        for issue in &report.issues {
            let _ = writeln!(out, "  - {issue}");
        }
    }

    out.push('\n');
    out.push_str("Checks:\n");
    for (name, passed) in &report.checks {
        let advisory = report
            .details
            .iter()
            .any(|detail| &detail.name == name && detail.advisory);
        let status = match (passed, advisory) {
            (true, _) => "PASS",
            (false, true) => "FAIL (advisory)",
            (false, false) => "FAIL",
        };
        let _ = writeln!(out, "  {name}: {status}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdtm_model::CheckDetail;

    fn detail(name: &str, passed: bool, advisory: bool) -> CheckDetail {
        CheckDetail {
            name: name.to_string(),
            passed,
            advisory,
            detail: String::new(),
        }
    }

    #[test]
    fn failing_report_text() {
        let mut report = ValidationReport::new();
        report.record(detail("required_variables", true, false));
        report.record(detail("usubjid_unique", false, false));
        report.record(detail("type_age", false, true));
        report.add_issue("USUBJID has 1 duplicate(s)");
        report.add_issue("AGE: spec says Num but actual type is str");

        insta::assert_snapshot!(render_validation_report(&report), @r"
        Validation pass: false

        Issues:
          - USUBJID has 1 duplicate(s)
          - AGE: spec says Num but actual type is str

        Checks:
          required_variables: PASS
          type_age: FAIL (advisory)
          usubjid_unique: FAIL
        ");
    }

    #[test]
    fn document_flattens_report() {
        let document = ValidationDocument {
            study_id: "XYZ".to_string(),
            domain: "DM".to_string(),
            vocabulary_version: "builtin-1".to_string(),
            report: ValidationReport::unreadable("Dataset not found: dm.parquet"),
        };
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["pass"], false);
        assert_eq!(value["issues"][0], "Dataset not found: dm.parquet");
        assert_eq!(value["vocabulary_version"], "builtin-1");
    }
}
