//! Validation report produced once per validation phase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of one named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDetail {
    pub name: String,
    pub passed: bool,
    /// Advisory checks never affect the overall verdict.
    #[serde(default)]
    pub advisory: bool,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<String>,
    pub checks: BTreeMap<String, bool>,
    #[serde(default)]
    pub details: Vec<CheckDetail>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// An empty, passing report.
    pub fn new() -> Self {
        Self {
            pass: true,
            issues: Vec::new(),
            checks: BTreeMap::new(),
            details: Vec::new(),
        }
    }

    /// A report for a dataset that could not be checked at all.
    pub fn unreadable(issue: impl Into<String>) -> Self {
        Self {
            pass: false,
            issues: vec![issue.into()],
            checks: BTreeMap::new(),
            details: Vec::new(),
        }
    }

    pub fn record(&mut self, check: CheckDetail) {
        if !check.passed && !check.advisory {
            self.pass = false;
        }
        self.checks.insert(check.name.clone(), check.passed);
        self.details.push(check);
    }

    pub fn add_issue(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    pub fn check(&self, name: &str) -> Option<bool> {
        self.checks.get(name).copied()
    }

    /// Names of failed checks, advisory ones included.
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, passed)| !**passed)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(name: &str, passed: bool, advisory: bool) -> CheckDetail {
        CheckDetail {
            name: name.to_string(),
            passed,
            advisory,
            detail: String::new(),
        }
    }

    #[test]
    fn advisory_failures_keep_pass() {
        let mut report = ValidationReport::new();
        report.record(detail("type_age", false, true));
        assert!(report.pass);
        assert_eq!(report.failed_checks(), vec!["type_age"]);

        report.record(detail("usubjid_unique", false, false));
        assert!(!report.pass);
    }

    #[test]
    fn unreadable_report_fails() {
        let report = ValidationReport::unreadable("Dataset not found: dm.parquet");
        assert!(!report.pass);
        assert!(report.checks.is_empty());
    }
}
