//! Mapping specification documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Target storage type of a variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    #[default]
    Char,
    Num,
}

/// One selectable answer for a variable that needs a human decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

/// Where a recorded decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Accepted from a pre-configured convention.
    Convention,
    /// A reviewer replaced the convention default.
    ManualOverride,
    /// Chosen by a reviewer with no convention available.
    Manual,
    /// No convention or reviewer input; the first listed option was taken.
    Default,
}

impl DecisionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionSource::Convention => "convention",
            DecisionSource::ManualOverride => "manual_override",
            DecisionSource::Manual => "manual",
            DecisionSource::Default => "default",
        }
    }
}

/// A resolved human decision for one variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanDecision {
    pub choice: String,
    #[serde(default)]
    pub options_shown: Vec<String>,
    pub source: DecisionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// A single target variable in the mapping specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub target_variable: String,
    #[serde(default)]
    pub source_variable: Option<String>,
    #[serde(default)]
    pub data_type: VariableType,
    #[serde(default)]
    pub codelist_code: Option<String>,
    /// Free-text derivation, e.g. `"STUDYID || '-' || SUBJID"`.
    #[serde(default)]
    pub mapping_logic: String,
    #[serde(default)]
    pub human_decision_required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decision_options: Vec<DecisionOption>,
}

impl VariableSpec {
    pub fn new(target: impl Into<String>, data_type: VariableType) -> Self {
        Self {
            target_variable: target.into(),
            source_variable: None,
            data_type,
            codelist_code: None,
            mapping_logic: String::new(),
            human_decision_required: false,
            decision_options: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_variable = Some(source.into());
        self
    }

    pub fn with_codelist(mut self, code: impl Into<String>) -> Self {
        self.codelist_code = Some(code.into());
        self
    }

    pub fn with_logic(mut self, logic: impl Into<String>) -> Self {
        self.mapping_logic = logic.into();
        self
    }

    /// Non-empty codelist reference, if any.
    pub fn codelist(&self) -> Option<&str> {
        self.codelist_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// Mapping specification for one study domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub study_id: String,
    pub domain: String,
    #[serde(default)]
    pub variables: Vec<VariableSpec>,
    #[serde(default)]
    pub human_decisions: BTreeMap<String, HumanDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub review_comments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_pass: Option<bool>,
    #[serde(default)]
    pub approved: bool,
}

impl Specification {
    pub fn new(
        study_id: impl Into<String>,
        domain: impl Into<String>,
        variables: Vec<VariableSpec>,
    ) -> Self {
        Self {
            study_id: study_id.into(),
            domain: domain.into(),
            variables,
            human_decisions: BTreeMap::new(),
            review_comments: Vec::new(),
            review_pass: None,
            approved: false,
        }
    }

    /// Looks up a variable by target name (case-insensitive).
    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables
            .iter()
            .find(|variable| variable.target_variable.eq_ignore_ascii_case(name))
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    /// Variables flagged for a human decision.
    pub fn decision_points(&self) -> impl Iterator<Item = &VariableSpec> {
        self.variables
            .iter()
            .filter(|variable| variable.human_decision_required)
    }

    /// Flagged variables that offer options but have no recorded decision.
    pub fn pending_decisions(&self) -> Vec<&str> {
        self.decision_points()
            .filter(|variable| !variable.decision_options.is_empty())
            .filter(|variable| !self.human_decisions.contains_key(&variable.target_variable))
            .map(|variable| variable.target_variable.as_str())
            .collect()
    }

    /// The chosen option for a variable, if a decision was recorded.
    pub fn decision_for(&self, variable: &str) -> Option<&str> {
        self.human_decisions
            .get(variable)
            .map(|decision| decision.choice.as_str())
    }

    pub fn record_decision(&mut self, variable: impl Into<String>, decision: HumanDecision) {
        self.human_decisions.insert(variable.into(), decision);
    }

    /// Freezes the specification for the programming phases.
    pub fn approve(&mut self) {
        self.approved = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn race_spec() -> Specification {
        let mut race = VariableSpec::new("RACE", VariableType::Char).with_codelist("C74457");
        race.human_decision_required = true;
        race.decision_options = vec![
            DecisionOption {
                id: "A".to_string(),
                description: "MULTIPLE".to_string(),
            },
            DecisionOption {
                id: "B".to_string(),
                description: "SUPPDM".to_string(),
            },
        ];
        Specification::new(
            "XYZ-2026-001",
            "DM",
            vec![VariableSpec::new("USUBJID", VariableType::Char), race],
        )
    }

    #[test]
    fn pending_decisions_clear_once_recorded() {
        let mut spec = race_spec();
        assert_eq!(spec.pending_decisions(), vec!["RACE"]);

        spec.record_decision(
            "RACE",
            HumanDecision {
                choice: "B".to_string(),
                options_shown: vec!["A".to_string(), "B".to_string()],
                source: DecisionSource::Convention,
                rationale: None,
            },
        );
        assert!(spec.pending_decisions().is_empty());
        assert_eq!(spec.decision_for("RACE"), Some("B"));
    }

    #[test]
    fn variable_lookup_is_case_insensitive() {
        let spec = race_spec();
        assert!(spec.has_variable("usubjid"));
        assert!(!spec.has_variable("AGE"));
    }

    #[test]
    fn deserializes_minimal_document() {
        let json = r#"{
            "study_id": "XYZ",
            "domain": "DM",
            "variables": [
                {"target_variable": "AGE", "data_type": "Num", "codelist_code": ""}
            ]
        }"#;
        let spec: Specification = serde_json::from_str(json).unwrap();
        assert_eq!(spec.variables[0].data_type, VariableType::Num);
        assert_eq!(spec.variables[0].codelist(), None);
        assert!(!spec.approved);
        assert!(spec.human_decisions.is_empty());
    }
}
