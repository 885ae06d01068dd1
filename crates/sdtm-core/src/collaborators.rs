//! Collaborators the orchestration loop calls out to.
//!
//! The loop only depends on the traits. The defaults here are deterministic
//! and need no network or interactive input:
//!
//! - [`TemplateSpecBuilder`] loads a prepared specification document
//! - [`ProfileSpecBuilder`] drafts a specification from the raw data columns
//! - [`RuleReviewer`] applies [`ReviewRules`]
//! - [`ConventionDecisions`] answers decision points from conventions files

use std::path::PathBuf;

use sdtm_ingest::{IngestError, read_dataset, read_spec};
use sdtm_model::{
    DecisionOption, DecisionSource, HumanDecision, Specification, VariableSpec, VariableType,
};
use sdtm_standards::Conventions;
use sdtm_validate::{ReviewRules, review_spec};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

/// Produces the draft specification.
pub trait SpecBuilder: Send + Sync {
    fn build(&self, study_id: &str, domain: &str) -> Result<Specification>;

    fn builder_name(&self) -> &str;
}

/// Annotates a draft with review comments and a verdict.
pub trait SpecReviewer: Send + Sync {
    fn review(&self, spec: &Specification) -> Specification;
}

/// Resolves one decision point.
pub trait DecisionProvider: Send + Sync {
    fn decide(&self, variable: &VariableSpec) -> Result<HumanDecision>;
}

pub struct Collaborators {
    pub builder: Box<dyn SpecBuilder>,
    pub reviewer: Box<dyn SpecReviewer>,
    pub decisions: Box<dyn DecisionProvider>,
}

impl Collaborators {
    pub fn new(
        builder: Box<dyn SpecBuilder>,
        reviewer: Box<dyn SpecReviewer>,
        decisions: Box<dyn DecisionProvider>,
    ) -> Self {
        Self {
            builder,
            reviewer,
            decisions,
        }
    }
}

/// Loads a prepared specification and stamps it with the run's identifiers.
#[derive(Debug, Clone)]
pub struct TemplateSpecBuilder {
    path: PathBuf,
}

impl TemplateSpecBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SpecBuilder for TemplateSpecBuilder {
    fn build(&self, study_id: &str, domain: &str) -> Result<Specification> {
        let mut spec = read_spec(&self.path).map_err(|err| match err {
            IngestError::FileNotFound { path } => PipelineError::MissingInput {
                artifact: "spec_template",
                path,
            },
            other => other.into(),
        })?;
        if !spec.domain.is_empty() && !spec.domain.eq_ignore_ascii_case(domain) {
            return Err(PipelineError::SpecBuild(format!(
                "template {} describes domain {}, not {domain}",
                self.path.display(),
                spec.domain
            )));
        }
        spec.study_id = study_id.to_string();
        spec.domain = domain.to_uppercase();
        spec.review_comments.clear();
        spec.review_pass = None;
        spec.approved = false;
        Ok(spec)
    }

    fn builder_name(&self) -> &str {
        "template"
    }
}

/// Drafts a specification from the columns present in the raw data.
///
/// DM gets the full demographics layout with derivations and decision
/// points; any other domain gets pass-through copies of every raw column
/// plus the identifier variables.
#[derive(Debug, Clone)]
pub struct ProfileSpecBuilder {
    raw_data: PathBuf,
}

impl ProfileSpecBuilder {
    pub fn new(raw_data: impl Into<PathBuf>) -> Self {
        Self {
            raw_data: raw_data.into(),
        }
    }
}

impl SpecBuilder for ProfileSpecBuilder {
    fn build(&self, study_id: &str, domain: &str) -> Result<Specification> {
        let df = read_dataset(&self.raw_data).map_err(|err| match err {
            IngestError::FileNotFound { path } => PipelineError::MissingInput {
                artifact: "raw_data",
                path,
            },
            other => other.into(),
        })?;
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_uppercase())
            .collect();
        let domain = domain.to_uppercase();
        let variables = if domain == "DM" {
            demographics_variables(study_id, &columns)
        } else {
            pass_through_variables(study_id, &domain, &columns)
        };
        info!(
            domain = %domain,
            raw_columns = columns.len(),
            variables = variables.len(),
            "drafted specification from raw data"
        );
        Ok(Specification::new(study_id, domain, variables))
    }

    fn builder_name(&self) -> &str {
        "raw-profile"
    }
}

fn char_var(name: &str, logic: &str) -> VariableSpec {
    VariableSpec::new(name, VariableType::Char).with_logic(logic)
}

fn option(id: &str, description: &str) -> DecisionOption {
    DecisionOption {
        id: id.to_string(),
        description: description.to_string(),
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', ""))
}

fn identifier_variables(study_id: &str, domain: &str, raw: &[String]) -> Vec<VariableSpec> {
    let mut variables = vec![
        char_var("STUDYID", &quoted(study_id)),
        char_var("DOMAIN", &quoted(domain)),
    ];
    if raw.iter().any(|c| c == "SUBJID") {
        variables.push(char_var("USUBJID", "STUDYID || \"-\" || SUBJID"));
        variables.push(char_var("SUBJID", "").with_source("SUBJID"));
    }
    variables
}

fn demographics_variables(study_id: &str, raw: &[String]) -> Vec<VariableSpec> {
    let has = |name: &str| raw.iter().any(|c| c == name);
    let copy = |name: &str| char_var(name, "").with_source(name);

    let mut variables = identifier_variables(study_id, "DM", raw);
    let has_rfstdtc = has("RFSTDTC");
    if has_rfstdtc {
        variables.push(char_var("RFSTDTC", "iso_date(RFSTDTC)").with_source("RFSTDTC"));
    }
    let mut rfendtc = char_var("RFENDTC", "missing");
    rfendtc.human_decision_required = true;
    rfendtc.decision_options = vec![
        option("A", "Leave RFENDTC missing; no end-of-participation date in raw data."),
        option("B", "Derive from the last visit or last dose date in other domains."),
    ];
    variables.push(rfendtc);
    for name in ["SITEID", "INVNAM"] {
        if has(name) {
            variables.push(copy(name));
        }
    }

    let birth_source = ["BRTHDT", "BRTHDTC"].into_iter().find(|name| has(name));
    if let Some(source) = birth_source {
        variables.push(char_var("BRTHDTC", &format!("iso_date({source})")).with_source(source));
        if has_rfstdtc {
            variables.push(
                VariableSpec::new("AGE", VariableType::Num)
                    .with_logic("age_years(BRTHDTC, RFSTDTC)"),
            );
            variables.push(char_var("AGEU", "\"YEARS\""));
        }
    }

    let codelists = [("SEX", "C66731"), ("RACE", "C74457"), ("ETHNIC", "C66790")];
    for (name, code) in codelists {
        if !has(name) {
            continue;
        }
        let mut variable = copy(name).with_codelist(code);
        if name == "RACE" {
            variable.human_decision_required = true;
            variable.decision_options = vec![
                option("A", "Map free text to the closest CT term where possible."),
                option("B", "Other Specify becomes RACE = 'OTHER'; free text goes to SUPPDM."),
                option("C", "Mixed responses become MULTIPLE; individual races go to SUPPDM."),
            ];
        }
        variables.push(variable);
    }

    for name in ["ARMCD", "ARM"] {
        if has(name) {
            variables.push(copy(name));
        }
    }
    if has("ARMCD") {
        let mut actarmcd = char_var("ACTARMCD", "ARMCD").with_source("ARMCD");
        actarmcd.human_decision_required = true;
        actarmcd.decision_options = vec![
            option("A", "ACTARMCD = ARMCD for all subjects."),
            option("B", "Derive from actual treatment received."),
        ];
        variables.push(actarmcd);
    }
    if has("ARM") {
        variables.push(char_var("ACTARM", "ARM").with_source("ARM"));
    }
    if has("COUNTRY") {
        variables.push(copy("COUNTRY").with_codelist("C71113"));
    }
    if has_rfstdtc {
        variables.push(char_var("DMDTC", "RFSTDTC").with_source("RFSTDTC"));
        variables.push(
            VariableSpec::new("DMDY", VariableType::Num).with_logic("study_day(DMDTC, RFSTDTC)"),
        );
    }
    variables
}

fn pass_through_variables(study_id: &str, domain: &str, raw: &[String]) -> Vec<VariableSpec> {
    let mut variables = identifier_variables(study_id, domain, raw);
    for column in raw {
        let valid = column
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        let defined = variables
            .iter()
            .any(|v| v.target_variable.eq_ignore_ascii_case(column));
        if valid && !defined {
            variables.push(char_var(column, "").with_source(column.as_str()));
        }
    }
    variables
}

/// Reviews drafts against a fixed rule set.
#[derive(Debug, Clone, Default)]
pub struct RuleReviewer {
    rules: ReviewRules,
}

impl RuleReviewer {
    pub fn new(rules: ReviewRules) -> Self {
        Self { rules }
    }
}

impl SpecReviewer for RuleReviewer {
    fn review(&self, spec: &Specification) -> Specification {
        review_spec(spec, &self.rules)
    }
}

/// Answers decision points from conventions, falling back to the first
/// listed option.
#[derive(Debug, Clone, Default)]
pub struct ConventionDecisions {
    conventions: Conventions,
}

impl ConventionDecisions {
    pub fn new(conventions: Conventions) -> Self {
        Self { conventions }
    }
}

impl DecisionProvider for ConventionDecisions {
    fn decide(&self, variable: &VariableSpec) -> Result<HumanDecision> {
        let name = variable.target_variable.as_str();
        let options_shown: Vec<String> = variable
            .decision_options
            .iter()
            .map(|option| option.id.clone())
            .collect();
        let Some(first) = options_shown.first().cloned() else {
            return Err(PipelineError::Decision {
                variable: name.to_string(),
                reason: "decision required but no options listed".to_string(),
            });
        };

        if let Some(convention) = self.conventions.get(name) {
            let listed = options_shown
                .iter()
                .find(|id| id.eq_ignore_ascii_case(&convention.approach))
                .cloned();
            match listed {
                Some(choice) => {
                    info!(variable = name, choice = %choice, "decision taken from convention");
                    return Ok(HumanDecision {
                        choice,
                        options_shown,
                        source: DecisionSource::Convention,
                        rationale: Some(convention.rationale.clone())
                            .filter(|rationale| !rationale.is_empty()),
                    });
                }
                None => warn!(
                    variable = name,
                    approach = %convention.approach,
                    "convention approach is not one of the listed options"
                ),
            }
        }

        warn!(
            variable = name,
            choice = %first,
            "no convention for decision point, taking the first option"
        );
        Ok(HumanDecision {
            choice: first,
            options_shown,
            source: DecisionSource::Default,
            rationale: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdtm_standards::{Convention, ConventionTier};
    use tempfile::tempdir;

    fn raw_dm(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("raw_dm.csv");
        std::fs::write(
            &path,
            "SUBJID,SITEID,BRTHDT,RFSTDTC,SEX,RACE,ETHNIC,ARMCD,ARM,COUNTRY\n\
             1001,01,1980-04-12,2026-01-15,F,WHITE,NOT HISPANIC OR LATINO,PBO,Placebo,USA\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn profiled_dm_draft_passes_default_review() {
        let dir = tempdir().unwrap();
        let spec = ProfileSpecBuilder::new(raw_dm(dir.path()))
            .build("XYZ-2026-001", "dm")
            .unwrap();
        assert_eq!(spec.domain, "DM");
        assert_eq!(spec.pending_decisions(), vec!["RFENDTC", "RACE", "ACTARMCD"]);

        let reviewed = RuleReviewer::default().review(&spec);
        assert_eq!(reviewed.review_pass, Some(true), "{:?}", reviewed.review_comments);
    }

    #[test]
    fn other_domains_pass_raw_columns_through() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw_ae.csv");
        std::fs::write(&path, "SUBJID,AETERM,AE START\n1001,Headache,2026-02-01\n").unwrap();
        let spec = ProfileSpecBuilder::new(path).build("XYZ", "AE").unwrap();
        let names: Vec<&str> = spec
            .variables
            .iter()
            .map(|v| v.target_variable.as_str())
            .collect();
        assert_eq!(names, vec!["STUDYID", "DOMAIN", "USUBJID", "SUBJID", "AETERM"]);
    }

    #[test]
    fn template_builder_rejects_other_domain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("template.json");
        std::fs::write(&path, r#"{"study_id": "OLD", "domain": "AE", "variables": []}"#).unwrap();
        let err = TemplateSpecBuilder::new(&path).build("XYZ", "DM").unwrap_err();
        assert!(matches!(err, PipelineError::SpecBuild(_)));
    }

    #[test]
    fn convention_wins_over_first_option() {
        let mut conventions = Conventions::default();
        conventions.insert(Convention {
            variable: "RACE".to_string(),
            approach: "b".to_string(),
            rationale: "SUPPDM per sponsor standard".to_string(),
            tier: ConventionTier::Study,
            overridden: false,
        });
        let mut race = VariableSpec::new("RACE", VariableType::Char);
        race.human_decision_required = true;
        race.decision_options = vec![option("A", "closest term"), option("B", "SUPPDM")];

        let decision = ConventionDecisions::new(conventions).decide(&race).unwrap();
        assert_eq!(decision.choice, "B");
        assert_eq!(decision.source, DecisionSource::Convention);
        assert_eq!(decision.rationale.as_deref(), Some("SUPPDM per sponsor standard"));

        let fallback = ConventionDecisions::default().decide(&race).unwrap();
        assert_eq!(fallback.choice, "A");
        assert_eq!(fallback.source, DecisionSource::Default);
        assert_eq!(fallback.options_shown, vec!["A", "B"]);
    }
}
