//! Draft specification review.
//!
//! Review annotates a copy of the specification with comments; an empty
//! comment list means the review passed.

use std::collections::BTreeMap;

use sdtm_model::Specification;

/// A derived variable and the variables its derivation reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationDependency {
    pub target: String,
    pub needs: Vec<String>,
}

impl DerivationDependency {
    pub fn new(target: &str, needs: &[&str]) -> Self {
        Self {
            target: target.to_string(),
            needs: needs.iter().map(|need| (*need).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRules {
    /// Domain code -> variables every specification for it must define.
    pub required: BTreeMap<String, Vec<String>>,
    pub dependencies: Vec<DerivationDependency>,
    /// Variables that must carry a codelist reference.
    pub controlled: Vec<String>,
}

const DM_REQUIRED: [&str; 12] = [
    "STUDYID", "DOMAIN", "USUBJID", "SUBJID", "RFSTDTC", "SITEID", "AGE", "AGEU", "SEX", "ARMCD",
    "ARM", "COUNTRY",
];

impl Default for ReviewRules {
    fn default() -> Self {
        let mut required = BTreeMap::new();
        required.insert(
            "DM".to_string(),
            DM_REQUIRED.iter().map(|v| (*v).to_string()).collect(),
        );
        Self {
            required,
            dependencies: vec![
                DerivationDependency::new("USUBJID", &["STUDYID", "SUBJID"]),
                DerivationDependency::new("AGE", &["BRTHDTC", "RFSTDTC"]),
            ],
            controlled: vec!["SEX".to_string(), "RACE".to_string(), "ETHNIC".to_string()],
        }
    }
}

/// Returns a reviewed copy of `spec` with `review_comments` and
/// `review_pass` filled in.
pub fn review_spec(spec: &Specification, rules: &ReviewRules) -> Specification {
    let mut comments = Vec::new();
    let domain = spec.domain.trim().to_uppercase();

    if let Some(required) = rules.required.get(&domain) {
        let mut missing: Vec<&str> = required
            .iter()
            .map(String::as_str)
            .filter(|name| !spec.has_variable(name))
            .collect();
        missing.sort_unstable();
        if !missing.is_empty() {
            comments.push(format!(
                "Missing required {domain} variables: {}",
                missing.join(", ")
            ));
        }
    }

    for dependency in &rules.dependencies {
        if spec.has_variable(&dependency.target) {
            for need in &dependency.needs {
                if !spec.has_variable(need) {
                    comments.push(format!("{} derivation requires {need}", dependency.target));
                }
            }
        }
    }

    // Study day: <DOMAIN>DY is derived from <DOMAIN>DTC and RFSTDTC.
    let study_day = format!("{domain}DY");
    if spec.has_variable(&study_day) {
        for need in [format!("{domain}DTC"), "RFSTDTC".to_string()] {
            if !spec.has_variable(&need) {
                comments.push(format!("{study_day} derivation requires {need}"));
            }
        }
    }

    for name in &rules.controlled {
        if let Some(variable) = spec.variable(name) {
            if variable.codelist().is_none() {
                comments.push(format!("{name}: controlled variable has no codelist_code"));
            }
        }
    }

    for variable in spec.decision_points() {
        if variable.decision_options.is_empty() {
            comments.push(format!(
                "{}: human decision required but no options listed",
                variable.target_variable
            ));
        }
    }

    let mut reviewed = spec.clone();
    reviewed.review_pass = Some(comments.is_empty());
    reviewed.review_comments = comments;
    reviewed
}
