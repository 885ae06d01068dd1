//! Controlled-terminology conformance.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use super::{CheckContext, CheckOutcome};

/// Codelists applied even when the specification omits the reference.
const DEFAULT_CODELISTS: [(&str, &str); 3] =
    [("SEX", "C66731"), ("RACE", "C74457"), ("ETHNIC", "C66790")];

pub(crate) fn check(ctx: &CheckContext<'_>) -> Vec<CheckOutcome> {
    let mut mapping: BTreeMap<String, String> = DEFAULT_CODELISTS
        .iter()
        .map(|(var, code)| ((*var).to_string(), (*code).to_string()))
        .collect();
    for variable in &ctx.spec.variables {
        if let Some(code) = variable.codelist() {
            mapping.insert(variable.target_variable.to_uppercase(), code.to_string());
        }
    }

    let mut outcomes = Vec::new();
    for (variable, code) in &mapping {
        let Some(codelist) = ctx.vocabulary.get(code) else {
            tracing::debug!(variable, codelist = code, "codelist not in vocabulary, skipped");
            continue;
        };
        let Some(values) = ctx.values(variable) else {
            continue;
        };

        let invalid: BTreeSet<&str> = values
            .iter()
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty() && !codelist.contains(value))
            .collect();

        let issues = if invalid.is_empty() {
            Vec::new()
        } else {
            let listed: Vec<&str> = invalid.into_iter().collect();
            vec![format!(
                "{variable} (codelist {code}): invalid values {}",
                listed.join(", ")
            )]
        };
        outcomes.push(CheckOutcome::new(
            format!("ct_{}", variable.to_lowercase()),
            issues,
        ));
    }
    outcomes
}
