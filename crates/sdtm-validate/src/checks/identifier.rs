//! Subject identifier uniqueness and study prefix.

use std::collections::HashSet;

use super::{CheckContext, CheckOutcome};

pub(crate) fn check(ctx: &CheckContext<'_>) -> Vec<CheckOutcome> {
    let field = ctx.options.subject_id_field.as_str();
    let Some(values) = ctx.values(field) else {
        return Vec::new();
    };
    let present: Vec<&str> = values
        .iter()
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .collect();
    let stem = field.to_lowercase();
    let mut outcomes = Vec::new();

    // Repeated occurrences beyond the first of each value.
    let mut seen = HashSet::new();
    let duplicates = present.iter().filter(|v| !seen.insert(**v)).count();
    let issues = if duplicates == 0 {
        Vec::new()
    } else {
        vec![format!("{field} has {duplicates} duplicate(s)")]
    };
    outcomes.push(CheckOutcome::new(format!("{stem}_unique"), issues));

    let study_id = ctx.spec.study_id.trim();
    if !study_id.is_empty() {
        let bad = present.iter().filter(|v| !v.starts_with(study_id)).count();
        let issues = if bad == 0 {
            Vec::new()
        } else {
            vec![format!(
                "{field}: {bad} value(s) don't start with STUDYID '{study_id}'"
            )]
        };
        outcomes.push(CheckOutcome::new(format!("{stem}_format"), issues));
    }

    outcomes
}
