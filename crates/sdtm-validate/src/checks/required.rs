//! Every specified variable must exist as a dataset column.

use super::{CheckContext, CheckOutcome};

pub(crate) fn check(ctx: &CheckContext<'_>) -> Vec<CheckOutcome> {
    let mut missing: Vec<&str> = ctx
        .spec
        .variables
        .iter()
        .map(|variable| variable.target_variable.as_str())
        .filter(|name| !ctx.columns.contains(name))
        .collect();
    missing.sort_unstable();
    missing.dedup();

    let issues = if missing.is_empty() {
        Vec::new()
    } else {
        vec![format!("Missing spec variables: {}", missing.join(", "))]
    };
    vec![CheckOutcome::new("required_variables", issues)]
}
