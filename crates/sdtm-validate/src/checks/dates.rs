//! Canonical date format for `--DTC` columns.

use std::sync::LazyLock;

use regex::Regex;

use super::{CheckContext, CheckOutcome};

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid ISO 8601 date regex"));

/// True for `YYYY-MM-DD`. Blank values are allowed; padding is not.
pub fn is_canonical_date(value: &str) -> bool {
    value.trim().is_empty() || ISO_DATE.is_match(value)
}

pub(crate) fn check(ctx: &CheckContext<'_>) -> Vec<CheckOutcome> {
    let mut columns: Vec<&str> = ctx
        .columns
        .names()
        .filter(|name| name.to_uppercase().ends_with("DTC"))
        .collect();
    columns.sort_unstable();

    columns
        .into_iter()
        .filter_map(|column| {
            let values = ctx.values(column)?;
            let bad = values.iter().filter(|v| !is_canonical_date(v)).count();
            let issues = if bad == 0 {
                Vec::new()
            } else {
                vec![format!(
                    "{column}: {bad} value(s) not in ISO 8601 YYYY-MM-DD format"
                )]
            };
            Some(CheckOutcome::new(
                format!("iso_{}", column.to_lowercase()),
                issues,
            ))
        })
        .collect()
}
