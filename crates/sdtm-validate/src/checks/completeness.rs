//! Structurally critical identifiers must be populated.

use super::{CheckContext, CheckOutcome};

const CRITICAL_FIELDS: [&str; 5] = ["STUDYID", "DOMAIN", "USUBJID", "SUBJID", "SITEID"];

pub(crate) fn check(ctx: &CheckContext<'_>) -> Vec<CheckOutcome> {
    CRITICAL_FIELDS
        .iter()
        .filter_map(|field| {
            let values = ctx.values(field)?;
            let missing = values.iter().filter(|v| v.trim().is_empty()).count();
            let issues = if missing == 0 {
                Vec::new()
            } else {
                vec![format!("{field}: {missing} missing value(s) in required field")]
            };
            Some(CheckOutcome::new(
                format!("not_null_{}", field.to_lowercase()),
                issues,
            ))
        })
        .collect()
}
