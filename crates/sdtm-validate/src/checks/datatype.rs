//! Numeric variables must have numeric storage.

use sdtm_common::is_numeric_dtype;
use sdtm_model::VariableType;

use super::{CheckContext, CheckOutcome};

pub(crate) fn check(ctx: &CheckContext<'_>) -> Vec<CheckOutcome> {
    let advisory = !ctx.options.strict_types;
    let mut outcomes = Vec::new();

    for variable in &ctx.spec.variables {
        if variable.data_type != VariableType::Num {
            continue;
        }
        let Some(column) = ctx.columns.get(&variable.target_variable) else {
            continue;
        };
        let Ok(series) = ctx.df.column(column) else {
            continue;
        };

        let dtype = series.dtype();
        let issues = if is_numeric_dtype(dtype) {
            Vec::new()
        } else {
            vec![format!(
                "{}: spec says Num but actual type is {dtype}",
                variable.target_variable
            )]
        };
        outcomes.push(
            CheckOutcome::new(
                format!("type_{}", variable.target_variable.to_lowercase()),
                issues,
            )
            .advisory(advisory),
        );
    }

    outcomes
}
