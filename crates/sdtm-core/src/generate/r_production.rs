//! Production program: a single dplyr pipeline.

use std::fmt::Write as _;

use sdtm_model::{DatasetFormat, Specification, VariableType};

use super::derivation::{Derivation, PlannedVariable, Term, dependency_order, plan};
use super::{GenerationContext, ProgramGenerator, r_path, r_string};
use crate::error::GenerateError;

/// Emits one `mutate()` call with derivations in specification order,
/// moved only as far as their inputs require.
#[derive(Debug, Clone, Copy, Default)]
pub struct RProductionGenerator;

impl ProgramGenerator for RProductionGenerator {
    fn generate(
        &self,
        spec: &Specification,
        ctx: &GenerationContext,
    ) -> Result<String, GenerateError> {
        let planned = plan(spec)?;
        let order = dependency_order(&planned, false)?;
        let frame = frame_name(&spec.domain);

        let mut out = String::new();
        let _ = writeln!(out, "# {} production program", spec.domain.to_uppercase());
        let _ = writeln!(out, "# Study: {}", spec.study_id);
        out.push_str("# Generated from the approved mapping specification. Do not edit.\n\n");

        out.push_str("suppressPackageStartupMessages(library(dplyr))\n");
        if ctx.format == DatasetFormat::Parquet {
            out.push_str("library(arrow)\n");
        }
        out.push('\n');

        let _ = writeln!(out, "raw_path <- {}", r_path(&ctx.raw_data));
        let _ = writeln!(out, "out_path <- {}", r_path(&ctx.output_dataset));
        out.push('\n');
        out.push_str(
            "raw <- read.csv(raw_path, colClasses = \"character\", na.strings = c(\"\", \"NA\"))\n\n",
        );

        let _ = writeln!(out, "{frame} <- raw %>%");
        out.push_str("  mutate(\n");
        for (position, &idx) in order.iter().enumerate() {
            let variable = &planned[idx];
            if let Some(decision) = spec.human_decisions.get(variable.name()) {
                let _ = writeln!(
                    out,
                    "    # {}: decision {} ({})",
                    variable.name(),
                    decision.choice,
                    decision.source.as_str()
                );
            }
            let separator = if position + 1 == order.len() { "" } else { "," };
            let _ = writeln!(
                out,
                "    {} = {}{separator}",
                variable.name(),
                expression(variable)
            );
        }
        out.push_str("  ) %>%\n");
        let columns: Vec<&str> = planned.iter().map(PlannedVariable::name).collect();
        let _ = writeln!(out, "  select({})", columns.join(", "));
        out.push('\n');

        out.push_str("dir.create(dirname(out_path), recursive = TRUE, showWarnings = FALSE)\n");
        match ctx.format {
            DatasetFormat::Parquet => {
                let _ = writeln!(out, "arrow::write_parquet({frame}, out_path)");
            }
            DatasetFormat::Csv => {
                let _ = writeln!(out, "write.csv({frame}, out_path, row.names = FALSE, na = \"\")");
            }
        }
        Ok(out)
    }

    fn generator_name(&self) -> &str {
        "r-dplyr"
    }
}

fn frame_name(domain: &str) -> String {
    let lower = domain.trim().to_lowercase();
    let valid = lower.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && lower.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid { lower } else { "dataset".to_string() }
}

fn date(column: &str) -> String {
    format!("as.Date({column}, optional = TRUE)")
}

fn expression(variable: &PlannedVariable<'_>) -> String {
    let numeric_target = variable.variable.data_type == VariableType::Num;
    let (expr, numeric) = match &variable.derivation {
        Derivation::Copy(column) => (column.clone(), false),
        Derivation::Constant(value) => (r_string(value), false),
        Derivation::Concat(terms) => {
            let parts: Vec<String> = terms
                .iter()
                .map(|term| match term {
                    Term::Column(column) => column.clone(),
                    Term::Literal(text) => r_string(text),
                })
                .collect();
            (format!("paste0({})", parts.join(", ")), false)
        }
        Derivation::IsoDate(column) => (format!("format({}, \"%Y-%m-%d\")", date(column)), false),
        Derivation::AgeYears { birth, reference } => (
            format!(
                "floor(as.numeric(difftime({}, {}, units = \"days\")) / 365.25)",
                date(reference),
                date(birth)
            ),
            true,
        ),
        Derivation::StudyDay { date: day, reference } => (
            format!(
                "as.numeric({d} - {r}) + ({d} >= {r})",
                d = date(day),
                r = date(reference)
            ),
            true,
        ),
        Derivation::Missing => {
            let missing = if numeric_target { "NA_real_" } else { "NA_character_" };
            return missing.to_string();
        }
    };
    match (numeric_target, numeric) {
        (true, false) => format!("as.numeric({expr})"),
        (false, true) => format!("as.character({expr})"),
        _ => expr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdtm_model::{DecisionSource, HumanDecision, VariableSpec};
    use std::path::PathBuf;

    fn spec() -> Specification {
        let mut spec = Specification::new(
            "XYZ-2026-001",
            "DM",
            vec![
                VariableSpec::new("STUDYID", VariableType::Char).with_logic("\"XYZ-2026-001\""),
                VariableSpec::new("USUBJID", VariableType::Char)
                    .with_logic("STUDYID || \"-\" || SUBJID"),
                VariableSpec::new("SUBJID", VariableType::Char).with_source("SUBJID"),
                VariableSpec::new("RACE", VariableType::Char).with_source("RACE"),
                VariableSpec::new("AGE", VariableType::Num)
                    .with_logic("age_years(BRTHDTC, RFSTDTC)"),
            ],
        );
        spec.record_decision(
            "RACE",
            HumanDecision {
                choice: "B".to_string(),
                options_shown: vec!["A".to_string(), "B".to_string()],
                source: DecisionSource::Convention,
                rationale: None,
            },
        );
        spec
    }

    fn ctx(format: DatasetFormat) -> GenerationContext {
        GenerationContext {
            raw_data: PathBuf::from("/study/raw/dm.csv"),
            output_dataset: PathBuf::from("/out/production/datasets/dm.parquet"),
            format,
        }
    }

    #[test]
    fn renders_dplyr_pipeline() {
        let program = RProductionGenerator
            .generate(&spec(), &ctx(DatasetFormat::Parquet))
            .unwrap();
        insta::assert_snapshot!(program, @r#"
        # DM production program
        # Study: XYZ-2026-001
        # Generated from the approved mapping specification. Do not edit.

        suppressPackageStartupMessages(library(dplyr))
        library(arrow)

        raw_path <- "/study/raw/dm.csv"
        out_path <- "/out/production/datasets/dm.parquet"

        raw <- read.csv(raw_path, colClasses = "character", na.strings = c("", "NA"))

        dm <- raw %>%
          mutate(
            STUDYID = "XYZ-2026-001",
            SUBJID = SUBJID,
            USUBJID = paste0(STUDYID, "-", SUBJID),
            # RACE: decision B (convention)
            RACE = RACE,
            AGE = floor(as.numeric(difftime(as.Date(RFSTDTC, optional = TRUE), as.Date(BRTHDTC, optional = TRUE), units = "days")) / 365.25)
          ) %>%
          select(STUDYID, USUBJID, SUBJID, RACE, AGE)

        dir.create(dirname(out_path), recursive = TRUE, showWarnings = FALSE)
        arrow::write_parquet(dm, out_path)
        "#);
    }

    #[test]
    fn csv_output_skips_arrow() {
        let program = RProductionGenerator
            .generate(&spec(), &ctx(DatasetFormat::Csv))
            .unwrap();
        assert!(!program.contains("library(arrow)"));
        assert!(program.contains("write.csv(dm, out_path, row.names = FALSE, na = \"\")"));
    }

    #[test]
    fn char_targets_of_numeric_derivations_are_coerced() {
        let variable = VariableSpec::new("DMDY", VariableType::Char)
            .with_logic("study_day(DMDTC, RFSTDTC)");
        let spec = Specification::new("XYZ", "DM", vec![variable]);
        let planned = plan(&spec).unwrap();
        assert!(expression(&planned[0]).starts_with("as.character(as.numeric("));
    }
}
