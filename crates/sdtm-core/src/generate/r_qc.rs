//! QC program: base R, one assignment per variable.
//!
//! Built without reference to the production generator. Variables are
//! derived in a different dependency-respecting order (latest ready
//! variable first) and every column is addressed through `[[`.

use sdtm_model::{DatasetFormat, Specification, VariableType};

use super::derivation::{Derivation, PlannedVariable, Term, dependency_order, plan};
use super::{GenerationContext, ProgramGenerator, r_path, r_string};
use crate::error::GenerateError;

#[derive(Debug, Clone, Copy, Default)]
pub struct RQcGenerator;

impl ProgramGenerator for RQcGenerator {
    fn generate(
        &self,
        spec: &Specification,
        ctx: &GenerationContext,
    ) -> Result<String, GenerateError> {
        let planned = plan(spec)?;
        let order = dependency_order(&planned, true)?;

        let mut lines: Vec<String> = vec![
            format!(
                "## QC program for {} (independent double programming)",
                spec.domain.to_uppercase()
            ),
            format!("## Study {}", spec.study_id),
            String::new(),
            format!("qc_input <- {}", r_path(&ctx.raw_data)),
            format!("qc_output <- {}", r_path(&ctx.output_dataset)),
            String::new(),
            "qc <- utils::read.csv(qc_input, colClasses = \"character\", na.strings = c(\"\", \"NA\"))"
                .to_string(),
            "n_obs <- nrow(qc)".to_string(),
            String::new(),
        ];

        for idx in order {
            let variable = &planned[idx];
            let name = r_string(variable.name());
            let mut line = format!("qc[[{name}]] <- {}", vector(variable));
            if let Some(decision) = spec.human_decisions.get(variable.name()) {
                line.push_str(&format!(
                    "  ## decision {} via {}",
                    decision.choice,
                    decision.source.as_str()
                ));
            }
            lines.push(line);
        }

        let keep: Vec<String> = planned.iter().map(|p| r_string(p.name())).collect();
        lines.push(String::new());
        lines.push(format!("qc <- qc[, c({}), drop = FALSE]", keep.join(", ")));
        lines.push(String::new());
        lines.push(
            "if (!dir.exists(dirname(qc_output))) dir.create(dirname(qc_output), recursive = TRUE)"
                .to_string(),
        );
        lines.push(match ctx.format {
            DatasetFormat::Parquet => "arrow::write_parquet(qc, qc_output)".to_string(),
            DatasetFormat::Csv => "utils::write.table(qc, qc_output, sep = \",\", row.names = FALSE, na = \"\", qmethod = \"double\")".to_string(),
        });

        let mut program = lines.join("\n");
        program.push('\n');
        Ok(program)
    }

    fn generator_name(&self) -> &str {
        "r-base"
    }
}

fn column(name: &str) -> String {
    format!("qc[[{}]]", r_string(name))
}

fn as_date(name: &str) -> String {
    format!("as.numeric(as.Date({}, optional = TRUE))", column(name))
}

/// Full-length vector for one variable.
fn vector(variable: &PlannedVariable<'_>) -> String {
    let wants_number = matches!(variable.variable.data_type, VariableType::Num);
    let (code, is_number) = match &variable.derivation {
        Derivation::Missing if wants_number => return "rep(NA_real_, n_obs)".to_string(),
        Derivation::Missing => return "rep(NA_character_, n_obs)".to_string(),
        Derivation::Constant(value) => (format!("rep({}, n_obs)", r_string(value)), false),
        Derivation::Copy(source) => (column(source), false),
        Derivation::Concat(terms) => {
            let pieces = terms
                .iter()
                .map(|term| match term {
                    Term::Literal(text) => r_string(text),
                    Term::Column(name) => column(name),
                })
                .collect::<Vec<_>>()
                .join(", ");
            (format!("paste({pieces}, sep = \"\")"), false)
        }
        Derivation::IsoDate(source) => (
            format!("as.character(as.Date({}, optional = TRUE))", column(source)),
            false,
        ),
        Derivation::AgeYears { birth, reference } => (
            format!("floor(({} - {}) / 365.25)", as_date(reference), as_date(birth)),
            true,
        ),
        Derivation::StudyDay { date, reference } => (
            format!(
                "local({{ delta <- {} - {}; ifelse(delta >= 0, delta + 1, delta) }})",
                as_date(date),
                as_date(reference)
            ),
            true,
        ),
    };
    if wants_number == is_number {
        code
    } else if wants_number {
        format!("as.numeric({code})")
    } else {
        format!("as.character({code})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdtm_model::VariableSpec;
    use std::path::PathBuf;

    fn ctx() -> GenerationContext {
        GenerationContext {
            raw_data: PathBuf::from("/study/raw/dm.csv"),
            output_dataset: PathBuf::from("/out/qc/datasets/dm_qc.csv"),
            format: DatasetFormat::Csv,
        }
    }

    #[test]
    fn derives_latest_ready_variable_first() {
        let spec = Specification::new(
            "XYZ-2026-001",
            "DM",
            vec![
                VariableSpec::new("STUDYID", VariableType::Char).with_logic("'XYZ-2026-001'"),
                VariableSpec::new("SUBJID", VariableType::Char).with_source("SUBJID"),
                VariableSpec::new("USUBJID", VariableType::Char)
                    .with_logic("STUDYID || '-' || SUBJID"),
                VariableSpec::new("DMDY", VariableType::Num)
                    .with_logic("study_day(DMDTC, RFSTDTC)"),
            ],
        );
        let program = RQcGenerator.generate(&spec, &ctx()).unwrap();
        let assignments: Vec<&str> = program
            .lines()
            .filter(|line| line.starts_with("qc[["))
            .collect();
        assert_eq!(
            assignments,
            vec![
                "qc[[\"DMDY\"]] <- local({ delta <- as.numeric(as.Date(qc[[\"DMDTC\"]], optional = TRUE)) - as.numeric(as.Date(qc[[\"RFSTDTC\"]], optional = TRUE)); ifelse(delta >= 0, delta + 1, delta) })",
                "qc[[\"SUBJID\"]] <- qc[[\"SUBJID\"]]",
                "qc[[\"STUDYID\"]] <- rep(\"XYZ-2026-001\", n_obs)",
                "qc[[\"USUBJID\"]] <- paste(qc[[\"STUDYID\"]], \"-\", qc[[\"SUBJID\"]], sep = \"\")",
            ]
        );
        assert!(program.contains("qc <- qc[, c(\"STUDYID\", \"SUBJID\", \"USUBJID\", \"DMDY\"), drop = FALSE]"));
        assert!(program.ends_with("qmethod = \"double\")\n"));
    }

    #[test]
    fn missing_numeric_is_na_real() {
        let spec = Specification::new(
            "XYZ",
            "DM",
            vec![VariableSpec::new("AGE", VariableType::Num).with_logic("missing")],
        );
        let program = RQcGenerator.generate(&spec, &ctx()).unwrap();
        assert!(program.contains("qc[[\"AGE\"]] <- rep(NA_real_, n_obs)"));
    }
}
