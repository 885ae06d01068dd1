//! Error types for the orchestration engine.

use std::path::PathBuf;

use sdtm_compare::CompareError;
use sdtm_ingest::IngestError;
use sdtm_model::TransitionError;
use thiserror::Error;

use crate::generate::ProgramRole;

/// A program could not be generated from the specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("specification for {domain} has no variables")]
    EmptySpecification { domain: String },

    #[error("{variable}: unsupported mapping logic '{logic}'")]
    UnsupportedLogic { variable: String, logic: String },

    #[error("{variable}: no source variable and no mapping logic")]
    NoDerivation { variable: String },

    #[error("derivation cycle through {variables}")]
    DerivationCycle { variables: String },
}

/// The runner could not launch or supervise a program.
///
/// A program that starts and exits non-zero is not an error here; see
/// [`crate::runner::RunOutcome`].
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start {interpreter} for {program}: {source}")]
    Spawn {
        interpreter: String,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for {program}: {source}")]
    Wait {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loading or saving the persisted pipeline state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read state {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid state document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("state {path} has schema version {found}, this build supports {supported}")]
    UnsupportedSchema {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("state {path} belongs to {found}, expected {expected}")]
    Mismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },

    #[error(transparent)]
    Write(#[from] IngestError),
}

/// Everything a phase or the orchestration loop can fail with.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input artifact is absent. Never retried.
    #[error("missing {artifact}: {path}")]
    MissingInput { artifact: &'static str, path: PathBuf },

    #[error(transparent)]
    Io(#[from] IngestError),

    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// The program ran and exited unsuccessfully.
    #[error("{role} program failed ({status}): {diagnostic}")]
    ProgramFailed {
        role: ProgramRole,
        status: String,
        diagnostic: String,
    },

    #[error("spec review failed with {count} comment(s): {comments}")]
    ReviewFailed { count: usize, comments: String },

    #[error("spec building failed: {0}")]
    SpecBuild(String),

    #[error("{variable}: {reason}")]
    Decision { variable: String, reason: String },

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl PipelineError {
    /// Input errors point at missing or unreadable files; rerunning without
    /// fixing the input does not help.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingInput { .. } | PipelineError::Io(_) | PipelineError::Compare(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_failure_names_role_and_status() {
        let err = PipelineError::ProgramFailed {
            role: ProgramRole::Qc,
            status: "exit code 1".to_string(),
            diagnostic: "Error in library(arrow)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "qc program failed (exit code 1): Error in library(arrow)"
        );
        assert!(!err.is_input_error());
    }

    #[test]
    fn missing_input_is_an_input_error() {
        let err = PipelineError::MissingInput {
            artifact: "approved_spec",
            path: PathBuf::from("specs/dm_mapping_spec_approved.json"),
        };
        assert!(err.is_input_error());
    }
}
