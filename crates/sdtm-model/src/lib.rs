//! Data model for the SDTM double-programming pipeline.
//!
//! Types here are plain data: every filesystem or process concern lives in
//! the crates that consume them.

pub mod artifact;
pub mod comparison;
pub mod error;
pub mod layout;
pub mod phase;
pub mod spec;
pub mod state;
pub mod validation;

pub use artifact::ArtifactRegistry;
pub use comparison::{ColumnDiscrepancy, ComparisonResult, SchemaPolicy};
pub use error::{ParsePhaseError, TransitionError};
pub use layout::{DatasetFormat, OutputLayout};
pub use phase::Phase;
pub use spec::{
    DecisionOption, DecisionSource, HumanDecision, Specification, VariableSpec, VariableType,
};
pub use state::{
    ComparisonStatus, EntryKind, LogEntry, PipelineState, STATE_SCHEMA_VERSION, SpecStatus,
    StepStatus, ValidationStatus,
};
pub use validation::{CheckDetail, ValidationReport};
