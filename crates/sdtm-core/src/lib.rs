//! Double-programming engine.
//!
//! # Flow
//!
//! 1. **spec_building** - draft specification from a [`SpecBuilder`]
//! 2. **spec_review** - [`SpecReviewer`] verdict gates the run unless forced
//! 3. **human_review** - [`DecisionProvider`] answers decision points, spec is approved
//! 4. **production** / **qc** - [`GeneratorPair`] emits two programs, [`ProgramRunner`] runs them
//! 5. **comparison** - datasets compared; a mismatch loops back to production
//!    up to `max_iterations` times
//! 6. **validation** - production dataset checked, reports written
//!
//! State is persisted after every phase so a run can be resumed.

pub mod collaborators;
pub mod error;
pub mod generate;
pub mod orchestrator;
pub mod runner;
pub mod store;

pub use collaborators::{
    Collaborators, ConventionDecisions, DecisionProvider, ProfileSpecBuilder, RuleReviewer,
    SpecBuilder, SpecReviewer, TemplateSpecBuilder,
};
pub use error::{GenerateError, PipelineError, Result, RunnerError, StateError};
pub use generate::{
    GenerationContext, GeneratorPair, ProgramGenerator, ProgramRole, RProductionGenerator,
    RQcGenerator,
};
pub use orchestrator::{
    DEFAULT_MAX_ITERATIONS, Orchestrator, PipelineConfig, RunMode, RunOptions, RunReport,
    RunStatus,
};
pub use runner::{DEFAULT_TIMEOUT, ProcessRunner, ProgramRunner, RunOutcome};
pub use store::StateStore;
