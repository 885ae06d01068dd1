use thiserror::Error;

use crate::phase::Phase;

/// A phase name that is not part of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown phase '{0}'")]
pub struct ParsePhaseError(pub String);

/// A state change rejected by the transition table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("transition {from} -> {to} is not allowed")]
    NotAllowed { from: Phase, to: Phase },
    #[error("pipeline is already complete")]
    AlreadyComplete,
}
