//! Pipeline phases and the transition table.
//!
//! The phase set is closed. Every legal state change is listed in
//! [`Phase::allowed_next`]; the only backwards edge is the comparison
//! loop-back into production.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParsePhaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SpecBuilding,
    SpecReview,
    HumanReview,
    Production,
    Qc,
    Comparison,
    Validation,
    /// Terminal success after validation.
    Complete,
}

impl Phase {
    /// All phases in nominal order.
    pub const NOMINAL_ORDER: [Phase; 8] = [
        Phase::SpecBuilding,
        Phase::SpecReview,
        Phase::HumanReview,
        Phase::Production,
        Phase::Qc,
        Phase::Comparison,
        Phase::Validation,
        Phase::Complete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::SpecBuilding => "spec_building",
            Phase::SpecReview => "spec_review",
            Phase::HumanReview => "human_review",
            Phase::Production => "production",
            Phase::Qc => "qc",
            Phase::Comparison => "comparison",
            Phase::Validation => "validation",
            Phase::Complete => "complete",
        }
    }

    /// Position of the phase in the nominal order.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Phases reachable in one transition from `self`.
    pub fn allowed_next(self) -> &'static [Phase] {
        match self {
            Phase::SpecBuilding => &[Phase::SpecReview],
            Phase::SpecReview => &[Phase::HumanReview],
            Phase::HumanReview => &[Phase::Production],
            Phase::Production => &[Phase::Qc],
            Phase::Qc => &[Phase::Comparison],
            Phase::Comparison => &[Phase::Production, Phase::Validation],
            Phase::Validation => &[Phase::Complete],
            Phase::Complete => &[],
        }
    }

    pub fn can_transition_to(self, next: Phase) -> bool {
        self.allowed_next().contains(&next)
    }

    /// The forward successor in the nominal order.
    pub fn next_nominal(self) -> Option<Phase> {
        Self::NOMINAL_ORDER.get(self.ordinal() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Phases re-entered by the bounded comparison retry.
    pub fn in_comparison_loop(self) -> bool {
        matches!(self, Phase::Production | Phase::Qc | Phase::Comparison)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ParsePhaseError;

    /// Accepts the canonical names plus the short stage aliases used on the
    /// command line (`spec_build`, `compare`, `validate`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        let phase = match normalized.as_str() {
            "spec_building" | "spec_build" => Phase::SpecBuilding,
            "spec_review" => Phase::SpecReview,
            "human_review" => Phase::HumanReview,
            "production" => Phase::Production,
            "qc" => Phase::Qc,
            "comparison" | "compare" => Phase::Comparison,
            "validation" | "validate" => Phase::Validation,
            "complete" => Phase::Complete,
            _ => return Err(ParsePhaseError(value.to_string())),
        };
        Ok(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_order_matches_ordinals() {
        for (idx, phase) in Phase::NOMINAL_ORDER.iter().enumerate() {
            assert_eq!(phase.ordinal(), idx);
        }
    }

    #[test]
    fn only_comparison_loops_back() {
        for phase in Phase::NOMINAL_ORDER {
            for next in phase.allowed_next() {
                if next.ordinal() <= phase.ordinal() {
                    assert_eq!(phase, Phase::Comparison);
                    assert_eq!(*next, Phase::Production);
                }
            }
        }
    }

    #[test]
    fn forward_edges_follow_nominal_order() {
        for phase in Phase::NOMINAL_ORDER {
            if let Some(next) = phase.next_nominal() {
                assert!(phase.can_transition_to(next), "{phase} -> {next}");
            }
        }
        assert!(Phase::Complete.is_terminal());
        assert!(!Phase::Production.can_transition_to(Phase::Comparison));
    }

    #[test]
    fn parses_stage_aliases() {
        assert_eq!("compare".parse::<Phase>().unwrap(), Phase::Comparison);
        assert_eq!("spec-build".parse::<Phase>().unwrap(), Phase::SpecBuilding);
        assert_eq!("VALIDATE".parse::<Phase>().unwrap(), Phase::Validation);
        assert!("deploy".parse::<Phase>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for phase in Phase::NOMINAL_ORDER {
            assert_eq!(phase.to_string().parse::<Phase>().unwrap(), phase);
        }
    }
}
