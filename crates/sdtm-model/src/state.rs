//! Persisted pipeline state for one study domain.
//!
//! A `PipelineState` is the single record the orchestration loop owns. It is
//! rewritten in full after every transition so an interrupted run can pick up
//! from `current_phase`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactRegistry;
use crate::error::TransitionError;
use crate::phase::Phase;
use crate::spec::HumanDecision;

/// Incremented whenever the persisted layout changes incompatibly.
pub const STATE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecStatus {
    #[default]
    Draft,
    Reviewed,
    Approved,
}

/// Status of a production or QC program run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    #[default]
    Pending,
    Match,
    Mismatch,
}

impl ComparisonStatus {
    pub fn is_decided(self) -> bool {
        !matches!(self, ComparisonStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    #[default]
    Pending,
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Error,
    Warning,
}

/// One error-log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub phase: Phase,
    pub kind: EntryKind,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub study_id: String,
    pub domain: String,
    pub current_phase: Phase,
    #[serde(default)]
    pub spec_status: SpecStatus,
    #[serde(default)]
    pub production_status: StepStatus,
    #[serde(default)]
    pub qc_status: StepStatus,
    #[serde(default)]
    pub comparison_result: ComparisonStatus,
    #[serde(default)]
    pub comparison_iteration: u32,
    #[serde(default)]
    pub validation_status: ValidationStatus,
    #[serde(default)]
    pub human_decisions: BTreeMap<String, HumanDecision>,
    #[serde(default)]
    pub artifacts: ArtifactRegistry,
    #[serde(default)]
    pub error_log: Vec<LogEntry>,
    pub updated_at: DateTime<Utc>,
}

fn default_schema_version() -> u32 {
    STATE_SCHEMA_VERSION
}

impl PipelineState {
    /// A fresh record positioned at the first phase.
    pub fn new(study_id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            study_id: study_id.into(),
            domain: domain.into(),
            current_phase: Phase::SpecBuilding,
            spec_status: SpecStatus::Draft,
            production_status: StepStatus::Pending,
            qc_status: StepStatus::Pending,
            comparison_result: ComparisonStatus::Pending,
            comparison_iteration: 0,
            validation_status: ValidationStatus::Pending,
            human_decisions: BTreeMap::new(),
            artifacts: ArtifactRegistry::new(),
            error_log: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Moves to `next` if the transition table allows it.
    ///
    /// The comparison loop-back must go through [`PipelineState::loop_back`]
    /// so the iteration counter stays in step with the phase.
    pub fn advance(&mut self, next: Phase) -> Result<(), TransitionError> {
        let from = self.current_phase;
        if from.is_terminal() {
            return Err(TransitionError::AlreadyComplete);
        }
        if !from.can_transition_to(next) || (from == Phase::Comparison && next == Phase::Production)
        {
            return Err(TransitionError::NotAllowed { from, to: next });
        }
        self.current_phase = next;
        self.touch();
        Ok(())
    }

    /// Re-enters production after a mismatch and starts the next iteration.
    pub fn loop_back(&mut self) -> Result<(), TransitionError> {
        let from = self.current_phase;
        if from != Phase::Comparison {
            return Err(TransitionError::NotAllowed {
                from,
                to: Phase::Production,
            });
        }
        self.current_phase = Phase::Production;
        self.comparison_iteration += 1;
        self.reset_iteration_statuses();
        Ok(())
    }

    /// Rewinds an interrupted loop iteration to its production step.
    ///
    /// The iteration counter is kept; only the in-flight step statuses are
    /// cleared.
    pub fn restart_iteration(&mut self) {
        if self.current_phase.in_comparison_loop() {
            self.current_phase = Phase::Production;
            self.reset_iteration_statuses();
        }
    }

    /// Positions the record at `phase` for a single-stage run.
    pub fn enter(&mut self, phase: Phase) {
        self.current_phase = phase;
        self.touch();
    }

    /// True when a resumed run must redo the current loop iteration.
    pub fn needs_iteration_restart(&self) -> bool {
        self.comparison_iteration > 0
            && self.current_phase.in_comparison_loop()
            && !self.comparison_result.is_decided()
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.push_entry(EntryKind::Error, message.into());
    }

    pub fn record_warning(&mut self, message: impl Into<String>) {
        self.push_entry(EntryKind::Warning, message.into());
    }

    pub fn errors(&self) -> impl Iterator<Item = &LogEntry> {
        self.error_log
            .iter()
            .filter(|entry| entry.kind == EntryKind::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LogEntry> {
        self.error_log
            .iter()
            .filter(|entry| entry.kind == EntryKind::Warning)
    }

    pub fn is_complete(&self) -> bool {
        self.current_phase == Phase::Complete
    }

    /// True when a phase status records a failure that stops the run.
    pub fn has_failed_step(&self) -> bool {
        match self.current_phase {
            Phase::Production => self.production_status == StepStatus::Failed,
            Phase::Qc => self.qc_status == StepStatus::Failed,
            _ => false,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn reset_iteration_statuses(&mut self) {
        self.production_status = StepStatus::Pending;
        self.qc_status = StepStatus::Pending;
        self.comparison_result = ComparisonStatus::Pending;
        self.touch();
    }

    fn push_entry(&mut self, kind: EntryKind, message: String) {
        self.error_log.push(LogEntry {
            phase: self.current_phase,
            kind,
            message,
            recorded_at: Utc::now(),
        });
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_comparison() -> PipelineState {
        let mut state = PipelineState::new("XYZ-2026-001", "DM");
        for phase in [
            Phase::SpecReview,
            Phase::HumanReview,
            Phase::Production,
            Phase::Qc,
            Phase::Comparison,
        ] {
            state.advance(phase).unwrap();
        }
        state
    }

    #[test]
    fn advance_rejects_skips() {
        let mut state = PipelineState::new("XYZ", "DM");
        let err = state.advance(Phase::Production).unwrap_err();
        assert_eq!(
            err,
            TransitionError::NotAllowed {
                from: Phase::SpecBuilding,
                to: Phase::Production
            }
        );
        assert_eq!(state.current_phase, Phase::SpecBuilding);
    }

    #[test]
    fn loop_back_increments_iteration() {
        let mut state = at_comparison();
        state.comparison_result = ComparisonStatus::Mismatch;
        state.production_status = StepStatus::Completed;

        state.loop_back().unwrap();
        assert_eq!(state.current_phase, Phase::Production);
        assert_eq!(state.comparison_iteration, 1);
        assert_eq!(state.comparison_result, ComparisonStatus::Pending);
        assert_eq!(state.production_status, StepStatus::Pending);
    }

    #[test]
    fn loop_back_only_from_comparison() {
        let mut state = PipelineState::new("XYZ", "DM");
        assert!(state.loop_back().is_err());
        assert_eq!(state.comparison_iteration, 0);
    }

    #[test]
    fn advance_does_not_loop_back() {
        let mut state = at_comparison();
        assert!(state.advance(Phase::Production).is_err());
        assert_eq!(state.comparison_iteration, 0);
    }

    #[test]
    fn complete_is_terminal() {
        let mut state = at_comparison();
        state.advance(Phase::Validation).unwrap();
        state.advance(Phase::Complete).unwrap();
        assert!(state.is_complete());
        assert_eq!(
            state.advance(Phase::Validation),
            Err(TransitionError::AlreadyComplete)
        );
    }

    #[test]
    fn interrupted_iteration_restarts_at_production() {
        let mut state = at_comparison();
        state.comparison_result = ComparisonStatus::Mismatch;
        state.loop_back().unwrap();
        state.advance(Phase::Qc).unwrap();
        assert!(state.needs_iteration_restart());

        state.restart_iteration();
        assert_eq!(state.current_phase, Phase::Production);
        assert_eq!(state.comparison_iteration, 1);
    }

    #[test]
    fn error_log_tags_phase_and_kind() {
        let mut state = at_comparison();
        state.record_warning("still mismatched");
        state.record_error("boom");
        assert_eq!(state.error_log.len(), 2);
        assert_eq!(state.warnings().count(), 1);
        assert_eq!(state.errors().next().unwrap().phase, Phase::Comparison);
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "study_id": "XYZ",
            "domain": "DM",
            "current_phase": "comparison",
            "comparison_result": "mismatch",
            "comparison_iteration": 5,
            "updated_at": "2026-01-05T10:00:00Z"
        }"#;
        let state: PipelineState = serde_json::from_str(json).unwrap();
        assert_eq!(state.schema_version, STATE_SCHEMA_VERSION);
        assert_eq!(state.current_phase, Phase::Comparison);
        assert_eq!(state.comparison_iteration, 5);
        assert!(state.error_log.is_empty());
    }
}
