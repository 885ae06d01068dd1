//! The orchestration loop.
//!
//! Each phase function takes a snapshot of the pipeline state and returns
//! the updated snapshot, the artifacts it wrote and where to go next. The
//! loop is the only place that applies transitions and persists: after a
//! successful phase it registers artifacts, moves to the next phase and
//! saves; after a failed phase it keeps the original snapshot, appends the
//! error, marks the phase failed and saves.

use std::path::{Path, PathBuf};
use std::time::Instant;

use sdtm_compare::{CompareOptions, compare_datasets};
use sdtm_ingest::{IngestError, read_spec, write_json_atomic, write_spec, write_text_atomic};
use sdtm_model::artifact::{
    APPROVED_SPEC, COMPARE_REPORT, DEFINE_METADATA, DRAFT_SPEC, PRODUCTION_DATASET,
    PRODUCTION_SCRIPT, QC_DATASET, QC_SCRIPT, VALIDATION_REPORT, VALIDATION_REPORT_JSON,
};
use sdtm_model::{
    ComparisonStatus, OutputLayout, Phase, PipelineState, SpecStatus, Specification, StepStatus,
    TransitionError, ValidationStatus,
};
use sdtm_report::{
    ComparisonHeader, ValidationDocument, define_metadata, render_comparison_error,
    render_comparison_report, render_validation_report,
};
use sdtm_standards::VocabularyTable;
use sdtm_validate::{ValidationOptions, validate_dataset_file};
use tracing::{error, info, info_span, warn};

use crate::collaborators::Collaborators;
use crate::error::{PipelineError, Result, StateError};
use crate::generate::{GenerationContext, GeneratorPair, ProgramRole};
use crate::runner::ProgramRunner;
use crate::store::StateStore;

/// Default bound on comparison loop-backs.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Everything the loop needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub study_id: String,
    pub layout: OutputLayout,
    /// Raw source data read by the generated programs.
    pub raw_data: PathBuf,
    /// Loop-backs allowed after the first comparison.
    pub max_iterations: u32,
    pub compare: CompareOptions,
    pub validation: ValidationOptions,
    pub vocabulary: VocabularyTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Start from spec building with a new state record.
    Fresh,
    /// Continue from the persisted state record.
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Continue past a failed spec review.
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The pipeline reached `complete`.
    Completed,
    /// A single requested stage finished.
    StageFinished(Phase),
    /// A phase failed; the error is also in the state's error log.
    Stopped { phase: Phase, error: String },
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: PipelineState,
    pub status: RunStatus,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        !matches!(self.status, RunStatus::Stopped { .. })
    }
}

enum PhaseOutcome {
    Advance(Phase),
    LoopBack,
}

/// What a phase function hands back to the loop.
struct PhaseOutput {
    state: PipelineState,
    artifacts: Vec<(&'static str, PathBuf)>,
    outcome: PhaseOutcome,
}

impl PhaseOutput {
    fn advance(state: PipelineState, next: Phase) -> Self {
        Self {
            state,
            artifacts: Vec::new(),
            outcome: PhaseOutcome::Advance(next),
        }
    }

    fn loop_back(state: PipelineState) -> Self {
        Self {
            state,
            artifacts: Vec::new(),
            outcome: PhaseOutcome::LoopBack,
        }
    }

    fn with_artifact(mut self, name: &'static str, path: PathBuf) -> Self {
        self.artifacts.push((name, path));
        self
    }
}

pub struct Orchestrator {
    config: PipelineConfig,
    collaborators: Collaborators,
    generators: GeneratorPair,
    runner: Box<dyn ProgramRunner>,
    store: StateStore,
}

impl Orchestrator {
    pub fn new(
        config: PipelineConfig,
        collaborators: Collaborators,
        generators: GeneratorPair,
        runner: Box<dyn ProgramRunner>,
    ) -> Self {
        let store = StateStore::new(config.layout.clone());
        Self {
            config,
            collaborators,
            generators,
            runner,
            store,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The persisted record for `domain`, if any.
    pub fn status(&self, domain: &str) -> Result<Option<PipelineState>> {
        Ok(self.store.load(domain)?)
    }

    /// Runs the pipeline until it completes or a phase fails.
    pub fn run(&self, domain: &str, options: RunOptions) -> Result<RunReport> {
        let mut state = match options.mode {
            RunMode::Fresh => PipelineState::new(&self.config.study_id, domain.to_uppercase()),
            RunMode::Resume => self.resume_state(domain)?,
        };
        if state.is_complete() {
            info!(domain, "pipeline already complete, nothing to resume");
            return Ok(RunReport {
                state,
                status: RunStatus::Completed,
            });
        }

        self.prepare_layout()?;
        if options.mode == RunMode::Fresh {
            self.store.save(&mut state)?;
        }
        info!(
            study_id = %state.study_id,
            domain = %state.domain,
            phase = %state.current_phase,
            iteration = state.comparison_iteration,
            "starting pipeline"
        );

        while !state.is_complete() {
            if let Some(status) = self.step(&mut state, options.force)? {
                return Ok(RunReport { state, status });
            }
        }
        info!(
            domain = %state.domain,
            iterations = state.comparison_iteration,
            validation = ?state.validation_status,
            "pipeline complete"
        );
        Ok(RunReport {
            state,
            status: RunStatus::Completed,
        })
    }

    /// Runs exactly one phase against the persisted record.
    pub fn run_stage(&self, domain: &str, phase: Phase, force: bool) -> Result<RunReport> {
        if phase.is_terminal() {
            return Err(TransitionError::AlreadyComplete.into());
        }
        let mut state = match self.store.load(domain)? {
            Some(state) => {
                self.check_study(&state, domain)?;
                state
            }
            None => PipelineState::new(&self.config.study_id, domain.to_uppercase()),
        };
        state.enter(phase);
        if phase == Phase::Comparison {
            state.comparison_result = ComparisonStatus::Pending;
        }

        self.prepare_layout()?;
        let status = self
            .step(&mut state, force)?
            .unwrap_or(RunStatus::StageFinished(phase));
        Ok(RunReport { state, status })
    }

    fn resume_state(&self, domain: &str) -> Result<PipelineState> {
        let Some(mut state) = self.store.load(domain)? else {
            info!(domain, "no saved state, starting a fresh run");
            return Ok(PipelineState::new(&self.config.study_id, domain.to_uppercase()));
        };
        self.check_study(&state, domain)?;
        if state.needs_iteration_restart() {
            info!(
                phase = %state.current_phase,
                iteration = state.comparison_iteration,
                "restarting interrupted iteration at production"
            );
            state.restart_iteration();
        } else if state.has_failed_step() {
            info!(phase = %state.current_phase, "retrying failed phase");
        }
        Ok(state)
    }

    fn check_study(&self, state: &PipelineState, domain: &str) -> Result<()> {
        if state.study_id == self.config.study_id {
            return Ok(());
        }
        Err(StateError::Mismatch {
            path: self.store.path(domain),
            found: state.study_id.clone(),
            expected: self.config.study_id.clone(),
        }
        .into())
    }

    fn prepare_layout(&self) -> Result<()> {
        for dir in self.config.layout.directories() {
            std::fs::create_dir_all(&dir).map_err(|source| IngestError::Io {
                operation: "create directory",
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Executes the current phase once and persists the result.
    ///
    /// Returns `Some` when the phase failed. Errors from persistence or from
    /// the transition table propagate.
    fn step(&self, state: &mut PipelineState, force: bool) -> Result<Option<RunStatus>> {
        let phase = state.current_phase;
        let span = info_span!(
            "phase",
            study_id = %state.study_id,
            domain = %state.domain,
            phase = %phase,
            iteration = state.comparison_iteration
        );
        let _guard = span.enter();
        let start = Instant::now();
        info!("phase started");

        match self.execute(phase, state, force) {
            Ok(output) => {
                let PhaseOutput {
                    state: mut next,
                    artifacts,
                    outcome,
                } = output;
                for (name, path) in artifacts {
                    next.artifacts.register(name, path.display().to_string());
                }
                match outcome {
                    PhaseOutcome::Advance(to) => next.advance(to)?,
                    PhaseOutcome::LoopBack => next.loop_back()?,
                }
                self.store.save(&mut next)?;
                info!(
                    next = %next.current_phase,
                    duration_ms = start.elapsed().as_millis(),
                    "phase finished"
                );
                *state = next;
                Ok(None)
            }
            Err(err) => {
                let message = err.to_string();
                error!(error = %message, input_error = err.is_input_error(), "phase failed");
                state.record_error(message.clone());
                match phase {
                    Phase::Production => state.production_status = StepStatus::Failed,
                    Phase::Qc => state.qc_status = StepStatus::Failed,
                    Phase::Validation => state.validation_status = ValidationStatus::Failed,
                    _ => {}
                }
                self.store.save(state)?;
                Ok(Some(RunStatus::Stopped {
                    phase,
                    error: message,
                }))
            }
        }
    }

    fn execute(&self, phase: Phase, state: &PipelineState, force: bool) -> Result<PhaseOutput> {
        match phase {
            Phase::SpecBuilding => self.spec_building(state),
            Phase::SpecReview => self.spec_review(state, force),
            Phase::HumanReview => self.human_review(state),
            Phase::Production => self.program_phase(state, ProgramRole::Production),
            Phase::Qc => self.program_phase(state, ProgramRole::Qc),
            Phase::Comparison => self.comparison(state),
            Phase::Validation => self.validation(state),
            Phase::Complete => Err(TransitionError::AlreadyComplete.into()),
        }
    }

    fn spec_building(&self, state: &PipelineState) -> Result<PhaseOutput> {
        let builder = &self.collaborators.builder;
        let spec = builder.build(&state.study_id, &state.domain)?;
        let path = self.config.layout.draft_spec(&state.domain);
        write_spec(&path, &spec)?;
        info!(
            builder = builder.builder_name(),
            variables = spec.variables.len(),
            decision_points = spec.decision_points().count(),
            "draft specification written"
        );

        let mut next = state.clone();
        next.spec_status = SpecStatus::Draft;
        Ok(PhaseOutput::advance(next, Phase::SpecReview).with_artifact(DRAFT_SPEC, path))
    }

    fn spec_review(&self, state: &PipelineState, force: bool) -> Result<PhaseOutput> {
        let path = self.resolve(state, DRAFT_SPEC, self.config.layout.draft_spec(&state.domain));
        let draft = load_spec(&path, DRAFT_SPEC)?;
        let reviewed = self.collaborators.reviewer.review(&draft);
        write_spec(&path, &reviewed)?;

        let mut next = state.clone();
        if reviewed.review_pass != Some(true) {
            let comments = reviewed.review_comments.join("; ");
            if !force {
                return Err(PipelineError::ReviewFailed {
                    count: reviewed.review_comments.len(),
                    comments,
                });
            }
            warn!(comments = %comments, "spec review failed, continuing because of --force");
            next.record_warning(format!("Spec review failed, forced past: {comments}"));
        }
        next.spec_status = SpecStatus::Reviewed;
        Ok(PhaseOutput::advance(next, Phase::HumanReview).with_artifact(DRAFT_SPEC, path))
    }

    fn human_review(&self, state: &PipelineState) -> Result<PhaseOutput> {
        let draft_path =
            self.resolve(state, DRAFT_SPEC, self.config.layout.draft_spec(&state.domain));
        let mut spec = load_spec(&draft_path, DRAFT_SPEC)?;

        let pending: Vec<String> = spec
            .pending_decisions()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in pending {
            let Some(variable) = spec.variable(&name) else {
                continue;
            };
            let decision = self.collaborators.decisions.decide(variable)?;
            info!(
                variable = %name,
                choice = %decision.choice,
                source = decision.source.as_str(),
                "recorded decision"
            );
            spec.record_decision(name, decision);
        }
        spec.approve();

        let path = self.config.layout.approved_spec(&state.domain);
        write_spec(&path, &spec)?;

        let mut next = state.clone();
        next.human_decisions = spec.human_decisions.clone();
        next.spec_status = SpecStatus::Approved;
        Ok(PhaseOutput::advance(next, Phase::Production).with_artifact(APPROVED_SPEC, path))
    }

    fn program_phase(&self, state: &PipelineState, role: ProgramRole) -> Result<PhaseOutput> {
        let layout = &self.config.layout;
        let domain = &state.domain;
        let (program, dataset, script_name, dataset_name, next_phase) = match role {
            ProgramRole::Production => (
                layout.production_program(domain),
                layout.production_dataset(domain),
                PRODUCTION_SCRIPT,
                PRODUCTION_DATASET,
                Phase::Qc,
            ),
            ProgramRole::Qc => (
                layout.qc_program(domain),
                layout.qc_dataset(domain),
                QC_SCRIPT,
                QC_DATASET,
                Phase::Comparison,
            ),
        };

        let spec = self.approved_spec(state)?;
        let ctx = GenerationContext {
            raw_data: self.config.raw_data.clone(),
            output_dataset: dataset.clone(),
            format: layout.format(),
        };
        let generator = self.generators.for_role(role);
        let source = generator.generate(&spec, &ctx)?;
        write_text_atomic(&program, &source)?;
        info!(
            %role,
            generator = generator.generator_name(),
            program = %program.display(),
            "program generated"
        );

        let outcome = self.runner.run(&program)?;
        if !outcome.succeeded() {
            return Err(PipelineError::ProgramFailed {
                role,
                status: outcome.status_text(),
                diagnostic: outcome.diagnostic(),
            });
        }
        if !dataset.is_file() {
            return Err(PipelineError::MissingInput {
                artifact: dataset_name,
                path: dataset,
            });
        }

        let mut next = state.clone();
        match role {
            ProgramRole::Production => next.production_status = StepStatus::Completed,
            ProgramRole::Qc => next.qc_status = StepStatus::Completed,
        }
        Ok(PhaseOutput::advance(next, next_phase)
            .with_artifact(script_name, program)
            .with_artifact(dataset_name, dataset))
    }

    fn comparison(&self, state: &PipelineState) -> Result<PhaseOutput> {
        let mut next = state.clone();
        let mut report_path = None;

        if !state.comparison_result.is_decided() {
            let layout = &self.config.layout;
            let domain = &state.domain;
            let production =
                self.resolve(state, PRODUCTION_DATASET, layout.production_dataset(domain));
            let qc = self.resolve(state, QC_DATASET, layout.qc_dataset(domain));
            let path = layout.compare_report(domain);

            let result = match compare_datasets(&production, &qc, &self.config.compare) {
                Ok(result) => result,
                Err(err) => {
                    write_text_atomic(&path, &render_comparison_error(&err))?;
                    return Err(err.into());
                }
            };
            let header = ComparisonHeader {
                domain: domain.clone(),
                iteration: state.comparison_iteration,
                key_column: self.config.compare.key_column.clone(),
            };
            write_text_atomic(&path, &render_comparison_report(&header, &result))?;
            report_path = Some(path);

            next.comparison_result = if result.is_match {
                ComparisonStatus::Match
            } else {
                ComparisonStatus::Mismatch
            };
            info!(
                is_match = result.is_match,
                flagged = ?result.flagged_columns(),
                "comparison finished"
            );
        }

        let output = match next.comparison_result {
            ComparisonStatus::Mismatch if next.comparison_iteration < self.config.max_iterations => {
                info!(
                    iteration = next.comparison_iteration + 1,
                    max_iterations = self.config.max_iterations,
                    "mismatch, regenerating both programs"
                );
                PhaseOutput::loop_back(next)
            }
            ComparisonStatus::Mismatch => {
                let message = format!(
                    "Comparison still mismatched after {} iteration(s); proceeding to validation",
                    next.comparison_iteration
                );
                warn!(iteration = next.comparison_iteration, "{message}");
                next.record_warning(message);
                PhaseOutput::advance(next, Phase::Validation)
            }
            _ => PhaseOutput::advance(next, Phase::Validation),
        };
        Ok(match report_path {
            Some(path) => output.with_artifact(COMPARE_REPORT, path),
            None => output,
        })
    }

    fn validation(&self, state: &PipelineState) -> Result<PhaseOutput> {
        let layout = &self.config.layout;
        let domain = &state.domain;
        let spec = self.approved_spec(state)?;
        let dataset = self.resolve(state, PRODUCTION_DATASET, layout.production_dataset(domain));

        let report = validate_dataset_file(
            &dataset,
            &spec,
            &self.config.vocabulary,
            &self.config.validation,
        );
        let text_path = layout.validation_report_text(domain);
        let json_path = layout.validation_report_json(domain);
        let define_path = layout.define_metadata(domain);
        write_text_atomic(&text_path, &render_validation_report(&report))?;
        write_json_atomic(&define_path, &define_metadata(&spec))?;

        let mut next = state.clone();
        next.validation_status = if report.pass {
            info!(checks = report.checks.len(), "validation passed");
            ValidationStatus::Passed
        } else {
            warn!(issues = report.issues.len(), "validation failed");
            ValidationStatus::Failed
        };
        let document = ValidationDocument {
            study_id: state.study_id.clone(),
            domain: domain.clone(),
            vocabulary_version: self.config.vocabulary.version().to_string(),
            report,
        };
        write_json_atomic(&json_path, &document)?;

        Ok(PhaseOutput::advance(next, Phase::Complete)
            .with_artifact(VALIDATION_REPORT, text_path)
            .with_artifact(VALIDATION_REPORT_JSON, json_path)
            .with_artifact(DEFINE_METADATA, define_path))
    }

    fn approved_spec(&self, state: &PipelineState) -> Result<Specification> {
        let path = self.resolve(
            state,
            APPROVED_SPEC,
            self.config.layout.approved_spec(&state.domain),
        );
        load_spec(&path, APPROVED_SPEC)
    }

    /// Registry location when its file still exists, else `conventional`.
    fn resolve(&self, state: &PipelineState, name: &str, conventional: PathBuf) -> PathBuf {
        match state.artifacts.get(name).map(Path::new) {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(path) => {
                warn!(
                    artifact = name,
                    registered = %path.display(),
                    fallback = %conventional.display(),
                    "registered artifact is missing, using conventional location"
                );
                conventional
            }
            None => conventional,
        }
    }
}

fn load_spec(path: &Path, artifact: &'static str) -> Result<Specification> {
    read_spec(path).map_err(|err| match err {
        IngestError::FileNotFound { path } => PipelineError::MissingInput { artifact, path },
        other => other.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_runs_are_not_successful() {
        let report = RunReport {
            state: PipelineState::new("XYZ", "DM"),
            status: RunStatus::Stopped {
                phase: Phase::Qc,
                error: "qc program failed (exit code 1): boom".to_string(),
            },
        };
        assert!(!report.succeeded());
        let done = RunReport {
            status: RunStatus::StageFinished(Phase::Comparison),
            ..report
        };
        assert!(done.succeeded());
    }
}
