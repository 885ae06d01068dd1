use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use sdtm_core::{
    Collaborators, ConventionDecisions, GeneratorPair, Orchestrator, ProfileSpecBuilder,
    RuleReviewer, RunMode, RunOptions, RunReport, SpecBuilder, StateStore, TemplateSpecBuilder,
};
use sdtm_model::PipelineState;
use sdtm_validate::ReviewRules;

use crate::cli::RunArgs;
use crate::config::Settings;

/// Wires the configured collaborators, generators and runner.
pub fn build_orchestrator(settings: &Settings) -> Result<Orchestrator> {
    let config = settings.pipeline_config()?;
    let builder: Box<dyn SpecBuilder> = match &settings.spec_template {
        Some(path) => Box::new(TemplateSpecBuilder::new(path)),
        None => Box::new(ProfileSpecBuilder::new(&settings.raw_data)),
    };
    let collaborators = Collaborators::new(
        builder,
        Box::new(RuleReviewer::new(ReviewRules::default())),
        Box::new(ConventionDecisions::new(settings.conventions()?)),
    );
    Ok(Orchestrator::new(
        config,
        collaborators,
        GeneratorPair::r_default(),
        Box::new(settings.runner()),
    ))
}

pub fn run_pipeline(config_path: &Path, args: &RunArgs) -> Result<(RunReport, u32)> {
    let settings = Settings::load(config_path)?;
    let orchestrator = build_orchestrator(&settings)?;
    let domain = args.domain.trim().to_uppercase();
    let span = info_span!("run", study_id = %settings.study_id, domain = %domain);
    let _guard = span.enter();
    let start = Instant::now();

    let report = match args.stage {
        Some(phase) => orchestrator
            .run_stage(&domain, phase, args.force)
            .with_context(|| format!("run stage {phase} for {domain}"))?,
        None => {
            let mode = if args.resume {
                RunMode::Resume
            } else {
                RunMode::Fresh
            };
            orchestrator
                .run(
                    &domain,
                    RunOptions {
                        mode,
                        force: args.force,
                    },
                )
                .with_context(|| format!("run pipeline for {domain}"))?
        }
    };
    info!(
        phase = %report.state.current_phase,
        succeeded = report.succeeded(),
        duration_ms = start.elapsed().as_millis(),
        "run finished"
    );
    Ok((report, settings.max_iterations))
}

pub fn load_status(config_path: &Path, domain: &str) -> Result<(Option<PipelineState>, u32)> {
    let settings = Settings::load(config_path)?;
    let domain = domain.trim().to_uppercase();
    let state = StateStore::new(settings.layout())
        .load(&domain)
        .with_context(|| format!("load state for {domain}"))?;
    Ok((state, settings.max_iterations))
}
