//! End-to-end command tests against a temporary study directory.

use std::path::{Path, PathBuf};

use sdtm_cli::cli::RunArgs;
use sdtm_cli::commands::{load_status, run_pipeline};
use sdtm_core::RunStatus;
use sdtm_model::{Phase, SpecStatus, StepStatus};
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

const RAW_DM: &str = "SUBJID,SITEID,BRTHDT,RFSTDTC,SEX,RACE,ETHNIC,ARMCD,ARM,COUNTRY\n\
                      1001,01,1980-04-12,2026-01-15,F,WHITE,NOT HISPANIC OR LATINO,PBO,Placebo,USA\n";

fn study(interpreter: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/raw_dm.csv"), RAW_DM).unwrap();
    let config = format!(
        r#"
study_id = "XYZ-2026-001"
raw_data = "data/raw_dm.csv"
output_format = "csv"

[interpreter]
program = "{interpreter}"
args = []

[comparison]
max_iterations = 1
schema_policy = "intersection"

[runner]
timeout_secs = 30
"#
    );
    let path = dir.path().join("sdtm-dual.toml");
    std::fs::write(&path, config).unwrap();
    (dir, path)
}

fn stage(phase: Phase) -> RunArgs {
    RunArgs {
        domain: "dm".to_string(),
        stage: Some(phase),
        resume: false,
        force: false,
    }
}

fn full_run() -> RunArgs {
    RunArgs {
        domain: "DM".to_string(),
        stage: None,
        resume: false,
        force: false,
    }
}

fn output(dir: &Path) -> PathBuf {
    dir.join("output")
}

// ============================================================================
// Stages
// ============================================================================

#[test]
fn spec_stages_persist_state_between_invocations() {
    let (dir, config) = study("true");

    let (report, _) = run_pipeline(&config, &stage(Phase::SpecBuilding)).unwrap();
    assert_eq!(report.status, RunStatus::StageFinished(Phase::SpecBuilding));
    assert!(output(dir.path()).join("specs/dm_mapping_spec.json").exists());

    run_pipeline(&config, &stage(Phase::SpecReview)).unwrap();
    let (report, _) = run_pipeline(&config, &stage(Phase::HumanReview)).unwrap();
    assert!(report.succeeded());
    assert!(
        output(dir.path())
            .join("specs/dm_mapping_spec_approved.json")
            .exists()
    );

    let (state, max_iterations) = load_status(&config, "DM").unwrap();
    let state = state.unwrap();
    assert_eq!(max_iterations, 1);
    assert_eq!(state.current_phase, Phase::Production);
    assert_eq!(state.spec_status, SpecStatus::Approved);
    assert_eq!(state.human_decisions.len(), 3);
}

// ============================================================================
// Failures
// ============================================================================

#[cfg(unix)]
#[test]
fn failing_interpreter_stops_at_production() {
    let (_dir, config) = study("false");

    let (report, _) = run_pipeline(&config, &full_run()).unwrap();
    assert!(!report.succeeded());
    match &report.status {
        RunStatus::Stopped { phase, error } => {
            assert_eq!(*phase, Phase::Production);
            assert!(error.contains("production program failed"), "{error}");
        }
        other => panic!("unexpected status {other:?}"),
    }

    let (state, _) = load_status(&config, "dm").unwrap();
    let state = state.unwrap();
    assert_eq!(state.production_status, StepStatus::Failed);
    assert_eq!(state.errors().count(), 1);
    assert!(state.artifacts.contains("approved_spec"));
}

#[test]
fn status_without_saved_state_is_empty() {
    let (_dir, config) = study("true");
    let (state, _) = load_status(&config, "AE").unwrap();
    assert!(state.is_none());
}

#[test]
fn missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = run_pipeline(&dir.path().join("nope.toml"), &full_run()).unwrap_err();
    assert!(format!("{error:#}").contains("nope.toml"));
}
