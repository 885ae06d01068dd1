//! Tests for sdtm-model types.

use sdtm_model::artifact::{PRODUCTION_DATASET, QC_DATASET};
use sdtm_model::{
    ComparisonResult, ComparisonStatus, ColumnDiscrepancy, DecisionSource, HumanDecision, Phase,
    PipelineState, SchemaPolicy, SpecStatus, StepStatus,
};

#[test]
fn state_document_preserves_loop_progress() {
    let mut state = PipelineState::new("XYZ-2026-001", "DM");
    state.spec_status = SpecStatus::Approved;
    state.comparison_iteration = 2;
    state.comparison_result = ComparisonStatus::Mismatch;
    state.production_status = StepStatus::Completed;
    state.enter(Phase::Comparison);
    state
        .artifacts
        .register(PRODUCTION_DATASET, "production/datasets/dm.parquet");
    state.artifacts.register(QC_DATASET, "qc/datasets/dm_qc.parquet");
    state.human_decisions.insert(
        "RACE".to_string(),
        HumanDecision {
            choice: "B".to_string(),
            options_shown: vec!["A".to_string(), "B".to_string()],
            source: DecisionSource::ManualOverride,
            rationale: Some("SUPPDM per sponsor standard".to_string()),
        },
    );
    state.record_warning("Still mismatched after 2 iteration(s)");

    let json = serde_json::to_string_pretty(&state).expect("serialize state");
    assert!(json.contains("\"current_phase\": \"comparison\""));
    assert!(json.contains("\"source\": \"manual_override\""));

    let restored: PipelineState = serde_json::from_str(&json).expect("deserialize state");
    assert_eq!(restored, state);
}

#[test]
fn nominal_walk_reaches_complete() {
    let mut state = PipelineState::new("XYZ", "AE");
    let mut phase = state.current_phase;
    while let Some(next) = phase.next_nominal() {
        state.advance(next).expect("nominal transition");
        phase = next;
    }
    assert!(state.is_complete());
    assert_eq!(state.comparison_iteration, 0);
}

#[test]
fn strict_report_names_one_sided_columns() {
    let result = ComparisonResult {
        is_match: false,
        discrepancies: vec![ColumnDiscrepancy {
            column: "SEX".to_string(),
            differing_rows: 1,
        }],
        compared_columns: vec!["USUBJID".to_string(), "SEX".to_string()],
        only_in_left: vec!["AGEU".to_string()],
        only_in_right: Vec::new(),
        left_rows: 3,
        right_rows: 3,
        schema_policy: SchemaPolicy::Strict,
    };
    assert_eq!(
        result.report_lines(),
        vec![
            "SEX: 1 row(s) differ.".to_string(),
            "AGEU: only in first dataset.".to_string(),
        ]
    );
    assert!(result.has_schema_drift());
}
