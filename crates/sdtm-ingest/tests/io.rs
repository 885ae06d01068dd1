//! Round trips through the filesystem for datasets and specifications.

use polars::prelude::*;
use sdtm_ingest::{IngestError, read_dataset, read_spec, write_dataset, write_spec};
use sdtm_model::{Specification, VariableSpec, VariableType};
use tempfile::tempdir;

fn dm_frame() -> DataFrame {
    DataFrame::new(vec![
        Series::new("USUBJID".into(), vec!["XYZ-001", "XYZ-002"]).into(),
        Series::new("AGE".into(), vec![Some(34.0), None]).into(),
        Series::new("SEX".into(), vec!["F", "M"]).into(),
    ])
    .unwrap()
}

#[test]
fn parquet_keeps_types_and_nulls() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("production").join("datasets").join("dm.parquet");

    let mut df = dm_frame();
    write_dataset(&mut df, &path).unwrap();
    let loaded = read_dataset(&path).unwrap();

    assert_eq!(loaded.shape(), (2, 3));
    assert_eq!(loaded.column("AGE").unwrap().dtype(), &DataType::Float64);
    assert_eq!(loaded.column("AGE").unwrap().null_count(), 1);
}

#[test]
fn csv_preserves_column_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dm_qc.csv");

    let mut df = dm_frame();
    write_dataset(&mut df, &path).unwrap();
    let loaded = read_dataset(&path).unwrap();

    let names: Vec<String> = loaded
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, vec!["USUBJID", "AGE", "SEX"]);
}

#[test]
fn spec_document_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("specs").join("dm_mapping_spec.json");

    let spec = Specification::new(
        "XYZ-2026-001",
        "DM",
        vec![
            VariableSpec::new("USUBJID", VariableType::Char)
                .with_logic("STUDYID || '-' || SUBJID"),
            VariableSpec::new("SEX", VariableType::Char)
                .with_source("GENDER")
                .with_codelist("C66731"),
        ],
    );
    write_spec(&path, &spec).unwrap();
    assert_eq!(read_spec(&path).unwrap(), spec);
}

#[test]
fn missing_spec_is_file_not_found() {
    let dir = tempdir().unwrap();
    let err = read_spec(&dir.path().join("dm_mapping_spec_approved.json")).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn malformed_spec_is_json_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dm_mapping_spec.json");
    std::fs::write(&path, "{\"study_id\": ").unwrap();
    assert!(matches!(read_spec(&path).unwrap_err(), IngestError::Json { .. }));
}
