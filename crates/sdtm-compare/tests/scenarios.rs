//! File-level comparisons of production and QC outputs.

use std::path::Path;

use polars::prelude::*;
use sdtm_compare::{CompareError, CompareOptions, Side, compare_datasets};
use sdtm_ingest::write_dataset;
use sdtm_model::SchemaPolicy;
use tempfile::tempdir;

fn write(path: &Path, sex: [&str; 3]) {
    let mut df = DataFrame::new(vec![
        Series::new("USUBJID".into(), vec!["XYZ-001", "XYZ-002", "XYZ-003"]).into(),
        Series::new("AGE".into(), vec![34i64, 57, 41]).into(),
        Series::new("SEX".into(), sex.to_vec()).into(),
    ])
    .unwrap();
    write_dataset(&mut df, path).unwrap();
}

fn options() -> CompareOptions {
    CompareOptions::new(SchemaPolicy::Intersection).with_key("USUBJID")
}

#[test]
fn identical_datasets_match_with_empty_report() {
    let dir = tempdir().unwrap();
    let production = dir.path().join("dm.parquet");
    let qc = dir.path().join("dm_qc.parquet");
    write(&production, ["F", "M", "F"]);
    write(&qc, ["F", "M", "F"]);

    let result = compare_datasets(&production, &qc, &options()).unwrap();
    assert!(result.is_match);
    assert!(result.report_lines().is_empty());
}

#[test]
fn single_sex_difference_is_reported() {
    let dir = tempdir().unwrap();
    let production = dir.path().join("dm.csv");
    let qc = dir.path().join("dm_qc.parquet");
    write(&production, ["F", "M", "F"]);
    write(&qc, ["F", "F", "F"]);

    let result = compare_datasets(&production, &qc, &options()).unwrap();
    assert!(!result.is_match);
    assert_eq!(result.report_lines(), vec!["SEX: 1 row(s) differ.".to_string()]);
}

#[test]
fn unreadable_qc_dataset_is_an_error() {
    let dir = tempdir().unwrap();
    let production = dir.path().join("dm.csv");
    write(&production, ["F", "M", "F"]);

    let err = compare_datasets(&production, &dir.path().join("dm_qc.csv"), &options()).unwrap_err();
    assert!(matches!(err, CompareError::Read { side: Side::Qc, .. }));
}
