//! Registry of artifacts produced by pipeline phases.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DRAFT_SPEC: &str = "draft_spec";
pub const APPROVED_SPEC: &str = "approved_spec";
pub const PRODUCTION_SCRIPT: &str = "production_script";
pub const PRODUCTION_DATASET: &str = "production_dataset";
pub const QC_SCRIPT: &str = "qc_script";
pub const QC_DATASET: &str = "qc_dataset";
pub const COMPARE_REPORT: &str = "compare_report";
pub const VALIDATION_REPORT: &str = "validation_report";
pub const VALIDATION_REPORT_JSON: &str = "validation_report_json";
pub const DEFINE_METADATA: &str = "define_metadata";

/// Logical artifact name to storage location.
///
/// Entries are only ever added or refreshed; nothing is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRegistry {
    entries: BTreeMap<String, String>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, location: impl Into<String>) {
        self.entries.insert(name.into(), location.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, location)| (name.as_str(), location.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_refreshes_location() {
        let mut registry = ArtifactRegistry::new();
        registry.register(QC_DATASET, "qc/datasets/dm_qc.csv");
        registry.register(QC_DATASET, "qc/datasets/dm_qc.parquet");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(QC_DATASET), Some("qc/datasets/dm_qc.parquet"));
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut registry = ArtifactRegistry::new();
        registry.register(DRAFT_SPEC, "specs/dm_mapping_spec.json");
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(json, r#"{"draft_spec":"specs/dm_mapping_spec.json"}"#);
    }
}
