//! Pre-configured answers for human-review decision points.
//!
//! Conventions come in two tiers: a company standard and a per-study file.
//! A study entry replaces the standard entry for the same variable.
//!
//! ```toml
//! [decisions.RACE]
//! approach = "B"
//! rationale = "Multiple races go to SUPPDM per sponsor standard"
//! ```

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, StandardsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConventionTier {
    Standard,
    Study,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convention {
    pub variable: String,
    pub approach: String,
    pub rationale: String,
    pub tier: ConventionTier,
    /// Study entry that replaced a standard entry.
    pub overridden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conventions {
    decisions: BTreeMap<String, Convention>,
}

#[derive(Debug, Default, Deserialize)]
struct ConventionsFile {
    #[serde(default)]
    decisions: BTreeMap<String, DecisionEntry>,
}

#[derive(Debug, Deserialize)]
struct DecisionEntry {
    approach: String,
    #[serde(default)]
    rationale: String,
}

impl Conventions {
    /// Looks up a variable, case-insensitively.
    pub fn get(&self, variable: &str) -> Option<&Convention> {
        self.decisions.get(&variable.to_uppercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Convention> {
        self.decisions.values()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn insert(&mut self, convention: Convention) {
        self.decisions
            .insert(convention.variable.to_uppercase(), convention);
    }

    fn merge_tier(&mut self, file: ConventionsFile, tier: ConventionTier) {
        for (variable, entry) in file.decisions {
            let overridden = tier == ConventionTier::Study
                && self
                    .get(&variable)
                    .is_some_and(|existing| existing.tier == ConventionTier::Standard);
            self.insert(Convention {
                variable,
                approach: entry.approach,
                rationale: entry.rationale,
                tier,
                overridden,
            });
        }
    }
}

/// Loads and merges the standard and study tiers.
///
/// A tier whose file does not exist contributes nothing.
pub fn load_conventions(standard: Option<&Path>, study: Option<&Path>) -> Result<Conventions> {
    let mut conventions = Conventions::default();
    if let Some(file) = standard.map(read_tier).transpose()?.flatten() {
        conventions.merge_tier(file, ConventionTier::Standard);
    }
    if let Some(file) = study.map(read_tier).transpose()?.flatten() {
        conventions.merge_tier(file, ConventionTier::Study);
    }
    tracing::debug!(decisions = conventions.len(), "loaded conventions");
    Ok(conventions)
}

fn read_tier(path: &Path) -> Result<Option<ConventionsFile>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "conventions file not found, skipping");
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
    let file = toml::from_str(&text).map_err(|source| StandardsError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn study_tier_overrides_standard() {
        let dir = tempdir().unwrap();
        let standard = dir.path().join("standard.toml");
        let study = dir.path().join("study.toml");
        std::fs::write(
            &standard,
            "[decisions.RACE]\napproach = \"A\"\nrationale = \"company default\"\n\n\
             [decisions.RFSTDTC]\napproach = \"first_dose\"\n",
        )
        .unwrap();
        std::fs::write(
            &study,
            "[decisions.RACE]\napproach = \"B\"\nrationale = \"study protocol\"\n",
        )
        .unwrap();

        let conventions = load_conventions(Some(&standard), Some(&study)).unwrap();
        let race = conventions.get("race").unwrap();
        assert_eq!(race.approach, "B");
        assert_eq!(race.tier, ConventionTier::Study);
        assert!(race.overridden);

        let rfstdtc = conventions.get("RFSTDTC").unwrap();
        assert_eq!(rfstdtc.tier, ConventionTier::Standard);
        assert!(rfstdtc.rationale.is_empty());
    }

    #[test]
    fn missing_tiers_are_empty() {
        let dir = tempdir().unwrap();
        let conventions =
            load_conventions(Some(&dir.path().join("absent.toml")), None).unwrap();
        assert!(conventions.is_empty());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("standard.toml");
        std::fs::write(&path, "[decisions.RACE]\nrationale = 3\n").unwrap();
        assert!(matches!(
            load_conventions(Some(&path), None),
            Err(StandardsError::Toml { .. })
        ));
    }
}
