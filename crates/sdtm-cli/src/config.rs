//! `sdtm-dual.toml` loading.
//!
//! Relative paths in the file resolve against `project_root`, which itself
//! resolves against the directory holding the config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use sdtm_compare::CompareOptions;
use sdtm_core::{DEFAULT_MAX_ITERATIONS, DEFAULT_TIMEOUT, PipelineConfig, ProcessRunner};
use sdtm_model::{DatasetFormat, OutputLayout, SchemaPolicy};
use sdtm_standards::{Conventions, VocabularyTable, load_conventions, load_vocabulary};
use sdtm_validate::ValidationOptions;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub study_id: String,
    #[serde(default)]
    pub project_root: Option<PathBuf>,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    pub raw_data: PathBuf,
    /// Prepared specification used instead of profiling the raw data.
    #[serde(default)]
    pub spec_template: Option<PathBuf>,
    #[serde(default)]
    pub conventions: ConventionPaths,
    /// CT CSV export; the built-in table is used when absent.
    #[serde(default)]
    pub vocabulary: Option<PathBuf>,
    #[serde(default)]
    pub interpreter: InterpreterSection,
    #[serde(default)]
    pub output_format: DatasetFormat,
    pub comparison: ComparisonSection,
    #[serde(default)]
    pub validation: ValidationSection,
    #[serde(default)]
    pub runner: RunnerSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConventionPaths {
    pub standard: Option<PathBuf>,
    pub study: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterpreterSection {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for InterpreterSection {
    fn default() -> Self {
        Self {
            program: "Rscript".to_string(),
            args: vec!["--vanilla".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonSection {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Row alignment key; an empty string compares in stored order.
    #[serde(default = "default_key_column")]
    pub key_column: String,
    pub schema_policy: SchemaPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationSection {
    pub subject_id_field: String,
    pub strict_types: bool,
}

impl Default for ValidationSection {
    fn default() -> Self {
        let defaults = ValidationOptions::default();
        Self {
            subject_id_field: defaults.subject_id_field,
            strict_types: defaults.strict_types,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerSection {
    pub timeout_secs: u64,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_key_column() -> String {
    "USUBJID".to_string()
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Resolves every path against `config_dir`.
    pub fn resolve(self, config_dir: &Path) -> Settings {
        let project_root = match self.project_root {
            Some(root) => join(config_dir, &root),
            None => config_dir.to_path_buf(),
        };
        let resolve = |path: &Path| join(&project_root, path);
        let key_column = Some(self.comparison.key_column.trim().to_string())
            .filter(|key| !key.is_empty());
        Settings {
            study_id: self.study_id,
            output_root: resolve(&self.output_root),
            raw_data: resolve(&self.raw_data),
            spec_template: self.spec_template.as_deref().map(resolve),
            standard_conventions: self.conventions.standard.as_deref().map(resolve),
            study_conventions: self.conventions.study.as_deref().map(resolve),
            vocabulary: self.vocabulary.as_deref().map(resolve),
            interpreter: self.interpreter,
            output_format: self.output_format,
            max_iterations: self.comparison.max_iterations,
            key_column,
            schema_policy: self.comparison.schema_policy,
            validation: ValidationOptions {
                subject_id_field: self.validation.subject_id_field,
                strict_types: self.validation.strict_types,
            },
            timeout: Duration::from_secs(self.runner.timeout_secs),
            project_root,
        }
    }
}

fn join(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// A configuration with every path made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub study_id: String,
    pub project_root: PathBuf,
    pub output_root: PathBuf,
    pub raw_data: PathBuf,
    pub spec_template: Option<PathBuf>,
    pub standard_conventions: Option<PathBuf>,
    pub study_conventions: Option<PathBuf>,
    pub vocabulary: Option<PathBuf>,
    pub interpreter: InterpreterSection,
    pub output_format: DatasetFormat,
    pub max_iterations: u32,
    pub key_column: Option<String>,
    pub schema_policy: SchemaPolicy,
    pub validation: ValidationOptions,
    pub timeout: Duration,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = ConfigFile::from_path(path)?;
        let config_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(file.resolve(&config_dir))
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_root, self.output_format)
    }

    pub fn compare_options(&self) -> CompareOptions {
        let options = CompareOptions::new(self.schema_policy);
        match &self.key_column {
            Some(key) => options.with_key(key.clone()),
            None => options,
        }
    }

    pub fn vocabulary_table(&self) -> Result<VocabularyTable> {
        match &self.vocabulary {
            Some(path) => load_vocabulary(path)
                .with_context(|| format!("load vocabulary {}", path.display())),
            None => Ok(VocabularyTable::builtin()),
        }
    }

    pub fn conventions(&self) -> Result<Conventions> {
        load_conventions(
            self.standard_conventions.as_deref(),
            self.study_conventions.as_deref(),
        )
        .context("load conventions")
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        Ok(PipelineConfig {
            study_id: self.study_id.clone(),
            layout: self.layout(),
            raw_data: self.raw_data.clone(),
            max_iterations: self.max_iterations,
            compare: self.compare_options(),
            validation: self.validation.clone(),
            vocabulary: self.vocabulary_table()?,
        })
    }

    pub fn runner(&self) -> ProcessRunner {
        ProcessRunner::new(self.interpreter.program.clone(), &self.project_root)
            .with_args(self.interpreter.args.iter().cloned())
            .with_timeout(self.timeout)
    }
}
