//! Conventional on-disk locations for every pipeline artifact.
//!
//! ```text
//! <root>/
//!   specs/                 <dom>_mapping_spec.json, <dom>_mapping_spec_approved.json
//!   production/programs/   <dom>_production.R
//!   production/datasets/   <dom>.<ext>
//!   qc/programs/           <dom>_qc.R
//!   qc/datasets/           <dom>_qc.<ext>
//!   compare/               <dom>_compare_report.txt
//!   validation/            <dom>_validation_report.{txt,json}, <dom>_define_metadata.json
//!   state/                 <dom>_pipeline_state.json
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Storage format of produced datasets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    #[default]
    Parquet,
    Csv,
}

impl DatasetFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DatasetFormat::Parquet => "parquet",
            DatasetFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    format: DatasetFormat,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, format: DatasetFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> DatasetFormat {
        self.format
    }

    pub fn specs_dir(&self) -> PathBuf {
        self.root.join("specs")
    }

    pub fn production_programs_dir(&self) -> PathBuf {
        self.root.join("production").join("programs")
    }

    pub fn production_datasets_dir(&self) -> PathBuf {
        self.root.join("production").join("datasets")
    }

    pub fn qc_programs_dir(&self) -> PathBuf {
        self.root.join("qc").join("programs")
    }

    pub fn qc_datasets_dir(&self) -> PathBuf {
        self.root.join("qc").join("datasets")
    }

    pub fn compare_dir(&self) -> PathBuf {
        self.root.join("compare")
    }

    pub fn validation_dir(&self) -> PathBuf {
        self.root.join("validation")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    /// Every directory the pipeline writes into.
    pub fn directories(&self) -> Vec<PathBuf> {
        vec![
            self.specs_dir(),
            self.production_programs_dir(),
            self.production_datasets_dir(),
            self.qc_programs_dir(),
            self.qc_datasets_dir(),
            self.compare_dir(),
            self.validation_dir(),
            self.state_dir(),
        ]
    }

    pub fn draft_spec(&self, domain: &str) -> PathBuf {
        self.specs_dir()
            .join(format!("{}_mapping_spec.json", stem(domain)))
    }

    pub fn approved_spec(&self, domain: &str) -> PathBuf {
        self.specs_dir()
            .join(format!("{}_mapping_spec_approved.json", stem(domain)))
    }

    pub fn production_program(&self, domain: &str) -> PathBuf {
        self.production_programs_dir()
            .join(format!("{}_production.R", stem(domain)))
    }

    pub fn production_dataset(&self, domain: &str) -> PathBuf {
        self.production_datasets_dir()
            .join(format!("{}.{}", stem(domain), self.format.extension()))
    }

    pub fn qc_program(&self, domain: &str) -> PathBuf {
        self.qc_programs_dir()
            .join(format!("{}_qc.R", stem(domain)))
    }

    pub fn qc_dataset(&self, domain: &str) -> PathBuf {
        self.qc_datasets_dir()
            .join(format!("{}_qc.{}", stem(domain), self.format.extension()))
    }

    pub fn compare_report(&self, domain: &str) -> PathBuf {
        self.compare_dir()
            .join(format!("{}_compare_report.txt", stem(domain)))
    }

    pub fn validation_report_text(&self, domain: &str) -> PathBuf {
        self.validation_dir()
            .join(format!("{}_validation_report.txt", stem(domain)))
    }

    pub fn validation_report_json(&self, domain: &str) -> PathBuf {
        self.validation_dir()
            .join(format!("{}_validation_report.json", stem(domain)))
    }

    pub fn define_metadata(&self, domain: &str) -> PathBuf {
        self.validation_dir()
            .join(format!("{}_define_metadata.json", stem(domain)))
    }

    pub fn state_file(&self, domain: &str) -> PathBuf {
        self.state_dir()
            .join(format!("{}_pipeline_state.json", stem(domain)))
    }
}

fn stem(domain: &str) -> String {
    domain.trim().to_lowercase()
}
