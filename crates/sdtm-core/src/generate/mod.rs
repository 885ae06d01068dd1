//! Program generation from an approved specification.
//!
//! A [`GeneratorPair`] holds two independent [`ProgramGenerator`]s. Both are
//! pure functions of the specification and the fixed paths in
//! [`GenerationContext`]; neither sees the other's output. For a correct
//! specification the programs they emit produce equal datasets, while their
//! source deliberately differs in structure.

pub mod derivation;
mod r_production;
mod r_qc;

use std::fmt;
use std::path::{Path, PathBuf};

use sdtm_model::{DatasetFormat, Specification};

use crate::error::GenerateError;

pub use r_production::RProductionGenerator;
pub use r_qc::RQcGenerator;

/// Which side of the double-programming pair a program belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramRole {
    Production,
    Qc,
}

impl fmt::Display for ProgramRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramRole::Production => f.write_str("production"),
            ProgramRole::Qc => f.write_str("qc"),
        }
    }
}

/// Fixed inputs a generated program is allowed to depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    /// Raw source data the program reads.
    pub raw_data: PathBuf,
    /// Where the program must write its dataset.
    pub output_dataset: PathBuf,
    pub format: DatasetFormat,
}

/// Turns a specification into program source text.
pub trait ProgramGenerator: Send + Sync {
    fn generate(
        &self,
        spec: &Specification,
        ctx: &GenerationContext,
    ) -> Result<String, GenerateError>;

    /// Human-readable name for logging.
    fn generator_name(&self) -> &str;
}

pub struct GeneratorPair {
    pub production: Box<dyn ProgramGenerator>,
    pub qc: Box<dyn ProgramGenerator>,
}

impl GeneratorPair {
    pub fn new(production: Box<dyn ProgramGenerator>, qc: Box<dyn ProgramGenerator>) -> Self {
        Self { production, qc }
    }

    /// dplyr production program and base R QC program.
    pub fn r_default() -> Self {
        Self::new(Box::new(RProductionGenerator), Box::new(RQcGenerator))
    }

    pub fn for_role(&self, role: ProgramRole) -> &dyn ProgramGenerator {
        match role {
            ProgramRole::Production => self.production.as_ref(),
            ProgramRole::Qc => self.qc.as_ref(),
        }
    }
}

impl Default for GeneratorPair {
    fn default() -> Self {
        Self::r_default()
    }
}

impl fmt::Debug for GeneratorPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorPair")
            .field("production", &self.production.generator_name())
            .field("qc", &self.qc.generator_name())
            .finish()
    }
}

/// Double-quoted R string literal.
pub(crate) fn r_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// R wants forward slashes, including on Windows.
pub(crate) fn r_path(path: &Path) -> String {
    r_string(&path.to_string_lossy().replace('\\', "/"))
}
