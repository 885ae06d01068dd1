//! Versioned controlled-vocabulary table.
//!
//! The validator never fetches terminology; callers hand it a
//! [`VocabularyTable`] built either from the built-in subset or from a CT
//! CSV export.
//!
//! CSV layout follows the NCI CT export:
//! - codelist rows have a blank `Codelist Code` and carry the codelist's NCI
//!   code in `Code`
//! - term rows carry the parent codelist in `Codelist Code` and the allowed
//!   value in `CDISC Submission Value`

#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{Result, StandardsError};
use crate::hash::sha256_hex;

/// Version label of the compiled-in table.
pub const BUILTIN_VERSION: &str = "builtin-1";

const BUILTIN_CODELISTS: &[(&str, &str, &[&str])] = &[
    ("C66731", "Sex", &["M", "F", "U"]),
    (
        "C74457",
        "Race",
        &[
            "WHITE",
            "BLACK OR AFRICAN AMERICAN",
            "ASIAN",
            "AMERICAN INDIAN OR ALASKA NATIVE",
            "NATIVE HAWAIIAN OR OTHER PACIFIC ISLANDER",
            "OTHER",
            "MULTIPLE",
        ],
    ),
    (
        "C66790",
        "Ethnic Group",
        &[
            "HISPANIC OR LATINO",
            "NOT HISPANIC OR LATINO",
            "NOT REPORTED",
            "UNKNOWN",
        ],
    ),
    (
        "C71113",
        "Country",
        &[
            "USA",
            "CANADA",
            "UNITED KINGDOM",
            "MEXICO",
            "GERMANY",
            "FRANCE",
            "JAPAN",
            "CHINA",
            "INDIA",
        ],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codelist {
    pub code: String,
    pub name: String,
    values: BTreeSet<String>,
}

impl Codelist {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            values: BTreeSet::new(),
        }
    }

    pub fn add_value(&mut self, value: impl Into<String>) {
        self.values.insert(value.into());
    }

    /// Exact match on the submission value.
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Codelists keyed by upper-cased NCI code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyTable {
    version: String,
    codelists: BTreeMap<String, Codelist>,
}

impl VocabularyTable {
    pub fn empty(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            codelists: BTreeMap::new(),
        }
    }

    /// Sex, race, ethnicity and a country subset.
    pub fn builtin() -> Self {
        let mut table = Self::empty(BUILTIN_VERSION);
        for (code, name, values) in BUILTIN_CODELISTS {
            let mut codelist = Codelist::new(*code, *name);
            for value in *values {
                codelist.add_value(*value);
            }
            table.insert(codelist);
        }
        table
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn insert(&mut self, codelist: Codelist) {
        self.codelists
            .insert(codelist.code.to_uppercase(), codelist);
    }

    pub fn get(&self, code: &str) -> Option<&Codelist> {
        self.codelists.get(&code.trim().to_uppercase())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codelists.values().map(|codelist| codelist.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.codelists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codelists.is_empty()
    }
}

/// Loads a vocabulary table from a CT CSV export.
///
/// The table version is `<file name>@<first 12 hex digits of sha256>`, so two
/// runs against the same bytes report the same version.
pub fn load_vocabulary(path: &Path) -> Result<VocabularyTable> {
    let bytes = std::fs::read(path).map_err(|e| StandardsError::io(path, e))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("vocabulary");
    let digest = sha256_hex(&bytes);
    let version = format!("{file_name}@{}", &digest[..12]);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());
    let csv_err = |e: csv::Error| StandardsError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_matches('\u{feff}').to_string())
        .collect();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| StandardsError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let code_idx = column("Code")?;
    let parent_idx = column("Codelist Code")?;
    let value_idx = column("CDISC Submission Value")?;
    let name_idx = column("Codelist Name").ok();

    let mut definitions: BTreeMap<String, Codelist> = BTreeMap::new();
    let mut terms: Vec<(String, String)> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
        let parent = field(parent_idx);
        if parent.is_empty() {
            let code = field(code_idx);
            if !code.is_empty() {
                let name = name_idx.map(field).unwrap_or_default();
                definitions.insert(code.to_uppercase(), Codelist::new(code, name));
            }
        } else {
            let value = field(value_idx);
            if !value.is_empty() {
                terms.push((parent.to_uppercase(), value));
            }
        }
    }

    let mut orphaned = 0usize;
    for (parent, value) in terms {
        match definitions.get_mut(&parent) {
            Some(codelist) => codelist.add_value(value),
            None => orphaned += 1,
        }
    }
    if orphaned > 0 {
        tracing::warn!(
            path = %path.display(),
            orphaned,
            "skipped terms whose codelist is not defined"
        );
    }

    let mut table = VocabularyTable::empty(version);
    for codelist in definitions.into_values() {
        table.insert(codelist);
    }
    tracing::info!(
        path = %path.display(),
        version = table.version(),
        codelists = table.len(),
        "loaded controlled vocabulary"
    );
    Ok(table)
}
