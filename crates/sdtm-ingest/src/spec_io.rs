//! Specification documents on disk.

use std::fs;
use std::path::Path;

use sdtm_model::Specification;

use crate::atomic::write_json_atomic;
use crate::error::{IngestError, Result};

pub fn read_spec(path: &Path) -> Result<Specification> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_spec(path: &Path, spec: &Specification) -> Result<()> {
    write_json_atomic(path, spec)?;
    tracing::info!(
        domain = %spec.domain,
        variables = spec.variables.len(),
        approved = spec.approved,
        "wrote specification to {}",
        path.display()
    );
    Ok(())
}
