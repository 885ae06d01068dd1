//! Error types for dataset and document I/O.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Input file does not exist.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temp file was written but could not replace the target.
    #[error("failed to move {temp_path} over {target_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported dataset format for {path} (expected .csv or .parquet)")]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    #[error("failed to read Parquet {path}: {message}")]
    ParquetParse { path: PathBuf, message: String },

    #[error("failed to write dataset {path}: {message}")]
    DatasetWrite { path: PathBuf, message: String },

    #[error("invalid JSON document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/out/production/datasets/dm.parquet"),
        };
        assert_eq!(
            err.to_string(),
            "file not found: /out/production/datasets/dm.parquet"
        );
    }
}
