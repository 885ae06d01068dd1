use std::fmt;

use sdtm_ingest::IngestError;
use thiserror::Error;

/// Which input of a comparison failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Production,
    Qc,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Production => f.write_str("production"),
            Side::Qc => f.write_str("qc"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("cannot read {side} dataset: {source}")]
    Read {
        side: Side,
        #[source]
        source: IngestError,
    },
}

pub type Result<T> = std::result::Result<T, CompareError>;
