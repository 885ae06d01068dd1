//! Reading and writing produced datasets.
//!
//! The format is chosen from the file extension: `.csv` or `.parquet`.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use sdtm_model::DatasetFormat;

use crate::atomic::write_bytes_atomic;
use crate::error::{IngestError, Result};

/// Rows sampled when inferring CSV column types.
const INFER_SCHEMA_ROWS: usize = 100;

/// Detects the dataset format from the path's extension.
pub fn format_for_path(path: &Path) -> Option<DatasetFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some(DatasetFormat::Csv),
        "parquet" => Some(DatasetFormat::Parquet),
        _ => None,
    }
}

/// Loads a dataset into a DataFrame.
///
/// A missing file is reported as [`IngestError::FileNotFound`] so callers can
/// distinguish it from a parse failure.
pub fn read_dataset(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let format = format_for_path(path).ok_or_else(|| IngestError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let df = match format {
        DatasetFormat::Csv => read_csv(path)?,
        DatasetFormat::Parquet => read_parquet(path)?,
    };
    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded dataset"
    );
    Ok(df)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| IngestError::Io {
        operation: "open",
        path: path.to_path_buf(),
        source: e,
    })?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| IngestError::ParquetParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Writes a DataFrame in the format implied by the path's extension.
pub fn write_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let format = format_for_path(path).ok_or_else(|| IngestError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let write_err = |e: PolarsError| IngestError::DatasetWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut buffer: Vec<u8> = Vec::new();
    match format {
        DatasetFormat::Csv => {
            CsvWriter::new(&mut buffer)
                .include_header(true)
                .finish(df)
                .map_err(write_err)?;
        }
        DatasetFormat::Parquet => {
            ParquetWriter::new(&mut buffer)
                .finish(df)
                .map_err(write_err)?;
        }
    }
    write_bytes_atomic(path, &buffer)
}
