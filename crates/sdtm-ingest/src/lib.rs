//! Dataset and document I/O.
//!
//! Datasets are read by path into Polars frames; specification documents
//! are JSON. Every write goes through [`atomic`] so a crash never leaves a
//! half-written file behind.

pub mod atomic;
pub mod dataset;
pub mod error;
pub mod spec_io;

pub use atomic::{write_json_atomic, write_text_atomic};
pub use dataset::{read_dataset, write_dataset};
pub use error::{IngestError, Result};
pub use spec_io::{read_spec, write_spec};
