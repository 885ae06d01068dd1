//! Comparator for double-programmed datasets.
//!
//! Two datasets match when every common column agrees cell by cell after
//! value normalization. Rows are aligned by the key column when both sides
//! have it.

pub mod compare;
pub mod error;

pub use compare::{CompareOptions, compare_datasets, compare_frames};
pub use error::{CompareError, Result, Side};
