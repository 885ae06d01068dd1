//! Shared utilities for SDTM crates.
//!
//! This crate provides the value normalization used by both the comparator
//! and the validator, so the two always agree on what a cell "says".

pub mod polars;

pub use polars::{
    any_to_string, column_text, format_numeric, is_missing_value, is_numeric_dtype,
};
