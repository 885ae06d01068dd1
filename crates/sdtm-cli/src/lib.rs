//! Command-line front end for the SDTM double-programming pipeline.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod summary;
