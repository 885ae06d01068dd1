//! Report rendering for the double-programming pipeline.
//!
//! - **Comparison report**: flat text summary of a production/QC comparison
//! - **Validation report**: flat text summary plus a JSON document
//! - **Define metadata**: define.xml-style variable metadata from the approved specification

mod comparison;
mod define;
mod labels;
mod validation;

pub use comparison::{ComparisonHeader, render_comparison_error, render_comparison_report};
pub use define::{DefineMetadata, DefineVariable, VariableOrigin, define_metadata};
pub use labels::variable_label;
pub use validation::{ValidationDocument, render_validation_report};
