#![deny(unsafe_code)]

pub mod conventions;
pub mod error;
pub mod hash;
pub mod vocabulary;

pub use crate::conventions::{Convention, ConventionTier, Conventions, load_conventions};
pub use crate::error::{Result, StandardsError};
pub use crate::vocabulary::{Codelist, VocabularyTable, load_vocabulary};
