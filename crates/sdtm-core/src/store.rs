//! Persisted pipeline state.
//!
//! One JSON document per study domain, always rewritten in full through a
//! temp file and rename.

use std::path::PathBuf;

use sdtm_ingest::write_json_atomic;
use sdtm_model::{OutputLayout, PipelineState, STATE_SCHEMA_VERSION};
use tracing::debug;

use crate::error::StateError;

#[derive(Debug, Clone)]
pub struct StateStore {
    layout: OutputLayout,
}

impl StateStore {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    pub fn path(&self, domain: &str) -> PathBuf {
        self.layout.state_file(domain)
    }

    pub fn exists(&self, domain: &str) -> bool {
        self.path(domain).is_file()
    }

    /// Loads the record for `domain`, or `None` if none was saved yet.
    pub fn load(&self, domain: &str) -> Result<Option<PipelineState>, StateError> {
        let path = self.path(domain);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StateError::Read { path, source }),
        };
        let state: PipelineState = serde_json::from_str(&text)
            .map_err(|source| StateError::Parse { path: path.clone(), source })?;
        if state.schema_version != STATE_SCHEMA_VERSION {
            return Err(StateError::UnsupportedSchema {
                path,
                found: state.schema_version,
                supported: STATE_SCHEMA_VERSION,
            });
        }
        if !state.domain.eq_ignore_ascii_case(domain) {
            return Err(StateError::Mismatch {
                path,
                found: state.domain,
                expected: domain.to_string(),
            });
        }
        Ok(Some(state))
    }

    /// Stamps `updated_at` and overwrites the record.
    pub fn save(&self, state: &mut PipelineState) -> Result<(), StateError> {
        state.touch();
        let path = self.path(&state.domain);
        write_json_atomic(&path, state)?;
        debug!(
            path = %path.display(),
            phase = %state.current_phase,
            iteration = state.comparison_iteration,
            "saved pipeline state"
        );
        Ok(())
    }
}
