//! Versioned JSON snapshots of a model state (feature: `serde`).
//!
//! These strings are what a UI or HTTP layer ships back and forth between
//! `step` calls. Decoding checks the format version and every shape invariant
//! before handing a state back, so a tampered or stale snapshot is rejected
//! instead of failing later in the middle of a step.

use serde::{Deserialize, Serialize};

use crate::engine::{ModelState, StepOutcome};
use crate::{Error, Result};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSnapshot {
    pub format_version: u32,
    pub state: ModelState,
}

impl WireSnapshot {
    pub fn new(state: ModelState) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            state,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported format_version {}; expected {}",
                self.format_version, FORMAT_VERSION
            )));
        }
        self.state
            .validate()
            .map_err(|e| Error::InvalidSnapshot(format!("state invalid: {e}")))
    }

    /// Compact JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::InvalidSnapshot(format!("failed to serialize snapshot: {e}")))
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidSnapshot(format!("failed to serialize snapshot: {e}")))
    }

    /// Parses and validates a snapshot.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let snapshot: WireSnapshot = serde_json::from_str(s)
            .map_err(|e| Error::InvalidSnapshot(format!("failed to parse snapshot json: {e}")))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn into_state(self) -> ModelState {
        self.state
    }
}

impl From<ModelState> for WireSnapshot {
    fn from(state: ModelState) -> Self {
        Self::new(state)
    }
}

impl ModelState {
    pub fn to_json_string(&self) -> Result<String> {
        WireSnapshot::new(self.clone()).to_json_string()
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(WireSnapshot::from_json_str(s)?.into_state())
    }
}

impl StepOutcome {
    /// Step records are outbound only, so there is no matching decoder.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::InvalidSnapshot(format!("failed to serialize step: {e}")))
    }
}
