use crate::error::EventsError;
use chrono::{DateTime, Utc};
use core_types::{Position, SignalRecord};
use serde::{Deserialize, Serialize};

/// A cycle that was aborted before anything was persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleFailure {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// The top-level event enum published by the engine.
///
/// Serialized as `{"type": "...", "payload": {...}}` so that any consumer can
/// dispatch on the `type` field without knowing every variant up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    /// The engine loaded its persisted state and is ready for cycles.
    Started { position: Position },
    /// An entry or exit that has been durably committed.
    SignalEmitted(SignalRecord),
    /// A cycle that failed and left the stored state untouched.
    CycleFailed(CycleFailure),
}

impl EngineEvent {
    pub fn to_json(&self) -> Result<String, EventsError> {
        Ok(serde_json::to_string(self)?)
    }
}
