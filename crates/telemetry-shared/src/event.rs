//! Wire event model and the structural ingress validator
//!
//! Every record entering the system over the live stream is shaped like
//! [`Event`]. The validator is the sole gate between network input and
//! buffer state: objects that fail it are dropped at ingress, never stored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Result;

/// Atomic telemetry record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Schema version
    pub v: u32,
    /// Identifier of the producing run, never empty
    pub run_id: String,
    /// Identifier of the producing source, never empty
    pub source_id: String,
    /// Coarse-grained named source of events within a run
    pub channel: String,
    /// Fine-grained event kind, optionally dotted for prefix filtering
    #[serde(rename = "type")]
    pub event_type: String,
    /// Frame counter, monotonic-ish per run
    pub frame_index: u64,
    /// Simulation time in seconds
    pub sim_time: f64,
    /// Optional wall-clock timestamp in milliseconds
    #[serde(default)]
    pub wall_time_ms: Option<f64>,
    /// Optional free-form string tags
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    /// Opaque payload tree; the core only ever walks it by dotted path
    pub payload: Value,
}

impl Event {
    /// Parse a pre-validated JSON value into an [`Event`].
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Structural type guard over a raw inbound JSON value.
///
/// Requires: integer version, non-empty `runId`/`sourceId`, string
/// `channel`/`type`, integer `frameIndex` >= 0, numeric `simTime` >= 0,
/// `wallTimeMs` absent/null/numeric, `tags` absent/null/object, and a
/// present `payload` key. No side effects.
pub fn validate_event(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    let non_empty_string =
        |key: &str| obj.get(key).and_then(Value::as_str).is_some_and(|s| !s.is_empty());
    let is_string = |key: &str| obj.get(key).is_some_and(Value::is_string);

    obj.get("v").and_then(Value::as_u64).is_some()
        && non_empty_string("runId")
        && non_empty_string("sourceId")
        && is_string("channel")
        && is_string("type")
        && obj.get("frameIndex").and_then(Value::as_u64).is_some()
        && obj
            .get("simTime")
            .and_then(Value::as_f64)
            .is_some_and(|t| t >= 0.0)
        && match obj.get("wallTimeMs") {
            None | Some(Value::Null) => true,
            Some(v) => v.is_number(),
        }
        && match obj.get("tags") {
            None | Some(Value::Null) => true,
            Some(v) => v.is_object(),
        }
        && obj.contains_key("payload")
}
