//! Common error types used across the telemetry crates
//! Provides consistent error handling and reporting

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base error type for all telemetry operations
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum TelemetryError {
    /// A malformed inbound event was rejected at ingress
    #[error("invalid event: {message}")]
    Validation { message: String },

    /// Socket-level failure; the logical subscription survives and the
    /// reconnection policy owns recovery
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Reconnect attempts exceeded the configured maximum. Terminal.
    #[error("reconnect attempts exhausted after {attempts} tries")]
    ReconnectExhausted { attempts: u32 },

    /// Historical fetch failed or returned a non-2xx status
    #[error("query failed: {message}")]
    Query {
        message: String,
        status: Option<u16>,
    },

    /// JSON decoding failed
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A chart or layout document is unusable despite passing schema
    /// validation upstream
    #[error("invalid spec: {message}")]
    InvalidSpec { message: String },
}

/// Result type alias for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::Parse {
            message: err.to_string(),
        }
    }
}
