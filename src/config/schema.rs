//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EndwareConfig {
    /// Demo server settings.
    pub server: ServerConfig,

    /// Request body buffering.
    pub body: BodyConfig,

    /// Content negotiation behaviour.
    pub negotiation: NegotiationConfig,

    /// Internal error reporting.
    pub diagnostics: DiagnosticsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Request body configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct BodyConfig {
    /// Maximum request body size buffered for an endpoint.
    pub max_bytes: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
        }
    }
}

/// Content negotiation configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Send the legacy 406 body verbatim instead of a valid JSON list of the
    /// supported content types.
    pub legacy_not_acceptable_body: bool,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            legacy_not_acceptable_body: true,
        }
    }
}

/// Diagnostics configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Install the tracing-backed diagnostic hook.
    pub log_internal_errors: bool,
}
