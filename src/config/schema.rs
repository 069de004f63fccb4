//! Configuration schema definitions.
//!
//! Raw, unvalidated configuration as read from a TOML file and the
//! environment. Rewrite rules stay in their environment syntax here so a
//! file and an override look the same; `validation.rs` turns them into
//! runtime types.

use serde::{Deserialize, Serialize};

/// Root configuration for the forwarder.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Where the proxy listens.
    pub listener: ListenerConfig,

    /// The single upstream every request is sent to.
    pub backend: BackendConfig,

    /// Substitution and bypass rules.
    pub rewrite: RewriteConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind host (IP address).
    pub host: String,

    /// Bind port.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
        }
    }
}

/// Backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend base URL (scheme + host, optional base path).
    pub url: String,

    /// Upstream response timeout in seconds. 0 disables the deadline.
    pub upstream_timeout_secs: u64,

    /// Maximum buffered (decoded) response body in bytes. 0 = unlimited.
    pub max_body_bytes: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            upstream_timeout_secs: 0,
            max_body_bytes: 0,
        }
    }
}

/// Rewrite rules in `pattern==replacement,...` form.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RewriteConfig {
    /// Substitutions on response bodies and headers.
    pub response: String,

    /// Substitutions on request headers.
    pub request: String,

    /// Comma-separated extensions that skip body rewriting.
    pub exclude_extensions: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus endpoint bind address. Disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}
