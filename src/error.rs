//! Error types shared across subsystems.
//!
//! # Taxonomy
//! - `ConfigError`: anything wrong at startup. Always fatal.
//! - `TransportError`: a failed round-trip for one request. Contained to
//!   that request, never retried.

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

/// A single semantic problem found while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure of a single upstream round-trip.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("failed to read upstream body: {0}")]
    Body(#[source] axum::Error),

    #[error("failed to decode gzip body: {0}")]
    Decode(#[source] std::io::Error),

    #[error("upstream body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl TransportError {
    /// Status returned to the client when the round-trip fails.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TransportError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}
