//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse the backend URL once, failing startup if it is unusable
//! - Build the immutable runtime `Settings`
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before any listener is bound

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::config::schema::ForwarderConfig;
use crate::error::{ConfigError, ValidationError};
use crate::http::forwarder::BackendTarget;
use crate::rewrite::{ExtensionFilter, RewriteRules, SubstitutionTable};

/// Validated, immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub listen_address: SocketAddr,
    pub backend: BackendTarget,
    pub rules: RewriteRules,
    pub upstream_timeout: Option<Duration>,
    pub max_body_bytes: Option<usize>,
    pub metrics_address: Option<SocketAddr>,
}

/// Validate `config` and build `Settings` from it.
pub fn validate_config(config: &ForwarderConfig) -> Result<Settings, ConfigError> {
    let mut errors = Vec::new();

    let listen_address = match config.listener.host.parse::<IpAddr>() {
        Ok(ip) => Some(SocketAddr::new(ip, config.listener.port)),
        Err(_) => {
            errors.push(ValidationError::new(
                "listener.host",
                format!("{:?} is not an IP address", config.listener.host),
            ));
            None
        }
    };

    let backend = match BackendTarget::parse(&config.backend.url) {
        Ok(target) => Some(target),
        Err(message) => {
            errors.push(ValidationError::new("backend.url", message));
            None
        }
    };

    let metrics_address = match config.observability.metrics_address.as_deref() {
        None => None,
        Some(addr) => match addr.parse::<SocketAddr>() {
            Ok(addr) => Some(addr),
            Err(_) => {
                errors.push(ValidationError::new(
                    "observability.metrics_address",
                    format!("{addr:?} is not a socket address"),
                ));
                None
            }
        },
    };

    let (Some(listen_address), Some(backend), true) = (listen_address, backend, errors.is_empty()) else {
        return Err(ConfigError::Validation(errors));
    };

    let rules = RewriteRules {
        response: SubstitutionTable::parse(&config.rewrite.response),
        request: SubstitutionTable::parse(&config.rewrite.request),
        excluded: ExtensionFilter::parse(&config.rewrite.exclude_extensions),
    };

    Ok(Settings {
        listen_address,
        backend,
        rules,
        upstream_timeout: (config.backend.upstream_timeout_secs > 0)
            .then(|| Duration::from_secs(config.backend.upstream_timeout_secs)),
        max_body_bytes: (config.backend.max_body_bytes > 0).then_some(config.backend.max_body_bytes),
        metrics_address,
    })
}
