//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::ForwarderConfig;
use crate::error::ConfigError;

/// Prefix of every environment variable the forwarder reads.
pub const ENV_PREFIX: &str = "FORWARDER_";

/// Load configuration from the process environment.
pub fn load_config() -> Result<ForwarderConfig, ConfigError> {
    load_config_with(|key| std::env::var(key).ok())
}

/// Load configuration using `lookup` to read environment variables.
///
/// `FORWARDER_CONFIG`, when set, names a TOML file used as the base;
/// the remaining `FORWARDER_*` variables override it.
pub fn load_config_with<F>(lookup: F) -> Result<ForwarderConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));

    let mut config = match env("CONFIG") {
        Some(path) => load_file(Path::new(&path))?,
        None => ForwarderConfig::default(),
    };

    if let Some(port) = env("PORT") {
        config.listener.port = parse_value("PORT", &port)?;
    }
    if let Some(url) = env("PROXY_BACKEND") {
        config.backend.url = url;
    }
    if let Some(secs) = env("UPSTREAM_TIMEOUT_SECS") {
        config.backend.upstream_timeout_secs = parse_value("UPSTREAM_TIMEOUT_SECS", &secs)?;
    }
    if let Some(bytes) = env("MAX_BODY_BYTES") {
        config.backend.max_body_bytes = parse_value("MAX_BODY_BYTES", &bytes)?;
    }
    if let Some(replace) = env("REPLACE") {
        config.rewrite.response = replace;
    }
    if let Some(replace) = env("REQUEST_REPLACE") {
        config.rewrite.request = replace;
    }
    if let Some(exts) = env("EXCLUDE_EXTENSIONS") {
        config.rewrite.exclude_extensions = exts;
    }
    if let Some(level) = env("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(addr) = env("METRICS_ADDRESS") {
        config.observability.metrics_address = (!addr.is_empty()).then_some(addr);
    }

    Ok(config)
}

/// Parse a TOML configuration file.
pub fn load_file(path: &Path) -> Result<ForwarderConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: format!("{ENV_PREFIX}{key}"),
        value: value.to_string(),
    })
}
