//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (FORWARDER_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → FORWARDER_* environment overrides
//!     → validation.rs (semantic checks, rule parsing)
//!     → Settings (validated, immutable)
//!     → shared via Arc with the forwarder and transport
//! ```
//!
//! # Design Decisions
//! - Settings never change after startup; there is no reload
//! - All fields have defaults, so an empty environment is a valid config
//! - A malformed backend URL stops the process before it listens

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ENV_PREFIX};
pub use schema::{BackendConfig, ForwarderConfig, ListenerConfig, ObservabilityConfig, RewriteConfig};
pub use validation::{validate_config, Settings};
