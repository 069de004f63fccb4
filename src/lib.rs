//! Single-backend rewriting reverse proxy.
//!
//! Every request is forwarded to one configured backend. Request headers
//! can have substrings replaced on the way out; response bodies and headers
//! can have substrings replaced on the way back, except for excluded file
//! extensions.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod transport;

pub use config::{ForwarderConfig, Settings};
pub use http::HttpServer;
pub use lifecycle::Shutdown;

/// Version reported by the binary.
pub const VERSION: &str = match option_env!("FORWARDER_BUILD_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// The line printed for `forwarder <anything>` and at startup.
pub fn version_banner() -> String {
    format!("forwarder {VERSION}")
}
