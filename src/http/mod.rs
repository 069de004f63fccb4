//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, /ping)
//!     → forwarder.rs (retarget to backend, rewrite request headers)
//!     → headers.rs (strip hop-by-hop, X-Forwarded-For)
//!     → transport (round-trip + response rewrite)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod headers;
pub mod request;
pub mod server;

pub use forwarder::{BackendTarget, ProxyForwarder};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{HttpServer, PING_PATH};
