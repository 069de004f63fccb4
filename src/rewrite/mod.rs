//! Content rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! FORWARDER_REQUEST_REPLACE ─▶ table.rs ─▶ request headers (forwarder)
//! FORWARDER_REPLACE         ─▶ table.rs ─▶ response body + headers (intercept)
//! FORWARDER_EXCLUDE_EXTENSIONS ─▶ extension.rs ─▶ bypass decision (intercept)
//! ```
//!
//! All rules are built once at startup and shared read-only.

pub mod extension;
pub mod table;

pub use extension::{extension_of, ExtensionFilter, DEFAULT_EXCLUDED_EXTENSIONS};
pub use table::{SubstitutionEntry, SubstitutionTable};

/// Every rewriting rule the proxy applies.
#[derive(Debug, Clone, Default)]
pub struct RewriteRules {
    /// Applied to response bodies and response headers.
    pub response: SubstitutionTable,
    /// Applied to request headers before forwarding.
    pub request: SubstitutionTable,
    /// Paths whose responses bypass body rewriting.
    pub excluded: ExtensionFilter,
}
