//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! forwarder / transport / server produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` always wins over the configured level
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
