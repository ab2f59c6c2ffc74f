#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Telemetry primitives shared across the mklink workspace.
//!
//! Logging initialisation, correlation identifiers and link metrics live here so the
//! orchestrator and front-ends report diagnostics the same way.

pub mod context;
pub mod error;
pub mod init;
pub mod metrics;

pub use context::{current_correlation_id, new_correlation_id, with_correlation};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use metrics::{Metrics, MetricsSnapshot, OUTCOME_SUCCESS};
