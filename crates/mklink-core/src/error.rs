//! # Design
//!
//! - Provide structured, constant-message errors for the link pipeline.
//! - Capture operation context (paths, fields, counts) so failures are reproducible in tests.
//! - Expected per-item conditions are `LinkOutcome` values; a `LinkError` means something
//!   was raised that the caller did not plan for, or the whole call was cancelled.

use std::error::Error;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors produced while validating, gating or creating links.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Input path failed validation.
    #[error("invalid path")]
    InvalidPath {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// IO failures while interacting with the filesystem.
    #[error("link io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Every rename candidate up to the probe limit was occupied.
    #[error("no free rename candidate")]
    RenameExhausted {
        /// Link path the candidates were derived from.
        path: PathBuf,
        /// Number of candidates probed.
        attempts: u32,
    },
    /// The operation was cancelled by the caller.
    #[error("link operation cancelled")]
    Cancelled,
    /// The capability service could not answer.
    #[error("privilege query failed")]
    PrivilegeQuery {
        /// Underlying failure reported by the service.
        source: Box<dyn Error + Send + Sync>,
    },
    /// A backend raised a failure outside its structured outcomes.
    #[error("link backend failure")]
    Backend {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Underlying failure.
        source: Box<dyn Error + Send + Sync>,
    },
    /// A backend returned a result count that does not match its input.
    #[error("link backend contract violated")]
    ContractViolation {
        /// Number of results expected.
        expected: usize,
        /// Number of results received.
        actual: usize,
    },
    /// The operation is not available on this platform.
    #[error("unsupported link operation")]
    Unsupported {
        /// Operation that is unsupported.
        operation: &'static str,
    },
}

impl LinkError {
    /// Wrap an IO failure with its operation and path.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Wrap an arbitrary backend failure.
    pub fn backend(
        operation: &'static str,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }

    /// Wrap a capability-service failure.
    pub fn privilege_query(source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::PrivilegeQuery {
            source: source.into(),
        }
    }

    pub(crate) fn invalid_path(reason: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidPath {
            field: "path",
            reason,
            value: Some(value.into()),
        }
    }

    /// Full `source` chain rendered for diagnostics; never shown to end users.
    #[must_use]
    pub fn diagnostic_detail(&self) -> String {
        let mut detail = self.to_string();
        let mut current = self.source();
        while let Some(source) = current {
            detail.push_str(": ");
            detail.push_str(&source.to_string());
            current = source.source();
        }
        detail
    }
}
