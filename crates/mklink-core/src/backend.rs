//! Link backend seam.
//!
//! # Design
//! - Backends own the actual link creation and apply the collision policy.
//! - Expected per-item failures come back as [`LinkOutcome`] values; `Err` is reserved
//!   for failures the backend could not attribute to one item.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::error::{LinkError, LinkResult};
use crate::model::{LinkOutcome, LinkRequest};

/// A batch submission that stopped before every request produced an outcome.
#[derive(Debug, Error)]
#[error("link backend interrupted")]
pub struct BackendFailure {
    /// Outcomes for the leading requests that completed, in submission order.
    pub completed: Vec<LinkOutcome>,
    /// Failure that stopped the batch.
    #[source]
    pub error: LinkError,
}

impl BackendFailure {
    /// Failure raised before any request completed.
    #[must_use]
    pub const fn immediate(error: LinkError) -> Self {
        Self {
            completed: Vec::new(),
            error,
        }
    }
}

/// Creates symbolic links for validated requests.
#[async_trait]
pub trait LinkBackend: Send + Sync {
    /// Create one link, honouring the configured collision policy.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that are not a structured outcome.
    async fn create_link(
        &self,
        request: &LinkRequest,
        cancel: &CancellationToken,
    ) -> LinkResult<LinkOutcome>;

    /// Create links for `requests` in order, one outcome per request.
    ///
    /// Checks `cancel` before each request.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] carrying the completed outcomes when cancelled or
    /// when a request raised.
    async fn create_links(
        &self,
        requests: &[LinkRequest],
        cancel: &CancellationToken,
    ) -> Result<Vec<LinkOutcome>, BackendFailure> {
        let mut completed = Vec::with_capacity(requests.len());
        for request in requests {
            if cancel.is_cancelled() {
                return Err(BackendFailure {
                    completed,
                    error: LinkError::Cancelled,
                });
            }
            match self.create_link(request, cancel).await {
                Ok(outcome) => completed.push(outcome),
                Err(error) => return Err(BackendFailure { completed, error }),
            }
        }
        Ok(completed)
    }
}
