//! Batch orchestration for link creation.
//!
//! # Design
//! - Batch-wide checks (destination, privilege, size) run before any backend call and
//!   apply uniformly to every slot.
//! - Only first-occurrence names reach the backend; its results are scattered back to
//!   their input positions.
//! - The returned batch always has one outcome per input source.

use std::path::Path;
use std::sync::Arc;

use mklink_config::SymlinkOptions;
use mklink_telemetry::{Metrics, OUTCOME_SUCCESS, current_correlation_id, new_correlation_id};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::backend::{BackendFailure, LinkBackend};
use crate::classify::{ErrorCode, outcome_for};
use crate::dedup::deduplicate;
use crate::error::{LinkError, LinkResult};
use crate::model::{BatchResult, LinkKind, LinkOutcome};
use crate::path::validate_absolute;
use crate::privilege::PrivilegeGate;

const STATUS_SUBMITTED: &str = "submitted";
const STATUS_INVALID_DESTINATION: &str = "invalid_destination";
const STATUS_DENIED: &str = "denied";
const STATUS_TOO_MANY_ITEMS: &str = "too_many_items";
const STATUS_CONTRACT_VIOLATION: &str = "contract_violation";
const STATUS_BACKEND_FAILURE: &str = "backend_failure";
const STATUS_CANCELLED: &str = "cancelled";

/// Public entry point composing validation, gating, deduplication and the backend.
pub struct SymlinkManager {
    options: SymlinkOptions,
    backend: Arc<dyn LinkBackend>,
    privilege: PrivilegeGate,
    metrics: Option<Metrics>,
}

impl SymlinkManager {
    /// Build a manager from its configuration and collaborators.
    #[must_use]
    pub fn new(
        options: SymlinkOptions,
        backend: Arc<dyn LinkBackend>,
        privilege: PrivilegeGate,
    ) -> Self {
        Self {
            options,
            backend,
            privilege,
            metrics: None,
        }
    }

    /// Record batch and outcome counters into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Configuration this manager was built with.
    #[must_use]
    pub const fn options(&self) -> &SymlinkOptions {
        &self.options
    }

    /// Privilege gate consulted once per batch.
    #[must_use]
    pub const fn privilege(&self) -> &PrivilegeGate {
        &self.privilege
    }

    /// Create one file link named after `source` inside `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Cancelled`] when `cancel` fired before any work started.
    pub async fn create_file_link(
        &self,
        source: impl AsRef<Path> + Send,
        destination: impl AsRef<Path> + Send,
        cancel: &CancellationToken,
    ) -> LinkResult<LinkOutcome> {
        let sources = [source.as_ref()];
        let batch = self
            .run(&sources, destination.as_ref(), LinkKind::File, cancel)
            .await?;
        Ok(batch
            .into_iter()
            .next()
            .unwrap_or_else(|| LinkOutcome::failed_with(ErrorCode::Unexpected)))
    }

    /// Create one file link per source inside `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Cancelled`] when `cancel` fired before any work started.
    pub async fn create_file_links<S>(
        &self,
        sources: &[S],
        destination: impl AsRef<Path> + Send,
        cancel: &CancellationToken,
    ) -> LinkResult<BatchResult>
    where
        S: AsRef<Path> + Sync,
    {
        let sources: Vec<&Path> = sources.iter().map(AsRef::as_ref).collect();
        self.run(&sources, destination.as_ref(), LinkKind::File, cancel)
            .await
    }

    /// Create one directory link per source inside `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Cancelled`] when `cancel` fired before any work started.
    pub async fn create_directory_links<S>(
        &self,
        sources: &[S],
        destination: impl AsRef<Path> + Send,
        cancel: &CancellationToken,
    ) -> LinkResult<BatchResult>
    where
        S: AsRef<Path> + Sync,
    {
        let sources: Vec<&Path> = sources.iter().map(AsRef::as_ref).collect();
        self.run(&sources, destination.as_ref(), LinkKind::Directory, cancel)
            .await
    }

    async fn run(
        &self,
        sources: &[&Path],
        destination: &Path,
        kind: LinkKind,
        cancel: &CancellationToken,
    ) -> LinkResult<BatchResult> {
        if cancel.is_cancelled() {
            return Err(LinkError::Cancelled);
        }

        let correlation_id = current_correlation_id().unwrap_or_else(new_correlation_id);
        let span = info_span!(
            "link_batch",
            correlation_id = %correlation_id,
            kind = kind.as_str(),
            count = sources.len(),
        );
        let batch = self
            .run_batch(&correlation_id, sources, destination, kind, cancel)
            .instrument(span)
            .await;
        self.record_outcomes(&batch);
        Ok(batch)
    }

    async fn run_batch(
        &self,
        correlation_id: &str,
        sources: &[&Path],
        destination: &Path,
        kind: LinkKind,
        cancel: &CancellationToken,
    ) -> BatchResult {
        let total = sources.len();

        let destination = match validate_absolute(destination) {
            Ok(destination) => destination,
            Err(err) => {
                warn!(
                    correlation_id,
                    destination = %destination.display(),
                    error = %err.diagnostic_detail(),
                    "destination folder rejected"
                );
                self.record_batch(STATUS_INVALID_DESTINATION);
                return BatchResult::uniform(total, &LinkOutcome::failed_with(ErrorCode::InvalidPath));
            }
        };

        let allowed = self.privilege.check_allowed().await;
        if let Some(metrics) = &self.metrics {
            metrics.inc_privilege_check(allowed);
        }
        if !allowed {
            warn!(
                correlation_id,
                destination = %destination,
                count = total,
                "link creation not permitted; rejecting batch"
            );
            self.record_batch(STATUS_DENIED);
            return BatchResult::uniform(
                total,
                &LinkOutcome::failed_with(ErrorCode::DevModeRequired),
            );
        }

        let batch_max = self.options.batch_max();
        if total > self.options.batch_max_len() {
            warn!(
                correlation_id,
                count = total,
                batch_max,
                "batch exceeds maximum size; rejecting batch"
            );
            self.record_batch(STATUS_TOO_MANY_ITEMS);
            return BatchResult::uniform(
                total,
                &LinkOutcome::failed(
                    ErrorCode::TooManyItems,
                    format!("Too many items. Max {batch_max}"),
                ),
            );
        }

        let deduplicated = deduplicate(sources, &destination, kind);
        let mut slots = deduplicated.prefilled;
        let indices: Vec<usize> = deduplicated.unique.iter().map(|(index, _)| *index).collect();
        let requests: Vec<_> = deduplicated
            .unique
            .into_iter()
            .map(|(_, request)| request)
            .collect();
        debug!(
            correlation_id,
            unique = requests.len(),
            prefilled = total - requests.len(),
            "batch partitioned"
        );

        let status = if requests.is_empty() {
            STATUS_SUBMITTED
        } else {
            match self.backend.create_links(&requests, cancel).await {
                Ok(outcomes) if outcomes.len() == requests.len() => {
                    scatter(&mut slots, &indices, outcomes);
                    STATUS_SUBMITTED
                }
                Ok(outcomes) => {
                    contract_violation(correlation_id, &mut slots, &indices, outcomes.len())
                }
                Err(BackendFailure { completed, .. }) if completed.len() > indices.len() => {
                    contract_violation(correlation_id, &mut slots, &indices, completed.len())
                }
                Err(BackendFailure { completed, error }) => {
                    let done = completed.len();
                    scatter(&mut slots, &indices[..done], completed);
                    fill(&mut slots, &indices[done..], &outcome_for(&error));
                    if matches!(error, LinkError::Cancelled) {
                        warn!(
                            correlation_id,
                            completed = done,
                            remaining = indices.len() - done,
                            "batch cancelled; links already created are kept"
                        );
                        STATUS_CANCELLED
                    } else {
                        error!(
                            correlation_id,
                            completed = done,
                            remaining = indices.len() - done,
                            error = %error.diagnostic_detail(),
                            "link backend raised; failing remaining items"
                        );
                        STATUS_BACKEND_FAILURE
                    }
                }
            }
        };
        self.record_batch(status);

        let batch = BatchResult::new(
            slots
                .into_iter()
                .map(|slot| slot.unwrap_or_else(|| LinkOutcome::failed_with(ErrorCode::Unexpected)))
                .collect(),
        );
        info!(
            correlation_id,
            succeeded = batch.succeeded(),
            failed = batch.failed(),
            "link batch finished"
        );
        batch
    }

    fn record_batch(&self, status: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_batch(status);
        }
    }

    fn record_outcomes(&self, batch: &BatchResult) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        for outcome in batch {
            let code = outcome.error_code().map_or(OUTCOME_SUCCESS, ErrorCode::as_str);
            metrics.inc_link_outcome(code);
        }
    }
}

fn contract_violation(
    correlation_id: &str,
    slots: &mut [Option<LinkOutcome>],
    indices: &[usize],
    actual: usize,
) -> &'static str {
    let violation = LinkError::ContractViolation {
        expected: indices.len(),
        actual,
    };
    error!(
        correlation_id,
        expected = indices.len(),
        actual,
        "link backend returned a mismatched result count; discarding results"
    );
    fill(slots, indices, &outcome_for(&violation));
    STATUS_CONTRACT_VIOLATION
}

fn scatter(slots: &mut [Option<LinkOutcome>], indices: &[usize], outcomes: Vec<LinkOutcome>) {
    for (&index, outcome) in indices.iter().zip(outcomes) {
        slots[index] = Some(outcome);
    }
}

fn fill(slots: &mut [Option<LinkOutcome>], indices: &[usize], outcome: &LinkOutcome) {
    for &index in indices {
        slots[index] = Some(outcome.clone());
    }
}
