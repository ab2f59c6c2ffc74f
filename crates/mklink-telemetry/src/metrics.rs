//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Labels are stable codes, never paths, so cardinality stays bounded.

use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Label recorded for successful link outcomes.
pub const OUTCOME_SUCCESS: &str = "ok";

/// Prometheus-backed metrics registry shared by the orchestrator and front-ends.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    link_outcomes_total: IntCounterVec,
    link_batches_total: IntCounterVec,
    privilege_checks_total: IntCounterVec,
}

/// Snapshot of selected counters for reporting.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Links created successfully.
    pub links_succeeded: u64,
    /// Link slots that ended in any failure.
    pub links_failed: u64,
    /// Batches that reached the backend.
    pub batches_submitted: u64,
    /// Batches rejected before reaching the backend.
    pub batches_rejected: u64,
    /// Privilege checks that denied link creation.
    pub privilege_denied: u64,
}

const FAILURE_CODES: &[&str] = &[
    "E_ACCESS_DENIED",
    "E_PATH_NOT_FOUND",
    "E_ALREADY_EXISTS",
    "E_IO",
    "E_UNEXPECTED",
    "E_INVALID_PATH",
    "E_DEV_MODE_REQUIRED",
    "E_TOO_MANY_ITEMS",
    "E_DUPLICATE_NAME",
];

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let link_outcomes_total = counter_vec(
            "link_outcomes_total",
            "Link creation outcomes by result code",
            &["code"],
        )?;
        let link_batches_total = counter_vec(
            "link_batches_total",
            "Link batches processed by terminal status",
            &["status"],
        )?;
        let privilege_checks_total = counter_vec(
            "privilege_checks_total",
            "Privilege gate evaluations by result",
            &["result"],
        )?;

        register(&registry, "link_outcomes_total", &link_outcomes_total)?;
        register(&registry, "link_batches_total", &link_batches_total)?;
        register(&registry, "privilege_checks_total", &privilege_checks_total)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                link_outcomes_total,
                link_batches_total,
                privilege_checks_total,
            }),
        })
    }

    /// Increment the outcome counter for one slot; successful slots use [`OUTCOME_SUCCESS`].
    pub fn inc_link_outcome(&self, code: &str) {
        self.inner
            .link_outcomes_total
            .with_label_values(&[code])
            .inc();
    }

    /// Increment the batch counter for a terminal status (`submitted`, `denied`, ...).
    pub fn inc_batch(&self, status: &str) {
        self.inner
            .link_batches_total
            .with_label_values(&[status])
            .inc();
    }

    /// Record a privilege gate evaluation.
    pub fn inc_privilege_check(&self, allowed: bool) {
        let result = if allowed { "allowed" } else { "denied" };
        self.inner
            .privilege_checks_total
            .with_label_values(&[result])
            .inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the link counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let outcomes = &self.inner.link_outcomes_total;
        let batches = &self.inner.link_batches_total;
        MetricsSnapshot {
            links_succeeded: outcomes.with_label_values(&[OUTCOME_SUCCESS]).get(),
            links_failed: FAILURE_CODES
                .iter()
                .map(|code| outcomes.with_label_values(&[*code]).get())
                .sum(),
            batches_submitted: batches.with_label_values(&["submitted"]).get(),
            batches_rejected: ["invalid_destination", "denied", "too_many_items"]
                .iter()
                .map(|status| batches.with_label_values(&[*status]).get())
                .sum(),
            privilege_denied: self
                .inner
                .privilege_checks_total
                .with_label_values(&["denied"])
                .get(),
        }
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register(registry: &Registry, name: &'static str, collector: &IntCounterVec) -> Result<()> {
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_snapshot_reflects_updates() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_link_outcome(OUTCOME_SUCCESS);
        metrics.inc_link_outcome(OUTCOME_SUCCESS);
        metrics.inc_link_outcome("E_DUPLICATE_NAME");
        metrics.inc_link_outcome("E_ALREADY_EXISTS");
        metrics.inc_batch("submitted");
        metrics.inc_batch("denied");
        metrics.inc_privilege_check(false);
        metrics.inc_privilege_check(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.links_succeeded, 2);
        assert_eq!(snapshot.links_failed, 2);
        assert_eq!(snapshot.batches_submitted, 1);
        assert_eq!(snapshot.batches_rejected, 1);
        assert_eq!(snapshot.privilege_denied, 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("link_outcomes_total"));
        assert!(rendered.contains("privilege_checks_total"));
        Ok(())
    }

    #[test]
    fn separate_registries_do_not_share_counts() -> Result<()> {
        let first = Metrics::new()?;
        let second = Metrics::new()?;
        first.inc_link_outcome(OUTCOME_SUCCESS);
        assert_eq!(second.snapshot(), MetricsSnapshot::default());
        Ok(())
    }
}
