//! Correlation identifier propagation.
//!
//! # Design
//! - Keeps the correlation identifier in task-local storage so nested calls can tag
//!   their diagnostics without threading it through every signature.
//! - Callers that do not scope an identifier get a fresh UUID per operation.

use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

tokio::task_local! {
    static ACTIVE_CORRELATION: Arc<str>;
}

/// Mint a new correlation identifier.
#[must_use]
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Retrieve the correlation identifier scoped by [`with_correlation`], if any.
#[must_use]
pub fn current_correlation_id() -> Option<String> {
    ACTIVE_CORRELATION.try_with(|id| id.to_string()).ok()
}

/// Execute the provided future with `correlation_id` visible to downstream code.
pub async fn with_correlation<Fut, T>(correlation_id: impl Into<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    ACTIVE_CORRELATION
        .scope(Arc::from(correlation_id.into()), fut)
        .await
}
