//! Assertion helpers for batch results.

use std::path::Path;

use mklink_core::{BatchResult, ErrorCode, LinkOutcome};

/// Assert the invariants every outcome must hold: success carries no error fields,
/// failure carries a message and a code.
///
/// # Panics
///
/// Panics when any outcome violates the invariants.
pub fn assert_outcome_invariants(batch: &BatchResult) {
    for (index, outcome) in batch.iter().enumerate() {
        if outcome.is_success() {
            assert!(
                outcome.error_message().is_none() && outcome.error_code().is_none(),
                "successful outcome {index} carries error fields: {outcome:?}"
            );
        } else {
            assert!(
                outcome.error_message().is_some() && outcome.error_code().is_some(),
                "failed outcome {index} lacks a message or code: {outcome:?}"
            );
        }
    }
}

/// Codes per slot, `None` for successes.
#[must_use]
pub fn codes(batch: &BatchResult) -> Vec<Option<ErrorCode>> {
    batch.iter().map(LinkOutcome::error_code).collect()
}

/// Assert the batch has `len` slots that all failed with `code`.
///
/// # Panics
///
/// Panics when the length differs or any slot has another result.
pub fn assert_all_failed_with(batch: &BatchResult, len: usize, code: ErrorCode) {
    assert_eq!(batch.len(), len, "batch length");
    assert_eq!(codes(batch), vec![Some(code); len], "batch codes");
    assert_outcome_invariants(batch);
}

/// Assert `outcome` succeeded and created its link at `expected`.
///
/// # Panics
///
/// Panics when the outcome failed or reports another path.
pub fn assert_linked_at(outcome: &LinkOutcome, expected: impl AsRef<Path>) {
    assert!(outcome.is_success(), "expected success, got {outcome:?}");
    assert_eq!(outcome.link_path(), Some(expected.as_ref()), "link path");
}
