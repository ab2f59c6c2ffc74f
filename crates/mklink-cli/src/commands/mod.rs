//! Command handlers grouped by concern.

pub(crate) mod link;
pub(crate) mod privilege;
