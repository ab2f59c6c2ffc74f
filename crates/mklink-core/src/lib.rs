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

//! Batch symlink orchestration.
//!
//! Layout: `path.rs` (validation), `classify.rs` (error taxonomy), `privilege.rs`
//! (capability gate), `dedup.rs` and `collision.rs` (pure planning steps),
//! `backend.rs` (link creation seam), `orchestrator.rs` (public entry point).

pub mod backend;
pub mod classify;
pub mod collision;
pub mod dedup;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod path;
pub mod privilege;

pub use backend::{BackendFailure, LinkBackend};
pub use classify::{ErrorCode, classify, classify_io, classify_source, outcome_for};
pub use collision::{CollisionResolution, MAX_RENAME_ATTEMPTS, rename_candidate, resolve_collision};
pub use dedup::{Deduplicated, SOURCE_AT_LINK_PATH, deduplicate};
pub use error::{LinkError, LinkResult};
pub use model::{BatchResult, LinkKind, LinkOutcome, LinkRequest};
pub use orchestrator::SymlinkManager;
pub use path::{AbsolutePath, validate_absolute};
pub use privilege::{PrivilegeGate, PrivilegeService};

pub use mklink_config::{CollisionPolicy, SymlinkOptions};
pub use tokio_util::sync::CancellationToken;
