//! Default values applied before any file or environment layer.
//!
//! # Design
//! - Centralize defaults so the loader, models and docs agree.

use crate::model::{CollisionPolicy, PrivilegeSource};

/// Maximum number of sources accepted in one batch unless configured otherwise.
pub const DEFAULT_BATCH_MAX: u32 = 100;
/// Collision policy applied when none is configured.
pub const DEFAULT_COLLISION_POLICY: CollisionPolicy = CollisionPolicy::Skip;
/// Log level used when neither configuration nor `RUST_LOG` provide one.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Privilege source used when none is configured.
pub const DEFAULT_PRIVILEGE_SOURCE: PrivilegeSource = PrivilegeSource::Probe;
