//! Collision policy resolution shared by link backends.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use mklink_config::CollisionPolicy;

use crate::error::{LinkError, LinkResult};

/// Highest numeric suffix probed under [`CollisionPolicy::Rename`].
pub const MAX_RENAME_ATTEMPTS: u32 = 10_000;

/// What a backend must do to honour the collision policy for one link path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionResolution {
    /// The requested path is free; create the link there.
    Free(PathBuf),
    /// The requested path is occupied; remove the entry, then create the link.
    Replace(PathBuf),
    /// The requested path is occupied; create the link at this free sibling instead.
    Renamed(PathBuf),
    /// The requested path is occupied and must not be touched.
    Occupied(PathBuf),
}

impl CollisionResolution {
    /// Path the resolution refers to.
    #[must_use]
    pub fn link_path(&self) -> &Path {
        match self {
            Self::Free(path) | Self::Replace(path) | Self::Renamed(path) | Self::Occupied(path) => {
                path
            }
        }
    }
}

/// Decide where a link goes given the policy and an occupancy probe.
///
/// `exists` must treat dangling symlinks as occupied.
///
/// # Errors
///
/// Returns [`LinkError::RenameExhausted`] when every rename candidate is taken.
pub fn resolve_collision<F>(
    link_path: &Path,
    policy: CollisionPolicy,
    mut exists: F,
) -> LinkResult<CollisionResolution>
where
    F: FnMut(&Path) -> bool,
{
    if !exists(link_path) {
        return Ok(CollisionResolution::Free(link_path.to_path_buf()));
    }
    match policy {
        CollisionPolicy::Skip => Ok(CollisionResolution::Occupied(link_path.to_path_buf())),
        CollisionPolicy::Overwrite => Ok(CollisionResolution::Replace(link_path.to_path_buf())),
        CollisionPolicy::Rename => (1..=MAX_RENAME_ATTEMPTS)
            .map(|n| rename_candidate(link_path, n))
            .find(|candidate| !exists(candidate))
            .map(CollisionResolution::Renamed)
            .ok_or_else(|| LinkError::RenameExhausted {
                path: link_path.to_path_buf(),
                attempts: MAX_RENAME_ATTEMPTS,
            }),
    }
}

/// `link_path` with `.n` appended to its final component.
#[must_use]
pub fn rename_candidate(link_path: &Path, n: u32) -> PathBuf {
    let mut raw = OsString::from(link_path.as_os_str());
    raw.push(format!(".{n}"));
    PathBuf::from(raw)
}
