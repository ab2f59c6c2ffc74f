//! Link backend creating real symbolic links.
//!
//! # Design
//! - Each request runs on the blocking pool; the token is checked before each one.
//! - Occupancy uses `symlink_metadata`, so a dangling link still occupies its path.
//! - Every filesystem failure is classified into an outcome; only a lost worker raises.
//! - A source that already is the link path entry is never touched, whatever the policy.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mklink_config::CollisionPolicy;
use mklink_core::{
    CollisionResolution, ErrorCode, LinkBackend, LinkError, LinkKind, LinkOutcome, LinkRequest,
    LinkResult, SOURCE_AT_LINK_PATH, classify, outcome_for, resolve_collision,
};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Creates symbolic links on the local filesystem.
#[derive(Debug, Clone, Copy)]
pub struct FsLinkBackend {
    policy: CollisionPolicy,
}

impl FsLinkBackend {
    /// Backend applying `policy` when a link path is occupied.
    #[must_use]
    pub const fn new(policy: CollisionPolicy) -> Self {
        Self { policy }
    }

    /// Collision policy in effect.
    #[must_use]
    pub const fn policy(&self) -> CollisionPolicy {
        self.policy
    }
}

#[async_trait]
impl LinkBackend for FsLinkBackend {
    async fn create_link(
        &self,
        request: &LinkRequest,
        cancel: &CancellationToken,
    ) -> LinkResult<LinkOutcome> {
        if cancel.is_cancelled() {
            return Err(LinkError::Cancelled);
        }
        let request = request.clone();
        let policy = self.policy;
        task::spawn_blocking(move || create_link_blocking(&request, policy))
            .await
            .map_err(|err| LinkError::backend("create_link.join", err))
    }
}

fn create_link_blocking(request: &LinkRequest, policy: CollisionPolicy) -> LinkOutcome {
    if same_entry(request.source_path.as_path(), &request.link_path) {
        debug!(
            source = %request.source_path,
            link = %request.link_path.display(),
            "source already sits at the link path; leaving it untouched"
        );
        return LinkOutcome::failed(ErrorCode::AlreadyExists, SOURCE_AT_LINK_PATH);
    }

    let resolution = match resolve_collision(&request.link_path, policy, occupied) {
        Ok(resolution) => resolution,
        Err(err) => return failure(&err),
    };

    let link_path = match resolution {
        CollisionResolution::Occupied(path) => {
            debug!(link = %path.display(), "link path occupied; skipping");
            return LinkOutcome::failed_with(ErrorCode::AlreadyExists);
        }
        CollisionResolution::Replace(path) => {
            if let Err(err) = remove_existing(&path) {
                return failure(&err);
            }
            path
        }
        CollisionResolution::Free(path) | CollisionResolution::Renamed(path) => path,
    };

    match make_symlink(request.source_path.as_path(), &link_path, request.kind) {
        Ok(()) => {
            info!(
                source = %request.source_path,
                link = %link_path.display(),
                kind = request.kind.as_str(),
                "symlink created"
            );
            LinkOutcome::succeeded(link_path)
        }
        Err(source) => failure(&LinkError::io("symlink", link_path, source)),
    }
}

fn failure(err: &LinkError) -> LinkOutcome {
    warn!(
        code = %classify(err),
        error = %err.diagnostic_detail(),
        "link creation failed"
    );
    outcome_for(err)
}

/// Both paths name the same directory entry. The final component is not
/// followed, so an old link pointing at the source is still replaceable.
fn same_entry(source: &Path, link_path: &Path) -> bool {
    source == link_path
        || entry_identity(source)
            .zip(entry_identity(link_path))
            .is_some_and(|(source, link)| source == link)
}

fn entry_identity(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let parent = fs::canonicalize(path.parent()?).ok()?;
    Some(parent.join(name))
}

fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn remove_existing(path: &Path) -> LinkResult<()> {
    let metadata =
        fs::symlink_metadata(path).map_err(|err| LinkError::io("overwrite.stat", path, err))?;
    let file_type = metadata.file_type();
    let removed = if file_type.is_dir() {
        fs::remove_dir_all(path)
    } else if is_directory_symlink(&file_type) {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|err| LinkError::io("overwrite.remove", path, err))?;
    debug!(link = %path.display(), "existing entry removed for overwrite");
    Ok(())
}

#[cfg(windows)]
fn is_directory_symlink(file_type: &fs::FileType) -> bool {
    use std::os::windows::fs::FileTypeExt;
    file_type.is_symlink_dir()
}

#[cfg(not(windows))]
const fn is_directory_symlink(_file_type: &fs::FileType) -> bool {
    false
}

#[cfg(unix)]
fn make_symlink(source: &Path, link: &Path, _kind: LinkKind) -> io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn make_symlink(source: &Path, link: &Path, kind: LinkKind) -> io::Result<()> {
    match kind {
        LinkKind::Directory => std::os::windows::fs::symlink_dir(source, link),
        LinkKind::File => std::os::windows::fs::symlink_file(source, link),
    }
}

#[cfg(not(any(unix, windows)))]
fn make_symlink(_source: &Path, _link: &Path, _kind: LinkKind) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
