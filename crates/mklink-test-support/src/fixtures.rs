//! Test fixtures: options, fake-backed managers and temporary trees.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use mklink_config::{CollisionPolicy, SymlinkOptions};
use mklink_core::{PrivilegeGate, SymlinkManager};
use tempfile::TempDir;

use crate::mocks::{FakeLinkBackend, FakePrivilegeService};

/// A manager wired to in-memory fakes, with handles to inspect them.
pub struct FakeHarness {
    /// Manager under test.
    pub manager: SymlinkManager,
    /// Backend the manager submits to.
    pub backend: Arc<FakeLinkBackend>,
    /// Privilege service behind the manager's gate.
    pub privilege: Arc<FakePrivilegeService>,
}

/// Validated options for tests.
///
/// # Errors
///
/// Returns an error when `batch_max` is zero.
pub fn options(policy: CollisionPolicy, batch_max: u32) -> Result<SymlinkOptions> {
    SymlinkOptions::new(policy, batch_max).context("invalid symlink options")
}

/// Manager over an honest fake backend whose privilege service answers `allowed`.
///
/// # Errors
///
/// Returns an error when `batch_max` is zero.
pub fn fake_harness(policy: CollisionPolicy, batch_max: u32, allowed: bool) -> Result<FakeHarness> {
    let privilege = if allowed {
        FakePrivilegeService::allowing()
    } else {
        FakePrivilegeService::denying()
    };
    Ok(harness_with(
        options(policy, batch_max)?,
        FakeLinkBackend::new(policy),
        privilege,
    ))
}

/// Manager over the supplied fakes.
#[must_use]
pub fn harness_with(
    options: SymlinkOptions,
    backend: FakeLinkBackend,
    privilege: FakePrivilegeService,
) -> FakeHarness {
    let backend = Arc::new(backend);
    let privilege = Arc::new(privilege);
    let manager = SymlinkManager::new(
        options,
        backend.clone(),
        PrivilegeGate::new(privilege.clone()),
    );
    FakeHarness {
        manager,
        backend,
        privilege,
    }
}

/// Temporary directory populated with `files` (created empty) and `dirs`.
///
/// # Errors
///
/// Returns an error when the directory or any entry cannot be created.
pub fn temp_tree(files: &[&str], dirs: &[&str]) -> Result<TempDir> {
    let root = tempfile::tempdir().context("failed to create temp dir")?;
    for dir in dirs {
        let path = root.path().join(dir);
        fs::create_dir_all(&path).with_context(|| format!("failed to create {}", path.display()))?;
    }
    for file in files {
        let path = root.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, b"").with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(root)
}
