//! Concrete privilege services, selected once at startup.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use mklink_config::PrivilegeSource;
use mklink_core::{LinkError, LinkResult, PrivilegeService};
use tokio::task;
use tracing::{debug, warn};
use uuid::Uuid;

/// Environment variable naming the deployment environment.
pub const ENV_ENVIRONMENT: &str = "MKLINK_ENVIRONMENT";

const DEVELOPMENT: &str = "development";

/// Build the service for `source`.
#[must_use]
pub fn privilege_service_for(source: PrivilegeSource) -> Arc<dyn PrivilegeService> {
    match source {
        PrivilegeSource::Probe => Arc::new(ProbePrivilegeService::new()),
        PrivilegeSource::Elevated => Arc::new(ElevationPrivilegeService),
        PrivilegeSource::Environment => Arc::new(EnvironmentPrivilegeService::from_process_env()),
        PrivilegeSource::Always => Arc::new(AlwaysPrivilegeService),
    }
}

/// Answers by creating and removing a scratch link in a probe directory.
#[derive(Debug, Clone)]
pub struct ProbePrivilegeService {
    dir: PathBuf,
}

impl ProbePrivilegeService {
    /// Probe inside the system temporary directory.
    #[must_use]
    pub fn new() -> Self {
        Self::in_dir(env::temp_dir())
    }

    /// Probe inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Default for ProbePrivilegeService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrivilegeService for ProbePrivilegeService {
    async fn is_allowed(&self) -> LinkResult<bool> {
        let dir = self.dir.clone();
        task::spawn_blocking(move || probe(&dir))
            .await
            .map_err(LinkError::privilege_query)?
    }
}

fn probe(dir: &Path) -> LinkResult<bool> {
    let id = Uuid::new_v4();
    let target = dir.join(format!("mklink-probe-{id}.target"));
    let link = dir.join(format!("mklink-probe-{id}.link"));

    fs::write(&target, b"").map_err(|err| LinkError::io("probe.write", &target, err))?;
    let created = make_probe_link(&target, &link);
    discard_scratch_file(&link);
    discard_scratch_file(&target);

    match created {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            debug!(dir = %dir.display(), "probe link refused");
            Ok(false)
        }
        Err(err) => Err(LinkError::io("probe.symlink", link, err)),
    }
}

/// Remove a scratch file, reporting anything left behind. Returns whether the path is gone.
fn discard_scratch_file(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to remove privilege check scratch file"
            );
            false
        }
    }
}

#[cfg(unix)]
fn make_probe_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_probe_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn make_probe_link(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

/// Permits link creation only when the process runs with an effective uid of root.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElevationPrivilegeService;

#[async_trait]
impl PrivilegeService for ElevationPrivilegeService {
    async fn is_allowed(&self) -> LinkResult<bool> {
        effective_root()
    }
}

#[cfg(unix)]
fn effective_root() -> LinkResult<bool> {
    Ok(nix::unistd::geteuid().is_root())
}

#[cfg(not(unix))]
fn effective_root() -> LinkResult<bool> {
    Err(LinkError::Unsupported {
        operation: "privilege.elevated",
    })
}

type Lookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Permits link creation when the deployment environment is `development`.
///
/// The variable is read on every query, so changes are visible without a restart.
#[derive(Clone)]
pub struct EnvironmentPrivilegeService {
    lookup: Arc<Lookup>,
}

impl EnvironmentPrivilegeService {
    /// Read [`ENV_ENVIRONMENT`] from the process environment.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self::with_lookup(|key| env::var(key).ok())
    }

    /// Read variables through `lookup`.
    #[must_use]
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Arc::new(lookup),
        }
    }
}

#[async_trait]
impl PrivilegeService for EnvironmentPrivilegeService {
    async fn is_allowed(&self) -> LinkResult<bool> {
        Ok((self.lookup)(ENV_ENVIRONMENT)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case(DEVELOPMENT)))
    }
}

/// Permits link creation unconditionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPrivilegeService;

#[async_trait]
impl PrivilegeService for AlwaysPrivilegeService {
    async fn is_allowed(&self) -> LinkResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn environment_service_reads_value_live() -> LinkResult<()> {
        let value = Arc::new(Mutex::new(None::<String>));
        let source = value.clone();
        let service = EnvironmentPrivilegeService::with_lookup(move |key| {
            assert_eq!(key, ENV_ENVIRONMENT);
            source.lock().ok().and_then(|guard| guard.clone())
        });

        assert!(!service.is_allowed().await?);
        *value.lock().expect("lock") = Some(" Development ".to_string());
        assert!(service.is_allowed().await?);
        *value.lock().expect("lock") = Some("production".to_string());
        assert!(!service.is_allowed().await?);
        Ok(())
    }

    #[tokio::test]
    async fn always_service_allows() -> LinkResult<()> {
        assert!(AlwaysPrivilegeService.is_allowed().await?);
        assert!(privilege_service_for(PrivilegeSource::Always).is_allowed().await?);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn elevation_matches_effective_uid() -> LinkResult<()> {
        let expected = nix::unistd::geteuid().is_root();
        assert_eq!(ElevationPrivilegeService.is_allowed().await?, expected);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_succeeds_in_writable_dir_and_cleans_up() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let service = ProbePrivilegeService::in_dir(dir.path());
        assert!(service.is_allowed().await?);
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn scratch_cleanup_reports_entries_it_could_not_remove() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let stuck = dir.path().join("stuck");
        fs::create_dir(&stuck)?;

        assert!(!discard_scratch_file(&stuck));
        assert!(stuck.is_dir());
        assert!(discard_scratch_file(&dir.path().join("never-created")));
        Ok(())
    }

    #[tokio::test]
    async fn probe_in_missing_dir_is_an_error() {
        let dir = env::temp_dir().join(format!("mklink-missing-{}", Uuid::new_v4()));
        let service = ProbePrivilegeService::in_dir(dir);
        assert!(service.is_allowed().await.is_err());
    }
}
