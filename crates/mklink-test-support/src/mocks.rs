//! In-memory fakes for the link backend and privilege service.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mklink_config::CollisionPolicy;
use mklink_core::{
    BackendFailure, CollisionResolution, LinkBackend, LinkError, LinkOutcome, LinkRequest,
    LinkResult, PrivilegeService, classify_io, outcome_for, resolve_collision,
};
use tokio_util::sync::CancellationToken;

/// Deliberate misbehaviour injected into [`FakeLinkBackend`] batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchScript {
    /// Behave correctly.
    #[default]
    Honest,
    /// Return one outcome more than requested.
    ExtraOutcome,
    /// Return one outcome fewer than requested.
    MissingOutcome,
    /// Raise after this many requests completed.
    RaiseAfter(usize),
    /// Cancel the supplied token after this many requests completed.
    CancelAfter(usize),
}

#[derive(Default)]
struct FakeState {
    occupied: HashSet<PathBuf>,
    links: HashMap<PathBuf, PathBuf>,
    failures: HashMap<PathBuf, io::ErrorKind>,
    requests: Vec<LinkRequest>,
    batches: usize,
}

/// Link backend that records calls and keeps created links in memory.
pub struct FakeLinkBackend {
    policy: CollisionPolicy,
    script: BatchScript,
    state: Mutex<FakeState>,
}

impl FakeLinkBackend {
    /// Honest backend applying `policy` on collisions.
    #[must_use]
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            script: BatchScript::Honest,
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Apply `script` to every batch submission.
    #[must_use]
    pub fn with_script(mut self, script: BatchScript) -> Self {
        self.script = script;
        self
    }

    /// Mark `path` as already occupied.
    pub fn occupy(&self, path: impl Into<PathBuf>) {
        self.state().occupied.insert(path.into());
    }

    /// Make link creation at `link_path` fail with an IO error of `kind`.
    pub fn fail_with(&self, link_path: impl Into<PathBuf>, kind: io::ErrorKind) {
        self.state().failures.insert(link_path.into(), kind);
    }

    /// Whether `path` is occupied, either pre-seeded or by a created link.
    #[must_use]
    pub fn is_occupied(&self, path: impl AsRef<Path>) -> bool {
        self.state().occupied.contains(path.as_ref())
    }

    /// Source a created link at `link_path` points to.
    #[must_use]
    pub fn link_target(&self, link_path: impl AsRef<Path>) -> Option<PathBuf> {
        self.state().links.get(link_path.as_ref()).cloned()
    }

    /// Every request that reached [`LinkBackend::create_link`], in order.
    #[must_use]
    pub fn requests(&self) -> Vec<LinkRequest> {
        self.state().requests.clone()
    }

    /// Number of per-item calls received.
    #[must_use]
    pub fn link_calls(&self) -> usize {
        self.state().requests.len()
    }

    /// Number of batch submissions received.
    #[must_use]
    pub fn batch_calls(&self) -> usize {
        self.state().batches
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LinkBackend for FakeLinkBackend {
    async fn create_link(
        &self,
        request: &LinkRequest,
        _cancel: &CancellationToken,
    ) -> LinkResult<LinkOutcome> {
        let mut state = self.state();
        state.requests.push(request.clone());

        if let Some(kind) = state.failures.get(&request.link_path).copied() {
            return Ok(LinkOutcome::failed_with(classify_io(&io::Error::from(kind))));
        }

        let resolution = match resolve_collision(&request.link_path, self.policy, |path| {
            state.occupied.contains(path)
        }) {
            Ok(resolution) => resolution,
            Err(err) => return Ok(outcome_for(&err)),
        };
        let link_path = match resolution {
            CollisionResolution::Occupied(_) => {
                return Ok(outcome_for(&LinkError::io(
                    "symlink",
                    request.link_path.clone(),
                    io::Error::from(io::ErrorKind::AlreadyExists),
                )));
            }
            CollisionResolution::Free(path)
            | CollisionResolution::Replace(path)
            | CollisionResolution::Renamed(path) => path,
        };

        state.occupied.insert(link_path.clone());
        state
            .links
            .insert(link_path.clone(), request.source_path.as_path().to_path_buf());
        Ok(LinkOutcome::succeeded(link_path))
    }

    async fn create_links(
        &self,
        requests: &[LinkRequest],
        cancel: &CancellationToken,
    ) -> Result<Vec<LinkOutcome>, BackendFailure> {
        self.state().batches += 1;

        let mut completed = Vec::with_capacity(requests.len());
        for request in requests {
            match self.script {
                BatchScript::RaiseAfter(n) if completed.len() == n => {
                    return Err(BackendFailure {
                        completed,
                        error: LinkError::backend(
                            "create_links",
                            io::Error::from(io::ErrorKind::PermissionDenied),
                        ),
                    });
                }
                BatchScript::CancelAfter(n) if completed.len() == n => cancel.cancel(),
                _ => {}
            }
            if cancel.is_cancelled() {
                return Err(BackendFailure {
                    completed,
                    error: LinkError::Cancelled,
                });
            }
            match self.create_link(request, cancel).await {
                Ok(outcome) => completed.push(outcome),
                Err(error) => return Err(BackendFailure { completed, error }),
            }
        }

        match self.script {
            BatchScript::ExtraOutcome => {
                completed.push(LinkOutcome::succeeded("/phantom"));
            }
            BatchScript::MissingOutcome => {
                completed.pop();
            }
            _ => {}
        }
        Ok(completed)
    }
}

/// Privilege service with a switchable answer.
#[derive(Debug, Default)]
pub struct FakePrivilegeService {
    allowed: AtomicBool,
    fail: AtomicBool,
    queries: AtomicUsize,
    refreshes: AtomicUsize,
}

impl FakePrivilegeService {
    /// Service permitting link creation.
    #[must_use]
    pub fn allowing() -> Self {
        let service = Self::default();
        service.set_allowed(true);
        service
    }

    /// Service denying link creation.
    #[must_use]
    pub fn denying() -> Self {
        Self::default()
    }

    /// Service whose query always fails.
    #[must_use]
    pub fn failing() -> Self {
        let service = Self::allowing();
        service.fail.store(true, Ordering::SeqCst);
        service
    }

    /// Change the answer returned by subsequent queries.
    pub fn set_allowed(&self, allowed: bool) {
        self.allowed.store(allowed, Ordering::SeqCst);
    }

    /// Number of queries received.
    #[must_use]
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Number of refreshes received.
    #[must_use]
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrivilegeService for FakePrivilegeService {
    async fn is_allowed(&self) -> LinkResult<bool> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(LinkError::privilege_query("capability source unavailable"));
        }
        Ok(self.allowed.load(Ordering::SeqCst))
    }

    async fn refresh(&self) -> LinkResult<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
