//! Privilege gate over an injected capability service.
//!
//! # Design
//! - The service is the only source of truth; the gate caches its last answer so a
//!   batch costs at most one query.
//! - Staleness is bounded by an optional maximum age and by explicit [`PrivilegeGate::refresh`].
//! - A failed query denies and is never cached.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::error::LinkResult;

/// Answers whether this process may create symbolic links.
#[async_trait]
pub trait PrivilegeService: Send + Sync {
    /// Query the current capability state.
    ///
    /// # Errors
    ///
    /// Returns an error when the state cannot be determined.
    async fn is_allowed(&self) -> LinkResult<bool>;

    /// Drop any state the service caches on its own.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying source cannot be re-read.
    async fn refresh(&self) -> LinkResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedAnswer {
    allowed: bool,
    at: Instant,
}

/// Caching, default-deny wrapper around a [`PrivilegeService`].
pub struct PrivilegeGate {
    service: Arc<dyn PrivilegeService>,
    max_age: Option<Duration>,
    cached: Mutex<Option<CachedAnswer>>,
}

impl PrivilegeGate {
    /// Gate that caches answers until [`Self::refresh`] is called.
    #[must_use]
    pub fn new(service: Arc<dyn PrivilegeService>) -> Self {
        Self {
            service,
            max_age: None,
            cached: Mutex::new(None),
        }
    }

    /// Expire cached answers after `max_age`; `None` keeps them until refreshed.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Whether link creation is currently permitted. Query failures deny.
    pub async fn check_allowed(&self) -> bool {
        if let Some(allowed) = self.fresh_cached() {
            return allowed;
        }

        match self.service.is_allowed().await {
            Ok(allowed) => {
                *self.lock_cache() = Some(CachedAnswer {
                    allowed,
                    at: Instant::now(),
                });
                debug!(allowed, "privilege state queried");
                allowed
            }
            Err(err) => {
                warn!(
                    error = %err,
                    detail = %err.diagnostic_detail(),
                    "privilege state could not be determined; denying link creation"
                );
                false
            }
        }
    }

    /// Discard the cached answer and ask the service to re-read its source.
    ///
    /// # Errors
    ///
    /// Returns the service's refresh failure; the cache is cleared either way.
    pub async fn refresh(&self) -> LinkResult<()> {
        self.lock_cache().take();
        self.service.refresh().await
    }

    fn fresh_cached(&self) -> Option<bool> {
        let cached = (*self.lock_cache())?;
        match self.max_age {
            Some(max_age) if cached.at.elapsed() >= max_age => None,
            _ => Some(cached.allowed),
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<CachedAnswer>> {
        match self.cached.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("privilege cache mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }
}
