//! Typed configuration models for link creation.
//!
//! # Design
//! - Pure data carriers used by the orchestrator, backends and CLI.
//! - `SymlinkOptions` is only constructible through a validating constructor, so
//!   an instance in hand always satisfies `batch_max >= 1`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_BATCH_MAX, DEFAULT_COLLISION_POLICY, DEFAULT_LOG_LEVEL, DEFAULT_PRIVILEGE_SOURCE,
};
use crate::error::{ConfigError, ConfigResult};
use crate::validate::validate_batch_max;

/// Behaviour applied when the requested link path is already occupied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Leave the existing entry alone and report `AlreadyExists`.
    #[default]
    Skip,
    /// Remove the existing entry (recursively for directories) and link in its place.
    Overwrite,
    /// Link at the first free `<path>.<n>` sibling instead.
    Rename,
}

impl CollisionPolicy {
    /// Render the policy as its lowercase configuration value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
            Self::Rename => "rename",
        }
    }
}

impl Display for CollisionPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollisionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            "rename" => Ok(Self::Rename),
            _ => Err(ConfigError::invalid(
                "symlink",
                "collision_policy",
                s,
                "must be one of skip, overwrite, rename",
            )),
        }
    }
}

/// Immutable options for one orchestrator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SymlinkOptions {
    collision_policy: CollisionPolicy,
    batch_max: u32,
}

impl SymlinkOptions {
    /// Build validated options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when `batch_max` is zero.
    pub fn new(collision_policy: CollisionPolicy, batch_max: u32) -> ConfigResult<Self> {
        validate_batch_max(i64::from(batch_max))?;
        Ok(Self {
            collision_policy,
            batch_max,
        })
    }

    /// Policy applied by backends when a link path is occupied.
    #[must_use]
    pub const fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }

    /// Largest batch accepted by one orchestrator call.
    #[must_use]
    pub const fn batch_max(&self) -> u32 {
        self.batch_max
    }

    /// `batch_max` widened for comparisons against collection lengths.
    #[must_use]
    pub fn batch_max_len(&self) -> usize {
        usize::try_from(self.batch_max).unwrap_or(usize::MAX)
    }
}

impl Default for SymlinkOptions {
    fn default() -> Self {
        Self {
            collision_policy: DEFAULT_COLLISION_POLICY,
            batch_max: DEFAULT_BATCH_MAX,
        }
    }
}

/// Output format requested for diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatKind {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

impl FromStr for LogFormatKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::invalid(
                "logging",
                "format",
                s,
                "must be one of json, pretty",
            )),
        }
    }
}

/// Logging settings consumed by the telemetry crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Explicit output format; inferred from the build profile when absent.
    pub format: Option<LogFormatKind>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: None,
        }
    }
}

/// Capability source consulted to decide whether link creation is permitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeSource {
    /// Create and remove a scratch symlink to test the capability directly.
    #[default]
    Probe,
    /// Require the process to run with an elevated (root) effective user.
    Elevated,
    /// Require `MKLINK_ENVIRONMENT=development`.
    Environment,
    /// Permit unconditionally.
    Always,
}

impl PrivilegeSource {
    /// Render the source as its lowercase configuration value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Elevated => "elevated",
            Self::Environment => "environment",
            Self::Always => "always",
        }
    }
}

impl FromStr for PrivilegeSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "probe" => Ok(Self::Probe),
            "elevated" => Ok(Self::Elevated),
            "environment" => Ok(Self::Environment),
            "always" => Ok(Self::Always),
            _ => Err(ConfigError::invalid(
                "privilege",
                "source",
                s,
                "must be one of probe, elevated, environment, always",
            )),
        }
    }
}

/// Privilege gate settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrivilegeSettings {
    /// Service consulted by the privilege gate.
    pub source: PrivilegeSource,
    /// Maximum age of a cached answer; `None` caches until an explicit refresh.
    pub cache_ttl: Option<Duration>,
}

impl Default for PrivilegeSettings {
    fn default() -> Self {
        Self {
            source: DEFAULT_PRIVILEGE_SOURCE,
            cache_ttl: None,
        }
    }
}

/// Fully validated application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    /// Orchestrator options.
    pub symlink: SymlinkOptions,
    /// Diagnostics settings.
    pub logging: LoggingSettings,
    /// Privilege gate settings.
    pub privilege: PrivilegeSettings,
}
