//! Layered configuration loading.
//!
//! # Design
//! - Layers apply in order: defaults, JSON file, environment, explicit overrides.
//! - Environment values are captured into the loader up front so tests can inject
//!   them without touching process state.
//! - Every layer is validated before the final `AppConfig` is assembled.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    AppConfig, CollisionPolicy, LogFormatKind, LoggingSettings, PrivilegeSettings,
    PrivilegeSource, SymlinkOptions,
};
use crate::validate::{cache_ttl_from_secs, parse_batch_max, validate_batch_max, validate_log_level};

/// Prefix shared by every environment variable the loader reads.
pub const ENV_PREFIX: &str = "MKLINK_";
/// Path to an optional JSON configuration file.
pub const ENV_CONFIG_PATH: &str = "MKLINK_CONFIG";
/// Collision policy override.
pub const ENV_COLLISION_POLICY: &str = "MKLINK_COLLISION_POLICY";
/// Batch limit override.
pub const ENV_BATCH_MAX: &str = "MKLINK_BATCH_MAX";
/// Log level override.
pub const ENV_LOG_LEVEL: &str = "MKLINK_LOG_LEVEL";
/// Log format override.
pub const ENV_LOG_FORMAT: &str = "MKLINK_LOG_FORMAT";
/// Privilege source override.
pub const ENV_PRIVILEGE_SOURCE: &str = "MKLINK_PRIVILEGE_SOURCE";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    symlink: FileSymlink,
    #[serde(default)]
    logging: FileLogging,
    #[serde(default)]
    privilege: FilePrivilege,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSymlink {
    collision_policy: Option<String>,
    batch_max: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileLogging {
    level: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilePrivilege {
    source: Option<String>,
    cache_ttl_secs: Option<u64>,
}

/// Values supplied by the caller (for example CLI flags) that win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Collision policy override.
    pub collision_policy: Option<CollisionPolicy>,
    /// Batch limit override; validated like any other layer.
    pub batch_max: Option<i64>,
    /// Log level override.
    pub log_level: Option<String>,
}

/// Builder that resolves an [`AppConfig`] from its layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    vars: HashMap<String, String>,
    overrides: ConfigOverrides,
}

struct Draft {
    collision_policy: CollisionPolicy,
    batch_max: u32,
    log_level: String,
    log_format: Option<LogFormatKind>,
    privilege: PrivilegeSettings,
}

impl ConfigLoader {
    /// Loader with no file, no environment and no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader seeded from the current process environment.
    ///
    /// Picks up `MKLINK_CONFIG` as the file path when set.
    #[must_use]
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        let file = vars
            .get(ENV_CONFIG_PATH)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        Self {
            file,
            vars,
            overrides: ConfigOverrides::default(),
        }
    }

    /// Read the JSON file at `path` as the file layer.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Set a single environment-layer value.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Apply explicit overrides above the environment layer.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Resolve and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file cannot be read or parsed, or when any
    /// layer supplies an invalid value.
    pub fn load(&self) -> ConfigResult<AppConfig> {
        let mut draft = Draft {
            collision_policy: SymlinkOptions::default().collision_policy(),
            batch_max: SymlinkOptions::default().batch_max(),
            log_level: LoggingSettings::default().level,
            log_format: None,
            privilege: PrivilegeSettings::default(),
        };

        if let Some(path) = &self.file {
            apply_file(&mut draft, read_file(path)?)?;
        }
        self.apply_env(&mut draft)?;
        self.apply_overrides(&mut draft)?;

        Ok(AppConfig {
            symlink: SymlinkOptions::new(draft.collision_policy, draft.batch_max)?,
            logging: LoggingSettings {
                level: draft.log_level,
                format: draft.log_format,
            },
            privilege: draft.privilege,
        })
    }

    fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    fn apply_env(&self, draft: &mut Draft) -> ConfigResult<()> {
        if let Some(raw) = self.var(ENV_COLLISION_POLICY) {
            draft.collision_policy = CollisionPolicy::from_str(raw)?;
        }
        if let Some(raw) = self.var(ENV_BATCH_MAX) {
            draft.batch_max = parse_batch_max(raw)?;
        }
        if let Some(raw) = self.var(ENV_LOG_LEVEL) {
            draft.log_level = validate_log_level(raw)?;
        }
        if let Some(raw) = self.var(ENV_LOG_FORMAT) {
            draft.log_format = Some(LogFormatKind::from_str(raw)?);
        }
        if let Some(raw) = self.var(ENV_PRIVILEGE_SOURCE) {
            draft.privilege.source = PrivilegeSource::from_str(raw)?;
        }
        Ok(())
    }

    fn apply_overrides(&self, draft: &mut Draft) -> ConfigResult<()> {
        if let Some(policy) = self.overrides.collision_policy {
            draft.collision_policy = policy;
        }
        if let Some(value) = self.overrides.batch_max {
            draft.batch_max = validate_batch_max(value)?;
        }
        if let Some(level) = &self.overrides.log_level {
            draft.log_level = validate_log_level(level)?;
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> ConfigResult<FileConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "read_config",
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_file(draft: &mut Draft, file: FileConfig) -> ConfigResult<()> {
    if let Some(raw) = file.symlink.collision_policy.as_deref() {
        draft.collision_policy = CollisionPolicy::from_str(raw)?;
    }
    if let Some(value) = file.symlink.batch_max {
        draft.batch_max = validate_batch_max(value)?;
    }
    if let Some(level) = file.logging.level.as_deref() {
        draft.log_level = validate_log_level(level)?;
    }
    if let Some(raw) = file.logging.format.as_deref() {
        draft.log_format = Some(LogFormatKind::from_str(raw)?);
    }
    if let Some(raw) = file.privilege.source.as_deref() {
        draft.privilege.source = PrivilegeSource::from_str(raw)?;
    }
    if let Some(secs) = file.privilege.cache_ttl_secs {
        draft.privilege.cache_ttl = cache_ttl_from_secs(secs);
    }
    Ok(())
}
