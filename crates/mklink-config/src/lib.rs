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

//! Configuration facade for symlink batch creation.
//!
//! Layout: `model.rs` (typed options), `validate.rs` (field parsing),
//! `loader.rs` (defaults, JSON file and environment layering).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    ConfigLoader, ConfigOverrides, ENV_BATCH_MAX, ENV_COLLISION_POLICY, ENV_CONFIG_PATH,
    ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_PREFIX, ENV_PRIVILEGE_SOURCE,
};
pub use model::{
    AppConfig, CollisionPolicy, LogFormatKind, LoggingSettings, PrivilegeSettings,
    PrivilegeSource, SymlinkOptions,
};
