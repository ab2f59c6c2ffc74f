//! Filesystem link backend and platform privilege services.
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

pub mod backend;
pub mod privilege;

pub use backend::FsLinkBackend;
pub use privilege::{
    AlwaysPrivilegeService, ENV_ENVIRONMENT, ElevationPrivilegeService,
    EnvironmentPrivilegeService, ProbePrivilegeService, privilege_service_for,
};
