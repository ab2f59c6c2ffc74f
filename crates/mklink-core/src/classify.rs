//! Closed error taxonomy and the classifier mapping raw failures onto it.
//!
//! The code is the stable contract callers branch on; messages are for display and
//! the raw underlying error is only ever logged.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;

use serde::{Deserialize, Serialize};

use crate::error::LinkError;
use crate::model::LinkOutcome;

/// Stable error codes reported per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The platform refused access to a path involved in the operation.
    #[serde(rename = "E_ACCESS_DENIED")]
    AccessDenied,
    /// A path involved in the operation does not exist.
    #[serde(rename = "E_PATH_NOT_FOUND")]
    PathNotFound,
    /// The link path is occupied and the policy forbids touching it.
    #[serde(rename = "E_ALREADY_EXISTS")]
    AlreadyExists,
    /// Any other IO failure.
    #[serde(rename = "E_IO")]
    IoError,
    /// Anything the classifier does not recognise.
    #[serde(rename = "E_UNEXPECTED")]
    Unexpected,
    /// A path was empty, relative or malformed.
    #[serde(rename = "E_INVALID_PATH")]
    InvalidPath,
    /// Link creation is not permitted for this process.
    #[serde(rename = "E_DEV_MODE_REQUIRED")]
    DevModeRequired,
    /// The batch exceeded the configured maximum.
    #[serde(rename = "E_TOO_MANY_ITEMS")]
    TooManyItems,
    /// An earlier source in the same batch already claimed this link name.
    #[serde(rename = "E_DUPLICATE_NAME")]
    DuplicateName,
}

impl ErrorCode {
    /// Wire representation of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessDenied => "E_ACCESS_DENIED",
            Self::PathNotFound => "E_PATH_NOT_FOUND",
            Self::AlreadyExists => "E_ALREADY_EXISTS",
            Self::IoError => "E_IO",
            Self::Unexpected => "E_UNEXPECTED",
            Self::InvalidPath => "E_INVALID_PATH",
            Self::DevModeRequired => "E_DEV_MODE_REQUIRED",
            Self::TooManyItems => "E_TOO_MANY_ITEMS",
            Self::DuplicateName => "E_DUPLICATE_NAME",
        }
    }

    /// User-safe message shown when no more specific message applies.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::AccessDenied => "Access denied.",
            Self::PathNotFound => "Path not found.",
            Self::AlreadyExists => "Link already exists.",
            Self::IoError => "I/O error occurred while creating the link.",
            Self::Unexpected => "Unexpected error occurred.",
            Self::InvalidPath => "Paths must be absolute.",
            Self::DevModeRequired => "Developer mode not enabled.",
            Self::TooManyItems => "Too many items.",
            Self::DuplicateName => "Duplicate name.",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a link error onto the taxonomy.
#[must_use]
pub fn classify(error: &LinkError) -> ErrorCode {
    match error {
        LinkError::InvalidPath { .. } => ErrorCode::InvalidPath,
        LinkError::Io { source, .. } => classify_io(source),
        LinkError::RenameExhausted { .. } => ErrorCode::IoError,
        LinkError::Backend { source, .. } => {
            let source: &(dyn Error + 'static) = &**source;
            classify_source(source)
        }
        LinkError::Cancelled
        | LinkError::PrivilegeQuery { .. }
        | LinkError::ContractViolation { .. }
        | LinkError::Unsupported { .. } => ErrorCode::Unexpected,
    }
}

/// Map a platform IO failure onto the taxonomy.
#[must_use]
pub fn classify_io(error: &io::Error) -> ErrorCode {
    match error.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            ErrorCode::AccessDenied
        }
        io::ErrorKind::NotFound => ErrorCode::PathNotFound,
        io::ErrorKind::AlreadyExists => ErrorCode::AlreadyExists,
        _ => ErrorCode::IoError,
    }
}

/// Walk an arbitrary error chain and classify the first recognised failure.
#[must_use]
pub fn classify_source(error: &(dyn Error + 'static)) -> ErrorCode {
    let mut current = Some(error);
    while let Some(candidate) = current {
        if let Some(link) = candidate.downcast_ref::<LinkError>() {
            return classify(link);
        }
        if let Some(io) = candidate.downcast_ref::<io::Error>() {
            return classify_io(io);
        }
        current = candidate.source();
    }
    ErrorCode::Unexpected
}

/// Build the failed outcome reported for a raised error.
#[must_use]
pub fn outcome_for(error: &LinkError) -> LinkOutcome {
    let code = classify(error);
    let message = match error {
        LinkError::Cancelled => "Operation cancelled.",
        LinkError::ContractViolation { .. } => "Failed to create symlinks.",
        _ => code.default_message(),
    };
    LinkOutcome::failed(code, message)
}
