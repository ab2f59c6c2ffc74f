//! Domain models for link batches.
//!
//! # Design
//! - Requests are built per call from validated paths and never persisted.
//! - `LinkOutcome` keeps its fields private so `success` and the error fields can
//!   never disagree.

use std::ops::Index;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::classify::ErrorCode;
use crate::path::AbsolutePath;

/// Kind of filesystem entry the link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// File symbolic link.
    File,
    /// Directory symbolic link.
    Directory,
}

impl LinkKind {
    /// Whether the link targets a directory.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Lowercase label used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

/// One validated unit of work handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// Normalised source the link points at.
    pub source_path: AbsolutePath,
    /// Normalised folder the link is created in.
    pub destination_folder: AbsolutePath,
    /// Requested link path (`destination_folder/<source name>`), before collision handling.
    pub link_path: PathBuf,
    /// Kind of entry the link targets.
    pub kind: LinkKind,
}

impl LinkRequest {
    /// Whether the link targets a directory.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }
}

/// Result of one link attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkOutcome {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link_path: Option<PathBuf>,
}

impl LinkOutcome {
    /// Successful outcome reporting the path actually created.
    #[must_use]
    pub fn succeeded(link_path: impl Into<PathBuf>) -> Self {
        Self {
            success: true,
            error_message: None,
            error_code: None,
            link_path: Some(link_path.into()),
        }
    }

    /// Failed outcome with a stable code and display message.
    #[must_use]
    pub fn failed(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            error_code: Some(code),
            link_path: None,
        }
    }

    /// Failed outcome using the code's default message.
    #[must_use]
    pub fn failed_with(code: ErrorCode) -> Self {
        Self::failed(code, code.default_message())
    }

    /// Whether the link was created.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Display message for failures.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Stable code for failures.
    #[must_use]
    pub const fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }

    /// Path of the created link, which differs from the requested one after a rename.
    #[must_use]
    pub fn link_path(&self) -> Option<&Path> {
        self.link_path.as_deref()
    }
}

/// Ordered outcomes, one per input source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BatchResult(Vec<LinkOutcome>);

impl BatchResult {
    pub(crate) const fn new(outcomes: Vec<LinkOutcome>) -> Self {
        Self(outcomes)
    }

    /// `len` copies of the same outcome.
    pub(crate) fn uniform(len: usize, outcome: &LinkOutcome) -> Self {
        Self(vec![outcome.clone(); len])
    }

    /// Number of outcomes, always equal to the number of submitted sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the batch had no sources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Outcome for the source at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LinkOutcome> {
        self.0.get(index)
    }

    /// Iterate outcomes in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, LinkOutcome> {
        self.0.iter()
    }

    /// Outcomes as a slice.
    #[must_use]
    pub fn outcomes(&self) -> &[LinkOutcome] {
        &self.0
    }

    /// Number of successful outcomes.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.0.iter().filter(|outcome| outcome.is_success()).count()
    }

    /// Number of failed outcomes.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Consume the batch into its outcomes.
    #[must_use]
    pub fn into_outcomes(self) -> Vec<LinkOutcome> {
        self.0
    }
}

impl Index<usize> for BatchResult {
    type Output = LinkOutcome;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for BatchResult {
    type Item = LinkOutcome;
    type IntoIter = std::vec::IntoIter<LinkOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a LinkOutcome;
    type IntoIter = std::slice::Iter<'a, LinkOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
