//! Absolute path validation and lexical normalisation.
//!
//! Paths are never resolved against the filesystem here; `.` and `..` segments are
//! folded lexically so link names derived from them compare consistently.

use std::ffi::OsStr;
use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::{LinkError, LinkResult};

/// A validated, normalised, fully-qualified path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AbsolutePath(PathBuf);

impl AbsolutePath {
    /// Borrow the underlying path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Final component, absent for a bare root.
    #[must_use]
    pub fn file_name(&self) -> Option<&OsStr> {
        self.0.file_name()
    }

    /// Case-insensitive link name used to detect duplicates within a batch.
    #[must_use]
    pub fn link_name_key(&self) -> Option<String> {
        self.file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
    }

    /// Append a component to this path.
    #[must_use]
    pub fn join(&self, component: impl AsRef<Path>) -> PathBuf {
        self.0.join(component)
    }

    /// Consume into the owned path.
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for AbsolutePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for AbsolutePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Validate that `path` is absolute and return its normalised form.
///
/// # Errors
///
/// Returns [`LinkError::InvalidPath`] when the input is empty, whitespace-only,
/// contains a NUL byte or platform-invalid characters, or is not fully qualified.
pub fn validate_absolute(path: impl AsRef<Path>) -> LinkResult<AbsolutePath> {
    let path = path.as_ref();
    let raw = path.as_os_str();
    let lossy = raw.to_string_lossy();

    if raw.is_empty() {
        return Err(LinkError::invalid_path("empty", lossy));
    }
    if lossy.trim().is_empty() {
        return Err(LinkError::invalid_path("whitespace_only", lossy));
    }
    if raw.as_encoded_bytes().contains(&0) {
        return Err(LinkError::invalid_path("contains_nul", lossy));
    }
    if !path.is_absolute() {
        return Err(LinkError::invalid_path("not_absolute", lossy));
    }
    if has_invalid_characters(path) {
        return Err(LinkError::invalid_path("invalid_characters", lossy));
    }

    let normalised = normalise(path);
    if !normalised.is_absolute() {
        return Err(LinkError::invalid_path("not_absolute", lossy));
    }
    Ok(AbsolutePath(normalised))
}

fn normalise(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                if out.file_name().is_some() {
                    out.pop();
                }
            }
        }
    }
    out
}

#[cfg(windows)]
fn has_invalid_characters(path: &Path) -> bool {
    const INVALID: &[char] = &['<', '>', '"', '|', '?', '*'];
    path.components().any(|component| match component {
        Component::Normal(part) => part
            .to_string_lossy()
            .chars()
            .any(|ch| INVALID.contains(&ch) || ch == ':' || ch.is_control()),
        _ => false,
    })
}

#[cfg(not(windows))]
const fn has_invalid_characters(_path: &Path) -> bool {
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn reason(err: &LinkError) -> &'static str {
        match err {
            LinkError::InvalidPath { reason, .. } => reason,
            _ => "other",
        }
    }

    #[test]
    fn rejects_blank_and_relative_inputs() {
        for (input, expected) in [
            ("", "empty"),
            ("   ", "whitespace_only"),
            ("relative/path", "not_absolute"),
            ("./here", "not_absolute"),
        ] {
            let err = validate_absolute(input).expect_err(input);
            assert_eq!(reason(&err), expected, "{input:?}");
        }
    }

    #[test]
    fn rejects_embedded_nul() {
        let err = validate_absolute("/tmp/a\0b").expect_err("nul");
        assert_eq!(reason(&err), "contains_nul");
    }

    #[test]
    fn folds_dot_segments_and_separators() -> LinkResult<()> {
        let path = validate_absolute("/data//links/./nested/../target/")?;
        assert_eq!(path.as_path(), Path::new("/data/links/target"));
        assert_eq!(path.link_name_key().as_deref(), Some("target"));
        Ok(())
    }

    #[test]
    fn parent_segments_stop_at_root() -> LinkResult<()> {
        let path = validate_absolute("/../../etc")?;
        assert_eq!(path.as_path(), Path::new("/etc"));

        let root = validate_absolute("/..")?;
        assert_eq!(root.as_path(), Path::new("/"));
        assert!(root.file_name().is_none());
        Ok(())
    }

    #[test]
    fn link_name_key_is_case_insensitive() -> LinkResult<()> {
        let upper = validate_absolute("/a/Report.TXT")?;
        let lower = validate_absolute("/b/report.txt")?;
        assert_eq!(upper.link_name_key(), lower.link_name_key());
        assert_eq!(upper.join("x"), PathBuf::from("/a/Report.TXT/x"));
        assert_eq!(upper.to_string(), "/a/Report.TXT");
        Ok(())
    }
}
