//! Partition a batch into unique link requests and pre-filled failures.
//!
//! Pure: no IO, no logging. Tie-break between sources that map to the same
//! link name is strictly input order.

use std::collections::HashSet;
use std::path::Path;

use crate::classify::ErrorCode;
use crate::model::{LinkKind, LinkOutcome, LinkRequest};
use crate::path::{AbsolutePath, validate_absolute};

/// Message for a source that already sits where its link would go.
pub const SOURCE_AT_LINK_PATH: &str = "Source is already at the link path.";

/// Output of [`deduplicate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduplicated {
    /// Requests to submit, each paired with its index in the input.
    pub unique: Vec<(usize, LinkRequest)>,
    /// One slot per input; `Some` for slots already decided without the backend.
    pub prefilled: Vec<Option<LinkOutcome>>,
}

impl Deduplicated {
    /// Requests in submission order without their indices.
    #[must_use]
    pub fn requests(&self) -> Vec<LinkRequest> {
        self.unique
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }
}

/// Split `sources` into first-occurrence requests and duplicate or invalid slots.
#[must_use]
pub fn deduplicate<S: AsRef<Path>>(
    sources: &[S],
    destination: &AbsolutePath,
    kind: LinkKind,
) -> Deduplicated {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    let mut prefilled = Vec::with_capacity(sources.len());

    for (index, source) in sources.iter().enumerate() {
        let Ok(source_path) = validate_absolute(source) else {
            prefilled.push(Some(LinkOutcome::failed_with(ErrorCode::InvalidPath)));
            continue;
        };
        let (Some(name), Some(key)) = (source_path.file_name(), source_path.link_name_key())
        else {
            prefilled.push(Some(LinkOutcome::failed(
                ErrorCode::InvalidPath,
                "Source path has no name.",
            )));
            continue;
        };

        if !seen.insert(key) {
            prefilled.push(Some(LinkOutcome::failed(
                ErrorCode::DuplicateName,
                format!("Duplicate name: {}", name.to_string_lossy()),
            )));
            continue;
        }

        let link_path = destination.join(name);
        if same_location(&link_path, source_path.as_path()) {
            prefilled.push(Some(LinkOutcome::failed(
                ErrorCode::AlreadyExists,
                SOURCE_AT_LINK_PATH,
            )));
            continue;
        }
        prefilled.push(None);
        unique.push((
            index,
            LinkRequest {
                source_path,
                destination_folder: destination.clone(),
                link_path,
                kind,
            },
        ));
    }

    Deduplicated { unique, prefilled }
}

#[cfg(windows)]
fn same_location(link_path: &Path, source: &Path) -> bool {
    link_path
        .to_string_lossy()
        .eq_ignore_ascii_case(&source.to_string_lossy())
}

#[cfg(not(windows))]
fn same_location(link_path: &Path, source: &Path) -> bool {
    link_path == source
}
