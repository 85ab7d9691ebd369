//! Error types shared by the packer and the unpacker.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StegError {
    /// No marker in the file, or the marker is not followed by a ZIP signature.
    #[error("file does not appear to contain any hidden file(s)")]
    NoHiddenContent,

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The payload passed the signature check but its structure is broken.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    #[error("entry {name}: {reason}")]
    Entry { name: String, reason: String },

    #[error("entry {name}: unsupported compression method {method}")]
    UnsupportedCompression { name: String, method: u16 },

    #[error("archive too large: {0}")]
    ArchiveTooLarge(String),

    #[error("refusing to extract entry with unsafe name: {0}")]
    UnsafeEntryName(String),

    #[error("two input files share the name {0}")]
    DuplicateEntry(String),

    #[error("no files to hide")]
    NoInputs,
}

impl StegError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn entry(name: &str, reason: impl Into<String>) -> Self {
        Self::Entry {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures of the archive container itself, as opposed to
    /// filesystem or marker problems.
    pub fn is_container_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArchive(_) | Self::Entry { .. } | Self::UnsupportedCompression { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StegError>;
