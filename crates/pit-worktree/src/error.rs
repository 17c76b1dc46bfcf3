//! Error types for the worktree crate.

use std::path::PathBuf;

/// Errors that can occur while turning working-tree content into objects.
#[derive(Debug, thiserror::Error)]
pub enum WorktreeError {
    /// A path that cannot become a chain of tree entry names.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A path used both as a file and as a directory.
    #[error("path is both a file and a directory: {0}")]
    Conflict(String),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] pit_store::StoreError),

    /// Reading a working-tree file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the working tree failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl WorktreeError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for worktree results.
pub type WorktreeResult<T> = Result<T, WorktreeError>;
