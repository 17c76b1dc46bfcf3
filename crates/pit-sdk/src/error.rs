use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("not a pit repository: {} (run `pit init`)", .0.display())]
    NotInitialized(PathBuf),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("no author identity configured (set [user] in .pit/config.toml or pass --author-name/--author-email)")]
    MissingIdentity,

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("store error: {0}")]
    Store(#[from] pit_store::StoreError),

    #[error("worktree error: {0}")]
    Worktree(#[from] pit_worktree::WorktreeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// Turn a store `NotFound` into `ObjectNotFound`, leaving other errors
    /// as they are.
    pub(crate) fn from_store(err: pit_store::StoreError) -> Self {
        match err {
            pit_store::StoreError::NotFound(id) => Self::ObjectNotFound(id.to_hex()),
            other => Self::Store(other),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
