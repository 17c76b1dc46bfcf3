//! High-level API for pit repositories.
//!
//! [`Repository`] ties a working-tree root to its loose-object store and
//! configuration. This is the main entry point for applications embedding
//! pit and the layer the `pit` binary is built on.

pub mod config;
pub mod error;
pub mod repository;

pub use config::{RepoConfig, CONFIG_FILE};
pub use error::{SdkError, SdkResult};
pub use repository::{LogEntry, Repository};

// Re-export key types
pub use pit_store::{Blob, Commit, EntryMode, ObjectKind, Tree, TreeEntry, PIT_DIR};
pub use pit_types::{Identity, ObjectId, Signature, Timestamp};
pub use pit_worktree::{SnapshotSummary, WorktreeEntry};
