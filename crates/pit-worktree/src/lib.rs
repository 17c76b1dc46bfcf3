//! Working-tree snapshots for pit.
//!
//! Turns a flat enumeration of files and directories into nested tree
//! objects, persisting every blob and subtree before the tree that names it.
//!
//! # Key Types
//!
//! - [`WorktreeEntry`] -- One enumerated file or directory
//! - [`Snapshot`] -- In-memory directory hierarchy awaiting persistence
//! - [`SnapshotSummary`] -- Root tree ID and object counts after a write
//! - [`scan`] -- Enumerate a directory on disk, skipping `.pit` and `node_modules`

pub mod entry;
pub mod error;
pub mod scan;
pub mod snapshot;

pub use entry::WorktreeEntry;
pub use error::{WorktreeError, WorktreeResult};
pub use scan::{scan, SKIPPED_DIRS};
pub use snapshot::{Snapshot, SnapshotSummary};
