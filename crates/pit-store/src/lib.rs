//! Content-addressed object storage for pit.
//!
//! This crate implements a hash-keyed object store analogous to git's
//! `.git/objects/` directory. Blobs, trees, and commits are immutable
//! objects identified by the SHA-1 digest of `"<kind> <len>\0"` followed by
//! their canonical body.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content (file contents, arbitrary bytes)
//! - [`Tree`] -- sorted directory listing mapping names to object references
//! - [`Commit`] -- a tree, at most one parent, and authorship
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`FileObjectStore`] -- loose objects under `<repo>/.pit/objects`
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Persist bottom-up: blobs, then the trees naming them, then the commit.
//! 3. Only bodies are stored; the kind is re-checked on verified reads.
//! 4. The store never interprets object contents -- it is a pure key-value store.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod commit;
pub mod error;
pub mod file;
pub mod history;
pub mod memory;
pub mod object;
pub mod traits;
pub mod tree;

// Re-export primary types at crate root for ergonomic imports.
pub use commit::Commit;
pub use error::{StoreError, StoreResult};
pub use file::{FileObjectStore, OBJECTS_DIR, PIT_DIR};
pub use history::{history, History};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, ObjectKind, StoredObject};
pub use traits::ObjectStore;
pub use tree::{validate_entry_name, EntryMode, Tree, TreeEntry};
