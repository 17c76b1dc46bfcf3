use pit_types::ObjectId;

use crate::object::ObjectKind;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Stored bytes do not hash to the ID they were read under.
    #[error("hash mismatch for {kind} {id}: content hashes to {computed}")]
    HashMismatch {
        id: ObjectId,
        kind: ObjectKind,
        computed: ObjectId,
    },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A tree entry name that cannot be serialized unambiguously.
    #[error("invalid tree entry {name:?}: {reason}")]
    InvalidEntry { name: String, reason: String },

    /// The object body is malformed or cannot be decoded.
    #[error("corrupt {kind} object: {reason}")]
    CorruptObject { kind: ObjectKind, reason: String },
}

impl StoreError {
    pub(crate) fn corrupt(kind: ObjectKind, reason: impl Into<String>) -> Self {
        Self::CorruptObject {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_entry(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
