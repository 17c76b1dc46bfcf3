use std::io::Read;
use std::str::FromStr;

use pit_crypto::ContentHasher;
use pit_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::traits::ObjectStore;

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Directory listing: sorted entries mapping names to object references.
    Tree,
    /// Snapshot pointer: a tree, an optional parent, and authorship.
    Commit,
}

impl ObjectKind {
    /// The hasher that produces IDs for this kind.
    pub fn hasher(&self) -> ContentHasher {
        match self {
            Self::Blob => ContentHasher::BLOB,
            Self::Tree => ContentHasher::TREE,
            Self::Commit => ContentHasher::COMMIT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            other => Err(format!("unknown object kind: {other}")),
        }
    }
}

/// A stored object: kind tag + canonical body.
///
/// `StoredObject` is the unit handed to [`ObjectStore::write`]. Only `data`
/// reaches the backend; the kind exists to pick the hasher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The canonical body of the object.
    pub data: Vec<u8>,
}

impl StoredObject {
    /// Create a new stored object from kind and body.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    /// Size of the body in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object (analogous to git blob).
///
/// The ID is computed once, at construction. Content is opaque bytes and is
/// never decoded as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    id: ObjectId,
    data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let id = ContentHasher::BLOB.hash(&data);
        Self { id, data }
    }

    /// Read a blob's content to the end of `reader`.
    pub fn from_reader<R: Read>(mut reader: R) -> StoreResult<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::new(data))
    }

    /// Compute the ID of `len` bytes read from `reader` without buffering
    /// them. A reader that ends early or runs long is an error.
    pub fn id_from_reader<R: Read>(len: u64, reader: R) -> StoreResult<ObjectId> {
        Ok(ContentHasher::BLOB.hash_reader(len, reader)?)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write the blob's content under its ID.
    pub fn persist<S: ObjectStore + ?Sized>(&self, store: &S) -> StoreResult<ObjectId> {
        store.put(&self.id, &self.data)?;
        Ok(self.id)
    }

    /// Convert into a `StoredObject` for batch writes.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Load a blob from the store, checking its content against `id`.
    pub fn load<S: ObjectStore + ?Sized>(store: &S, id: &ObjectId) -> StoreResult<Self> {
        let data = store.read_verified(id, ObjectKind::Blob)?;
        Ok(Self { id: *id, data })
    }
}
