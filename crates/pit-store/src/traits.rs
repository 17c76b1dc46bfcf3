use pit_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same ID always maps to the same
///   bytes, so writing an existing ID again is a no-op in effect.
/// - Only the canonical body is stored; the hashing header is not.
/// - Concurrent reads are always safe, and concurrent writers of one ID
///   converge on identical bytes.
/// - The store never interprets object contents. It is a pure key-value
///   store keyed by digest.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `id`.
    ///
    /// The caller is responsible for `id` actually being the digest of
    /// `data`; no verification against existing content is done.
    fn put(&self, id: &ObjectId, data: &[u8]) -> StoreResult<()>;

    /// Read the body stored under `id`.
    ///
    /// Returns [`StoreError::NotFound`] if the object does not exist.
    fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Hash an object and store it, returning its ID.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        self.put(&id, &object.data)?;
        Ok(id)
    }

    /// Write multiple objects and return their IDs in order.
    ///
    /// Default implementation calls `write()` for each object and stops at
    /// the first failure.
    fn write_batch(&self, objects: &[StoredObject]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.write(obj)).collect()
    }

    /// Read an object and check that it hashes to `id` as the given kind.
    ///
    /// Kinds are not recorded on disk, so this is also how a caller confirms
    /// that an ID refers to the kind of object it expects.
    fn read_verified(&self, id: &ObjectId, kind: ObjectKind) -> StoreResult<Vec<u8>> {
        let data = self.get(id)?;
        let computed = kind.hasher().hash(&data);
        if computed != *id {
            return Err(StoreError::HashMismatch {
                id: *id,
                kind,
                computed,
            });
        }
        Ok(data)
    }
}
