use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pit_types::{ObjectId, HEX_LEN};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Name of the repository metadata directory under a repo root.
pub const PIT_DIR: &str = ".pit";

/// Name of the objects directory under [`PIT_DIR`].
pub const OBJECTS_DIR: &str = "objects";

/// Loose-object store on the local filesystem.
///
/// Each object lives at `<objects>/<hex[0..2]>/<hex[2..]>` and holds exactly
/// the object's canonical body. Writes go to a temporary file inside the
/// objects directory and are renamed into place, so a reader never sees a
/// partial object and concurrent writers of one ID converge on the same
/// bytes.
#[derive(Clone, Debug)]
pub struct FileObjectStore {
    objects_dir: PathBuf,
}

impl FileObjectStore {
    /// Use `objects_dir` as the store root. Does not touch the filesystem.
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: objects_dir.into(),
        }
    }

    /// The store for the repository rooted at `repo_root`
    /// (`<repo_root>/.pit/objects`).
    pub fn for_repo(repo_root: &Path) -> Self {
        Self::new(repo_root.join(PIT_DIR).join(OBJECTS_DIR))
    }

    /// Create the objects directory if needed and return the store.
    pub fn create(objects_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self::new(objects_dir);
        fs::create_dir_all(&store.objects_dir)?;
        Ok(store)
    }

    /// Root directory holding the object buckets.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Where the object with `id` lives (whether or not it exists).
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (bucket, file) = id.bucket_parts();
        self.objects_dir.join(bucket).join(file)
    }

    /// Every object ID present on disk, sorted.
    ///
    /// Files whose bucket and name do not form a valid hex ID (such as
    /// leftover temporary files) are skipped.
    pub fn all_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let mut ids = Vec::new();
        let buckets = match fs::read_dir(&self.objects_dir) {
            Ok(buckets) => buckets,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        for bucket in buckets {
            let bucket = bucket?;
            let bucket_name = bucket.file_name();
            let Some(prefix) = bucket_name.to_str().filter(|n| n.len() == 2) else {
                continue;
            };
            if !bucket.file_type()?.is_dir() {
                continue;
            }
            for object in fs::read_dir(bucket.path())? {
                let object = object?;
                let object_name = object.file_name();
                let Some(rest) = object_name.to_str().filter(|n| n.len() == HEX_LEN - 2) else {
                    continue;
                };
                if let Ok(id) = ObjectId::from_hex(&format!("{prefix}{rest}")) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl ObjectStore for FileObjectStore {
    fn put(&self, id: &ObjectId, data: &[u8]) -> StoreResult<()> {
        let path = self.object_path(id);
        if self.exists(id)? {
            debug!(id = %id.short_hex(), "object already present");
            return Ok(());
        }
        let bucket = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "object path has no parent"))?;
        fs::create_dir_all(bucket)?;

        let mut tmp = NamedTempFile::new_in(bucket)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(id = %id.short_hex(), len = data.len(), "wrote object");
        Ok(())
    }

    fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        match fs::read(self.object_path(id)) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(*id)),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        match fs::metadata(self.object_path(id)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
