use std::fs;
use std::path::{Path, PathBuf};

use pit_store::{
    history, Blob, Commit, FileObjectStore, ObjectKind, ObjectStore, Tree, TreeEntry, PIT_DIR,
};
use pit_types::{Identity, ObjectId};
use pit_worktree::{scan, Snapshot, SnapshotSummary, WorktreeEntry};
use tracing::{debug, info};

use crate::config::{RepoConfig, CONFIG_FILE};
use crate::error::{SdkError, SdkResult};

/// One step of [`Repository::log`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub id: ObjectId,
    pub commit: Commit,
}

/// High-level pit repository API.
///
/// Bundles a working-tree root, the loose-object store under
/// `<root>/.pit/objects`, and the settings from `<root>/.pit/config.toml`.
#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    store: FileObjectStore,
    config: RepoConfig,
}

impl Repository {
    /// Create the repository layout under `root`.
    ///
    /// Running this on an existing repository is harmless: nothing is
    /// overwritten. The returned flag is `true` when the repository was
    /// already there.
    pub fn init(root: impl AsRef<Path>) -> SdkResult<(Self, bool)> {
        let root = root.as_ref().to_path_buf();
        let existed = Self::exists_at(&root);

        let store = FileObjectStore::create(root.join(PIT_DIR).join(pit_store::OBJECTS_DIR))?;
        let config_path = root.join(PIT_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            RepoConfig::default().save(&config_path)?;
        }
        let config = RepoConfig::load(&config_path)?;

        if existed {
            info!(root = %root.display(), "reinitialized existing repository");
        } else {
            info!(root = %root.display(), "initialized empty repository");
        }
        Ok((Self { root, store, config }, existed))
    }

    /// Open the repository rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> SdkResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !Self::exists_at(&root) {
            return Err(SdkError::NotInitialized(root));
        }
        let config = RepoConfig::load(&root.join(PIT_DIR).join(CONFIG_FILE))?;
        let store = FileObjectStore::for_repo(&root);
        debug!(root = %root.display(), "opened repository");
        Ok(Self { root, store, config })
    }

    /// Whether `root` holds a repository (has `.pit/objects`).
    pub fn exists_at(root: &Path) -> bool {
        FileObjectStore::for_repo(root).objects_dir().is_dir()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &FileObjectStore {
        &self.store
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Use `identity` for commits made through this handle, instead of the
    /// configured one. The config file is not changed.
    pub fn set_identity(&mut self, identity: Identity) {
        self.config.user = Some(identity);
    }

    /// The identity commits will be recorded under.
    pub fn identity(&self) -> SdkResult<&Identity> {
        self.config.user.as_ref().ok_or(SdkError::MissingIdentity)
    }

    /// Save the current settings to `.pit/config.toml`.
    pub fn save_config(&self) -> SdkResult<()> {
        self.config.save(&self.root.join(PIT_DIR).join(CONFIG_FILE))
    }

    // ---- Content operations ----

    pub fn write_blob(&self, data: &[u8]) -> SdkResult<ObjectId> {
        let id = Blob::new(data).persist(&self.store)?;
        Ok(id)
    }

    /// Hash a file and store it as a blob.
    pub fn write_blob_from_file(&self, path: &Path) -> SdkResult<ObjectId> {
        let file = fs::File::open(path)?;
        let id = Blob::from_reader(file)?.persist(&self.store)?;
        Ok(id)
    }

    pub fn read_blob(&self, id: &ObjectId) -> SdkResult<Vec<u8>> {
        let blob = Blob::load(&self.store, id).map_err(SdkError::from_store)?;
        Ok(blob.into_data())
    }

    /// Store a tree over already-stored objects.
    ///
    /// Every entry must refer to an object that is already in the store,
    /// so a stored tree never points at something missing.
    pub fn write_tree(&self, entries: Vec<TreeEntry>) -> SdkResult<ObjectId> {
        for entry in &entries {
            if !self.store.exists(&entry.object_id)? {
                return Err(SdkError::ObjectNotFound(entry.object_id.to_hex()));
            }
        }
        let tree = Tree::from_entries(entries)?;
        Ok(tree.persist(&self.store)?)
    }

    pub fn read_tree(&self, id: &ObjectId) -> SdkResult<Tree> {
        Tree::load(&self.store, id).map_err(SdkError::from_store)
    }

    pub fn read_commit(&self, id: &ObjectId) -> SdkResult<Commit> {
        Commit::load(&self.store, id).map_err(SdkError::from_store)
    }

    /// Read any object's body, checking that it is of kind `kind`.
    pub fn read_object(&self, kind: ObjectKind, id: &ObjectId) -> SdkResult<Vec<u8>> {
        self.store
            .read_verified(id, kind)
            .map_err(SdkError::from_store)
    }

    // ---- Snapshot operations ----

    /// Persist enumerated working-tree items as nested trees.
    pub fn snapshot(
        &self,
        entries: impl IntoIterator<Item = WorktreeEntry>,
    ) -> SdkResult<SnapshotSummary> {
        let snapshot = Snapshot::from_entries(entries)?;
        Ok(snapshot.write(&self.store)?)
    }

    /// Scan the working tree on disk and persist it.
    pub fn snapshot_worktree(&self) -> SdkResult<SnapshotSummary> {
        let summary = self.snapshot(scan(&self.root)?)?;
        info!(
            root = %summary.root.short_hex(),
            blobs = summary.blobs,
            trees = summary.trees,
            "wrote working tree"
        );
        Ok(summary)
    }

    // ---- Commit operations ----

    /// Record `tree` as a new commit on top of `parent`.
    ///
    /// The tree and the parent (if any) must already be stored and be of the
    /// right kind. Author and committer are the current identity, timestamped
    /// now.
    pub fn commit(
        &self,
        tree: ObjectId,
        message: &str,
        parent: Option<ObjectId>,
    ) -> SdkResult<ObjectId> {
        let identity = self.identity()?;
        self.read_tree(&tree)?;
        if let Some(parent) = &parent {
            self.read_commit(parent)?;
        }

        let commit = Commit::new(tree, message, parent, identity);
        let id = commit.persist(&self.store)?;
        info!(
            commit = %id.short_hex(),
            tree = %tree.short_hex(),
            parent = ?parent.map(|p| p.short_hex()),
            "created commit"
        );
        Ok(id)
    }

    /// Walk the chain from `head`, newest first, returning at most `limit`
    /// commits.
    pub fn log(&self, head: ObjectId, limit: Option<usize>) -> SdkResult<Vec<LogEntry>> {
        let limit = limit.unwrap_or(usize::MAX);
        history(&self.store, head)
            .take(limit)
            .map(|step| {
                step.map(|(id, commit)| LogEntry { id, commit })
                    .map_err(SdkError::from_store)
            })
            .collect()
    }
}
