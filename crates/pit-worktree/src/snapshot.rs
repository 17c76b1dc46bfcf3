//! Building nested trees from a flat list of working-tree items.
//!
//! The [`Snapshot`] holds a directory hierarchy in memory. Nothing touches
//! the store until [`Snapshot::write`], which persists every blob first and
//! then every tree children-before-parent, so a tree is never stored while
//! one of its entries is missing.

use std::collections::BTreeMap;

use pit_store::{validate_entry_name, Blob, EntryMode, ObjectStore, Tree};
use pit_types::ObjectId;
use tracing::debug;

use crate::entry::WorktreeEntry;
use crate::error::{WorktreeError, WorktreeResult};

#[derive(Clone, Debug, Default)]
struct DirNode {
    files: BTreeMap<String, Blob>,
    dirs: BTreeMap<String, DirNode>,
}

impl DirNode {
    fn blob_count(&self) -> usize {
        self.files.len() + self.dirs.values().map(DirNode::blob_count).sum::<usize>()
    }

    fn tree_count(&self) -> usize {
        1 + self.dirs.values().map(DirNode::tree_count).sum::<usize>()
    }

    fn persist_blobs<S: ObjectStore + ?Sized>(&self, store: &S) -> WorktreeResult<()> {
        for blob in self.files.values() {
            blob.persist(store)?;
        }
        for dir in self.dirs.values() {
            dir.persist_blobs(store)?;
        }
        Ok(())
    }

    /// Build this directory's tree. With a store, children are persisted
    /// before the tree itself.
    fn build_tree<S: ObjectStore + ?Sized>(&self, store: Option<&S>) -> WorktreeResult<Tree> {
        let mut tree = Tree::new();
        for (name, dir) in &self.dirs {
            let subtree = dir.build_tree(store)?;
            let id = match store {
                Some(store) => subtree.persist(store)?,
                None => subtree.id(),
            };
            tree.add_entry(name.clone(), id, EntryMode::Directory)?;
        }
        for (name, blob) in &self.files {
            tree.add_entry(name.clone(), blob.id(), EntryMode::File)?;
        }
        Ok(tree)
    }
}

/// What [`Snapshot::write`] stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// ID of the root tree.
    pub root: ObjectId,
    /// Number of file entries (blobs, before dedup).
    pub blobs: usize,
    /// Number of trees, including the root.
    pub trees: usize,
}

/// In-memory directory hierarchy awaiting persistence.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    root: DirNode,
}

impl Snapshot {
    /// An empty snapshot (writes as the empty tree).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from enumerated working-tree items.
    pub fn from_entries(entries: impl IntoIterator<Item = WorktreeEntry>) -> WorktreeResult<Self> {
        let mut snapshot = Self::new();
        for entry in entries {
            snapshot.add(entry)?;
        }
        Ok(snapshot)
    }

    /// Add one enumerated item.
    pub fn add(&mut self, entry: WorktreeEntry) -> WorktreeResult<()> {
        if entry.is_directory {
            self.add_directory(&entry.path)
        } else {
            self.add_file(&entry.path, entry.content)
        }
    }

    /// Add (or replace) a file. Missing parent directories are created.
    pub fn add_file(&mut self, path: &str, content: impl Into<Vec<u8>>) -> WorktreeResult<()> {
        let (parents, name) = split_path(path)?;
        let dir = self.descend(path, &parents)?;
        if dir.dirs.contains_key(name) {
            return Err(WorktreeError::Conflict(path.to_string()));
        }
        dir.files.insert(name.to_string(), Blob::new(content));
        Ok(())
    }

    /// Add a directory, so it appears even if it holds no files.
    pub fn add_directory(&mut self, path: &str) -> WorktreeResult<()> {
        let (mut parents, name) = split_path(path)?;
        parents.push(name);
        self.descend(path, &parents)?;
        Ok(())
    }

    /// Number of files in the snapshot.
    pub fn file_count(&self) -> usize {
        self.root.blob_count()
    }

    /// Returns `true` if the snapshot has no files and no directories.
    pub fn is_empty(&self) -> bool {
        self.root.files.is_empty() && self.root.dirs.is_empty()
    }

    /// The root tree ID this snapshot would be stored under, without
    /// writing anything.
    pub fn root_id(&self) -> WorktreeResult<ObjectId> {
        let tree = self.root.build_tree::<dyn ObjectStore>(None)?;
        Ok(tree.id())
    }

    /// Persist all blobs, then all trees bottom-up, and return what was
    /// written.
    ///
    /// An error stops the write before any tree that would refer to the
    /// failed object is stored.
    pub fn write<S: ObjectStore + ?Sized>(&self, store: &S) -> WorktreeResult<SnapshotSummary> {
        self.root.persist_blobs(store)?;
        let root = self.root.build_tree(Some(store))?.persist(store)?;
        let summary = SnapshotSummary {
            root,
            blobs: self.root.blob_count(),
            trees: self.root.tree_count(),
        };
        debug!(
            root = %root.short_hex(),
            blobs = summary.blobs,
            trees = summary.trees,
            "snapshot written"
        );
        Ok(summary)
    }

    fn descend(&mut self, path: &str, components: &[&str]) -> WorktreeResult<&mut DirNode> {
        let mut node = &mut self.root;
        for component in components {
            if node.files.contains_key(*component) {
                return Err(WorktreeError::Conflict(path.to_string()));
            }
            node = node.dirs.entry(component.to_string()).or_default();
        }
        Ok(node)
    }
}

/// Split a `/`-separated relative path into validated parent components and
/// the final name.
fn split_path(path: &str) -> WorktreeResult<(Vec<&str>, &str)> {
    if path.is_empty() {
        return Err(WorktreeError::invalid_path(path, "path is empty"));
    }
    if path.starts_with('/') {
        return Err(WorktreeError::invalid_path(path, "path is absolute"));
    }
    let mut components: Vec<&str> = path.split('/').collect();
    for component in &components {
        validate_entry_name(component)
            .map_err(|e| WorktreeError::invalid_path(path, e.to_string()))?;
    }
    let name = components.pop().unwrap_or_default();
    Ok((components, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pit_store::{InMemoryObjectStore, ObjectKind, StoreError, StoreResult, TreeEntry};

    fn entries() -> Vec<WorktreeEntry> {
        vec![
            WorktreeEntry::file("README.md", "# readme\n"),
            WorktreeEntry::file("src/main.rs", "fn main() {}\n"),
            WorktreeEntry::file("src/util/mod.rs", "// util\n"),
            WorktreeEntry::directory("empty"),
        ]
    }

    #[test]
    fn empty_snapshot_is_the_empty_tree() {
        let store = InMemoryObjectStore::new();
        let summary = Snapshot::new().write(&store).unwrap();
        assert_eq!(summary.root.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert_eq!(summary.blobs, 0);
        assert_eq!(summary.trees, 1);
    }

    #[test]
    fn nested_paths_become_nested_trees() {
        let store = InMemoryObjectStore::new();
        let snapshot = Snapshot::from_entries(entries()).unwrap();
        let summary = snapshot.write(&store).unwrap();
        assert_eq!(summary.blobs, 3);
        assert_eq!(summary.trees, 4);

        let root = Tree::load(&store, &summary.root).unwrap();
        let names: Vec<&str> = root.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["README.md", "empty", "src"]);

        let empty = root.get("empty").unwrap();
        assert_eq!(empty.mode, EntryMode::Directory);
        assert_eq!(empty.object_id, Tree::new().id());

        let src = Tree::load(&store, &root.get("src").unwrap().object_id).unwrap();
        let main = src.get("main.rs").unwrap();
        assert_eq!(main.mode, EntryMode::File);
        assert_eq!(
            store.read_verified(&main.object_id, ObjectKind::Blob).unwrap(),
            b"fn main() {}\n"
        );
        let util = Tree::load(&store, &src.get("util").unwrap().object_id).unwrap();
        assert!(util.get("mod.rs").is_some());
    }

    #[test]
    fn every_referenced_object_is_stored() {
        let store = InMemoryObjectStore::new();
        let summary = Snapshot::from_entries(entries()).unwrap().write(&store).unwrap();

        let mut pending = vec![summary.root];
        while let Some(id) = pending.pop() {
            let tree = Tree::load(&store, &id).unwrap();
            for TreeEntry { mode, object_id, .. } in tree.iter() {
                match mode {
                    EntryMode::Directory => pending.push(*object_id),
                    EntryMode::File => assert!(store.exists(object_id).unwrap()),
                }
            }
        }
    }

    #[test]
    fn root_id_matches_written_root() {
        let store = InMemoryObjectStore::new();
        let snapshot = Snapshot::from_entries(entries()).unwrap();
        let predicted = snapshot.root_id().unwrap();
        assert!(store.is_empty());
        assert_eq!(snapshot.write(&store).unwrap().root, predicted);
    }

    #[test]
    fn entry_order_does_not_matter() {
        let forward = Snapshot::from_entries(entries()).unwrap();
        let backward = Snapshot::from_entries(entries().into_iter().rev()).unwrap();
        assert_eq!(forward.root_id().unwrap(), backward.root_id().unwrap());
    }

    #[test]
    fn identical_files_share_a_blob() {
        let store = InMemoryObjectStore::new();
        let snapshot = Snapshot::from_entries([
            WorktreeEntry::file("a.txt", "same"),
            WorktreeEntry::file("dir/b.txt", "same"),
        ])
        .unwrap();
        let summary = snapshot.write(&store).unwrap();
        assert_eq!(summary.blobs, 2);
        // One blob, the `dir` tree, and the root tree.
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn re_adding_a_file_replaces_it() {
        let mut snapshot = Snapshot::new();
        snapshot.add_file("a.txt", "old").unwrap();
        snapshot.add_file("a.txt", "new").unwrap();
        assert_eq!(snapshot.file_count(), 1);

        let mut expected = Snapshot::new();
        expected.add_file("a.txt", "new").unwrap();
        assert_eq!(snapshot.root_id().unwrap(), expected.root_id().unwrap());
    }

    #[test]
    fn file_directory_conflicts_are_rejected() {
        let mut snapshot = Snapshot::new();
        snapshot.add_file("a", "file").unwrap();
        assert!(matches!(
            snapshot.add_file("a/b", "x"),
            Err(WorktreeError::Conflict(_))
        ));

        let mut snapshot = Snapshot::new();
        snapshot.add_file("a/b", "x").unwrap();
        assert!(matches!(
            snapshot.add_file("a", "file"),
            Err(WorktreeError::Conflict(_))
        ));
        assert!(matches!(
            snapshot.add_directory("a/b"),
            Err(WorktreeError::Conflict(_))
        ));
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let mut snapshot = Snapshot::new();
        for bad in ["", "/abs", "a//b", "a/", "./a", "a/../b", "tab\tname"] {
            let err = snapshot.add_file(bad, "x").unwrap_err();
            assert!(matches!(err, WorktreeError::InvalidPath { .. }), "{bad:?}");
        }
        assert!(snapshot.is_empty());
    }

    /// Fails every write of one chosen ID and records what was written.
    struct FailingStore {
        inner: InMemoryObjectStore,
        poison: ObjectId,
    }

    impl ObjectStore for FailingStore {
        fn put(&self, id: &ObjectId, data: &[u8]) -> StoreResult<()> {
            if *id == self.poison {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.put(id, data)
        }

        fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
            self.inner.get(id)
        }

        fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
            self.inner.exists(id)
        }
    }

    #[test]
    fn failed_blob_stops_before_any_tree() {
        let snapshot = Snapshot::from_entries(entries()).unwrap();
        let store = FailingStore {
            inner: InMemoryObjectStore::new(),
            poison: Blob::new("// util\n").id(),
        };
        let err = snapshot.write(&store).unwrap_err();
        assert!(matches!(err, WorktreeError::Store(StoreError::Io(_))));
        for id in store.inner.all_ids() {
            assert!(
                store.inner.read_verified(&id, ObjectKind::Blob).is_ok(),
                "a tree was written before all blobs were stored"
            );
        }
    }

    #[test]
    fn failed_subtree_stops_before_root() {
        let snapshot = Snapshot::from_entries(entries()).unwrap();
        let mut util = Tree::new();
        util.add_entry("mod.rs", Blob::new("// util\n").id(), EntryMode::File)
            .unwrap();
        let store = FailingStore {
            inner: InMemoryObjectStore::new(),
            poison: util.id(),
        };
        assert!(snapshot.write(&store).is_err());
        assert!(!store.inner.exists(&snapshot.root_id().unwrap()).unwrap());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn arb_files() -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
            // Leaf names start with "f" and directories with "d", so no path
            // can be both a file and a directory.
            let path = prop::collection::vec("d[a-c]", 0..3).prop_flat_map(|dirs| {
                "f[a-e]".prop_map(move |leaf| {
                    let mut parts = dirs.clone();
                    parts.push(leaf);
                    parts.join("/")
                })
            });
            prop::collection::vec((path, prop::collection::vec(any::<u8>(), 0..32)), 0..12)
        }

        proptest! {
            #[test]
            fn root_id_ignores_insertion_order(files in arb_files()) {
                // Deduplicate so "last write wins" does not depend on order.
                let files: BTreeMap<String, Vec<u8>> = files.into_iter().collect();
                let forward = Snapshot::from_entries(
                    files.iter().map(|(p, c)| WorktreeEntry::file(p.clone(), c.clone())),
                ).unwrap();
                let backward = Snapshot::from_entries(
                    files.iter().rev().map(|(p, c)| WorktreeEntry::file(p.clone(), c.clone())),
                ).unwrap();
                prop_assert_eq!(forward.root_id().unwrap(), backward.root_id().unwrap());
                prop_assert_eq!(forward.file_count(), files.len());
            }

            #[test]
            fn write_stores_the_predicted_root(files in arb_files()) {
                let store = InMemoryObjectStore::new();
                let snapshot = Snapshot::from_entries(
                    files.into_iter().map(|(p, c)| WorktreeEntry::file(p, c)),
                ).unwrap();
                let summary = snapshot.write(&store).unwrap();
                prop_assert_eq!(summary.root, snapshot.root_id().unwrap());
                prop_assert!(store.exists(&summary.root).unwrap());
            }
        }
    }
}
