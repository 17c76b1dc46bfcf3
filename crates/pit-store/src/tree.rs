//! Tree objects: sorted directory listings.
//!
//! A tree body is the concatenation, in byte-wise name order, of one record
//! per entry:
//!
//! ```text
//! <mode> <kind> <40-hex digest>\t<name>
//! ```
//!
//! There is no separator between records. Names may not contain a tab, so
//! every tab in the body ends exactly one fixed-width header and the name
//! that follows it runs up to the next header.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use pit_crypto::ContentHasher;
use pit_types::{ObjectId, HEX_LEN};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// Width of `<mode> <kind> <digest>` in bytes.
const HEADER_LEN: usize = 6 + 1 + 4 + 1 + HEX_LEN;

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file (100644); the entry refers to a blob.
    #[default]
    File,
    /// Subtree (040000); the entry refers to a tree.
    Directory,
}

impl EntryMode {
    /// Octal mode value.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::File => 0o100644,
            Self::Directory => 0o040000,
        }
    }

    /// Parse from an octal mode value.
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0o100644 => Some(Self::File),
            0o040000 => Some(Self::Directory),
            _ => None,
        }
    }

    /// The kind of object an entry with this mode points at.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::File => ObjectKind::Blob,
            Self::Directory => ObjectKind::Tree,
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

impl FromStr for EntryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u32::from_str_radix(s, 8)
            .ok()
            .filter(|_| s.len() == 6)
            .and_then(Self::from_mode_bits)
            .ok_or_else(|| format!("unsupported mode: {s:?}"))
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeEntry {
    /// File or subtree.
    pub mode: EntryMode,
    /// Entry name (a single path component).
    pub name: String,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }

    fn write_record(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(
            format!(
                "{} {} {}\t",
                self.mode,
                self.mode.object_kind(),
                self.object_id
            )
            .as_bytes(),
        );
        out.extend_from_slice(self.name.as_bytes());
    }
}

/// Check that `name` is a single path component that serializes
/// unambiguously.
pub fn validate_entry_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::invalid_entry(name, "name is empty"));
    }
    if name == "." || name == ".." {
        return Err(StoreError::invalid_entry(name, "name is a relative path marker"));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\\' | '\t' | '\n' | '\0')) {
        return Err(StoreError::invalid_entry(
            name,
            format!("name contains reserved character {c:?}"),
        ));
    }
    Ok(())
}

/// Directory listing object (analogous to git tree).
///
/// Entries are keyed by name, so inserting an existing name replaces it.
/// The ID is computed on first request and cached until the next mutation.
#[derive(Clone, Debug, Default)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
    cached_id: OnceLock<ObjectId>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from entries. Later entries win on duplicate names.
    pub fn from_entries(entries: impl IntoIterator<Item = TreeEntry>) -> StoreResult<Self> {
        let mut tree = Self::new();
        for entry in entries {
            tree.insert(entry)?;
        }
        Ok(tree)
    }

    /// Add or replace the entry for `name`.
    pub fn add_entry(
        &mut self,
        name: impl Into<String>,
        object_id: ObjectId,
        mode: EntryMode,
    ) -> StoreResult<()> {
        self.insert(TreeEntry::new(mode, name, object_id))
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, entry: TreeEntry) -> StoreResult<()> {
        validate_entry_name(&entry.name)?;
        self.cached_id.take();
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Remove the entry for `name`, if any.
    pub fn remove(&mut self, name: &str) -> Option<TreeEntry> {
        let removed = self.entries.remove(name);
        if removed.is_some() {
            self.cached_id.take();
        }
        removed
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    /// Entries in canonical (byte-wise name) order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The canonical body.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * (HEADER_LEN + 16));
        for entry in self.entries.values() {
            entry.write_record(&mut out);
        }
        out
    }

    /// The tree's ID, computed from the current entries.
    pub fn id(&self) -> ObjectId {
        *self
            .cached_id
            .get_or_init(|| ContentHasher::TREE.hash(&self.serialize()))
    }

    /// The cached ID, if one has been computed since the last mutation.
    pub fn cached_id(&self) -> Option<ObjectId> {
        self.cached_id.get().copied()
    }

    /// Write the tree body under its ID.
    pub fn persist<S: ObjectStore + ?Sized>(&self, store: &S) -> StoreResult<ObjectId> {
        let data = self.serialize();
        let id = *self
            .cached_id
            .get_or_init(|| ContentHasher::TREE.hash(&data));
        store.put(&id, &data)?;
        Ok(id)
    }

    /// Convert into a `StoredObject` for batch writes.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Tree, self.serialize())
    }

    /// Load a tree from the store, checking its content against `id`.
    pub fn load<S: ObjectStore + ?Sized>(store: &S, id: &ObjectId) -> StoreResult<Self> {
        let data = store.read_verified(id, ObjectKind::Tree)?;
        let tree = Self::parse(&data)?;
        let _ = tree.cached_id.set(*id);
        Ok(tree)
    }

    /// Decode a tree body.
    pub fn parse(data: &[u8]) -> StoreResult<Self> {
        let corrupt = |reason: String| StoreError::corrupt(ObjectKind::Tree, reason);

        let tabs: Vec<usize> = data
            .iter()
            .enumerate()
            .filter_map(|(i, b)| (*b == b'\t').then_some(i))
            .collect();

        let mut tree = Self::new();
        let mut header_start = 0;
        for (i, &tab) in tabs.iter().enumerate() {
            if tab < header_start + HEADER_LEN || tab - HEADER_LEN != header_start {
                return Err(corrupt(format!("malformed entry header at byte {header_start}")));
            }
            let name_end = match tabs.get(i + 1) {
                Some(&next) if next >= tab + 1 + HEADER_LEN => next - HEADER_LEN,
                Some(_) => return Err(corrupt(format!("truncated entry after byte {tab}"))),
                None => data.len(),
            };

            let header = std::str::from_utf8(&data[header_start..tab])
                .map_err(|_| corrupt(format!("non-UTF-8 header at byte {header_start}")))?;
            let name = std::str::from_utf8(&data[tab + 1..name_end])
                .map_err(|_| corrupt(format!("non-UTF-8 name at byte {}", tab + 1)))?;
            let entry = parse_header(header, name).map_err(corrupt)?;
            if tree.entries.contains_key(name) {
                return Err(corrupt(format!("duplicate entry {name:?}")));
            }
            if let Some(last) = tree.entries.keys().next_back() {
                if last.as_str() > name {
                    return Err(corrupt(format!("entry {name:?} is out of order")));
                }
            }
            tree.insert(entry).map_err(|e| corrupt(e.to_string()))?;
            header_start = name_end;
        }

        if tabs.is_empty() && !data.is_empty() {
            return Err(corrupt("body has no entries".into()));
        }
        // Anything accepted must hash back to the bytes it came from, since
        // `load` caches the stored ID.
        if tree.serialize() != data {
            return Err(corrupt("body is not in canonical form".into()));
        }
        Ok(tree)
    }
}

fn parse_header(header: &str, name: &str) -> Result<TreeEntry, String> {
    let mut parts = header.split(' ');
    let (Some(mode), Some(kind), Some(digest), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("malformed entry header {header:?}"));
    };
    let mode: EntryMode = mode.parse()?;
    let kind: ObjectKind = kind.parse()?;
    if kind != mode.object_kind() {
        return Err(format!("entry {name:?} has mode {mode} but kind {kind}"));
    }
    let object_id = ObjectId::from_hex(digest).map_err(|e| e.to_string())?;
    if object_id.to_hex() != digest {
        return Err(format!("entry {name:?} has non-canonical digest {digest:?}"));
    }
    Ok(TreeEntry::new(mode, name, object_id))
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Tree {}
