//! Working-tree items as handed over by an enumerator.

/// One item from a working-tree enumeration.
///
/// `path` is relative to the working-tree root and uses `/` separators.
/// Directory items carry no content; they only make sure the directory
/// shows up as a (possibly empty) subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorktreeEntry {
    pub path: String,
    pub content: Vec<u8>,
    pub is_directory: bool,
}

impl WorktreeEntry {
    /// A regular file with the given content.
    pub fn file(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            is_directory: false,
        }
    }

    /// A directory.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Vec::new(),
            is_directory: true,
        }
    }

    /// Content size in bytes (zero for directories).
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}
