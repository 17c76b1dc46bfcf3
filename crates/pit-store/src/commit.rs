use pit_crypto::ContentHasher;
use pit_types::{Identity, ObjectId, Signature};

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// Snapshot pointer (analogous to git commit).
///
/// A commit names one tree, at most one parent, and who made it when. The
/// signatures are captured at construction and never change, so two commits
/// of the same tree made moments apart normally have different IDs.
///
/// The body is line-oriented text:
///
/// ```text
/// tree <tree>
/// parent <parent>              (only when there is a parent)
/// author <name> <<email>> <seconds> <+hhmm>
/// committer <name> <<email>> <seconds> <+hhmm>
///
/// <message>
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    tree: ObjectId,
    parent: Option<ObjectId>,
    author: Signature,
    committer: Signature,
    message: String,
}

impl Commit {
    /// Create a commit authored and committed by `identity` right now.
    pub fn new(
        tree: ObjectId,
        message: impl Into<String>,
        parent: Option<ObjectId>,
        identity: &Identity,
    ) -> Self {
        let signature = Signature::now(identity.clone());
        Self::with_signatures(tree, message, parent, signature.clone(), signature)
    }

    /// Create a commit with explicit signatures.
    pub fn with_signatures(
        tree: ObjectId,
        message: impl Into<String>,
        parent: Option<ObjectId>,
        author: Signature,
        committer: Signature,
    ) -> Self {
        Self {
            tree,
            parent,
            author,
            committer,
            message: message.into(),
        }
    }

    pub fn tree(&self) -> ObjectId {
        self.tree
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// The canonical body.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = format!("tree {}\n", self.tree);
        if let Some(parent) = &self.parent {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!("committer {}\n", self.committer));
        out.push('\n');
        out.push_str(&self.message);
        out.push('\n');
        out.into_bytes()
    }

    /// The commit's ID.
    pub fn id(&self) -> ObjectId {
        ContentHasher::COMMIT.hash(&self.serialize())
    }

    /// Write the commit body under its ID.
    pub fn persist<S: ObjectStore + ?Sized>(&self, store: &S) -> StoreResult<ObjectId> {
        let data = self.serialize();
        let id = ContentHasher::COMMIT.hash(&data);
        store.put(&id, &data)?;
        Ok(id)
    }

    /// Convert into a `StoredObject` for batch writes.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Commit, self.serialize())
    }

    /// Load a commit from the store, checking its content against `id`.
    pub fn load<S: ObjectStore + ?Sized>(store: &S, id: &ObjectId) -> StoreResult<Self> {
        let data = store.read_verified(id, ObjectKind::Commit)?;
        Self::parse(&data)
    }

    /// Decode a commit body.
    pub fn parse(data: &[u8]) -> StoreResult<Self> {
        let corrupt = |reason: String| StoreError::corrupt(ObjectKind::Commit, reason);

        let text = std::str::from_utf8(data)
            .map_err(|e| corrupt(format!("body is not UTF-8: {e}")))?;
        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| corrupt("missing blank line before message".into()))?;
        let message = message
            .strip_suffix('\n')
            .ok_or_else(|| corrupt("message is not newline-terminated".into()))?;

        let mut lines = headers.split('\n');
        let tree = header_value(lines.next(), "tree")
            .and_then(parse_id)
            .map_err(corrupt)?;

        let mut next = lines.next();
        let mut parent = None;
        if let Some(value) = next.and_then(|line| line.strip_prefix("parent ")) {
            parent = Some(parse_id(value).map_err(corrupt)?);
            next = lines.next();
            if next.is_some_and(|line| line.starts_with("parent ")) {
                return Err(corrupt("multiple parents are not supported".into()));
            }
        }

        let author = header_value(next, "author")
            .and_then(parse_signature)
            .map_err(corrupt)?;
        let committer = header_value(lines.next(), "committer")
            .and_then(parse_signature)
            .map_err(corrupt)?;
        if let Some(extra) = lines.next() {
            return Err(corrupt(format!("unexpected header line {extra:?}")));
        }

        let commit = Self {
            tree,
            parent,
            author,
            committer,
            message: message.to_string(),
        };
        if commit.serialize() != data {
            return Err(corrupt("body is not in canonical form".into()));
        }
        Ok(commit)
    }
}

fn header_value<'a>(line: Option<&'a str>, name: &str) -> Result<&'a str, String> {
    line.and_then(|l| l.strip_prefix(name))
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| format!("expected {name} line"))
}

fn parse_signature(s: &str) -> Result<Signature, String> {
    s.parse().map_err(|e: pit_types::TypeError| e.to_string())
}

fn parse_id(s: &str) -> Result<ObjectId, String> {
    let id = ObjectId::from_hex(s).map_err(|e| format!("bad object id {s:?}: {e}"))?;
    if id.to_hex() != s {
        return Err(format!("non-canonical object id {s:?}"));
    }
    Ok(id)
}
