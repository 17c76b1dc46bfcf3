//! Walking the parent-linked commit chain.

use pit_types::ObjectId;
use tracing::debug;

use crate::commit::Commit;
use crate::error::StoreResult;
use crate::traits::ObjectStore;

/// Iterator over a commit chain, newest first.
///
/// Starts at `head` and follows `parent` links until a root commit. Each
/// commit is read with hash verification. The first error ends the walk.
pub struct History<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    next: Option<ObjectId>,
}

impl<'a, S: ObjectStore + ?Sized> History<'a, S> {
    pub fn new(store: &'a S, head: ObjectId) -> Self {
        Self {
            store,
            next: Some(head),
        }
    }
}

impl<S: ObjectStore + ?Sized> Iterator for History<'_, S> {
    type Item = StoreResult<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match Commit::load(self.store, &id) {
            Ok(commit) => {
                debug!(commit = %id.short_hex(), parent = ?commit.parent(), "history step");
                self.next = commit.parent();
                Some(Ok((id, commit)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Walk the chain ending at `head`.
pub fn history<S: ObjectStore + ?Sized>(store: &S, head: ObjectId) -> History<'_, S> {
    History::new(store, head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::InMemoryObjectStore;
    use crate::tree::Tree;
    use pit_types::{Identity, Signature, Timestamp};

    fn commit(tree: ObjectId, message: &str, parent: Option<ObjectId>) -> Commit {
        let sig = Signature::new(
            Identity::new("Grace", "grace@example.com").unwrap(),
            Timestamp::new(1_700_000_000, 0),
        );
        Commit::with_signatures(tree, message, parent, sig.clone(), sig)
    }

    #[test]
    fn walks_newest_first_to_root() {
        let store = InMemoryObjectStore::new();
        let tree = Tree::new().persist(&store).unwrap();
        let a = commit(tree, "a", None).persist(&store).unwrap();
        let b = commit(tree, "b", Some(a)).persist(&store).unwrap();
        let c = commit(tree, "c", Some(b)).persist(&store).unwrap();

        let walked: Vec<(ObjectId, String)> = history(&store, c)
            .map(|step| step.map(|(id, commit)| (id, commit.message().to_string())))
            .collect::<StoreResult<_>>()
            .unwrap();
        assert_eq!(
            walked,
            vec![(c, "c".to_string()), (b, "b".to_string()), (a, "a".to_string())]
        );
    }

    #[test]
    fn missing_ancestor_surfaces_not_found() {
        let store = InMemoryObjectStore::new();
        let tree = Tree::new().persist(&store).unwrap();
        let ghost = commit(tree, "never stored", None).id();
        let head = commit(tree, "orphan", Some(ghost)).persist(&store).unwrap();

        let mut walk = history(&store, head);
        assert!(walk.next().unwrap().is_ok());
        let err = walk.next().unwrap().unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == ghost));
        assert!(walk.next().is_none());
    }

    #[test]
    fn head_that_is_not_a_commit_fails() {
        let store = InMemoryObjectStore::new();
        let tree = Tree::new().persist(&store).unwrap();
        let err = history(&store, tree).next().unwrap().unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
    }
}
