use std::io::{self, Read};

use pit_types::ObjectId;
use sha1::{Digest, Sha1};

/// Kind-tagged SHA-1 hasher.
///
/// Every object is hashed as `"<kind> <len>\0" || body`, where `len` is the
/// body length in bytes. The kind tag keeps a blob and a tree with identical
/// bodies from sharing an ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    kind: &'static str,
}

impl ContentHasher {
    /// Hasher for blob objects.
    pub const BLOB: Self = Self { kind: "blob" };
    /// Hasher for tree objects.
    pub const TREE: Self = Self { kind: "tree" };
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self { kind: "commit" };

    /// The header that prefixes a body of `len` bytes.
    pub fn header(&self, len: u64) -> Vec<u8> {
        format!("{} {}\0", self.kind, len).into_bytes()
    }

    /// Hash a complete body.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = Sha1::new();
        hasher.update(self.header(data.len() as u64));
        hasher.update(data);
        ObjectId::from_hash(hasher.finalize().into())
    }

    /// Hash a body of known length from a reader without buffering it.
    ///
    /// Fails with `UnexpectedEof` if the reader yields fewer than `len`
    /// bytes, and with `InvalidData` if it yields more.
    pub fn hash_reader<R: Read>(&self, len: u64, reader: R) -> io::Result<ObjectId> {
        let mut hasher = Sha1::new();
        hasher.update(self.header(len));
        let mut limited = reader.take(len);
        let copied = io::copy(&mut limited, &mut hasher)?;
        if copied != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {len} bytes, read {copied}"),
            ));
        }
        let mut reader = limited.into_inner();
        let mut extra = [0u8; 1];
        if reader.read(&mut extra)? != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("reader produced more than {len} bytes"),
            ));
        }
        Ok(ObjectId::from_hash(hasher.finalize().into()))
    }

    /// Verify that data produces the expected object ID.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_blob_matches_known_digest() {
        let id = ContentHasher::BLOB.hash(b"hello");
        assert_eq!(id.to_hex(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
    }

    #[test]
    fn empty_bodies_still_hash_the_header() {
        assert_eq!(
            ContentHasher::BLOB.hash(b"").to_hex(),
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
        );
        assert_eq!(
            ContentHasher::TREE.hash(b"").to_hex(),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
        );
    }

    #[test]
    fn header_counts_bytes_not_chars() {
        let text = "héllo";
        assert_eq!(text.len(), 6);
        assert_eq!(ContentHasher::BLOB.header(text.len() as u64), b"blob 6\0");
        let mut manual = b"blob 6\0".to_vec();
        manual.extend_from_slice(text.as_bytes());
        assert_eq!(
            ContentHasher::BLOB.hash(text.as_bytes()).as_bytes(),
            &<[u8; 20]>::from(Sha1::digest(&manual))
        );
    }

    #[test]
    fn hash_is_deterministic() {
        let id1 = ContentHasher::BLOB.hash(b"hello world");
        let id2 = ContentHasher::BLOB.hash(b"hello world");
        assert_eq!(id1, id2);
    }

    #[test]
    fn different_kinds_produce_different_hashes() {
        let data = b"same content";
        let blob = ContentHasher::BLOB.hash(data);
        let tree = ContentHasher::TREE.hash(data);
        let commit = ContentHasher::COMMIT.hash(data);
        assert_ne!(blob, tree);
        assert_ne!(blob, commit);
        assert_ne!(tree, commit);
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::BLOB.hash(b"original");
        assert!(ContentHasher::BLOB.verify(b"original", &id));
        assert!(!ContentHasher::BLOB.verify(b"tampered", &id));
        assert!(!ContentHasher::TREE.verify(b"original", &id));
    }

    #[test]
    fn hash_reader_matches_hash() {
        let data = vec![7u8; 100_000];
        let streamed = ContentHasher::BLOB
            .hash_reader(data.len() as u64, data.as_slice())
            .unwrap();
        assert_eq!(streamed, ContentHasher::BLOB.hash(&data));
    }

    #[test]
    fn hash_reader_rejects_length_mismatch() {
        let short = ContentHasher::BLOB.hash_reader(10, &b"abc"[..]).unwrap_err();
        assert_eq!(short.kind(), io::ErrorKind::UnexpectedEof);
        let long = ContentHasher::BLOB.hash_reader(2, &b"abc"[..]).unwrap_err();
        assert_eq!(long.kind(), io::ErrorKind::InvalidData);
    }
}
