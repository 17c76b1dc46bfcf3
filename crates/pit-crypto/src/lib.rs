//! Hashing primitives for pit.
//!
//! Objects are identified by the SHA-1 digest of a `"<kind> <len>\0"` header
//! followed by the object's canonical body. All hashing wraps the `sha1`
//! crate; there is no custom cryptography here.

pub mod hasher;

pub use hasher::ContentHasher;
