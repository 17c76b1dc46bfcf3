//! Foundation types for pit.
//!
//! This crate provides the identifier, identity, and time types shared by
//! every other pit crate.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (SHA-1 digest)
//! - [`Identity`] -- `Name <email>` of an author or committer
//! - [`Timestamp`] -- UNIX seconds plus timezone offset
//! - [`Signature`] -- An identity stamped with a timestamp

pub mod error;
pub mod identity;
pub mod object;
pub mod temporal;

pub use error::TypeError;
pub use identity::Identity;
pub use object::{ObjectId, DIGEST_LEN, HEX_LEN};
pub use temporal::{Signature, Timestamp};
