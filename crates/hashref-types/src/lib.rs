//! Data model for hashref.
//!
//! hashref keeps two storage tiers consistent through content hashing: a
//! small, authoritative hash tier holding `(hash, reference)` pairs, and a
//! bulk content tier holding the payloads. This crate holds the types both
//! tiers and the clients agree on.
//!
//! # Key Types
//!
//! - [`StorageEntry`] -- a `(hash, reference)` pair as persisted in the hash tier
//! - [`Storage`] -- one ordered batch of storage entries at a location
//! - [`Entry`] -- a reconciled read result carrying a `valid` flag
//! - [`ContentList`] -- the entries of one batch, in order
//! - [`NextContent`] -- `(next content, previous reference)` update pairs
//! - [`ReadTally`] -- valid/invalid counts over a read
//! - [`Digest`] -- 32-byte digest with hex formatting

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod digest;
pub mod entry;
pub mod error;
pub mod storage;

pub use digest::Digest;
pub use entry::{ContentList, Entry, ReadTally};
pub use error::{TypeError, TypeResult};
pub use storage::{NextContent, Storage, StorageEntry};
