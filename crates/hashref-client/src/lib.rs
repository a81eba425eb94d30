//! Reconciliation engine for hashref.
//!
//! Content lives in a bulk content tier; a small authoritative hash tier
//! records, per location, which references belong there and what each one
//! hashed to when it was written. Clients in this crate keep the two in step
//! and check one against the other on every read.
//!
//! # Clients
//!
//! - [`ViewClient`] -- read-only, over a content viewer and a hash viewer
//! - [`ControlClient`] -- reads plus originate/create/remove/update for one
//!   owner
//! - [`MultiClient`] -- registry of control clients keyed by app and client
//!   id, with an optional shared view client for public reads
//!
//! # Consistency
//!
//! Reads never fail on a hash mismatch: the entry comes back with
//! `valid == false`. Writes run their provider calls in a fixed order and stop
//! at the first failure without rolling back earlier steps. Removal always
//! drops the hash-tier entry before the content, so an interrupted removal
//! leaves orphaned content rather than a record pointing at nothing.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hashref_client::ControlClient;
//! use hashref_provider::{InMemoryContentStore, InMemoryHashLedger, JsonBlake3Hasher, MemoryRef};
//! use hashref_types::Digest;
//!
//! # async fn demo() -> hashref_client::ClientResult<()> {
//! let ledger: Arc<InMemoryHashLedger<Digest, MemoryRef, String>> =
//!     Arc::new(InMemoryHashLedger::new());
//! let store: Arc<InMemoryContentStore<String>> = Arc::new(InMemoryContentStore::new());
//! let client: ControlClient<String, Digest, MemoryRef, String> = ControlClient::new(
//!     Arc::new(JsonBlake3Hasher),
//!     store,
//!     Arc::new(ledger.control("alice".to_string())),
//! );
//!
//! client.originate_content(&["hello".to_string()]).await?;
//! for entry in client.read_own().await?.iter().flatten() {
//!     assert!(entry.valid);
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod control;
pub mod error;
pub mod multi;
pub mod reconcile;
pub mod view;

#[cfg(test)]
mod test_support;

pub use config::{ClientConfig, PrevHashSource};
pub use control::ControlClient;
pub use error::{ClientError, ClientResult};
pub use multi::{AppRegistration, ClientRegistration, MultiClient};
pub use view::ViewClient;

pub use hashref_types::{ContentList, Entry, NextContent, Storage, StorageEntry};
