//! Provider contracts for hashref.
//!
//! A hashref client sits between two storage tiers it does not own. This crate
//! defines what it expects from each:
//!
//! - [`Hasher`] -- content to digest, deterministic and side-effect free
//! - [`ContentViewer`] / [`ContentControl`] -- the bulk content tier
//! - [`HashViewer`] / [`HashControl`] -- the authoritative hash tier
//!
//! Optional backend features are capability accessors:
//! [`ContentControl::updater`], [`HashControl::updater`] and
//! [`HashControl::own_storage`] return `None` unless the backend implements
//! [`ContentUpdate`], [`HashUpdate`] or [`OwnStorage`] natively.
//!
//! # Reference Providers
//!
//! - [`InMemoryContentStore`] -- HashMap-backed content tier
//! - [`InMemoryHashLedger`] / [`InMemoryHashControl`] -- shared hash tier with
//!   per-owner write handles
//! - [`JsonBlake3Hasher`] -- BLAKE3 over JSON-encoded content
//!
//! # Contract Rules
//!
//! 1. Every provider is `Send + Sync`; clients call them concurrently on reads.
//! 2. Batch operations preserve order: the i-th output belongs to the i-th input.
//! 3. Failures are reported as [`ProviderError`] and reach callers unchanged.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
pub mod hasher;
pub mod memory;
pub mod traits;

pub use error::{ProviderError, ProviderResult};
pub use hasher::{Hasher, JsonBlake3Hasher};
pub use memory::{InMemoryContentStore, InMemoryHashControl, InMemoryHashLedger, MemoryRef};
pub use traits::{
    ContentControl, ContentUpdate, ContentViewer, HashControl, HashUpdate, HashViewer, OwnStorage,
};
