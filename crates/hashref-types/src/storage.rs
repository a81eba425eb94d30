//! Hash-tier records.
//!
//! A [`StorageEntry`] is the only thing the hash tier ever holds: a hash and
//! the reference the content tier resolves it from. A [`Storage`] is one batch
//! of entries as kept at a single hash-tier location.

use serde::{Deserialize, Serialize};

/// A `(hash, reference)` pair persisted in the hash tier.
///
/// When written by a client, `hash` equals the hash of the content at
/// `reference` at the time of writing. Nothing keeps that true afterwards:
/// out-of-band edits to the content tier or a half-finished write will break
/// it, which is what reads detect.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageEntry<H, R> {
    pub hash: H,
    pub reference: R,
}

impl<H, R> StorageEntry<H, R> {
    /// Pair `hash` with the `reference` it was computed from.
    pub fn new(hash: H, reference: R) -> Self {
        Self { hash, reference }
    }

    /// Split into `(hash, reference)`.
    pub fn into_parts(self) -> (H, R) {
        (self.hash, self.reference)
    }
}

impl<H, R> From<(H, R)> for StorageEntry<H, R> {
    fn from((hash, reference): (H, R)) -> Self {
        Self { hash, reference }
    }
}

/// One ordered batch of [`StorageEntry`] values, as stored at one location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Storage<H, R> {
    entries: Vec<StorageEntry<H, R>>,
}

impl<H, R> Storage<H, R> {
    /// Empty batch.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Batch holding `entries` in the given order.
    pub fn from_entries(entries: Vec<StorageEntry<H, R>>) -> Self {
        Self { entries }
    }

    /// Entries in batch order.
    pub fn entries(&self) -> &[StorageEntry<H, R>] {
        &self.entries
    }

    /// Consume the batch, returning its entries.
    pub fn into_entries(self) -> Vec<StorageEntry<H, R>> {
        self.entries
    }

    /// Append an entry at the end of the batch.
    pub fn push(&mut self, entry: StorageEntry<H, R>) {
        self.entries.push(entry);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in batch order.
    pub fn iter(&self) -> std::slice::Iter<'_, StorageEntry<H, R>> {
        self.entries.iter()
    }

    /// References in batch order.
    pub fn refs(&self) -> Vec<R>
    where
        R: Clone,
    {
        self.entries.iter().map(|e| e.reference.clone()).collect()
    }

    /// Hashes in batch order.
    pub fn hashes(&self) -> Vec<H>
    where
        H: Clone,
    {
        self.entries.iter().map(|e| e.hash.clone()).collect()
    }

    /// Whether any entry points at `reference`.
    pub fn contains_ref(&self, reference: &R) -> bool
    where
        R: PartialEq,
    {
        self.find_by_ref(reference).is_some()
    }

    /// First entry pointing at `reference`.
    pub fn find_by_ref(&self, reference: &R) -> Option<&StorageEntry<H, R>>
    where
        R: PartialEq,
    {
        self.entries.iter().find(|e| &e.reference == reference)
    }
}

impl<H, R> Default for Storage<H, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, R> FromIterator<StorageEntry<H, R>> for Storage<H, R> {
    fn from_iter<I: IntoIterator<Item = StorageEntry<H, R>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<H, R> From<Vec<StorageEntry<H, R>>> for Storage<H, R> {
    fn from(entries: Vec<StorageEntry<H, R>>) -> Self {
        Self { entries }
    }
}

impl<H, R> IntoIterator for Storage<H, R> {
    type Item = StorageEntry<H, R>;
    type IntoIter = std::vec::IntoIter<StorageEntry<H, R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, H, R> IntoIterator for &'a Storage<H, R> {
    type Item = &'a StorageEntry<H, R>;
    type IntoIter = std::slice::Iter<'a, StorageEntry<H, R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Replacement instructions for an update: each pair says "replace whatever
/// is at the reference with this content".
pub type NextContent<C, R> = Vec<(C, R)>;
