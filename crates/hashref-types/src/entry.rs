use serde::{Deserialize, Serialize};

use crate::storage::StorageEntry;

/// Reconciled view of one hash-tier record.
///
/// `valid` is `true` when the freshly computed hash of `content` equals the
/// `hash` recorded in the hash tier. Entries are built on every read and
/// never cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<C, H, R> {
    /// Content found at `reference` in the content tier.
    pub content: C,
    /// Hash recorded in the hash tier.
    pub hash: H,
    /// Where the content tier keeps `content`.
    pub reference: R,
    pub valid: bool,
}

impl<C, H, R> Entry<C, H, R> {
    /// Build an entry by comparing the recorded hash with a recomputed one.
    pub fn reconcile(stored: StorageEntry<H, R>, content: C, computed: &H) -> Self
    where
        H: PartialEq,
    {
        let valid = stored.hash == *computed;
        Self {
            content,
            hash: stored.hash,
            reference: stored.reference,
            valid,
        }
    }

    /// The hash-tier record this entry was read from.
    pub fn storage_entry(&self) -> StorageEntry<H, R>
    where
        H: Clone,
        R: Clone,
    {
        StorageEntry::new(self.hash.clone(), self.reference.clone())
    }
}

/// Reconciled entries of one hash-tier batch, in batch order.
pub type ContentList<C, H, R> = Vec<Entry<C, H, R>>;

/// Counts over a read result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadTally {
    pub batches: usize,
    pub entries: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl ReadTally {
    pub fn of<C, H, R>(lists: &[ContentList<C, H, R>]) -> Self {
        let mut tally = Self {
            batches: lists.len(),
            ..Self::default()
        };
        for entry in lists.iter().flatten() {
            tally.entries += 1;
            if entry.valid {
                tally.valid += 1;
            } else {
                tally.invalid += 1;
            }
        }
        tally
    }

    /// `true` when no entry failed verification. An empty read counts as valid.
    pub fn all_valid(&self) -> bool {
        self.invalid == 0
    }
}
