//! In-memory providers for tests and embedding.
//!
//! [`InMemoryContentStore`] plays the content tier and hands out sequential
//! [`MemoryRef`]s. [`InMemoryHashLedger`] plays a shared hash tier; each owner
//! writes through its own [`InMemoryHashControl`] handle, and anyone can read
//! any location through the ledger itself.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use hashref_types::{Storage, StorageEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{
    ContentControl, ContentUpdate, ContentViewer, HashControl, HashUpdate, HashViewer, OwnStorage,
};

/// Reference handed out by [`InMemoryContentStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryRef(pub u64);

impl fmt::Display for MemoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mem://{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Content tier
// ---------------------------------------------------------------------------

/// HashMap-backed content tier.
///
/// Native update is off by default; enable it with
/// [`with_native_update`](Self::with_native_update) to have updates rewrite
/// content in place under the same reference.
pub struct InMemoryContentStore<C> {
    id: String,
    native_update: bool,
    inner: RwLock<ContentState<C>>,
}

struct ContentState<C> {
    next_ref: u64,
    items: HashMap<MemoryRef, C>,
}

impl<C> InMemoryContentStore<C> {
    pub fn new() -> Self {
        Self {
            id: "memory-content".into(),
            native_update: false,
            inner: RwLock::new(ContentState {
                next_ref: 0,
                items: HashMap::new(),
            }),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_native_update(mut self, enabled: bool) -> Self {
        self.native_update = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, reference: &MemoryRef) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .contains_key(reference)
    }

    /// Replace the content at `reference` without touching any hash tier.
    ///
    /// This is the out-of-band mutation reads are meant to catch.
    pub fn overwrite(&self, reference: &MemoryRef, content: C) -> ProviderResult<()> {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match state.items.get_mut(reference) {
            Some(slot) => {
                *slot = content;
                Ok(())
            }
            None => Err(ProviderError::NotFound(reference.to_string())),
        }
    }
}

impl<C> Default for InMemoryContentStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for InMemoryContentStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("id", &self.id)
            .field("item_count", &self.len())
            .finish()
    }
}

fn missing_ref<C>(state: &ContentState<C>, references: &[MemoryRef]) -> Option<MemoryRef> {
    references
        .iter()
        .find(|r| !state.items.contains_key(r))
        .copied()
}

#[async_trait]
impl<C> ContentViewer<C, MemoryRef> for InMemoryContentStore<C>
where
    C: Clone + Send + Sync,
{
    async fn read(&self, reference: &MemoryRef) -> ProviderResult<C> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state
            .items
            .get(reference)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(reference.to_string()))
    }
}

#[async_trait]
impl<C> ContentControl<C, MemoryRef> for InMemoryContentStore<C>
where
    C: Clone + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn create(&self, contents: &[C]) -> ProviderResult<Vec<MemoryRef>> {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut refs = Vec::with_capacity(contents.len());
        for content in contents {
            let reference = MemoryRef(state.next_ref);
            state.next_ref += 1;
            state.items.insert(reference, content.clone());
            refs.push(reference);
        }
        debug!(store = %self.id, count = refs.len(), "content created");
        Ok(refs)
    }

    async fn remove(&self, references: &[MemoryRef]) -> ProviderResult<()> {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(missing) = missing_ref(&state, references) {
            return Err(ProviderError::NotFound(missing.to_string()));
        }
        for reference in references {
            state.items.remove(reference);
        }
        debug!(store = %self.id, count = references.len(), "content removed");
        Ok(())
    }

    fn updater(&self) -> Option<&dyn ContentUpdate<C, MemoryRef>> {
        if self.native_update {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl<C> ContentUpdate<C, MemoryRef> for InMemoryContentStore<C>
where
    C: Clone + Send + Sync,
{
    async fn update(&self, next: &[C], previous: &[MemoryRef]) -> ProviderResult<Vec<MemoryRef>> {
        if next.len() != previous.len() {
            return Err(ProviderError::Rejected(format!(
                "{} contents for {} references",
                next.len(),
                previous.len()
            )));
        }
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(missing) = missing_ref(&state, previous) {
            return Err(ProviderError::NotFound(missing.to_string()));
        }
        for (content, reference) in next.iter().zip(previous) {
            state.items.insert(*reference, content.clone());
        }
        debug!(store = %self.id, count = previous.len(), "content updated in place");
        Ok(previous.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Hash tier
// ---------------------------------------------------------------------------

/// Shared in-memory hash tier, keyed by location.
///
/// Each location holds zero or more batches. Reading is open to anyone via
/// [`HashViewer`]; writing goes through an owner handle from
/// [`control`](Self::control).
pub struct InMemoryHashLedger<H, R, L> {
    id: String,
    inner: RwLock<HashMap<L, Vec<Storage<H, R>>>>,
}

impl<H, R, L> InMemoryHashLedger<H, R, L>
where
    H: Clone + PartialEq,
    R: Clone + PartialEq,
    L: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            id: "memory-ledger".into(),
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owner handle writing to `owner`'s location.
    pub fn control(self: &Arc<Self>, owner: L) -> InMemoryHashControl<H, R, L> {
        InMemoryHashControl {
            id: format!("{}-control", self.id),
            ledger: Arc::clone(self),
            owner,
            native_update: false,
            own_storage: false,
        }
    }

    /// Add a batch at `location` directly, bypassing any owner handle.
    pub fn insert_batch(&self, location: L, storage: Storage<H, R>) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(location).or_default().push(storage);
    }

    /// Snapshot of the batches at `location`.
    pub fn batches(&self, location: &L) -> Vec<Storage<H, R>> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(location).cloned().unwrap_or_default()
    }

    /// Total entries across every batch at `location`.
    pub fn entry_count(&self, location: &L) -> usize {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(location)
            .map(|batches| batches.iter().map(Storage::len).sum())
            .unwrap_or(0)
    }

    fn originate_at(&self, location: &L, storage: &Storage<H, R>) -> ProviderResult<()> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let batches = map.entry(location.clone()).or_default();
        if !batches.is_empty() {
            return Err(ProviderError::AlreadyExists(format!(
                "{} already holds a record at this location",
                self.id
            )));
        }
        batches.push(storage.clone());
        Ok(())
    }

    fn append_at(&self, location: &L, storage: &Storage<H, R>) -> ProviderResult<()> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let last = map
            .get_mut(location)
            .and_then(|batches| batches.last_mut())
            .ok_or_else(|| ProviderError::NotFound(format!("{}: no record at location", self.id)))?;
        for entry in storage {
            last.push(entry.clone());
        }
        Ok(())
    }

    fn remove_at(&self, location: &L, storage: &Storage<H, R>) -> ProviderResult<()> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let batches = map
            .get_mut(location)
            .ok_or_else(|| ProviderError::NotFound(format!("{}: no record at location", self.id)))?;
        let positions = positions_of(batches, storage, &self.id)?;

        let mut doomed: Vec<Vec<bool>> = batches.iter().map(|b| vec![false; b.len()]).collect();
        for (batch, index) in positions {
            doomed[batch][index] = true;
        }
        for (batch, flags) in batches.iter_mut().zip(doomed) {
            let kept: Storage<H, R> = batch
                .iter()
                .zip(flags)
                .filter(|(_, gone)| !gone)
                .map(|(entry, _)| entry.clone())
                .collect();
            *batch = kept;
        }
        Ok(())
    }

    fn replace_at(
        &self,
        location: &L,
        previous: &Storage<H, R>,
        next: &Storage<H, R>,
    ) -> ProviderResult<()> {
        if previous.len() != next.len() {
            return Err(ProviderError::Rejected(format!(
                "{} previous entries for {} next entries",
                previous.len(),
                next.len()
            )));
        }
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let batches = map
            .get_mut(location)
            .ok_or_else(|| ProviderError::NotFound(format!("{}: no record at location", self.id)))?;
        let positions = positions_of(batches, previous, &self.id)?;

        let replacements = positions.into_iter().zip(next.iter());
        let mut staged: Vec<Vec<StorageEntry<H, R>>> =
            batches.iter().map(|b| b.entries().to_vec()).collect();
        for ((batch, index), entry) in replacements {
            staged[batch][index] = entry.clone();
        }
        for (batch, entries) in batches.iter_mut().zip(staged) {
            *batch = Storage::from_entries(entries);
        }
        Ok(())
    }
}

/// Find a distinct `(batch, index)` slot for every entry of `wanted`.
///
/// Fails without side effects if any entry has no unclaimed match.
fn positions_of<H, R>(
    batches: &[Storage<H, R>],
    wanted: &Storage<H, R>,
    ledger_id: &str,
) -> ProviderResult<Vec<(usize, usize)>>
where
    H: PartialEq,
    R: PartialEq,
{
    let mut claimed: Vec<(usize, usize)> = Vec::with_capacity(wanted.len());
    for target in wanted {
        let slot = batches.iter().enumerate().find_map(|(b, batch)| {
            batch
                .iter()
                .enumerate()
                .find(|(i, entry)| *entry == target && !claimed.contains(&(b, *i)))
                .map(|(i, _)| (b, i))
        });
        match slot {
            Some(pos) => claimed.push(pos),
            None => {
                return Err(ProviderError::NotFound(format!(
                    "{ledger_id}: entry not present at location"
                )))
            }
        }
    }
    Ok(claimed)
}

impl<H, R, L> Default for InMemoryHashLedger<H, R, L>
where
    H: Clone + PartialEq,
    R: Clone + PartialEq,
    L: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H, R, L> fmt::Debug for InMemoryHashLedger<H, R, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locations = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("InMemoryHashLedger")
            .field("id", &self.id)
            .field("location_count", &locations)
            .finish()
    }
}

#[async_trait]
impl<H, R, L> HashViewer<H, R, L> for InMemoryHashLedger<H, R, L>
where
    H: Clone + PartialEq + Send + Sync,
    R: Clone + PartialEq + Send + Sync,
    L: Clone + Eq + Hash + Send + Sync,
{
    async fn locate(&self, location: &L) -> ProviderResult<Vec<Storage<H, R>>> {
        Ok(self.batches(location))
    }
}

/// Owner handle onto an [`InMemoryHashLedger`].
///
/// Originates at, and by default writes to, the owner's location. Native
/// update and direct own-storage access are off unless enabled.
pub struct InMemoryHashControl<H, R, L> {
    id: String,
    ledger: Arc<InMemoryHashLedger<H, R, L>>,
    owner: L,
    native_update: bool,
    own_storage: bool,
}

impl<H, R, L> InMemoryHashControl<H, R, L> {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_native_update(mut self, enabled: bool) -> Self {
        self.native_update = enabled;
        self
    }

    pub fn with_own_storage(mut self, enabled: bool) -> Self {
        self.own_storage = enabled;
        self
    }

    pub fn ledger(&self) -> &Arc<InMemoryHashLedger<H, R, L>> {
        &self.ledger
    }

    pub fn owner(&self) -> &L {
        &self.owner
    }
}

impl<H, R, L> fmt::Debug for InMemoryHashControl<H, R, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryHashControl")
            .field("id", &self.id)
            .field("native_update", &self.native_update)
            .field("own_storage", &self.own_storage)
            .finish()
    }
}

#[async_trait]
impl<H, R, L> HashViewer<H, R, L> for InMemoryHashControl<H, R, L>
where
    H: Clone + PartialEq + Send + Sync,
    R: Clone + PartialEq + Send + Sync,
    L: Clone + Eq + Hash + Send + Sync,
{
    async fn locate(&self, location: &L) -> ProviderResult<Vec<Storage<H, R>>> {
        Ok(self.ledger.batches(location))
    }
}

#[async_trait]
impl<H, R, L> HashControl<H, R, L> for InMemoryHashControl<H, R, L>
where
    H: Clone + PartialEq + Send + Sync,
    R: Clone + PartialEq + Send + Sync,
    L: Clone + Eq + Hash + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn get_location(&self) -> L {
        self.owner.clone()
    }

    async fn create(&self, storage: &Storage<H, R>, location: &L) -> ProviderResult<()> {
        self.ledger.append_at(location, storage)?;
        debug!(control = %self.id, count = storage.len(), "hash entries appended");
        Ok(())
    }

    async fn originate(&self, storage: &Storage<H, R>) -> ProviderResult<()> {
        self.ledger.originate_at(&self.owner, storage)?;
        debug!(control = %self.id, count = storage.len(), "hash record originated");
        Ok(())
    }

    async fn remove(&self, storage: &Storage<H, R>, location: &L) -> ProviderResult<()> {
        self.ledger.remove_at(location, storage)?;
        debug!(control = %self.id, count = storage.len(), "hash entries removed");
        Ok(())
    }

    fn updater(&self) -> Option<&dyn HashUpdate<H, R, L>> {
        if self.native_update {
            Some(self)
        } else {
            None
        }
    }

    fn own_storage(&self) -> Option<&dyn OwnStorage<H, R>> {
        if self.own_storage {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl<H, R, L> HashUpdate<H, R, L> for InMemoryHashControl<H, R, L>
where
    H: Clone + PartialEq + Send + Sync,
    R: Clone + PartialEq + Send + Sync,
    L: Clone + Eq + Hash + Send + Sync,
{
    async fn update(
        &self,
        previous: &Storage<H, R>,
        next: &Storage<H, R>,
        location: &L,
    ) -> ProviderResult<()> {
        self.ledger.replace_at(location, previous, next)?;
        debug!(control = %self.id, count = next.len(), "hash entries replaced in place");
        Ok(())
    }
}

#[async_trait]
impl<H, R, L> OwnStorage<H, R> for InMemoryHashControl<H, R, L>
where
    H: Clone + PartialEq + Send + Sync,
    R: Clone + PartialEq + Send + Sync,
    L: Clone + Eq + Hash + Send + Sync,
{
    async fn get_storage(&self) -> ProviderResult<Vec<Storage<H, R>>> {
        Ok(self.ledger.batches(&self.owner))
    }
}
