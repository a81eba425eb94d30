//! Provider contracts for the two storage tiers.
//!
//! Each tier has a read-only viewer and a read/write control. Operations a
//! backend may or may not support natively (in-place update, direct access to
//! the caller's own storage) are exposed through capability accessors that
//! return an extension trait object, or `None` when the backend lacks it.
//! Clients branch on that `Option` to pick the native path or the
//! remove-then-create fallback.

use async_trait::async_trait;
use hashref_types::Storage;

use crate::error::ProviderResult;

// ---------------------------------------------------------------------------
// Content tier
// ---------------------------------------------------------------------------

/// Resolves a reference to the content stored there.
#[async_trait]
pub trait ContentViewer<C, R>: Send + Sync
where
    C: Send + Sync,
    R: Send + Sync,
{
    /// Fetch the content at `reference`.
    ///
    /// Returns `Err(ProviderError::NotFound)` when nothing is stored there.
    async fn read(&self, reference: &R) -> ProviderResult<C>;
}

/// Read/write access to the content tier.
#[async_trait]
pub trait ContentControl<C, R>: ContentViewer<C, R>
where
    C: Send + Sync,
    R: Send + Sync,
{
    /// Stable identifier of this provider, used in logs and diagnostics.
    fn id(&self) -> &str;

    /// Host every item in `contents` and return where each now lives, in the
    /// same order.
    async fn create(&self, contents: &[C]) -> ProviderResult<Vec<R>>;

    /// Remove the content at each reference.
    async fn remove(&self, references: &[R]) -> ProviderResult<()>;

    /// Native update support, if the backend has it.
    fn updater(&self) -> Option<&dyn ContentUpdate<C, R>> {
        None
    }
}

/// Native in-place update for content tiers that support it.
#[async_trait]
pub trait ContentUpdate<C, R>: Send + Sync
where
    C: Send + Sync,
    R: Send + Sync,
{
    /// Host `next[i]` in place of whatever is at `previous[i]` and return the
    /// resulting references in the same order.
    async fn update(&self, next: &[C], previous: &[R]) -> ProviderResult<Vec<R>>;
}

// ---------------------------------------------------------------------------
// Hash tier
// ---------------------------------------------------------------------------

/// Resolves a location to the hash-tier batches stored there.
#[async_trait]
pub trait HashViewer<H, R, L>: Send + Sync
where
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    /// Every batch found at `location`, in the backend's order.
    async fn locate(&self, location: &L) -> ProviderResult<Vec<Storage<H, R>>>;
}

/// Read/write access to the hash tier on behalf of one owner.
#[async_trait]
pub trait HashControl<H, R, L>: HashViewer<H, R, L>
where
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    /// Stable identifier of this provider, used in logs and diagnostics.
    fn id(&self) -> &str;

    /// Where this control's own records live.
    fn get_location(&self) -> L;

    /// Append entries to the record at `location`.
    async fn create(&self, storage: &Storage<H, R>, location: &L) -> ProviderResult<()>;

    /// Establish a brand-new record from initial entries.
    ///
    /// Backends typically refuse when a record already exists at the location
    /// the origination implies.
    async fn originate(&self, storage: &Storage<H, R>) -> ProviderResult<()>;

    /// Remove the given entries from the record at `location`.
    async fn remove(&self, storage: &Storage<H, R>, location: &L) -> ProviderResult<()>;

    /// Native update support, if the backend has it.
    fn updater(&self) -> Option<&dyn HashUpdate<H, R, L>> {
        None
    }

    /// Direct access to the owner's storage, for backends that learn it while
    /// resolving the owner's location.
    fn own_storage(&self) -> Option<&dyn OwnStorage<H, R>> {
        None
    }
}

/// Native replacement of hash-tier entries.
#[async_trait]
pub trait HashUpdate<H, R, L>: Send + Sync
where
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    /// Replace each entry of `previous` at `location` with the entry at the
    /// same position in `next`.
    async fn update(
        &self,
        previous: &Storage<H, R>,
        next: &Storage<H, R>,
        location: &L,
    ) -> ProviderResult<()>;
}

/// Shortcut to the owner's batches without a separate `locate` round-trip.
#[async_trait]
pub trait OwnStorage<H, R>: Send + Sync
where
    H: Send + Sync,
    R: Send + Sync,
{
    /// Every batch at the owner's own location.
    async fn get_storage(&self) -> ProviderResult<Vec<Storage<H, R>>>;
}
