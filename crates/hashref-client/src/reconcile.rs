//! Read-side reconciliation between the two tiers.
//!
//! These helpers are shared by [`ViewClient`](crate::ViewClient) and
//! [`ControlClient`](crate::ControlClient). They are generic over the viewer
//! so a full content control can be passed wherever a viewer is expected.

use futures_util::future::try_join_all;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use hashref_provider::{ContentViewer, Hasher};
use hashref_types::{ContentList, Entry, Storage, StorageEntry};

use crate::error::ClientResult;

/// Read the content at `reference`, hash it, and pair the two for the hash tier.
pub async fn stored_from_ref<C, H, R, V>(
    reference: R,
    hasher: &dyn Hasher<C, H>,
    viewer: &V,
) -> ClientResult<StorageEntry<H, R>>
where
    C: Send + Sync,
    H: Send,
    R: Send + Sync,
    V: ContentViewer<C, R> + ?Sized,
{
    let content = viewer.read(&reference).await?;
    let hash = hasher.hash(&content).await?;
    Ok(StorageEntry::new(hash, reference))
}

/// Fetch the content behind a hash-tier record and check it against the
/// recorded hash. A mismatch yields `valid == false`, not an error.
pub async fn entry_from_stored<C, H, R, V>(
    stored: StorageEntry<H, R>,
    hasher: &dyn Hasher<C, H>,
    viewer: &V,
) -> ClientResult<Entry<C, H, R>>
where
    C: Send + Sync,
    H: PartialEq + Send,
    R: Send + Sync,
    V: ContentViewer<C, R> + ?Sized,
{
    let content = viewer.read(&stored.reference).await?;
    let computed = hasher.hash(&content).await?;
    Ok(Entry::reconcile(stored, content, &computed))
}

/// Hash and pair every reference, concurrently, keeping input order.
pub async fn stored_from_refs<C, H, R, V>(
    references: Vec<R>,
    hasher: &dyn Hasher<C, H>,
    viewer: &V,
) -> ClientResult<Storage<H, R>>
where
    C: Send + Sync,
    H: Send,
    R: Send + Sync,
    V: ContentViewer<C, R> + ?Sized,
{
    let entries = try_join_all(
        references
            .into_iter()
            .map(|reference| stored_from_ref(reference, hasher, viewer)),
    )
    .await?;
    Ok(Storage::from_entries(entries))
}

/// Reconcile every entry of every batch.
///
/// All fetches run concurrently across batches, bounded by `limit` when set.
/// The result has one list per batch and keeps hash-tier order within each.
/// The first failed fetch aborts the whole read.
pub async fn reconcile_batches<C, H, R, V>(
    batches: Vec<Storage<H, R>>,
    hasher: &dyn Hasher<C, H>,
    viewer: &V,
    limit: Option<usize>,
) -> ClientResult<Vec<ContentList<C, H, R>>>
where
    C: Send + Sync,
    H: PartialEq + Send,
    R: Send + Sync,
    V: ContentViewer<C, R> + ?Sized,
{
    let sizes: Vec<usize> = batches.iter().map(Storage::len).collect();
    let fetches = batches
        .into_iter()
        .flatten()
        .map(|stored| entry_from_stored(stored, hasher, viewer));

    let entries: Vec<Entry<C, H, R>> = match limit {
        None => try_join_all(fetches).await?,
        Some(n) => stream::iter(fetches).buffered(n).try_collect().await?,
    };

    let mut entries = entries.into_iter();
    Ok(sizes
        .into_iter()
        .map(|n| entries.by_ref().take(n).collect())
        .collect())
}
