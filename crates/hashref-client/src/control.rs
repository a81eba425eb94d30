//! Read/write client over one content control and one hash control.
//!
//! Writes touch two systems that share no transaction manager, so every
//! operation is a fixed sequence of provider calls. Steps run strictly in
//! order, the first failure is returned as-is, and nothing already done is
//! rolled back. A later read shows the resulting state through its `valid`
//! flags.

use std::sync::Arc;

use futures_util::future::try_join_all;
use hashref_provider::{ContentControl, HashControl, Hasher};
use hashref_types::{ContentList, NextContent, ReadTally, Storage, StorageEntry};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, PrevHashSource};
use crate::error::{ClientError, ClientResult};
use crate::reconcile::{reconcile_batches, stored_from_refs};

/// Reads and writes one owner's records across a content control and a hash
/// control, hashing with a shared [`Hasher`].
pub struct ControlClient<C, H, R, L>
where
    C: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    hasher: Arc<dyn Hasher<C, H>>,
    content: Arc<dyn ContentControl<C, R>>,
    hash: Arc<dyn HashControl<H, R, L>>,
    config: ClientConfig,
}

impl<C, H, R, L> ControlClient<C, H, R, L>
where
    C: Send + Sync,
    H: Clone + PartialEq + Send + Sync,
    R: Clone + PartialEq + Send + Sync,
    L: Clone + Send + Sync,
{
    /// Client with the default [`ClientConfig`].
    pub fn new(
        hasher: Arc<dyn Hasher<C, H>>,
        content: Arc<dyn ContentControl<C, R>>,
        hash: Arc<dyn HashControl<H, R, L>>,
    ) -> Self {
        Self {
            hasher,
            content,
            hash,
            config: ClientConfig::default(),
        }
    }

    /// Replace the client's configuration.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Hasher applied to content on every read and write.
    pub fn hasher(&self) -> &Arc<dyn Hasher<C, H>> {
        &self.hasher
    }

    /// Content tier provider.
    pub fn content_control(&self) -> &Arc<dyn ContentControl<C, R>> {
        &self.content
    }

    /// Hash tier provider.
    pub fn hash_control(&self) -> &Arc<dyn HashControl<H, R, L>> {
        &self.hash
    }

    /// The location this client's own records live at.
    pub fn location(&self) -> L {
        self.hash.get_location()
    }

    fn resolve(&self, location: Option<&L>) -> L {
        match location {
            Some(location) => location.clone(),
            None => self.hash.get_location(),
        }
    }

    // ---- Reads ----

    /// Every batch at `location`, reconciled.
    pub async fn read(&self, location: &L) -> ClientResult<Vec<ContentList<C, H, R>>> {
        let batches = self.hash.locate(location).await?;
        self.reconcile(batches).await
    }

    /// This client's own batches, reconciled.
    ///
    /// Uses the hash control's direct storage access when it has one, and
    /// otherwise locates the control's own location.
    pub async fn read_own(&self) -> ClientResult<Vec<ContentList<C, H, R>>> {
        let batches = match self.hash.own_storage() {
            Some(own) => own.get_storage().await?,
            None => {
                let location = self.hash.get_location();
                self.hash.locate(&location).await?
            }
        };
        self.reconcile(batches).await
    }

    async fn reconcile(&self, batches: Vec<Storage<H, R>>) -> ClientResult<Vec<ContentList<C, H, R>>> {
        let lists = reconcile_batches(
            batches,
            self.hasher.as_ref(),
            self.content.as_ref(),
            self.config.fetch_limit(),
        )
        .await?;

        let tally = ReadTally::of(&lists);
        if tally.all_valid() {
            debug!(hash = self.hash.id(), entries = tally.entries, "read");
        } else {
            warn!(
                hash = self.hash.id(),
                content = self.content.id(),
                entries = tally.entries,
                invalid = tally.invalid,
                "read found entries that fail verification"
            );
        }
        Ok(lists)
    }

    // ---- Origination ----

    /// Start a new hash-tier record from content already hosted at `references`.
    pub async fn originate_ref(&self, references: Vec<R>) -> ClientResult<()> {
        let storage = stored_from_refs(references, self.hasher.as_ref(), self.content.as_ref()).await?;
        self.hash.originate(&storage).await?;
        info!(hash = self.hash.id(), count = storage.len(), "record originated");
        Ok(())
    }

    /// Host `contents`, then start a new hash-tier record from them.
    pub async fn originate_content(&self, contents: &[C]) -> ClientResult<()> {
        let references = self.content.create(contents).await?;
        self.originate_ref(references).await
    }

    // ---- Writes ----

    /// Host `contents` and append them to the record at `location`, or at
    /// this client's own location when `None`.
    pub async fn create(&self, contents: &[C], location: Option<&L>) -> ClientResult<()> {
        let location = self.resolve(location);
        let references = self.content.create(contents).await?;
        let storage = stored_from_refs(references, self.hasher.as_ref(), self.content.as_ref()).await?;
        self.hash.create(&storage, &location).await?;
        info!(
            content = self.content.id(),
            hash = self.hash.id(),
            count = storage.len(),
            "entries created"
        );
        Ok(())
    }

    /// Drop `target` from the hash tier, then delete its content.
    ///
    /// The hash tier goes first: content nothing points to is harmless, while
    /// a record pointing at deleted content is not. If the hash-tier removal
    /// fails, the content tier is left alone.
    pub async fn remove(&self, target: &Storage<H, R>, location: Option<&L>) -> ClientResult<()> {
        let location = self.resolve(location);
        self.hash.remove(target, &location).await?;
        self.content.remove(&target.refs()).await?;
        info!(
            content = self.content.id(),
            hash = self.hash.id(),
            count = target.len(),
            "entries removed"
        );
        Ok(())
    }

    /// Replace the content at each `(next, previous reference)` pair and move
    /// the hash-tier entries along with it.
    ///
    /// Native update is used on each tier that offers it; otherwise that tier
    /// gets a remove followed by a create. The content tier must hand back one
    /// reference per new content, or the update stops before the hash tier is
    /// touched.
    pub async fn update(&self, pairs: NextContent<C, R>, location: Option<&L>) -> ClientResult<()> {
        let location = self.resolve(location);
        let (next_contents, old_refs): (Vec<C>, Vec<R>) = pairs.into_iter().unzip();

        let next_hashes: Vec<H> =
            try_join_all(next_contents.iter().map(|content| self.hasher.hash(content))).await?;
        let prev_hashes = self.previous_hashes(&old_refs, &location).await?;
        let prev_storage: Storage<H, R> = prev_hashes
            .into_iter()
            .zip(old_refs.iter().cloned())
            .map(|(hash, reference)| StorageEntry::new(hash, reference))
            .collect();

        let next_refs = match self.content.updater() {
            Some(updater) => {
                debug!(content = self.content.id(), "native content update");
                updater.update(&next_contents, &old_refs).await?
            }
            None => {
                debug!(content = self.content.id(), "content update as remove then create");
                self.content.remove(&old_refs).await?;
                self.content.create(&next_contents).await?
            }
        };

        if next_refs.len() != next_hashes.len() {
            return Err(ClientError::CardinalityMismatch {
                refs: next_refs.len(),
                hashes: next_hashes.len(),
            });
        }

        let next_storage: Storage<H, R> = next_hashes
            .into_iter()
            .zip(next_refs)
            .map(|(hash, reference)| StorageEntry::new(hash, reference))
            .collect();

        match self.hash.updater() {
            Some(updater) => {
                debug!(hash = self.hash.id(), "native hash update");
                updater.update(&prev_storage, &next_storage, &location).await?;
            }
            None => {
                debug!(hash = self.hash.id(), "hash update as remove then create");
                self.hash.remove(&prev_storage, &location).await?;
                self.hash.create(&next_storage, &location).await?;
            }
        }

        info!(
            content = self.content.id(),
            hash = self.hash.id(),
            count = next_storage.len(),
            "entries updated"
        );
        Ok(())
    }

    /// Hash of whatever currently sits at each reference, in order.
    async fn previous_hashes(&self, old_refs: &[R], location: &L) -> ClientResult<Vec<H>> {
        match self.config.prev_hash_source {
            PrevHashSource::Content => {
                let hasher = self.hasher.as_ref();
                let content = self.content.as_ref();
                try_join_all(old_refs.iter().map(|reference| async move {
                    let current = content.read(reference).await?;
                    Ok::<H, ClientError>(hasher.hash(&current).await?)
                }))
                .await
            }
            PrevHashSource::HashTier => {
                let batches = self.hash.locate(location).await?;
                old_refs
                    .iter()
                    .enumerate()
                    .map(|(position, reference)| {
                        batches
                            .iter()
                            .find_map(|batch| batch.find_by_ref(reference))
                            .map(|entry| entry.hash.clone())
                            .ok_or(ClientError::UnknownReference { position })
                    })
                    .collect()
            }
        }
    }
}

impl<C, H, R, L> std::fmt::Debug for ControlClient<C, H, R, L>
where
    C: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlClient")
            .field("content", &self.content.id())
            .field("hash", &self.hash.id())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
