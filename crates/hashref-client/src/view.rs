use std::sync::Arc;

use hashref_provider::{ContentViewer, HashViewer, Hasher};
use hashref_types::{ContentList, ReadTally};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::reconcile::reconcile_batches;

/// Read-only client: resolves a location through the hash tier and checks
/// every record against the content tier.
pub struct ViewClient<C, H, R, L>
where
    C: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    hasher: Arc<dyn Hasher<C, H>>,
    content_viewer: Arc<dyn ContentViewer<C, R>>,
    hash_viewer: Arc<dyn HashViewer<H, R, L>>,
    config: ClientConfig,
}

impl<C, H, R, L> ViewClient<C, H, R, L>
where
    C: Send + Sync,
    H: PartialEq + Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    pub fn new(
        hasher: Arc<dyn Hasher<C, H>>,
        content_viewer: Arc<dyn ContentViewer<C, R>>,
        hash_viewer: Arc<dyn HashViewer<H, R, L>>,
    ) -> Self {
        Self {
            hasher,
            content_viewer,
            hash_viewer,
            config: ClientConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Every batch at `location`, reconciled.
    ///
    /// Hash mismatches come back as entries with `valid == false`. Failing to
    /// reach either tier, or a reference that no longer resolves, is an error.
    pub async fn read(&self, location: &L) -> ClientResult<Vec<ContentList<C, H, R>>> {
        let batches = self.hash_viewer.locate(location).await?;
        let lists = reconcile_batches(
            batches,
            self.hasher.as_ref(),
            self.content_viewer.as_ref(),
            self.config.fetch_limit(),
        )
        .await?;

        let tally = ReadTally::of(&lists);
        if tally.all_valid() {
            debug!(batches = tally.batches, entries = tally.entries, "public read");
        } else {
            warn!(
                batches = tally.batches,
                entries = tally.entries,
                invalid = tally.invalid,
                "public read found entries that fail verification"
            );
        }
        Ok(lists)
    }
}

impl<C, H, R, L> std::fmt::Debug for ViewClient<C, H, R, L>
where
    C: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
