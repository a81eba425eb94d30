//! Recording providers for client tests.
//!
//! The spies wrap the in-memory providers and log every tier call by name so
//! tests can assert on call order and on calls that must not happen.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use hashref_provider::{
    ContentControl, ContentUpdate, ContentViewer, HashControl, HashUpdate, HashViewer, Hasher,
    InMemoryContentStore, InMemoryHashControl, InMemoryHashLedger, JsonBlake3Hasher, MemoryRef,
    OwnStorage, ProviderError, ProviderResult,
};
use hashref_types::{Digest, Storage};

use crate::control::ControlClient;

pub(crate) type Ledger = InMemoryHashLedger<Digest, MemoryRef, String>;
pub(crate) type TestClient = ControlClient<String, Digest, MemoryRef, String>;

pub(crate) fn digest(s: &str) -> Digest {
    JsonBlake3Hasher::digest(&s.to_string()).unwrap()
}

#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, call: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn contains(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    pub(crate) fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum ContentMode {
    #[default]
    Fallback,
    Native,
    /// Native update that drops the last reference it returns.
    Truncating,
}

pub(crate) struct SpyContent {
    pub(crate) inner: Arc<InMemoryContentStore<String>>,
    mode: ContentMode,
    log: CallLog,
}

#[async_trait]
impl ContentViewer<String, MemoryRef> for SpyContent {
    async fn read(&self, reference: &MemoryRef) -> ProviderResult<String> {
        self.log.push("content.read");
        self.inner.read(reference).await
    }
}

#[async_trait]
impl ContentControl<String, MemoryRef> for SpyContent {
    fn id(&self) -> &str {
        "spy-content"
    }

    async fn create(&self, contents: &[String]) -> ProviderResult<Vec<MemoryRef>> {
        self.log.push("content.create");
        self.inner.create(contents).await
    }

    async fn remove(&self, references: &[MemoryRef]) -> ProviderResult<()> {
        self.log.push("content.remove");
        self.inner.remove(references).await
    }

    fn updater(&self) -> Option<&dyn ContentUpdate<String, MemoryRef>> {
        match self.mode {
            ContentMode::Fallback => None,
            ContentMode::Native | ContentMode::Truncating => Some(self),
        }
    }
}

#[async_trait]
impl ContentUpdate<String, MemoryRef> for SpyContent {
    async fn update(&self, next: &[String], previous: &[MemoryRef]) -> ProviderResult<Vec<MemoryRef>> {
        self.log.push("content.update");
        let mut refs = ContentUpdate::update(self.inner.as_ref(), next, previous).await?;
        if self.mode == ContentMode::Truncating {
            refs.pop();
        }
        Ok(refs)
    }
}

pub(crate) struct SpyHash {
    inner: InMemoryHashControl<Digest, MemoryRef, String>,
    native_update: bool,
    own_storage: bool,
    fail_remove: bool,
    fail_locate: bool,
    log: CallLog,
}

#[async_trait]
impl HashViewer<Digest, MemoryRef, String> for SpyHash {
    async fn locate(&self, location: &String) -> ProviderResult<Vec<Storage<Digest, MemoryRef>>> {
        self.log.push("hash.locate");
        if self.fail_locate {
            return Err(ProviderError::Unavailable("ledger down".into()));
        }
        self.inner.locate(location).await
    }
}

#[async_trait]
impl HashControl<Digest, MemoryRef, String> for SpyHash {
    fn id(&self) -> &str {
        "spy-hash"
    }

    fn get_location(&self) -> String {
        self.inner.get_location()
    }

    async fn create(&self, storage: &Storage<Digest, MemoryRef>, location: &String) -> ProviderResult<()> {
        self.log.push("hash.create");
        self.inner.create(storage, location).await
    }

    async fn originate(&self, storage: &Storage<Digest, MemoryRef>) -> ProviderResult<()> {
        self.log.push("hash.originate");
        self.inner.originate(storage).await
    }

    async fn remove(&self, storage: &Storage<Digest, MemoryRef>, location: &String) -> ProviderResult<()> {
        self.log.push("hash.remove");
        if self.fail_remove {
            return Err(ProviderError::Rejected("removal refused".into()));
        }
        self.inner.remove(storage, location).await
    }

    fn updater(&self) -> Option<&dyn HashUpdate<Digest, MemoryRef, String>> {
        self.native_update.then_some(self as &dyn HashUpdate<Digest, MemoryRef, String>)
    }

    fn own_storage(&self) -> Option<&dyn OwnStorage<Digest, MemoryRef>> {
        self.own_storage.then_some(self as &dyn OwnStorage<Digest, MemoryRef>)
    }
}

#[async_trait]
impl HashUpdate<Digest, MemoryRef, String> for SpyHash {
    async fn update(
        &self,
        previous: &Storage<Digest, MemoryRef>,
        next: &Storage<Digest, MemoryRef>,
        location: &String,
    ) -> ProviderResult<()> {
        self.log.push("hash.update");
        HashUpdate::update(&self.inner, previous, next, location).await
    }
}

#[async_trait]
impl OwnStorage<Digest, MemoryRef> for SpyHash {
    async fn get_storage(&self) -> ProviderResult<Vec<Storage<Digest, MemoryRef>>> {
        self.log.push("hash.get_storage");
        Ok(self.inner.ledger().batches(self.inner.owner()))
    }
}

/// One content store and one ledger, with spies on the owner "alice".
pub(crate) struct Fixture {
    pub(crate) content: Arc<SpyContent>,
    pub(crate) hash: Arc<SpyHash>,
    pub(crate) ledger: Arc<Ledger>,
    pub(crate) log: CallLog,
}

#[derive(Default)]
pub(crate) struct FixtureBuilder {
    content_mode: ContentMode,
    native_hash_update: bool,
    own_storage: bool,
    fail_hash_remove: bool,
    fail_locate: bool,
}

impl FixtureBuilder {
    pub(crate) fn content_mode(mut self, mode: ContentMode) -> Self {
        self.content_mode = mode;
        self
    }

    pub(crate) fn native_hash_update(mut self, enabled: bool) -> Self {
        self.native_hash_update = enabled;
        self
    }

    pub(crate) fn own_storage(mut self, enabled: bool) -> Self {
        self.own_storage = enabled;
        self
    }

    pub(crate) fn fail_hash_remove(mut self, enabled: bool) -> Self {
        self.fail_hash_remove = enabled;
        self
    }

    pub(crate) fn fail_locate(mut self, enabled: bool) -> Self {
        self.fail_locate = enabled;
        self
    }

    pub(crate) fn build(self) -> Fixture {
        let log = CallLog::default();
        let ledger = Arc::new(Ledger::new());
        let content = Arc::new(SpyContent {
            inner: Arc::new(InMemoryContentStore::new()),
            mode: self.content_mode,
            log: log.clone(),
        });
        let hash = Arc::new(SpyHash {
            inner: ledger.control("alice".to_string()),
            native_update: self.native_hash_update,
            own_storage: self.own_storage,
            fail_remove: self.fail_hash_remove,
            fail_locate: self.fail_locate,
            log: log.clone(),
        });
        Fixture {
            content,
            hash,
            ledger,
            log,
        }
    }
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::builder().build()
    }

    pub(crate) fn builder() -> FixtureBuilder {
        FixtureBuilder::default()
    }

    pub(crate) fn owner(&self) -> String {
        self.hash.get_location()
    }

    /// Client over the spies, hashing with [`JsonBlake3Hasher`].
    pub(crate) fn client(&self) -> TestClient {
        self.client_with_hasher(Arc::new(JsonBlake3Hasher))
    }

    pub(crate) fn client_with_hasher(&self, hasher: Arc<dyn Hasher<String, Digest>>) -> TestClient {
        ControlClient::new(hasher, self.content.clone(), self.hash.clone())
    }

    /// Unrecorded client for another owner, sharing the same store and ledger.
    pub(crate) fn control_for(&self, owner: &str) -> TestClient {
        ControlClient::new(
            Arc::new(JsonBlake3Hasher),
            self.content.inner.clone(),
            Arc::new(self.ledger.control(owner.to_string())),
        )
    }
}
