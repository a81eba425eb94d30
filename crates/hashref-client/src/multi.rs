//! Registry of control clients keyed by `(app_id, client_id)`.
//!
//! Each registration bundles a hasher and one provider per tier; the registry
//! builds a [`ControlClient`] for it and shares that client behind an `Arc`.
//! Every operation is a lookup followed by a call on the matching client.

use std::collections::HashMap;
use std::sync::Arc;

use hashref_provider::{ContentControl, HashControl, Hasher};
use hashref_types::{ContentList, NextContent, Storage};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::control::ControlClient;
use crate::error::{ClientError, ClientResult};
use crate::view::ViewClient;

/// Providers for one client of one app.
pub struct ClientRegistration<C, H, R, L>
where
    C: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    pub client_id: String,
    pub hasher: Arc<dyn Hasher<C, H>>,
    pub content_control: Arc<dyn ContentControl<C, R>>,
    pub hash_control: Arc<dyn HashControl<H, R, L>>,
}

impl<C, H, R, L> ClientRegistration<C, H, R, L>
where
    C: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    pub fn new(
        client_id: impl Into<String>,
        hasher: Arc<dyn Hasher<C, H>>,
        content_control: Arc<dyn ContentControl<C, R>>,
        hash_control: Arc<dyn HashControl<H, R, L>>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            hasher,
            content_control,
            hash_control,
        }
    }
}

/// Every client registered under one app.
pub struct AppRegistration<C, H, R, L>
where
    C: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    pub app_id: String,
    pub clients: Vec<ClientRegistration<C, H, R, L>>,
}

impl<C, H, R, L> AppRegistration<C, H, R, L>
where
    C: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    pub fn new(app_id: impl Into<String>, clients: Vec<ClientRegistration<C, H, R, L>>) -> Self {
        Self {
            app_id: app_id.into(),
            clients,
        }
    }
}

type Registry<C, H, R, L> = HashMap<String, HashMap<String, Arc<ControlClient<C, H, R, L>>>>;

/// Control clients for many apps and owners, plus an optional shared view
/// client for public reads.
pub struct MultiClient<C, H, R, L>
where
    C: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    apps: Registry<C, H, R, L>,
    public_client: Option<ViewClient<C, H, R, L>>,
    config: ClientConfig,
}

impl<C, H, R, L> MultiClient<C, H, R, L>
where
    C: Send + Sync,
    H: Clone + PartialEq + Send + Sync,
    R: Clone + PartialEq + Send + Sync,
    L: Clone + Send + Sync,
{
    /// Registry built from `apps` with the default [`ClientConfig`].
    pub fn new(
        apps: Vec<AppRegistration<C, H, R, L>>,
        public_client: Option<ViewClient<C, H, R, L>>,
    ) -> Self {
        Self::with_config(ClientConfig::default(), apps, public_client)
    }

    /// Like [`new`](Self::new), applying `config` to every control client the
    /// registry builds, now and on later [`add_clients`](Self::add_clients).
    pub fn with_config(
        config: ClientConfig,
        apps: Vec<AppRegistration<C, H, R, L>>,
        public_client: Option<ViewClient<C, H, R, L>>,
    ) -> Self {
        let mut multi = Self {
            apps: HashMap::new(),
            public_client,
            config,
        };
        multi.add_clients(apps);
        multi
    }

    /// Register clients, replacing any existing client with the same
    /// `(app_id, client_id)`. Other clients of an existing app are kept.
    pub fn add_clients(&mut self, apps: Vec<AppRegistration<C, H, R, L>>) {
        for app in apps {
            let clients = self.apps.entry(app.app_id.clone()).or_default();
            for registration in app.clients {
                let client = ControlClient::new(
                    registration.hasher,
                    registration.content_control,
                    registration.hash_control,
                )
                .with_config(self.config.clone());
                let replaced = clients
                    .insert(registration.client_id.clone(), Arc::new(client))
                    .is_some();
                info!(
                    app_id = %app.app_id,
                    client_id = %registration.client_id,
                    replaced,
                    "client registered"
                );
            }
        }
    }

    /// The client registered for `(app_id, client_id)`.
    pub fn get_client(
        &self,
        app_id: &str,
        client_id: &str,
    ) -> ClientResult<Arc<ControlClient<C, H, R, L>>> {
        let clients = self
            .apps
            .get(app_id)
            .ok_or_else(|| ClientError::AppNotFound(app_id.to_string()))?;
        clients
            .get(client_id)
            .cloned()
            .ok_or_else(|| ClientError::ClientNotFound {
                app_id: app_id.to_string(),
                client_id: client_id.to_string(),
            })
    }

    // ---- Registry inspection ----

    /// Configuration applied to every built control client.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared view client, if one was configured.
    pub fn public_client(&self) -> Option<&ViewClient<C, H, R, L>> {
        self.public_client.as_ref()
    }

    pub fn has_public_client(&self) -> bool {
        self.public_client.is_some()
    }

    /// Registered app ids, sorted.
    pub fn app_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.apps.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Client ids registered under `app_id`, sorted. Empty for unknown apps.
    pub fn client_ids(&self, app_id: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .apps
            .get(app_id)
            .map(|clients| clients.keys().map(String::as_str).collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    pub fn contains(&self, app_id: &str, client_id: &str) -> bool {
        self.apps
            .get(app_id)
            .is_some_and(|clients| clients.contains_key(client_id))
    }

    /// Total number of registered clients across all apps.
    pub fn len(&self) -> usize {
        self.apps.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---- Dispatch ----

    /// Read `location` through the shared view client.
    pub async fn public_read(&self, location: &L) -> ClientResult<Vec<ContentList<C, H, R>>> {
        let view = self.public_client.as_ref().ok_or(ClientError::NoPublicClient)?;
        view.read(location).await
    }

    pub async fn read_own(
        &self,
        app_id: &str,
        client_id: &str,
    ) -> ClientResult<Vec<ContentList<C, H, R>>> {
        debug!(app_id, client_id, "read_own");
        self.get_client(app_id, client_id)?.read_own().await
    }

    pub async fn originate_ref(
        &self,
        app_id: &str,
        client_id: &str,
        references: Vec<R>,
    ) -> ClientResult<()> {
        debug!(app_id, client_id, "originate_ref");
        self.get_client(app_id, client_id)?
            .originate_ref(references)
            .await
    }

    pub async fn originate_content(
        &self,
        app_id: &str,
        client_id: &str,
        contents: &[C],
    ) -> ClientResult<()> {
        debug!(app_id, client_id, "originate_content");
        self.get_client(app_id, client_id)?
            .originate_content(contents)
            .await
    }

    pub async fn create(
        &self,
        app_id: &str,
        client_id: &str,
        contents: &[C],
        location: Option<&L>,
    ) -> ClientResult<()> {
        debug!(app_id, client_id, "create");
        self.get_client(app_id, client_id)?
            .create(contents, location)
            .await
    }

    pub async fn remove(
        &self,
        app_id: &str,
        client_id: &str,
        target: &Storage<H, R>,
        location: Option<&L>,
    ) -> ClientResult<()> {
        debug!(app_id, client_id, "remove");
        self.get_client(app_id, client_id)?
            .remove(target, location)
            .await
    }

    pub async fn update(
        &self,
        app_id: &str,
        client_id: &str,
        pairs: NextContent<C, R>,
        location: Option<&L>,
    ) -> ClientResult<()> {
        debug!(app_id, client_id, "update");
        self.get_client(app_id, client_id)?
            .update(pairs, location)
            .await
    }
}

impl<C, H, R, L> std::fmt::Debug for MultiClient<C, H, R, L>
where
    C: Send + Sync,
    H: Send + Sync,
    R: Send + Sync,
    L: Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut apps: Vec<(&String, Vec<&String>)> = self
            .apps
            .iter()
            .map(|(app, clients)| (app, clients.keys().collect()))
            .collect();
        apps.sort();
        f.debug_struct("MultiClient")
            .field("apps", &apps)
            .field("public_client", &self.public_client.is_some())
            .field("config", &self.config)
            .finish()
    }
}
