use hashref_provider::ProviderError;
use thiserror::Error;

/// Errors returned by the hashref clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A hasher or storage provider failed. Passed through untouched.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The content tier returned a different number of references than
    /// contents it was given.
    #[error("content tier returned {refs} references for {hashes} hashed contents")]
    CardinalityMismatch { refs: usize, hashes: usize },

    #[error("update pair {position} names a reference not recorded at the target location")]
    UnknownReference { position: usize },

    #[error("no clients registered for app: {0}")]
    AppNotFound(String),

    #[error("no client {client_id} registered for app {app_id}")]
    ClientNotFound { app_id: String, client_id: String },

    #[error("no public view client configured")]
    NoPublicClient,

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
