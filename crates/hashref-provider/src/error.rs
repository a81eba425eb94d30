/// Errors raised by hash-tier and content-tier providers.
///
/// Clients propagate these unmodified; nothing in the engine retries or
/// reinterprets them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// A reference or location does not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record already exists where a new one was to be originated.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The backend refused the write.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Content could not be encoded for hashing or storage.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
