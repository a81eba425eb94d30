use async_trait::async_trait;
use hashref_types::Digest;
use serde::Serialize;

use crate::error::{ProviderError, ProviderResult};

/// Content to hash digest.
///
/// Must be deterministic and free of side effects: the same content always
/// hashes to the same value, because reads compare a freshly computed hash
/// against one computed when the record was written. The call may suspend,
/// so a hasher backed by a remote service or HSM does not stall the executor.
/// Any synchronous `Fn(&C) -> ProviderResult<H>` closure is a `Hasher`.
#[async_trait]
pub trait Hasher<C, H>: Send + Sync
where
    C: Send + Sync,
    H: Send,
{
    async fn hash(&self, content: &C) -> ProviderResult<H>;
}

#[async_trait]
impl<C, H, F> Hasher<C, H> for F
where
    C: Send + Sync,
    H: Send,
    F: Fn(&C) -> ProviderResult<H> + Send + Sync,
{
    async fn hash(&self, content: &C) -> ProviderResult<H> {
        self(content)
    }
}

const CONTENT_DOMAIN: &[u8] = b"hashref-content-v1:";

/// BLAKE3 over the JSON encoding of any serializable content,
/// domain-separated so digests never collide with other BLAKE3 uses.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonBlake3Hasher;

impl JsonBlake3Hasher {
    pub fn new() -> Self {
        Self
    }

    pub fn digest<C: Serialize>(content: &C) -> ProviderResult<Digest> {
        let encoded =
            serde_json::to_vec(content).map_err(|e| ProviderError::Serialization(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(CONTENT_DOMAIN);
        hasher.update(&encoded);
        Ok(Digest::from_bytes(*hasher.finalize().as_bytes()))
    }
}

#[async_trait]
impl<C> Hasher<C, Digest> for JsonBlake3Hasher
where
    C: Serialize + Send + Sync,
{
    async fn hash(&self, content: &C) -> ProviderResult<Digest> {
        Self::digest(content)
    }
}
