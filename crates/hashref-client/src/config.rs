use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Where `update` gets the hash of the content it is replacing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrevHashSource {
    /// Re-read the current content at each previous reference and hash it.
    /// Costs one extra content read per pair.
    #[default]
    Content,
    /// Look each previous reference up at the target location and reuse the
    /// hash recorded there. Costs one `locate` call in total.
    HashTier,
}

/// Tuning shared by view, control, and multi clients.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Upper bound on content fetches in flight during one read. `None` issues
    /// every fetch at once; `Some(0)` behaves like `Some(1)`.
    pub max_concurrent_fetches: Option<usize>,
    pub prev_hash_source: PrevHashSource,
}

impl ClientConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> ClientResult<Self> {
        toml::from_str(input).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Bound the content fetches in flight during one read.
    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = Some(limit);
        self
    }

    /// Choose where `update` gets previous hashes from.
    pub fn with_prev_hash_source(mut self, source: PrevHashSource) -> Self {
        self.prev_hash_source = source;
        self
    }

    /// Effective fetch bound, with zero clamped to one.
    pub(crate) fn fetch_limit(&self) -> Option<usize> {
        self.max_concurrent_fetches.map(|n| n.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ClientConfig::default();
        assert_eq!(c.max_concurrent_fetches, None);
        assert_eq!(c.prev_hash_source, PrevHashSource::Content);
        assert_eq!(c.fetch_limit(), None);
    }

    #[test]
    fn parses_full_toml() {
        let c = ClientConfig::from_toml_str(
            r#"
            max_concurrent_fetches = 8
            prev_hash_source = "hash_tier"
            "#,
        )
        .unwrap();
        assert_eq!(c.max_concurrent_fetches, Some(8));
        assert_eq!(c.prev_hash_source, PrevHashSource::HashTier);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let c = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(c, ClientConfig::default());
    }

    #[test]
    fn unknown_source_is_a_config_error() {
        let err = ClientConfig::from_toml_str(r#"prev_hash_source = "ledger""#).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn zero_limit_clamps_to_one() {
        let c = ClientConfig::default().with_max_concurrent_fetches(0);
        assert_eq!(c.fetch_limit(), Some(1));
    }
}
