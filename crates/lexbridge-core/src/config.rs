//! Engine configuration.
//!
//! Everything the pipeline needs is passed in explicitly through this
//! struct. There are no ambient globals, which keeps the pipeline
//! constructible with mock adapters in tests.

use std::path::PathBuf;
use std::time::Duration;

/// Connection parameters for one remote model endpoint.
#[derive(Debug, Clone)]
pub struct ModelEndpoint {
    /// Base URL without a trailing slash, e.g. `https://api.openai.com`.
    pub base_url: String,
    pub api_key: String,
    /// Model identifier sent with every request.
    pub model: String,
}

impl ModelEndpoint {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the vector database.
    pub index_path: PathBuf,
    /// Name of the vector collection.
    pub collection: String,
    pub embedding: ModelEndpoint,
    /// Embedding dimensionality. Must stay constant for the lifetime of a
    /// collection; vectors from different models or dimensions are not
    /// comparable.
    pub embedding_dim: usize,
    pub generation: ModelEndpoint,
    /// Bound on every remote call (embedding, search transport, each model
    /// call).
    pub request_timeout: Duration,
    /// Maximum number of sources retrieved per query.
    pub search_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./lexbridge-data"),
            collection: "legal_documents".to_string(),
            embedding: ModelEndpoint::new("https://api.openai.com", "", "text-embedding-3-small"),
            embedding_dim: 1536,
            generation: ModelEndpoint::new("https://api.openai.com", "", "gpt-4o-mini"),
            request_timeout: Duration::from_secs(30),
            search_limit: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        let ep = ModelEndpoint::new("http://localhost:8080/", "k", "m");
        assert_eq!(ep.base_url, "http://localhost:8080");
    }

    #[test]
    fn default_config_is_usable() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.embedding_dim, 1536);
        assert!(cfg.search_limit > 0);
        assert!(cfg.request_timeout > Duration::ZERO);
    }
}
