//! Remote embedding adapter.
//!
//! Converts text into fixed-length vectors through an OpenAI-compatible
//! `/v1/embeddings` endpoint. One model and one text representation are
//! used for both ingestion and query-time embedding; vectors produced by
//! different models or representations are not comparable, so the model
//! identifier is stored alongside every indexed point.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lexbridge_core::ModelEndpoint;

use crate::AiError;

/// Byte cap for the document body in the embedded representation.
const EMBED_BODY_BYTES: usize = 2000;

/// The single text representation embedded for a document: title plus
/// truncated body.
///
/// Used by the ingestion path when indexing and by any caller that needs to
/// re-embed the same document. Both sides must call this function so the
/// index stays comparable.
pub fn embedding_input(title: &str, body: &str) -> String {
    let mut end = body.len().min(EMBED_BODY_BYTES);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{title}\n\n{}", &body[..end])
}

/// Text embedding adapter.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AiError>;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
}

/// Embedding client for an OpenAI-compatible HTTP endpoint.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dim: usize,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    pub fn new(endpoint: &ModelEndpoint, dim: usize, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
            model: endpoint.model.clone(),
            dim,
            timeout,
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AiError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        debug!(count = texts.len(), model = %self.model, "embedding request");
        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::EmbeddingUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::EmbeddingUnavailable(format!(
                "server returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| AiError::EmbeddingUnavailable(e.to_string()))?;

        if parsed.data.len() != texts.len() {
            return Err(AiError::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        let mut rows = parsed.data;
        rows.sort_by_key(|r| r.index);

        let mut vectors = Vec::with_capacity(rows.len());
        for row in rows {
            if row.embedding.len() != self.dim {
                return Err(AiError::EmbeddingUnavailable(format!(
                    "embedding dimension {} does not match configured {}",
                    row.embedding.len(),
                    self.dim
                )));
            }
            vectors.push(row.embedding);
        }
        Ok(vectors)
    }
}

#[async_trait]
impl TextEmbedder for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| AiError::EmbeddingUnavailable("empty embedding response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AiError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_input_joins_title_and_body() {
        let input = embedding_input("BGB § 551", "Die Sicherheit darf...");
        assert!(input.starts_with("BGB § 551\n\n"));
        assert!(input.ends_with("Die Sicherheit darf..."));
    }

    #[test]
    fn embedding_input_truncates_long_bodies() {
        let body = "x".repeat(10_000);
        let input = embedding_input("Title", &body);
        assert!(input.len() < 3_000);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // A multi-byte character straddling the byte cap must not split.
        let body = format!("{}ü{}", "a".repeat(EMBED_BODY_BYTES - 1), "b".repeat(100));
        let input = embedding_input("T", &body);
        assert!(input.is_char_boundary(input.len()));
        assert!(!input.contains('b'));
    }

    #[test]
    fn embedding_input_is_deterministic() {
        let a = embedding_input("Title", "Body");
        let b = embedding_input("Title", "Body");
        assert_eq!(a, b);
    }

    #[test]
    fn response_rows_parse() {
        let json = r#"{"data": [
            {"index": 1, "embedding": [0.3, 0.4]},
            {"index": 0, "embedding": [0.1, 0.2]}
        ]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.len(), 2);
        let mut rows = parsed.data;
        rows.sort_by_key(|r| r.index);
        assert_eq!(rows[0].embedding, vec![0.1, 0.2]);
    }
}
