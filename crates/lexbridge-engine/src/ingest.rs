//! Ingestion path: embed incoming documents and upsert them into the
//! vector collection.
//!
//! Unlike the query path, ingestion propagates real errors to its caller;
//! the scraping collaborator needs to know a batch did not land.

use std::time::Instant;

use tracing::info;

use lexbridge_ai::embedding_input;
use lexbridge_core::LegalDocument;

use crate::{EngineError, LegalEngine};

/// Documents per embedding request.
const INGEST_BATCH_SIZE: usize = 64;

pub struct IngestStats {
    pub indexed: usize,
    pub elapsed_secs: f64,
}

impl LegalEngine {
    /// Embed and index a batch of documents, replacing by `doc_id`.
    ///
    /// Each document is embedded exactly once per content revision, from
    /// the same text representation the query side compares against.
    pub async fn ingest(&self, mut docs: Vec<LegalDocument>) -> Result<IngestStats, EngineError> {
        let start = Instant::now();
        if docs.is_empty() {
            return Ok(IngestStats {
                indexed: 0,
                elapsed_secs: 0.0,
            });
        }

        self.index.ensure_collection().await?;

        let mut indexed = 0usize;
        for chunk in docs.chunks_mut(INGEST_BATCH_SIZE) {
            let inputs: Vec<String> = chunk
                .iter()
                .map(|d| embedding_input(&d.title, &d.text))
                .collect();
            let vectors = self.embedder.embed_batch(&inputs).await?;
            for (doc, vector) in chunk.iter_mut().zip(vectors) {
                doc.embedding = Some(vector);
            }
            indexed += self.index.upsert(chunk, &self.config.embedding.model).await?;
        }

        info!(count = indexed, "ingest complete");
        Ok(IngestStats {
            indexed,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }
}
