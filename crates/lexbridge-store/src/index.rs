//! Vector index gateway.
//!
//! Owns the lifecycle of one named LanceDB table: lazy idempotent creation,
//! batch upsert keyed by document id, and filtered cosine search.
//!
//! The gateway is built to degrade instead of fail. A backend that is
//! unreachable at construction leaves the gateway permanently unavailable,
//! and any search error yields an empty result list. The pipeline treats an
//! empty list as the signal to answer without grounding.

use std::path::Path;

use arrow::array::RecordBatchIterator;
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::DistanceType;
use lancedb::query::{ExecutableQuery, QueryBase};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use lexbridge_core::LegalDocument;

use crate::filter::{SearchFilter, sql_quote};
use crate::schema::{batch_to_documents, collection_schema, documents_to_batch};
use crate::StoreError;

/// Gateway to one named vector collection.
pub struct VectorIndex {
    db: Option<lancedb::Connection>,
    collection: String,
    dim: i32,
    /// Write-once collection-readiness flag. Once the collection is known
    /// to exist it is never re-checked for the process lifetime.
    ready: OnceCell<()>,
}

impl VectorIndex {
    /// Open the vector database at `path`.
    ///
    /// Never fails: if the backend is unreachable the gateway is permanently
    /// unavailable, searches return no results, and upserts error.
    pub async fn open(path: &Path, collection: &str, dim: usize) -> Self {
        let db = match Self::connect(path).await {
            Ok(db) => Some(db),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "vector backend unreachable");
                None
            }
        };

        Self {
            db,
            collection: collection.to_string(),
            dim: dim as i32,
            ready: OnceCell::new(),
        }
    }

    async fn connect(path: &Path) -> Result<lancedb::Connection, StoreError> {
        let uri = path
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?;
        let db = lancedb::connect(uri).execute().await?;
        // Reachability probe. A connection that cannot list tables would
        // otherwise fail on first use instead of at construction.
        db.table_names().execute().await?;
        Ok(db)
    }

    /// Whether the backend was reachable at construction.
    pub fn is_available(&self) -> bool {
        self.db.is_some()
    }

    /// Create the collection if absent. Idempotent; the existence check runs
    /// at most once per process lifetime.
    pub async fn ensure_collection(&self) -> Result<(), StoreError> {
        let db = self.db.as_ref().ok_or(StoreError::Unavailable)?;
        self.ready
            .get_or_try_init(|| async {
                let names = db.table_names().execute().await?;
                if !names.contains(&self.collection) {
                    db.create_empty_table(&self.collection, collection_schema(self.dim))
                        .execute()
                        .await?;
                    info!(
                        collection = %self.collection,
                        dim = self.dim,
                        "created vector collection"
                    );
                }
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }

    /// Batch insert-or-replace by document id.
    ///
    /// Existing rows with matching ids are removed before the new rows are
    /// appended, so re-ingestion replaces a document rather than duplicating
    /// it. Errors surface to the ingestion caller; there are no
    /// partial-failure semantics.
    pub async fn upsert(
        &self,
        docs: &[LegalDocument],
        embedding_model: &str,
    ) -> Result<usize, StoreError> {
        if docs.is_empty() {
            return Ok(0);
        }
        self.ensure_collection().await?;
        let db = self.db.as_ref().ok_or(StoreError::Unavailable)?;

        let batch = documents_to_batch(docs, self.dim, embedding_model)?;
        let table = db.open_table(&self.collection).execute().await?;

        let ids: Vec<String> = docs.iter().map(|d| sql_quote(&d.doc_id)).collect();
        table
            .delete(&format!("doc_id IN ({})", ids.join(", ")))
            .await?;

        let schema = batch.schema();
        let reader = RecordBatchIterator::new([Ok(batch)], schema);
        table.add(Box::new(reader)).execute().await?;

        info!(
            count = docs.len(),
            collection = %self.collection,
            "upserted points"
        );
        Ok(docs.len())
    }

    /// Cosine nearest-neighbor search, scoped by the filter.
    ///
    /// Returns at most `limit` documents ordered by similarity. Any backend
    /// error yields an empty list instead of propagating; the caller reads
    /// that as "no grounding available".
    pub async fn search(
        &self,
        query_vector: &[f32],
        filter: &SearchFilter<'_>,
        limit: usize,
    ) -> Vec<LegalDocument> {
        match self.try_search(query_vector, filter, limit).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "vector search failed, returning no results");
                Vec::new()
            }
        }
    }

    async fn try_search(
        &self,
        query_vector: &[f32],
        filter: &SearchFilter<'_>,
        limit: usize,
    ) -> Result<Vec<LegalDocument>, StoreError> {
        self.ensure_collection().await?;
        let db = self.db.as_ref().ok_or(StoreError::Unavailable)?;
        let table = db.open_table(&self.collection).execute().await?;

        let batches: Vec<RecordBatch> = table
            .vector_search(query_vector)?
            .distance_type(DistanceType::Cosine)
            .only_if(filter.to_predicate())
            .limit(limit)
            .execute()
            .await?
            .try_collect()
            .await?;

        let mut docs = Vec::new();
        for batch in &batches {
            docs.extend(batch_to_documents(batch)?);
        }
        docs.truncate(limit);
        Ok(docs)
    }

    /// Number of indexed points.
    pub async fn count(&self) -> Result<usize, StoreError> {
        self.ensure_collection().await?;
        let db = self.db.as_ref().ok_or(StoreError::Unavailable)?;
        let table = db.open_table(&self.collection).execute().await?;
        Ok(table.count_rows(None).await?)
    }
}
