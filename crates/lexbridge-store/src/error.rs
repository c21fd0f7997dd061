use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vector backend unavailable")]
    Unavailable,

    #[error("document {0} has no embedding")]
    MissingEmbedding(String),

    #[error("embedding for {doc_id} has dimension {got}, collection expects {expected}")]
    DimensionMismatch {
        doc_id: String,
        got: usize,
        expected: usize,
    },

    #[error("lancedb error: {0}")]
    Lance(#[from] lancedb::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("{0}")]
    Other(String),
}
