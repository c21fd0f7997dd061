use thiserror::Error;

/// Errors surfaced by the ingestion path.
///
/// The query path never returns an error; its failure modes degrade into a
/// displayable answer instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] lexbridge_store::StoreError),

    #[error(transparent)]
    Ai(#[from] lexbridge_ai::AiError),
}
