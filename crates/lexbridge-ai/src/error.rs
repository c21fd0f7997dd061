use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// The embedding service failed or returned an unusable reply. The
    /// pipeline treats this as a reason to degrade, never to crash.
    #[error("embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The generation service failed or returned an unusable reply.
    #[error("generation service unavailable: {0}")]
    GenerationUnavailable(String),
}
