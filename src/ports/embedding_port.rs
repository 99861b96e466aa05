use async_trait::async_trait;

use crate::helper::error_chain_fmt;

/// Port to an external text-embedding provider.
///
/// One outbound call per `embed` invocation, no local state, no retry: callers
/// decide their own retry policy.
#[async_trait]
pub trait EmbeddingPort: Send + Sync {
    /// Converts a text to a vector of exactly `dimension()` floats.
    ///
    /// Either yields a complete vector or fails, never a partial or
    /// differently-sized one.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Dimension of the vectors produced by the provider, fixed per deployment
    fn dimension(&self) -> usize;
}

#[derive(thiserror::Error)]
pub enum EmbeddingError {
    #[error("Embedding provider request failed: {0}")]
    Provider(String),

    #[error("Embedding provider returned a malformed response: {0}")]
    MalformedResponse(String),

    #[error("Embedding provider returned a vector of dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Debug for EmbeddingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
