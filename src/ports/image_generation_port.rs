use async_trait::async_trait;

use crate::helper::error_chain_fmt;

/// Status reported by the provider for an asynchronous generation task.
///
/// `Pending` covers every still-processing status string the provider may
/// come up with; the three other variants are terminal on the provider side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderTaskStatus {
    Pending,
    Succeeded,
    Failed,
    Unknown,
}

/// One poll response from the provider's task status endpoint
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    pub status: ProviderTaskStatus,
    /// URL of the first generated image, when the task succeeded
    pub result_url: Option<String>,
    /// Provider diagnostic, reported alongside terminal failures
    pub message: Option<String>,
}

/// Port to an external asynchronous image-generation provider
#[async_trait]
pub trait ImageGenerationPort: Send + Sync {
    /// Submits a generation task, returning the provider-issued task id
    async fn submit(&self, prompt: &str) -> Result<String, ImageGenerationError>;

    /// Fetches the current status of a submitted task
    async fn status(&self, task_id: &str) -> Result<TaskUpdate, ImageGenerationError>;
}

#[derive(thiserror::Error)]
pub enum ImageGenerationError {
    #[error("Image provider request failed: {0}")]
    Provider(String),

    #[error("Image provider returned a malformed response: {0}")]
    MalformedResponse(String),
}

impl std::fmt::Debug for ImageGenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
