use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

use crate::domain::entities::generative_task::GenerativeTask;
use crate::helper::error_chain_fmt;
use crate::ports::image_generation_port::{
    ImageGenerationError, ImageGenerationPort, ProviderTaskStatus,
};

/// Fixed pause between two polls of a submitted task
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum number of polls before a task is declared timed out.
/// Together with [`POLL_INTERVAL`] this bounds a generation to ~60 seconds.
pub const MAX_POLL_ATTEMPTS: u32 = 30;

/// Drives avatar image synthesis through the provider's submit/poll protocol.
///
/// The polling loop blocks only the calling task; concurrent generations for
/// different users are independent and share no state. Every failure path is
/// surfaced to the caller: unlike search, avatar generation has no
/// silent-empty fallback.
pub struct AvatarGenerationService {
    image_provider: Arc<dyn ImageGenerationPort>,
}

impl AvatarGenerationService {
    pub fn new(image_provider: Arc<dyn ImageGenerationPort>) -> Self {
        Self { image_provider }
    }

    /// Generates an avatar for a user, returning the image URL
    #[tracing::instrument(name = "Generating user avatar", skip(self))]
    pub async fn generate(&self, nickname: &str) -> Result<String, AvatarGenerationError> {
        let prompt = avatar_prompt(nickname);
        self.synthesize(&prompt).await
    }

    /// Submits a synthesis task and polls it to a terminal status
    #[tracing::instrument(name = "Synthesizing image", skip(self, prompt))]
    pub async fn synthesize(&self, prompt: &str) -> Result<String, AvatarGenerationError> {
        let task_id = self.image_provider.submit(prompt).await?;
        info!(%task_id, "Submitted image synthesis task");

        let mut task = GenerativeTask::submitted(task_id);

        for _attempt in 0..MAX_POLL_ATTEMPTS {
            // A malformed or failed status call is a hard stop, not a retry
            let update = self.image_provider.status(&task.task_id).await?;
            task.record(&update);

            match update.status {
                ProviderTaskStatus::Succeeded => {
                    let url = task.result_ref.clone().ok_or_else(|| {
                        ImageGenerationError::MalformedResponse(
                            "succeeded task did not expose a result url".into(),
                        )
                    })?;
                    info!(task_id = %task.task_id, "Image synthesis succeeded");
                    return Ok(url);
                }
                ProviderTaskStatus::Failed | ProviderTaskStatus::Unknown => {
                    return Err(AvatarGenerationError::TaskFailed(
                        task.failure_message
                            .clone()
                            .unwrap_or_else(|| "internal error".into()),
                    ));
                }
                ProviderTaskStatus::Pending => sleep(POLL_INTERVAL).await,
            }
        }

        task.time_out();
        Err(AvatarGenerationError::TaskTimedOut {
            budget_seconds: MAX_POLL_ATTEMPTS as u64 * POLL_INTERVAL.as_secs(),
        })
    }
}

/// Fixed designer prompt built from the user's nickname
fn avatar_prompt(nickname: &str) -> String {
    format!(
        "You are an avatar designer. Design a professional profile avatar for a user \
         nicknamed \"{}\": cartoon style, modern and good-looking.",
        nickname
    )
}

#[derive(thiserror::Error)]
pub enum AvatarGenerationError {
    #[error(transparent)]
    Provider(#[from] ImageGenerationError),

    #[error("Image generation failed: {0}")]
    TaskFailed(String),

    #[error("Image generation timed out after {budget_seconds} seconds")]
    TaskTimedOut { budget_seconds: u64 },
}

impl std::fmt::Debug for AvatarGenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
