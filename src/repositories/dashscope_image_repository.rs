use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::configuration::DashScopeSettings;
use crate::ports::image_generation_port::{
    ImageGenerationError, ImageGenerationPort, ProviderTaskStatus, TaskUpdate,
};

/// Adapter to the DashScope asynchronous text-to-image endpoints.
///
/// Submission goes through the `X-DashScope-Async` header, so the provider
/// answers immediately with a task id; results are fetched from the task
/// status endpoint.
pub struct DashScopeImageRepository {
    client: reqwest::Client,
    settings: DashScopeSettings,
}

impl DashScopeImageRepository {
    pub fn try_new(settings: &DashScopeSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }
}

#[async_trait]
impl ImageGenerationPort for DashScopeImageRepository {
    #[tracing::instrument(name = "Submitting image synthesis task", skip(self, prompt))]
    async fn submit(&self, prompt: &str) -> Result<String, ImageGenerationError> {
        let request = SynthesisRequest {
            model: &self.settings.image.model,
            input: SynthesisInput { prompt },
            parameters: SynthesisParameters {
                n: self.settings.image.count,
                size: &self.settings.image.size,
            },
        };

        let response = self
            .client
            .post(self.settings.image_synthesis_url())
            .bearer_auth(self.settings.api_key.expose_secret())
            .header("X-DashScope-Async", "enable")
            .json(&request)
            .send()
            .await
            .map_err(|e| ImageGenerationError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageGenerationError::Provider(format!(
                "image synthesis endpoint answered with status {}",
                status
            )));
        }

        let body: SynthesisResponse = response
            .json()
            .await
            .map_err(|e| ImageGenerationError::MalformedResponse(e.to_string()))?;

        task_id_from_response(body)
    }

    #[tracing::instrument(name = "Fetching image synthesis task status", skip(self))]
    async fn status(&self, task_id: &str) -> Result<TaskUpdate, ImageGenerationError> {
        let response = self
            .client
            .get(self.settings.task_url(task_id))
            .bearer_auth(self.settings.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| ImageGenerationError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageGenerationError::Provider(format!(
                "task status endpoint answered with status {}",
                status
            )));
        }

        let body: TaskStatusResponse = response
            .json()
            .await
            .map_err(|e| ImageGenerationError::MalformedResponse(e.to_string()))?;

        update_from_response(body)
    }
}

/// Extracts the task id from a submission response
fn task_id_from_response(response: SynthesisResponse) -> Result<String, ImageGenerationError> {
    response
        .output
        .and_then(|output| output.task_id)
        .ok_or_else(|| {
            ImageGenerationError::Provider(format!(
                "provider did not return a task id: {}",
                response.message.unwrap_or_else(|| "unknown error".into())
            ))
        })
}

/// Maps a status payload to a task update.
///
/// A payload without an `output` object is malformed and becomes a hard
/// error. `SUCCEEDED`, `FAILED` and `UNKNOWN` map to their terminal statuses;
/// every other status string (PENDING, RUNNING, ...) means still processing.
fn update_from_response(response: TaskStatusResponse) -> Result<TaskUpdate, ImageGenerationError> {
    let output = response.output.ok_or_else(|| {
        ImageGenerationError::MalformedResponse(
            "task status payload missing the output object".into(),
        )
    })?;

    let status = match output.task_status.as_deref() {
        Some("SUCCEEDED") => ProviderTaskStatus::Succeeded,
        Some("FAILED") => ProviderTaskStatus::Failed,
        Some("UNKNOWN") => ProviderTaskStatus::Unknown,
        _ => ProviderTaskStatus::Pending,
    };

    let result_url = output
        .results
        .unwrap_or_default()
        .into_iter()
        .find_map(|result| result.url);

    Ok(TaskUpdate {
        status,
        result_url,
        message: output.message,
    })
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    model: &'a str,
    input: SynthesisInput<'a>,
    parameters: SynthesisParameters<'a>,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct SynthesisParameters<'a> {
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct SynthesisResponse {
    output: Option<SynthesisOutput>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SynthesisOutput {
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    output: Option<TaskStatusOutput>,
}

#[derive(Debug, Deserialize)]
struct TaskStatusOutput {
    task_status: Option<String>,
    results: Option<Vec<TaskResult>>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskResult {
    url: Option<String>,
}
