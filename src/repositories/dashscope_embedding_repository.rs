use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::configuration::DashScopeSettings;
use crate::ports::embedding_port::{EmbeddingError, EmbeddingPort};

/// Adapter to the DashScope OpenAI-compatible embeddings endpoint.
///
/// Stateless apart from the HTTP client: one outbound request per `embed`
/// call, no retry, no cache.
pub struct DashScopeEmbeddingRepository {
    client: reqwest::Client,
    endpoint: String,
    api_key: Secret<String>,
    model: String,
    dimension: usize,
}

impl DashScopeEmbeddingRepository {
    pub fn try_new(settings: &DashScopeSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.embeddings_url(),
            api_key: settings.api_key.clone(),
            model: settings.embedding.model.clone(),
            dimension: settings.embedding.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingPort for DashScopeEmbeddingRepository {
    #[tracing::instrument(name = "Requesting embedding from DashScope", skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Provider(format!(
                "embeddings endpoint answered with status {}",
                status
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        let embedding = vector_from_response(body, self.dimension)?;
        debug!("Received a {}-dimension embedding", embedding.len());

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Extracts `data[0].embedding` and enforces the configured dimension
fn vector_from_response(
    response: EmbeddingResponse,
    expected_dimension: usize,
) -> Result<Vec<f32>, EmbeddingError> {
    let embedding = response
        .data
        .and_then(|mut data| {
            if data.is_empty() {
                None
            } else {
                data.swap_remove(0).embedding
            }
        })
        .ok_or_else(|| {
            EmbeddingError::MalformedResponse(format!(
                "response missing the embedding field: {}",
                response.message.unwrap_or_else(|| "unknown error".into())
            ))
        })?;

    if embedding.len() != expected_dimension {
        return Err(EmbeddingError::DimensionMismatch {
            expected: expected_dimension,
            actual: embedding.len(),
        });
    }

    Ok(embedding)
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Option<Vec<EmbeddingData>>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Option<Vec<f32>>,
}
