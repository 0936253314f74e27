//! Ollama client for local LLM inference.
//!
//! Epistemic foundation:
//! - K_i: Ollama serves a native generate API plus model metadata endpoints
//! - B_i: The backend will respond within the timeout (might fail)
//! - B_i: A response may carry no generated text at all → Option
//! - I^B: Network availability unknowable → retry with backoff

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::client::{GenerationOptions, TextGenerator};
use crate::models::{OllamaError, PodbriefError, Result};

/// Generate request payload (native Ollama API).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateRequestOptions,
}

#[derive(Debug, Serialize)]
struct GenerateRequestOptions {
    temperature: f64,
    num_ctx: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TaggedModel>,
}

/// Older Ollama versions report `name`, newer ones `model`.
#[derive(Debug, Deserialize)]
struct TaggedModel {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl TaggedModel {
    fn id(&self) -> Option<&str> {
        self.model.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShowResponse {
    #[serde(default)]
    model_info: serde_json::Map<String, serde_json::Value>,
}

/// Client for a single Ollama instance and a fixed model.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(PodbriefError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_retries: max_retries.max(1),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Names of the models the backend currently serves.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await.into());
        }

        let body: TagsResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::InvalidResponse(format!("tags: {e}")))?;

        let mut names: Vec<String> = body
            .models
            .iter()
            .filter_map(|m| m.id().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Context window size of a served model, when the backend reports one.
    pub async fn model_context_size(&self, model: &str) -> Result<Option<usize>> {
        let url = format!("{}/api/show", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ShowRequest { model })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await.into());
        }

        let body: ShowResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::InvalidResponse(format!("show: {e}")))?;

        Ok(context_length_from_model_info(&body.model_info))
    }

    /// Fail fast at configuration time: the model must exist and the
    /// requested context window must fit it.
    pub async fn validate_model(&self, num_ctx: usize) -> Result<()> {
        let models = self.list_models().await?;
        if !models.iter().any(|m| m == &self.model) {
            return Err(OllamaError::ModelNotFound(self.model.clone()).into());
        }

        match self.model_context_size(&self.model).await? {
            Some(max) if num_ctx > max => {
                Err(OllamaError::ContextTooLarge {
                    requested: num_ctx,
                    max,
                }
                .into())
            }
            Some(_) => Ok(()),
            None => {
                warn!(model = %self.model, "Backend reports no context length, skipping check");
                Ok(())
            }
        }
    }
}

/// The backend's model metadata keys vary by architecture
/// (e.g. `llama.context_length`); match on the suffix.
fn context_length_from_model_info(
    model_info: &serde_json::Map<String, serde_json::Value>,
) -> Option<usize> {
    model_info.iter().find_map(|(key, value)| {
        if key.contains("context_length") {
            value.as_u64().map(|v| v as usize)
        } else {
            None
        }
    })
}

async fn api_error(response: reqwest::Response) -> OllamaError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    OllamaError::ApiError { status, message }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Option<String>> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            options: GenerateRequestOptions {
                temperature: options.temperature,
                num_ctx: options.num_ctx,
            },
        };

        let start = Instant::now();
        let mut last_error: Option<PodbriefError> = None;

        for attempt in 0..self.max_retries {
            let response = match self.client.post(&url).json(&request).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(PodbriefError::Network(e));
                    if attempt < self.max_retries - 1 {
                        let backoff = Duration::from_secs(2u64.pow(attempt));
                        debug!(
                            attempt = attempt,
                            backoff_secs = backoff.as_secs(),
                            "Retrying after network error"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let err = api_error(response).await;
                // A missing model will not appear on retry.
                if status.as_u16() == 404 {
                    return Err(OllamaError::ModelNotFound(self.model.clone()).into());
                }
                last_error = Some(err.into());
                if attempt < self.max_retries - 1 {
                    tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                }
                continue;
            }

            let body: GenerateResponse = response
                .json()
                .await
                .map_err(|e| OllamaError::InvalidResponse(format!("generate: {e}")))?;

            debug!(
                model = %self.model,
                elapsed_secs = start.elapsed().as_secs(),
                "Generation complete"
            );

            return Ok(body.response.filter(|text| !text.trim().is_empty()));
        }

        Err(last_error.unwrap_or_else(|| {
            OllamaError::MaxRetriesExceeded {
                attempts: self.max_retries,
                last_error: "Unknown error".to_string(),
            }
            .into()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_response_tolerates_missing_field() {
        let body: GenerateResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(body.response.is_none());
    }

    #[test]
    fn test_tagged_model_accepts_both_shapes() {
        let body: TagsResponse = serde_json::from_str(
            r#"{"models": [{"model": "llama3.3:latest"}, {"name": "qwen2.5:32b"}]}"#,
        )
        .unwrap();
        let ids: Vec<&str> = body.models.iter().filter_map(TaggedModel::id).collect();
        assert_eq!(ids, vec!["llama3.3:latest", "qwen2.5:32b"]);
    }

    #[test]
    fn test_context_length_matched_by_suffix() {
        let body: ShowResponse = serde_json::from_str(
            r#"{"model_info": {"llama.context_length": 131072, "llama.embedding_length": 8192}}"#,
        )
        .unwrap();
        assert_eq!(context_length_from_model_info(&body.model_info), Some(131072));
    }

    #[test]
    fn test_context_length_absent() {
        let body: ShowResponse = serde_json::from_str(r#"{"model_info": {}}"#).unwrap();
        assert_eq!(context_length_from_model_info(&body.model_info), None);
    }
}
