//! Ollama-backed adapter for local models.

use super::{
    GenerationRequest, InferenceError, SummarizationModel, SummarizationRequest,
    TextGenerationModel,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Client for the Ollama `/api/generate` endpoint.
pub struct OllamaClient {
    http: Client,
    base_url: String,
}

impl OllamaClient {
    /// Construct a client, defaulting to the standard local Ollama address.
    pub fn new(base_url: Option<String>) -> Self {
        let http = Client::builder()
            .user_agent("research-assistant/ollama")
            .build()
            .expect("Failed to construct reqwest::Client for Ollama");
        Self {
            http,
            base_url: base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    async fn complete(&self, payload: Value) -> Result<String, InferenceError> {
        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                InferenceError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(InferenceError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            InferenceError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(InferenceError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

fn summarization_prompt(text: &str, max_length: usize) -> String {
    format!(
        "Summarize the following text in a single factual paragraph of at most {max_length} tokens. \
         Respond with the summary only.\n\n{text}"
    )
}

#[async_trait]
impl SummarizationModel for OllamaClient {
    async fn summarize(&self, request: SummarizationRequest) -> Result<String, InferenceError> {
        // Input truncation happens upstream against the tokenizer budget.
        let payload = json!({
            "model": request.model,
            "prompt": summarization_prompt(&request.text, request.max_length),
            "stream": false,
            "options": {
                "temperature": 0.1,
                "num_predict": request.max_length,
            }
        });
        self.complete(payload).await
    }
}

#[async_trait]
impl TextGenerationModel for OllamaClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, InferenceError> {
        let temperature = if request.do_sample {
            request.temperature
        } else {
            0.0
        };
        let payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_predict": request.max_length,
            }
        });
        self.complete(payload).await
    }
}
