//! Clients for the pretrained models that do the actual language work.
//!
//! Two capabilities are needed: abstractive summarization of a bounded span of text, and free
//! text generation for answers, comprehension questions, and answer feedback. Both are served
//! either by the hosted Hugging Face Inference API or by a local Ollama runtime; the adapters
//! issue HTTP requests directly.

mod huggingface;
mod ollama;

pub use huggingface::HuggingFaceClient;
pub use ollama::OllamaClient;

use crate::config::{Config, ConfigError, InferenceProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by model providers.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Provider was unreachable, unauthorized, or still loading the model.
    #[error("Model provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Model request failed: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Request payload for a single summarization call.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    /// Text to summarize.
    pub text: String,
    /// Upper bound on the summary length, in model tokens.
    pub max_length: usize,
    /// Ask the provider to truncate input that exceeds the model window.
    pub truncation: bool,
}

/// Request payload for a single text generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    /// Fully assembled prompt.
    pub prompt: String,
    /// Upper bound on generated tokens.
    pub max_length: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Sample instead of decoding greedily.
    pub do_sample: bool,
}

/// Interface implemented by abstractive summarization providers.
#[async_trait]
pub trait SummarizationModel: Send + Sync {
    /// Summarize `request.text` in at most `request.max_length` tokens.
    async fn summarize(&self, request: SummarizationRequest) -> Result<String, InferenceError>;
}

/// Interface implemented by text generation providers.
#[async_trait]
pub trait TextGenerationModel: Send + Sync {
    /// Generate a completion for `request.prompt`.
    async fn generate(&self, request: GenerationRequest) -> Result<String, InferenceError>;
}

/// Model handles shared by every request for the lifetime of the process.
#[derive(Clone)]
pub struct InferenceClients {
    /// Summarization backend.
    pub summarization: Arc<dyn SummarizationModel>,
    /// Text generation backend.
    pub generation: Arc<dyn TextGenerationModel>,
}

/// Build model clients for the configured provider.
///
/// A Hugging Face provider without an access token is a configuration error; callers surface it
/// to users instead of failing at startup.
pub fn build_clients(config: &Config) -> Result<InferenceClients, ConfigError> {
    match config.inference_provider {
        InferenceProvider::HuggingFace => {
            let token = config
                .huggingface_api_token
                .clone()
                .ok_or_else(|| ConfigError::MissingVariable("HUGGINGFACEHUB_API_TOKEN".into()))?;
            let client = Arc::new(HuggingFaceClient::new(
                config.huggingface_api_url.clone(),
                token,
            ));
            Ok(InferenceClients {
                summarization: client.clone(),
                generation: client,
            })
        }
        InferenceProvider::Ollama => {
            let client = Arc::new(OllamaClient::new(config.ollama_url.clone()));
            Ok(InferenceClients {
                summarization: client.clone(),
                generation: client,
            })
        }
    }
}
