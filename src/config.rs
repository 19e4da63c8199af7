use crate::processing::summarize::{
    DEFAULT_CHUNK_TOKENS, DEFAULT_CONCURRENCY, DEFAULT_MAX_LENGTH, DEFAULT_MAX_MODEL_TOKENS,
};
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_SUMMARIZATION_MODEL: &str = "facebook/bart-large-cnn";
const DEFAULT_GENERATION_MODEL: &str = "google/flan-t5-base";
const DEFAULT_TOKENIZER_MODEL: &str = "r50k_base";

/// Token value shipped in sample `.env` files; treated as "not configured".
const PLACEHOLDER_TOKEN: &str = "your_token_here";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the research assistant.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backend that serves summarization and text generation models.
    pub inference_provider: InferenceProvider,
    /// Access token for the Hugging Face Inference API.
    pub huggingface_api_token: Option<String>,
    /// Optional override for the Hugging Face Inference API base URL.
    pub huggingface_api_url: Option<String>,
    /// Optional override for the Ollama runtime base URL.
    pub ollama_url: Option<String>,
    /// Model used for chunk and second-pass summaries.
    pub summarization_model: String,
    /// Model used for answers and comprehension questions.
    pub generation_model: String,
    /// Model used to grade user answers.
    pub evaluation_model: String,
    /// Tokenizer model or encoding name used for token budgets.
    pub tokenizer_model: String,
    /// Token budget used when packing sentences into chunks.
    pub summary_chunk_tokens: usize,
    /// Hard input ceiling of the summarization model.
    pub summary_max_model_tokens: usize,
    /// Default summary length passed to the model.
    pub summary_max_length: usize,
    /// Maximum number of chunk summaries requested concurrently.
    pub summary_concurrency: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported inference backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProvider {
    /// Hosted Hugging Face Inference API.
    HuggingFace,
    /// Local Ollama runtime.
    Ollama,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let generation_model = optional("GENERATION_MODEL")
            .unwrap_or_else(|| DEFAULT_GENERATION_MODEL.to_string());

        Ok(Self {
            inference_provider: optional("INFERENCE_PROVIDER")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("INFERENCE_PROVIDER".into()))
                })
                .transpose()?
                .unwrap_or(InferenceProvider::HuggingFace),
            huggingface_api_token: optional("HUGGINGFACEHUB_API_TOKEN")
                .filter(|token| token.trim() != PLACEHOLDER_TOKEN),
            huggingface_api_url: optional("HUGGINGFACE_API_URL"),
            ollama_url: optional("OLLAMA_URL"),
            summarization_model: optional("SUMMARIZATION_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZATION_MODEL.to_string()),
            evaluation_model: optional("EVALUATION_MODEL")
                .unwrap_or_else(|| generation_model.clone()),
            generation_model,
            tokenizer_model: optional("TOKENIZER_MODEL")
                .unwrap_or_else(|| DEFAULT_TOKENIZER_MODEL.to_string()),
            summary_chunk_tokens: parse_positive(
                "SUMMARY_CHUNK_TOKENS",
                optional("SUMMARY_CHUNK_TOKENS"),
                DEFAULT_CHUNK_TOKENS,
            )?,
            summary_max_model_tokens: parse_positive(
                "SUMMARY_MAX_MODEL_TOKENS",
                optional("SUMMARY_MAX_MODEL_TOKENS"),
                DEFAULT_MAX_MODEL_TOKENS,
            )?,
            summary_max_length: parse_positive(
                "SUMMARY_MAX_LENGTH",
                optional("SUMMARY_MAX_LENGTH"),
                DEFAULT_MAX_LENGTH,
            )?,
            summary_concurrency: parse_positive(
                "SUMMARY_CONCURRENCY",
                optional("SUMMARY_CONCURRENCY"),
                DEFAULT_CONCURRENCY,
            )?,
            server_port: optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn parse_positive(key: &str, value: Option<String>, default: usize) -> Result<usize, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.trim().parse::<usize>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

impl std::str::FromStr for InferenceProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        provider = ?config.inference_provider,
        summarization_model = %config.summarization_model,
        generation_model = %config.generation_model,
        tokenizer_model = %config.tokenizer_model,
        chunk_tokens = config.summary_chunk_tokens,
        max_model_tokens = config.summary_max_model_tokens,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
