//! Token counting and truncation backed by `tiktoken-rs`.
//!
//! Budgets throughout the summarization pipeline are expressed in tokens, so the tokenizer is
//! the single source of truth for "how long is this text". Two operations are needed:
//!
//! - counting: `encode(text).len()`
//! - truncation: `decode(encode(text)[..n])`
//!
//! Both are provided on the [`Tokenizer`] trait so the pipeline can run against any encoder.
//! Byte-level BPE prefixes can end in the middle of a UTF-8 sequence; truncation backs off a
//! few tokens until the prefix decodes cleanly.

use anyhow::Error as EncodingError;
use thiserror::Error;
use tiktoken_rs::{
    CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, p50k_edit, r50k_base,
};

/// Identifier of a single token.
pub type TokenId = u32;

/// A multi-byte character spans at most four byte-level tokens.
const MAX_SPLIT_CHARACTER_TOKENS: usize = 3;

/// Errors raised by tokenizer backends.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// Tokenizer resources could not be loaded.
    #[error("failed to initialize tokenizer for model '{model}': {source}")]
    Unavailable {
        /// Model or encoding name we attempted to load.
        model: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: EncodingError,
    },
    /// Text could not be encoded.
    #[error("failed to encode text: {0}")]
    Encode(String),
    /// Token ids could not be decoded back into text.
    #[error("failed to decode tokens: {0}")]
    Decode(String),
}

/// Converts text to token ids and back.
pub trait Tokenizer: Send + Sync {
    /// Encode `text` without special tokens.
    fn encode(&self, text: &str) -> Result<Vec<TokenId>, TokenizerError>;

    /// Decode token ids into text.
    fn decode(&self, tokens: &[TokenId]) -> Result<String, TokenizerError>;

    /// Count the tokens in `text`.
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(self.encode(text)?.len())
    }

    /// Truncate `text` to at most `max_tokens` tokens; returns the input when it already fits.
    fn truncate(&self, text: &str, max_tokens: usize) -> Result<String, TokenizerError> {
        let tokens = self.encode(text)?;
        if tokens.len() <= max_tokens {
            return Ok(text.to_string());
        }
        self.decode_prefix(&tokens, max_tokens)
    }

    /// Decode the first `limit` tokens, backing off when the prefix splits a character.
    fn decode_prefix(&self, tokens: &[TokenId], limit: usize) -> Result<String, TokenizerError> {
        let limit = limit.min(tokens.len());
        let floor = limit.saturating_sub(MAX_SPLIT_CHARACTER_TOKENS);
        let mut end = limit;
        loop {
            match self.decode(&tokens[..end]) {
                Ok(text) => return Ok(text),
                Err(TokenizerError::Decode(_)) if end > floor => {
                    tracing::trace!(end, limit, "Token prefix split a character; backing off");
                    end -= 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Byte-pair-encoding tokenizer resolved through `tiktoken-rs`.
pub struct TiktokenTokenizer {
    encoding: CoreBPE,
    model: String,
}

impl TiktokenTokenizer {
    /// Resolve a tokenizer for a model name or encoding name.
    ///
    /// Unknown names fall back to `cl100k_base` so token budgets keep working for models whose
    /// exact vocabulary is not bundled.
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        let normalized = model.trim();
        let target = if normalized.is_empty() {
            "cl100k_base"
        } else {
            normalized
        };
        let encoding = resolve_encoding(target).map_err(|source| TokenizerError::Unavailable {
            model: target.to_string(),
            source,
        })?;
        Ok(Self {
            encoding,
            model: target.to_string(),
        })
    }

    /// Model or encoding name this tokenizer was resolved from.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>, TokenizerError> {
        Ok(self.encoding.encode_ordinary(text))
    }

    fn decode(&self, tokens: &[TokenId]) -> Result<String, TokenizerError> {
        self.encoding
            .decode(tokens.to_vec())
            .map_err(|error| TokenizerError::Decode(error.to_string()))
    }
}

fn resolve_encoding(model: &str) -> Result<CoreBPE, EncodingError> {
    if let Some(candidate) = encoding_from_name(model) {
        return candidate;
    }
    match get_bpe_from_model(model) {
        Ok(encoding) => Ok(encoding),
        Err(model_err) => {
            tracing::warn!(
                model,
                error = %model_err,
                "Unknown tokenizer model; falling back to 'cl100k_base' encoding"
            );
            cl100k_base()
        }
    }
}

fn encoding_from_name(name: &str) -> Option<Result<CoreBPE, EncodingError>> {
    match name {
        "cl100k_base" => Some(cl100k_base()),
        "o200k_base" => Some(o200k_base()),
        "p50k_base" => Some(p50k_base()),
        "p50k_edit" => Some(p50k_edit()),
        "r50k_base" | "gpt2" => Some(r50k_base()),
        _ => None,
    }
}
