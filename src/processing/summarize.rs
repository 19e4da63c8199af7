//! Two-level chunked summarization.
//!
//! Documents longer than the model window are split into sentence-aligned chunks, each chunk is
//! summarized independently, and when more than one chunk summary survives, their concatenation
//! is summarized once more. Failures never escape: a failed chunk is dropped, a failed second
//! pass falls back to the joined chunk summaries, and nothing usable yields
//! [`SummaryOutcome::NoSummary`].
//!
//! Two token limits apply. `chunk_tokens` bounds sentence packing; `max_model_tokens` is the
//! model's hard input ceiling and is re-checked on every model input, since joined sentences can
//! tokenize differently than their parts.

use super::chunking::chunk_sentences;
use super::sentences::split_into_sentences;
use super::types::{SummaryOutcome, SummaryReport, SummaryStrategy};
use crate::inference::{InferenceError, SummarizationModel, SummarizationRequest};
use crate::tokenizer::Tokenizer;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

/// Default summary length requested from the model.
pub const DEFAULT_MAX_LENGTH: usize = 200;
/// Default token budget for sentence packing.
pub const DEFAULT_CHUNK_TOKENS: usize = 900;
/// Default input ceiling of the summarization model.
pub const DEFAULT_MAX_MODEL_TOKENS: usize = 1024;
/// Default number of chunk summaries in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Token limits and parallelism for [`ChunkedSummarizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLimits {
    /// Budget used when packing sentences into chunks.
    pub chunk_tokens: usize,
    /// Hard ceiling on any single model input.
    pub max_model_tokens: usize,
    /// Maximum chunk summaries in flight at once.
    pub concurrency: usize,
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            chunk_tokens: DEFAULT_CHUNK_TOKENS,
            max_model_tokens: DEFAULT_MAX_MODEL_TOKENS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Result of summarizing one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChunkSummary {
    Summarized(String),
    Failed(String),
}

impl ChunkSummary {
    fn placeholder(message: &str) -> String {
        format!("[Error summarizing chunk: {message}]")
    }

    fn usable(self) -> Option<String> {
        match self {
            Self::Summarized(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Summarizes arbitrarily long text with a fixed-window summarization model.
///
/// Construct once and share; the tokenizer and model handles are reused by every request.
#[derive(Clone)]
pub struct ChunkedSummarizer {
    tokenizer: Arc<dyn Tokenizer>,
    model: Arc<dyn SummarizationModel>,
    model_name: String,
    limits: SummaryLimits,
}

impl ChunkedSummarizer {
    /// Create a summarizer over the given collaborators.
    pub fn new(
        tokenizer: Arc<dyn Tokenizer>,
        model: Arc<dyn SummarizationModel>,
        model_name: impl Into<String>,
        limits: SummaryLimits,
    ) -> Self {
        Self {
            tokenizer,
            model,
            model_name: model_name.into(),
            limits: SummaryLimits {
                concurrency: limits.concurrency.max(1),
                ..limits
            },
        }
    }

    /// Limits this summarizer applies.
    pub fn limits(&self) -> SummaryLimits {
        self.limits
    }

    /// Summarize `text`, asking the model for at most `max_length` tokens per call.
    pub async fn generate_summary(&self, text: &str, max_length: usize) -> SummaryOutcome {
        if text.trim().is_empty() {
            return SummaryOutcome::EmptyInput;
        }

        let sentences = split_into_sentences(text);
        let chunks = chunk_sentences(&sentences, self.limits.chunk_tokens, self.tokenizer.as_ref());
        tracing::debug!(
            sentences = sentences.len(),
            chunks = chunks.len(),
            chunk_tokens = self.limits.chunk_tokens,
            "Packed document into chunks"
        );

        let chunks: Vec<String> = chunks
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect();
        let chunk_count = chunks.len();

        // `buffered` yields results in chunk order regardless of completion order.
        let results: Vec<ChunkSummary> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| self.summarize_chunk(index, chunk, max_length))
            .buffered(self.limits.concurrency)
            .collect()
            .await;

        let summaries: Vec<String> = results.into_iter().filter_map(ChunkSummary::usable).collect();
        let failed_chunks = chunk_count - summaries.len();

        match summaries.len() {
            0 => {
                tracing::warn!(chunk_count, failed_chunks, "No chunk produced a summary");
                SummaryOutcome::NoSummary {
                    chunk_count,
                    failed_chunks,
                }
            }
            1 => {
                let text = summaries.into_iter().next().unwrap_or_default();
                SummaryOutcome::Summarized(SummaryReport {
                    text,
                    strategy: SummaryStrategy::SingleChunk,
                    chunk_count,
                    failed_chunks,
                })
            }
            _ => {
                let (text, strategy) = self.combine(&summaries, max_length).await;
                SummaryOutcome::Summarized(SummaryReport {
                    text,
                    strategy,
                    chunk_count,
                    failed_chunks,
                })
            }
        }
    }

    async fn summarize_chunk(
        &self,
        index: usize,
        chunk: String,
        max_length: usize,
    ) -> ChunkSummary {
        let input = self.fit_to_model(chunk);
        match self.call_model(input, max_length).await {
            Ok(summary) => {
                tracing::debug!(chunk = index, chars = summary.len(), "Chunk summarized");
                ChunkSummary::Summarized(summary)
            }
            Err(error) => {
                let message = error.to_string();
                tracing::warn!(
                    chunk = index,
                    placeholder = %ChunkSummary::placeholder(&message),
                    "Chunk summarization failed"
                );
                ChunkSummary::Failed(message)
            }
        }
    }

    async fn combine(&self, summaries: &[String], max_length: usize) -> (String, SummaryStrategy) {
        let combined = self.fit_to_model(summaries.join(" "));
        tracing::debug!(
            summaries = summaries.len(),
            chars = combined.len(),
            "Summarizing chunk summaries"
        );
        match self.call_model(combined.clone(), max_length).await {
            Ok(summary) => (summary, SummaryStrategy::Combined),
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "Second-pass summarization failed; returning joined chunk summaries"
                );
                (combined, SummaryStrategy::ConcatenatedFallback)
            }
        }
    }

    /// Truncate `text` to the model input ceiling.
    fn fit_to_model(&self, text: String) -> String {
        match self.tokenizer.truncate(&text, self.limits.max_model_tokens) {
            Ok(fitted) => fitted,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "Token ceiling check failed; relying on provider truncation"
                );
                text
            }
        }
    }

    async fn call_model(&self, text: String, max_length: usize) -> Result<String, InferenceError> {
        self.model
            .summarize(SummarizationRequest {
                model: self.model_name.clone(),
                text,
                max_length,
                truncation: true,
            })
            .await
    }
}
