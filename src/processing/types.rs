//! Core data types and error definitions for the processing pipeline.

use crate::inference::InferenceError;
use serde::Serialize;
use thiserror::Error;

/// Returned for blank input.
pub const EMPTY_INPUT_MESSAGE: &str = "No text provided for summarization.";
/// Returned when no chunk produced a usable summary.
pub const NO_SUMMARY_MESSAGE: &str = "No summary generated.";
/// Rendered when an answer cannot be traced back to a paragraph.
pub const NO_PARAGRAPH_REFERENCE: &str = "Source paragraph not clearly found.";

/// Errors surfaced by the assistant to its front ends.
///
/// Every variant renders a message suitable for showing to the user as-is.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Credentials or model provider are not configured.
    #[error("{0}")]
    Configuration(String),
    /// The request itself was unusable.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Question answering failed.
    #[error("Error generating answer: {0}")]
    Answer(#[source] InferenceError),
    /// Comprehension question generation failed.
    #[error("Error generating questions: {0}")]
    Questions(#[source] InferenceError),
    /// Answer evaluation failed.
    #[error("Error evaluating answer: {0}")]
    Evaluation(#[source] InferenceError),
}

/// How the final summary was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStrategy {
    /// Exactly one chunk summary succeeded and is returned as-is.
    SingleChunk,
    /// Several chunk summaries were summarized again into one.
    Combined,
    /// The second pass failed; the joined chunk summaries are returned instead.
    ConcatenatedFallback,
}

/// A usable summary together with how it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    /// Final summary text.
    pub text: String,
    /// Path taken to produce `text`.
    pub strategy: SummaryStrategy,
    /// Number of chunks sent to the model.
    pub chunk_count: usize,
    /// Chunks whose summary failed and was dropped.
    pub failed_chunks: usize,
}

/// Result of one summarization request. Never an error: every path ends in displayable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// The input was empty or whitespace.
    EmptyInput,
    /// No chunk yielded a usable summary.
    NoSummary {
        /// Number of chunks sent to the model.
        chunk_count: usize,
        /// Chunks whose summary failed.
        failed_chunks: usize,
    },
    /// A summary was produced.
    Summarized(SummaryReport),
}

impl SummaryOutcome {
    /// Text shown to the user for this outcome.
    pub fn text(&self) -> &str {
        match self {
            Self::EmptyInput => EMPTY_INPUT_MESSAGE,
            Self::NoSummary { .. } => NO_SUMMARY_MESSAGE,
            Self::Summarized(report) => &report.text,
        }
    }

    /// Consume the outcome, returning the text shown to the user.
    pub fn into_text(self) -> String {
        match self {
            Self::Summarized(report) => report.text,
            other => other.text().to_string(),
        }
    }

    /// Number of chunks sent to the model.
    pub fn chunk_count(&self) -> usize {
        match self {
            Self::EmptyInput => 0,
            Self::NoSummary { chunk_count, .. } => *chunk_count,
            Self::Summarized(report) => report.chunk_count,
        }
    }

    /// Number of chunk summaries that failed.
    pub fn failed_chunks(&self) -> usize {
        match self {
            Self::EmptyInput => 0,
            Self::NoSummary { failed_chunks, .. } => *failed_chunks,
            Self::Summarized(report) => report.failed_chunks,
        }
    }

    /// Strategy used, when a summary was produced.
    pub fn strategy(&self) -> Option<SummaryStrategy> {
        match self {
            Self::Summarized(report) => Some(report.strategy),
            _ => None,
        }
    }
}

/// Feedback on a user's answer to a comprehension question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerEvaluation {
    /// Model feedback on correctness and justification.
    pub feedback: String,
    /// 1-based paragraph of the document that contains the answer, if found.
    pub paragraph_reference: Option<usize>,
}

impl AnswerEvaluation {
    /// Human-readable paragraph reference.
    pub fn reference_label(&self) -> String {
        match self.paragraph_reference {
            Some(index) => format!("Paragraph {index}"),
            None => NO_PARAGRAPH_REFERENCE.to_string(),
        }
    }
}
