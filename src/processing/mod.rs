//! Document processing pipeline: sentence splitting, chunking, summarization, and Q&A.

pub mod chunking;
pub mod qna;
pub mod sentences;
mod service;
pub mod summarize;
pub mod types;

pub use service::{AssistantApi, AssistantService};
pub use summarize::{ChunkedSummarizer, SummaryLimits};
pub use types::{
    AnswerEvaluation, AssistantError, SummaryOutcome, SummaryReport, SummaryStrategy,
};
