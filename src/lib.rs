#![deny(missing_docs)]

//! Core library for the research assistant: chunked summarization and document Q&A.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Text extraction for PDF and plain-text documents.
pub mod document;
/// Summarization and text generation model clients.
pub mod inference;
/// Structured logging and tracing setup.
pub mod logging;
/// Summarization and question answering metrics.
pub mod metrics;
/// Summarization pipeline and question answering.
pub mod processing;
/// Token counting, truncation, and decoding.
pub mod tokenizer;
