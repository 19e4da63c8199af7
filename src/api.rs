//! HTTP surface for the research assistant.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /documents` – Upload a `.pdf` or `.txt` file (multipart field `file`) and return its
//!   extracted text with a short preview.
//! - `POST /summary` – Summarize a document with the chunked two-level strategy.
//! - `POST /ask` – Answer a free-text question using the document as context.
//! - `POST /questions` – Generate comprehension questions about a document.
//! - `POST /evaluate` – Grade a user's answer and point to the supporting paragraph.
//! - `GET /metrics` – Observe summarization and question answering counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The CLI shares the same service, so behavior is identical across interfaces.

use crate::document::{self, DocumentError, DocumentKind};
use crate::metrics::MetricsSnapshot;
use crate::processing::{AssistantApi, AssistantError, SummaryStrategy};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Build the HTTP router exposing the assistant API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: AssistantApi + 'static,
{
    Router::new()
        .route("/documents", post(upload_document))
        .route("/summary", post(summarize::<S>))
        .route("/ask", post(ask_question::<S>))
        .route("/questions", post(generate_questions::<S>))
        .route("/evaluate", post(evaluate_answer::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

/// Success response for `POST /documents`.
#[derive(Serialize)]
struct DocumentResponse {
    filename: String,
    kind: DocumentKind,
    /// Character count of the extracted text.
    chars: usize,
    preview: String,
    text: String,
}

/// Extract the text of an uploaded file.
async fn upload_document(mut multipart: Multipart) -> Result<Json<DocumentResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.txt").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let extracted = document::extract_text(&bytes, &filename)?;
        tracing::info!(
            filename = %extracted.filename,
            kind = ?extracted.kind,
            bytes = bytes.len(),
            "Document uploaded"
        );
        return Ok(Json(DocumentResponse {
            preview: extracted.preview(),
            chars: extracted.text.chars().count(),
            filename: extracted.filename,
            kind: extracted.kind,
            text: extracted.text,
        }));
    }
    Err(AppError::BadRequest("multipart field `file` is required".into()))
}

/// Request body for `POST /summary`.
#[derive(Deserialize)]
struct SummaryRequest {
    text: String,
    /// Optional summary length (defaults to `SUMMARY_MAX_LENGTH`).
    #[serde(default)]
    max_length: Option<usize>,
}

/// Success response for `POST /summary`.
#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<SummaryStrategy>,
    chunk_count: usize,
    failed_chunks: usize,
}

/// Summarize the supplied document text.
async fn summarize<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: AssistantApi,
{
    let outcome = service.summarize(request.text, request.max_length).await?;
    Ok(Json(SummaryResponse {
        strategy: outcome.strategy(),
        chunk_count: outcome.chunk_count(),
        failed_chunks: outcome.failed_chunks(),
        summary: outcome.into_text(),
    }))
}

/// Request body for `POST /ask`.
#[derive(Deserialize)]
struct AskRequest {
    context: String,
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

async fn ask_question<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError>
where
    S: AssistantApi,
{
    let answer = service
        .ask_question(request.context, request.question)
        .await?;
    Ok(Json(AskResponse { answer }))
}

/// Request body for `POST /questions`.
#[derive(Deserialize)]
struct QuestionsRequest {
    text: String,
    /// Optional number of questions (defaults to 5).
    #[serde(default)]
    count: Option<usize>,
}

#[derive(Serialize)]
struct QuestionsResponse {
    questions: Vec<String>,
}

async fn generate_questions<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QuestionsRequest>,
) -> Result<Json<QuestionsResponse>, AppError>
where
    S: AssistantApi,
{
    let questions = service
        .generate_questions(request.text, request.count)
        .await?;
    Ok(Json(QuestionsResponse { questions }))
}

/// Request body for `POST /evaluate`.
#[derive(Deserialize)]
struct EvaluateRequest {
    question: String,
    answer: String,
    document: String,
}

#[derive(Serialize)]
struct EvaluateResponse {
    feedback: String,
    paragraph_reference: Option<usize>,
    reference_label: String,
}

/// Grade an answer and locate the paragraph it draws from.
async fn evaluate_answer<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError>
where
    S: AssistantApi,
{
    let evaluation = service
        .evaluate_answer(request.question, request.answer, request.document)
        .await?;
    Ok(Json(EvaluateResponse {
        reference_label: evaluation.reference_label(),
        feedback: evaluation.feedback,
        paragraph_reference: evaluation.paragraph_reference,
    }))
}

/// Return the current activity counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: AssistantApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload_document",
                method: "POST",
                path: "/documents",
                description: "Upload a .pdf or .txt file as multipart field `file`. Response returns the extracted text and a preview of up to 500 characters.",
                request_example: None,
            },
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summary",
                description: "Summarize a document of any length by chunking it by sentences and summarizing the chunk summaries.",
                request_example: Some(json!({
                    "text": "Document contents",
                    "max_length": 200
                })),
            },
            CommandDescriptor {
                name: "ask",
                method: "POST",
                path: "/ask",
                description: "Answer a question using the document as context.",
                request_example: Some(json!({
                    "context": "Document contents",
                    "question": "What is the main finding?"
                })),
            },
            CommandDescriptor {
                name: "questions",
                method: "POST",
                path: "/questions",
                description: "Generate comprehension questions about a document.",
                request_example: Some(json!({
                    "text": "Document contents",
                    "count": 3
                })),
            },
            CommandDescriptor {
                name: "evaluate",
                method: "POST",
                path: "/evaluate",
                description: "Grade an answer to a comprehension question and report the supporting paragraph.",
                request_example: Some(json!({
                    "question": "What is the main finding?",
                    "answer": "The study found...",
                    "document": "Document contents"
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization and question answering counters.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    Assistant(AssistantError),
    Document(DocumentError),
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Assistant(AssistantError::Configuration(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Assistant(AssistantError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            Self::Assistant(_) => StatusCode::BAD_GATEWAY,
            Self::Document(DocumentError::UnsupportedFormat(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::Document(DocumentError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Document(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        let message = match self {
            Self::Assistant(error) => error.to_string(),
            Self::Document(error) => error.to_string(),
            Self::BadRequest(message) => message,
        };
        tracing::warn!(status = status.as_u16(), error = %message, "Request failed");
        (status, message).into_response()
    }
}

impl From<AssistantError> for AppError {
    fn from(inner: AssistantError) -> Self {
        Self::Assistant(inner)
    }
}

impl From<DocumentError> for AppError {
    fn from(inner: DocumentError) -> Self {
        Self::Document(inner)
    }
}
