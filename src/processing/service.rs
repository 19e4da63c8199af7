//! Assistant service coordinating summarization, question answering, and evaluation.

use crate::{
    config::Config,
    inference::{self, TextGenerationModel},
    metrics::{AssistantMetrics, MetricsSnapshot},
    processing::{
        qna::{self, DEFAULT_QUESTION_COUNT},
        summarize::{ChunkedSummarizer, DEFAULT_MAX_LENGTH, SummaryLimits},
        types::{AnswerEvaluation, AssistantError, SummaryOutcome, SummaryStrategy},
    },
    tokenizer::{TiktokenTokenizer, Tokenizer},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Model handles available once the provider is configured.
struct Backend {
    summarizer: ChunkedSummarizer,
    generator: Arc<dyn TextGenerationModel>,
    generation_model: String,
    evaluation_model: String,
}

/// Coordinates every document operation against shared model handles.
///
/// Tokenizer and model clients are created once, when the service is built, and reused by all
/// requests. Construct the service near process start and share it through an `Arc`.
pub struct AssistantService {
    backend: Result<Backend, String>,
    default_max_length: usize,
    metrics: Arc<AssistantMetrics>,
}

/// Abstraction over the assistant used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Summarize a document; `max_length` defaults to the configured summary length.
    async fn summarize(
        &self,
        text: String,
        max_length: Option<usize>,
    ) -> Result<SummaryOutcome, AssistantError>;

    /// Answer a free-text question about a document.
    async fn ask_question(&self, context: String, question: String)
    -> Result<String, AssistantError>;

    /// Generate comprehension questions about a document.
    async fn generate_questions(
        &self,
        text: String,
        count: Option<usize>,
    ) -> Result<Vec<String>, AssistantError>;

    /// Evaluate a user's answer to a question against the document.
    async fn evaluate_answer(
        &self,
        question: String,
        user_answer: String,
        document_text: String,
    ) -> Result<AnswerEvaluation, AssistantError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl AssistantService {
    /// Build the service from configuration.
    ///
    /// Missing credentials or an unloadable tokenizer do not abort startup; every operation
    /// then reports the problem as [`AssistantError::Configuration`].
    pub fn from_config(config: &Config) -> Self {
        tracing::info!(provider = ?config.inference_provider, "Initializing model clients");
        match build_backend(config) {
            Ok(backend) => {
                tracing::info!(
                    summarization_model = %config.summarization_model,
                    generation_model = %config.generation_model,
                    "Model clients initialized"
                );
                Self {
                    backend: Ok(backend),
                    default_max_length: config.summary_max_length,
                    metrics: Arc::new(AssistantMetrics::new()),
                }
            }
            Err(reason) => {
                tracing::warn!(reason = %reason, "Model clients unavailable");
                Self {
                    default_max_length: config.summary_max_length,
                    ..Self::unconfigured(reason)
                }
            }
        }
    }

    /// Build the service around explicit collaborators.
    pub fn new(
        summarizer: ChunkedSummarizer,
        generator: Arc<dyn TextGenerationModel>,
        generation_model: impl Into<String>,
        evaluation_model: impl Into<String>,
        default_max_length: usize,
    ) -> Self {
        Self {
            backend: Ok(Backend {
                summarizer,
                generator,
                generation_model: generation_model.into(),
                evaluation_model: evaluation_model.into(),
            }),
            default_max_length,
            metrics: Arc::new(AssistantMetrics::new()),
        }
    }

    /// Build a service whose every operation reports `reason` as a configuration error.
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self {
            backend: Err(reason.into()),
            default_max_length: DEFAULT_MAX_LENGTH,
            metrics: Arc::new(AssistantMetrics::new()),
        }
    }

    fn backend(&self) -> Result<&Backend, AssistantError> {
        self.backend
            .as_ref()
            .map_err(|reason| AssistantError::Configuration(reason.clone()))
    }

    /// Summarize a document with the chunked two-level strategy.
    pub async fn summarize(
        &self,
        text: String,
        max_length: Option<usize>,
    ) -> Result<SummaryOutcome, AssistantError> {
        let backend = self.backend()?;
        let max_length = max_length.unwrap_or(self.default_max_length).max(1);
        tracing::info!(chars = text.len(), max_length, "Summarizing document");

        let outcome = backend.summarizer.generate_summary(&text, max_length).await;
        if !matches!(outcome, SummaryOutcome::EmptyInput) {
            self.metrics.record_summary(
                outcome.chunk_count() as u64,
                outcome.failed_chunks() as u64,
                outcome.strategy() == Some(SummaryStrategy::ConcatenatedFallback),
            );
        }
        tracing::info!(
            chunks = outcome.chunk_count(),
            failed_chunks = outcome.failed_chunks(),
            strategy = ?outcome.strategy(),
            "Summary completed"
        );
        Ok(outcome)
    }

    /// Answer `question` using the document as context.
    pub async fn ask_question(
        &self,
        context: String,
        question: String,
    ) -> Result<String, AssistantError> {
        let backend = self.backend()?;
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::InvalidRequest(
                "question must not be empty".into(),
            ));
        }

        let answer = qna::ask_question(
            backend.generator.as_ref(),
            &backend.generation_model,
            &context,
            question,
        )
        .await
        .map_err(AssistantError::Answer)?;
        self.metrics.record_answer();
        tracing::info!(chars = answer.len(), "Question answered");
        Ok(answer)
    }

    /// Generate up to `count` comprehension questions (default 5).
    pub async fn generate_questions(
        &self,
        text: String,
        count: Option<usize>,
    ) -> Result<Vec<String>, AssistantError> {
        let backend = self.backend()?;
        let count = count.unwrap_or(DEFAULT_QUESTION_COUNT);
        if count == 0 {
            return Err(AssistantError::InvalidRequest(
                "question count must be greater than zero".into(),
            ));
        }

        let questions = qna::generate_logic_questions(
            backend.generator.as_ref(),
            &backend.generation_model,
            &text,
            count,
        )
        .await
        .map_err(AssistantError::Questions)?;
        tracing::info!(requested = count, produced = questions.len(), "Questions generated");
        Ok(questions)
    }

    /// Grade `user_answer` and locate the paragraph it draws from.
    pub async fn evaluate_answer(
        &self,
        question: String,
        user_answer: String,
        document_text: String,
    ) -> Result<AnswerEvaluation, AssistantError> {
        let backend = self.backend()?;
        if user_answer.trim().is_empty() {
            return Err(AssistantError::InvalidRequest(
                "answer must not be empty".into(),
            ));
        }

        let feedback = qna::evaluate_answer(
            backend.generator.as_ref(),
            &backend.evaluation_model,
            &question,
            &user_answer,
            &document_text,
        )
        .await
        .map_err(AssistantError::Evaluation)?;
        let paragraph_reference = qna::extract_paragraph_reference(&document_text, &user_answer);
        tracing::info!(paragraph = ?paragraph_reference, "Answer evaluated");
        Ok(AnswerEvaluation {
            feedback,
            paragraph_reference,
        })
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn build_backend(config: &Config) -> Result<Backend, String> {
    let clients = inference::build_clients(config).map_err(|error| match error {
        crate::config::ConfigError::MissingVariable(name) => format!(
            "Model provider not configured: set {name} in the environment or .env file."
        ),
        other => other.to_string(),
    })?;

    let tokenizer: Arc<dyn Tokenizer> = Arc::new(
        TiktokenTokenizer::for_model(&config.tokenizer_model)
            .map_err(|error| format!("Tokenizer unavailable: {error}"))?,
    );

    let summarizer = ChunkedSummarizer::new(
        tokenizer,
        clients.summarization,
        config.summarization_model.clone(),
        SummaryLimits {
            chunk_tokens: config.summary_chunk_tokens,
            max_model_tokens: config.summary_max_model_tokens,
            concurrency: config.summary_concurrency,
        },
    );

    Ok(Backend {
        summarizer,
        generator: clients.generation,
        generation_model: config.generation_model.clone(),
        evaluation_model: config.evaluation_model.clone(),
    })
}

#[async_trait]
impl AssistantApi for AssistantService {
    async fn summarize(
        &self,
        text: String,
        max_length: Option<usize>,
    ) -> Result<SummaryOutcome, AssistantError> {
        AssistantService::summarize(self, text, max_length).await
    }

    async fn ask_question(
        &self,
        context: String,
        question: String,
    ) -> Result<String, AssistantError> {
        AssistantService::ask_question(self, context, question).await
    }

    async fn generate_questions(
        &self,
        text: String,
        count: Option<usize>,
    ) -> Result<Vec<String>, AssistantError> {
        AssistantService::generate_questions(self, text, count).await
    }

    async fn evaluate_answer(
        &self,
        question: String,
        user_answer: String,
        document_text: String,
    ) -> Result<AnswerEvaluation, AssistantError> {
        AssistantService::evaluate_answer(self, question, user_answer, document_text).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        AssistantService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{
        GenerationRequest, InferenceError, SummarizationModel, SummarizationRequest,
    };
    use crate::tokenizer::testing::WordTokenizer;
    use std::collections::HashMap;

    struct FixedModel;

    #[async_trait]
    impl SummarizationModel for FixedModel {
        async fn summarize(
            &self,
            _request: SummarizationRequest,
        ) -> Result<String, InferenceError> {
            Ok("A concise summary.".into())
        }
    }

    #[async_trait]
    impl TextGenerationModel for FixedModel {
        async fn generate(&self, request: GenerationRequest) -> Result<String, InferenceError> {
            if request.prompt.contains("FAIL") {
                return Err(InferenceError::GenerationFailed("model crashed".into()));
            }
            Ok("The answer is in the text.".into())
        }
    }

    fn service() -> AssistantService {
        let summarizer = ChunkedSummarizer::new(
            Arc::new(WordTokenizer::default()),
            Arc::new(FixedModel),
            "bart",
            SummaryLimits::default(),
        );
        AssistantService::new(summarizer, Arc::new(FixedModel), "flan", "judge", 200)
    }

    #[tokio::test]
    async fn missing_token_surfaces_configuration_error() {
        let config = Config::from_lookup(|_| None::<String>).expect("config");
        let service = AssistantService::from_config(&config);

        let error = service
            .summarize("Some text worth summarizing.".into(), None)
            .await
            .expect_err("not configured");
        assert!(matches!(error, AssistantError::Configuration(_)));
        assert!(error.to_string().contains("HUGGINGFACEHUB_API_TOKEN"));

        let error = service
            .ask_question("ctx".into(), "q?".into())
            .await
            .expect_err("not configured");
        assert!(matches!(error, AssistantError::Configuration(_)));
    }

    #[tokio::test]
    async fn configured_service_builds_real_clients() {
        let vars: HashMap<&str, &str> = HashMap::from([("INFERENCE_PROVIDER", "ollama")]);
        let config = Config::from_lookup(|key| vars.get(key).map(|value| value.to_string()))
            .expect("config");
        let service = AssistantService::from_config(&config);

        let outcome = service.summarize("   ".into(), None).await.expect("configured");
        assert_eq!(outcome, SummaryOutcome::EmptyInput);
    }

    #[tokio::test]
    async fn summarize_records_metrics() {
        let service = service();
        let outcome = service
            .summarize("A single sentence that is long enough.".into(), None)
            .await
            .expect("summary");
        assert_eq!(outcome.text(), "A concise summary.");

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.documents_summarized, 1);
        assert_eq!(snapshot.chunks_summarized, 1);
    }

    #[tokio::test]
    async fn empty_input_is_not_counted() {
        let service = service();
        let outcome = service.summarize(String::new(), None).await.expect("outcome");
        assert_eq!(outcome.text(), "No text provided for summarization.");
        assert_eq!(service.metrics_snapshot().documents_summarized, 0);
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let error = service()
            .ask_question("context".into(), "   ".into())
            .await
            .expect_err("blank question");
        assert!(matches!(error, AssistantError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn answer_failures_are_wrapped() {
        let error = service()
            .ask_question("FAIL context".into(), "Why?".into())
            .await
            .expect_err("model failure");
        assert_eq!(
            error.to_string(),
            "Error generating answer: Model request failed: model crashed"
        );
    }

    #[tokio::test]
    async fn evaluation_reports_paragraph() {
        let document = "First paragraph.\n\nThe answer is in the second paragraph.".to_string();
        let evaluation = service()
            .evaluate_answer(
                "Where?".into(),
                "The answer is in the second".into(),
                document,
            )
            .await
            .expect("evaluation");
        assert_eq!(evaluation.feedback, "The answer is in the text.");
        assert_eq!(evaluation.paragraph_reference, Some(2));
    }

    #[tokio::test]
    async fn zero_questions_is_invalid() {
        let error = service()
            .generate_questions("text".into(), Some(0))
            .await
            .expect_err("zero count");
        assert!(matches!(error, AssistantError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn unconfigured_service_reports_reason() {
        let error = AssistantService::unconfigured("no models")
            .generate_questions("text".into(), None)
            .await
            .expect_err("unconfigured");
        assert_eq!(error.to_string(), "no models");
    }
}
