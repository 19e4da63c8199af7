//! Hugging Face Inference API adapter.
//!
//! Summarization targets encoder-decoder models such as `facebook/bart-large-cnn`; generation
//! targets text2text models such as `google/flan-t5-base`. Both share the same endpoint shape:
//! `POST {base}/models/{model}` with `{"inputs": ..., "parameters": {...}}`.

use super::{
    GenerationRequest, InferenceError, SummarizationModel, SummarizationRequest,
    TextGenerationModel,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const DEFAULT_HUGGINGFACE_URL: &str = "https://api-inference.huggingface.co";

/// Client for the hosted Hugging Face Inference API.
pub struct HuggingFaceClient {
    http: Client,
    base_url: String,
    token: String,
}

#[derive(Serialize)]
struct InferencePayload<'a, P> {
    inputs: &'a str,
    parameters: P,
}

#[derive(Serialize)]
struct SummarizationParameters {
    max_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncation: Option<&'static str>,
}

#[derive(Serialize)]
struct GenerationParameters {
    max_new_tokens: usize,
    temperature: f32,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedOutput {
    generated_text: String,
}

impl HuggingFaceClient {
    /// Construct a client using `token` as the bearer credential.
    pub fn new(base_url: Option<String>, token: String) -> Self {
        let http = Client::builder()
            .user_agent("research-assistant/huggingface")
            .build()
            .expect("Failed to construct reqwest::Client for Hugging Face");
        Self {
            http,
            base_url: base_url.unwrap_or_else(|| DEFAULT_HUGGINGFACE_URL.to_string()),
            token,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}",
            self.base_url.trim_end_matches('/'),
            model.trim_matches('/')
        )
    }

    async fn infer<P, T>(&self, model: &str, payload: &P) -> Result<Vec<T>, InferenceError>
    where
        P: Serialize + Sync,
        T: for<'de> Deserialize<'de>,
    {
        let endpoint = self.endpoint(model);
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(|error| {
                InferenceError::ProviderUnavailable(format!(
                    "failed to reach Hugging Face at {}: {error}",
                    self.base_url
                ))
            })?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::UNAUTHORIZED
                | StatusCode::FORBIDDEN
                | StatusCode::NOT_FOUND
                | StatusCode::SERVICE_UNAVAILABLE
        ) {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::ProviderUnavailable(format!(
                "{endpoint} returned {status}: {body}"
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::GenerationFailed(format!(
                "Hugging Face returned {status}: {body}"
            )));
        }

        response.json::<Vec<T>>().await.map_err(|error| {
            InferenceError::InvalidResponse(format!(
                "failed to decode Hugging Face response: {error}"
            ))
        })
    }
}

#[async_trait]
impl SummarizationModel for HuggingFaceClient {
    async fn summarize(&self, request: SummarizationRequest) -> Result<String, InferenceError> {
        let payload = InferencePayload {
            inputs: &request.text,
            parameters: SummarizationParameters {
                max_length: request.max_length,
                truncation: request.truncation.then_some("longest_first"),
            },
        };
        let outputs: Vec<SummaryOutput> = self.infer(&request.model, &payload).await?;
        outputs
            .into_iter()
            .next()
            .map(|output| output.summary_text.trim().to_string())
            .ok_or_else(|| InferenceError::InvalidResponse("empty summarization result".into()))
    }
}

#[async_trait]
impl TextGenerationModel for HuggingFaceClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, InferenceError> {
        let payload = InferencePayload {
            inputs: &request.prompt,
            parameters: GenerationParameters {
                max_new_tokens: request.max_length,
                temperature: request.temperature,
                do_sample: request.do_sample,
            },
        };
        let outputs: Vec<GeneratedOutput> = self.infer(&request.model, &payload).await?;
        outputs
            .into_iter()
            .next()
            .map(|output| output.generated_text.trim().to_string())
            .ok_or_else(|| InferenceError::InvalidResponse("empty generation result".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn client(server: &MockServer) -> HuggingFaceClient {
        HuggingFaceClient::new(Some(server.base_url()), "hf_test".into())
    }

    fn summarization(text: &str) -> SummarizationRequest {
        SummarizationRequest {
            model: "facebook/bart-large-cnn".into(),
            text: text.into(),
            max_length: 200,
            truncation: true,
        }
    }

    #[tokio::test]
    async fn summarize_sends_parameters_and_reads_summary_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/facebook/bart-large-cnn")
                    .header("authorization", "Bearer hf_test")
                    .json_body_partial(
                        r#"{"inputs": "Some long text", "parameters": {"max_length": 200, "truncation": "longest_first"}}"#,
                    );
                then.status(200)
                    .json_body(json!([{ "summary_text": " A short summary. " }]));
            })
            .await;

        let summary = client(&server)
            .summarize(summarization("Some long text"))
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "A short summary.");
    }

    #[tokio::test]
    async fn generate_reads_generated_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/google/flan-t5-base")
                    .json_body_partial(
                        r#"{"parameters": {"max_new_tokens": 256, "do_sample": true}}"#,
                    );
                then.status(200)
                    .json_body(json!([{ "generated_text": "Paris" }]));
            })
            .await;

        let answer = client(&server)
            .generate(GenerationRequest {
                model: "google/flan-t5-base".into(),
                prompt: "Question: capital of France?".into(),
                max_length: 256,
                temperature: 0.7,
                do_sample: true,
            })
            .await
            .expect("answer");

        mock.assert_async().await;
        assert_eq!(answer, "Paris");
    }

    #[tokio::test]
    async fn loading_model_is_reported_as_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/facebook/bart-large-cnn");
                then.status(503)
                    .json_body(json!({ "error": "Model is currently loading" }));
            })
            .await;

        let error = client(&server)
            .summarize(summarization("text"))
            .await
            .expect_err("unavailable");

        assert!(matches!(error, InferenceError::ProviderUnavailable(_)));
        assert!(error.to_string().contains("loading"));
    }

    #[tokio::test]
    async fn server_errors_and_empty_results_are_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/broken");
                then.status(500).body("internal");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/empty");
                then.status(200).json_body(json!([]));
            })
            .await;

        let hf = client(&server);
        let mut request = summarization("text");
        request.model = "broken".into();
        let error = hf.summarize(request.clone()).await.expect_err("500");
        assert!(matches!(error, InferenceError::GenerationFailed(_)));

        request.model = "empty".into();
        let error = hf.summarize(request).await.expect_err("empty");
        assert!(matches!(error, InferenceError::InvalidResponse(_)));
    }
}
