//! Question answering, comprehension questions, and answer evaluation.
//!
//! Each operation assembles a prompt for a text generation model. Document text is cut to a
//! fixed character budget before prompting so requests stay within small model windows.

use crate::inference::{GenerationRequest, InferenceError, TextGenerationModel};

const ANSWER_CONTEXT_CHARS: usize = 1000;
const ANSWER_MAX_LENGTH: usize = 256;
const ANSWER_TEMPERATURE: f32 = 0.7;

/// Default number of comprehension questions.
pub const DEFAULT_QUESTION_COUNT: usize = 5;
const QUESTION_CONTEXT_CHARS: usize = 800;
const QUESTION_MAX_LENGTH: usize = 512;
const QUESTION_TEMPERATURE: f32 = 0.8;
const MIN_QUESTION_CHARS: usize = 10;
const QUESTION_DECORATION: &[char] = &[
    '-', '•', '.', ' ', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

const EVALUATION_CONTEXT_CHARS: usize = 2500;
const EVALUATION_MAX_LENGTH: usize = 512;

const REFERENCE_PREFIX_CHARS: usize = 20;

/// Answer `question` from `context`.
pub async fn ask_question(
    model: &dyn TextGenerationModel,
    model_name: &str,
    context: &str,
    question: &str,
) -> Result<String, InferenceError> {
    let context = truncate_with_ellipsis(context, ANSWER_CONTEXT_CHARS);
    let prompt = format!("Context: {context}\n\nQuestion: {question}\n\nAnswer:");
    model
        .generate(GenerationRequest {
            model: model_name.to_string(),
            prompt,
            max_length: ANSWER_MAX_LENGTH,
            temperature: ANSWER_TEMPERATURE,
            do_sample: true,
        })
        .await
}

/// Generate up to `count` comprehension questions about `text`.
pub async fn generate_logic_questions(
    model: &dyn TextGenerationModel,
    model_name: &str,
    text: &str,
    count: usize,
) -> Result<Vec<String>, InferenceError> {
    let text = truncate_with_ellipsis(text, QUESTION_CONTEXT_CHARS);
    let prompt = format!(
        "Generate {count} comprehension questions from the following text:\n\n{text}\n\nQuestions:"
    );
    let output = model
        .generate(GenerationRequest {
            model: model_name.to_string(),
            prompt,
            max_length: QUESTION_MAX_LENGTH,
            temperature: QUESTION_TEMPERATURE,
            do_sample: true,
        })
        .await?;
    Ok(parse_questions(&output, count))
}

/// Ask the model to grade `user_answer` against the document.
pub async fn evaluate_answer(
    model: &dyn TextGenerationModel,
    model_name: &str,
    question: &str,
    user_answer: &str,
    document_text: &str,
) -> Result<String, InferenceError> {
    let excerpt = take_chars(document_text, EVALUATION_CONTEXT_CHARS);
    let prompt = format!(
        "Evaluate the following user response.\n\n\
         Question: {question}\n\
         User Answer: {user_answer}\n\n\
         Refer to this document content:\n{excerpt}\n\n\
         Give feedback about correctness and justification with paragraph reference if possible.\n"
    );
    model
        .generate(GenerationRequest {
            model: model_name.to_string(),
            prompt,
            max_length: EVALUATION_MAX_LENGTH,
            temperature: 0.0,
            do_sample: false,
        })
        .await
}

/// Locate the 1-based paragraph of `text` that contains the start of `answer`.
///
/// Paragraphs are separated by blank lines; matching uses the first 20 characters of the
/// trimmed answer.
pub fn extract_paragraph_reference(text: &str, answer: &str) -> Option<usize> {
    let needle = take_chars(answer.trim(), REFERENCE_PREFIX_CHARS);
    text.split("\n\n")
        .position(|paragraph| paragraph.contains(needle))
        .map(|index| index + 1)
}

/// Split model output into cleaned questions, keeping at most `count`.
pub(crate) fn parse_questions(output: &str, count: usize) -> Vec<String> {
    output
        .split('\n')
        .map(|line| line.trim_matches(QUESTION_DECORATION))
        .filter(|line| line.chars().count() > MIN_QUESTION_CHARS)
        .take(count)
        .map(str::to_string)
        .collect()
}

fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let head = take_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingModel {
        reply: String,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl RecordingModel {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> GenerationRequest {
            self.requests
                .lock()
                .expect("requests lock")
                .last()
                .cloned()
                .expect("a request was made")
        }
    }

    #[async_trait]
    impl TextGenerationModel for RecordingModel {
        async fn generate(&self, request: GenerationRequest) -> Result<String, InferenceError> {
            self.requests.lock().expect("requests lock").push(request);
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn ask_question_truncates_long_context() {
        let model = RecordingModel::replying("Forty-two");
        let context = "x".repeat(1500);
        let answer = ask_question(&model, "flan", &context, "What is it?")
            .await
            .expect("answer");

        assert_eq!(answer, "Forty-two");
        let request = model.last_request();
        let expected_context = format!("{}...", "x".repeat(1000));
        assert_eq!(
            request.prompt,
            format!("Context: {expected_context}\n\nQuestion: What is it?\n\nAnswer:")
        );
        assert_eq!(request.max_length, 256);
        assert!(request.do_sample);
    }

    #[tokio::test]
    async fn ask_question_keeps_short_context_intact() {
        let model = RecordingModel::replying("Yes");
        ask_question(&model, "flan", "Short context.", "Is it short?")
            .await
            .expect("answer");
        assert!(model.last_request().prompt.starts_with("Context: Short context.\n\n"));
    }

    #[tokio::test]
    async fn logic_questions_are_cleaned_and_capped() {
        let model = RecordingModel::replying(
            "1. What causes ocean tides to rise?\n\
             - Why?\n\
             2) How does the moon influence tides?\n\
             • What role does the sun play in tides?\n\
             \n\
             3. When are spring tides strongest?",
        );
        let questions = generate_logic_questions(&model, "flan", "Tides text.", 3)
            .await
            .expect("questions");

        assert_eq!(
            questions,
            vec![
                "What causes ocean tides to rise?",
                ") How does the moon influence tides?",
                "What role does the sun play in tides?",
            ]
        );
        let request = model.last_request();
        assert!(request.prompt.starts_with("Generate 3 comprehension questions"));
        assert_eq!(request.max_length, 512);
    }

    #[tokio::test]
    async fn evaluation_uses_document_excerpt_deterministically() {
        let model = RecordingModel::replying("Correct, see paragraph 1.");
        let document = "d".repeat(3000);
        let feedback = evaluate_answer(&model, "judge", "Q?", "A.", &document)
            .await
            .expect("feedback");

        assert_eq!(feedback, "Correct, see paragraph 1.");
        let request = model.last_request();
        assert_eq!(request.model, "judge");
        assert!(request.prompt.contains(&"d".repeat(2500)));
        assert!(!request.prompt.contains(&"d".repeat(2501)));
        assert!(!request.do_sample);
    }

    #[test]
    fn paragraph_reference_matches_answer_prefix() {
        let text = "Intro paragraph.\n\nThe mitochondria is the powerhouse of the cell.\n\nOutro.";
        assert_eq!(
            extract_paragraph_reference(text, "  The mitochondria is the powerhouse, I think"),
            Some(2)
        );
        assert_eq!(extract_paragraph_reference(text, "Something unrelated"), None);
    }

    #[test]
    fn character_budgets_respect_multibyte_text() {
        let text = "é".repeat(5);
        assert_eq!(truncate_with_ellipsis(&text, 3), "ééé...");
        assert_eq!(truncate_with_ellipsis(&text, 5), text);
        assert_eq!(take_chars("abc", 10), "abc");
    }
}
