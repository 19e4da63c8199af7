//! Greedy sentence packing under a token budget.
//!
//! Sentences are packed in order into chunks whose summed token counts stay within
//! `max_tokens`. A sentence that alone exceeds the budget is truncated to exactly `max_tokens`
//! tokens and occupies a chunk by itself. Chunks of 20 characters or fewer carry no content
//! worth a model call and are dropped after packing.
//!
//! Token counts come from the configured [`Tokenizer`]; if it fails the packer returns no
//! chunks, which callers read as "no summary possible".

use crate::tokenizer::{Tokenizer, TokenizerError};
use std::borrow::Cow;

/// Chunks with this many characters or fewer (after trimming) are discarded.
pub const MIN_CHUNK_CHARS: usize = 20;

/// Pack `sentences` into chunks of at most `max_tokens` tokens each.
///
/// Sentences inside a chunk are joined with single spaces. Chunk order follows sentence order.
/// Returns an empty vector when the tokenizer is unavailable.
pub fn chunk_sentences<S>(
    sentences: &[S],
    max_tokens: usize,
    tokenizer: &dyn Tokenizer,
) -> Vec<String>
where
    S: AsRef<str>,
{
    match pack_sentences(sentences, max_tokens, tokenizer) {
        Ok(chunks) => chunks,
        Err(error) => {
            tracing::warn!(
                error = %error,
                sentences = sentences.len(),
                "Tokenizer unavailable; no chunks produced"
            );
            Vec::new()
        }
    }
}

fn pack_sentences<S>(
    sentences: &[S],
    max_tokens: usize,
    tokenizer: &dyn Tokenizer,
) -> Result<Vec<String>, TokenizerError>
where
    S: AsRef<str>,
{
    let mut chunks = Vec::new();
    let mut current: Vec<Cow<'_, str>> = Vec::new();
    let mut current_tokens = 0usize;

    for sentence in sentences {
        let sentence = sentence.as_ref();
        let tokens = tokenizer.encode(sentence)?;

        let (sentence, sentence_tokens) = if tokens.len() > max_tokens {
            tracing::debug!(
                tokens = tokens.len(),
                max_tokens,
                "Truncating oversized sentence"
            );
            (
                Cow::Owned(tokenizer.decode_prefix(&tokens, max_tokens)?),
                max_tokens,
            )
        } else {
            (Cow::Borrowed(sentence), tokens.len())
        };

        if current_tokens + sentence_tokens > max_tokens && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_tokens = 0;
        }
        current.push(sentence);
        current_tokens += sentence_tokens;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    let packed = chunks.len();
    chunks.retain(|chunk| chunk.trim().chars().count() > MIN_CHUNK_CHARS);
    if chunks.len() < packed {
        tracing::debug!(
            dropped = packed - chunks.len(),
            kept = chunks.len(),
            "Dropped short chunks"
        );
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::sentences::split_into_sentences;
    use crate::tokenizer::TiktokenTokenizer;
    use crate::tokenizer::testing::{UnavailableTokenizer, WordTokenizer};

    fn words(count: usize, tail: &str) -> String {
        let mut sentence = vec!["word"; count - 1].join(" ");
        sentence.push(' ');
        sentence.push_str(tail);
        sentence
    }

    #[test]
    fn packs_sentences_greedily_in_order() {
        let tokenizer = WordTokenizer::default();
        let sentences = [
            "alpha beta gamma delta.",
            "epsilon zeta eta.",
            "theta iota kappa lambda mu.",
        ];
        let chunks = chunk_sentences(&sentences, 7, &tokenizer);
        assert_eq!(
            chunks,
            vec![
                "alpha beta gamma delta. epsilon zeta eta.",
                "theta iota kappa lambda mu.",
            ]
        );
    }

    #[test]
    fn oversized_sentence_is_truncated_to_budget() {
        let tokenizer = WordTokenizer::default();
        let long = words(12, "end.");
        let sentences = [long.as_str(), "short follow up sentence here."];
        let chunks = chunk_sentences(&sentences, 5, &tokenizer);

        assert_eq!(chunks.len(), 2);
        assert_eq!(tokenizer.count_tokens(&chunks[0]).unwrap(), 5);
        assert_eq!(chunks[0], "word word word word word");
        assert_eq!(chunks[1], "short follow up sentence here.");
    }

    #[test]
    fn every_chunk_respects_the_budget() {
        let tokenizer = WordTokenizer::default();
        let text = (1..=40)
            .map(|index| format!("{} number {index}.", words(index % 7 + 1, "sentence")))
            .collect::<Vec<_>>()
            .join(" ");
        let sentences = split_into_sentences(&text);
        for budget in [3, 5, 8, 13] {
            for chunk in chunk_sentences(&sentences, budget, &tokenizer) {
                assert!(tokenizer.count_tokens(&chunk).unwrap() <= budget);
            }
        }
    }

    #[test]
    fn chunks_preserve_sentence_order() {
        let tokenizer = WordTokenizer::default();
        let text = "The first sentence is here. A second sentence follows it! \
                    Does a third one exist? It does, and a fourth closes the text.";
        let sentences = split_into_sentences(text);
        let chunks = chunk_sentences(&sentences, 9, &tokenizer);
        assert!(chunks.len() > 1);

        let rejoined = chunks.join(" ");
        assert_eq!(split_into_sentences(&rejoined), sentences);
    }

    #[test]
    fn short_chunks_are_discarded_whole() {
        let tokenizer = WordTokenizer::default();
        // 15 characters: dropped.
        assert!(chunk_sentences(&["Short sentence."], 900, &tokenizer).is_empty());
        // 21 characters: kept.
        assert_eq!(
            chunk_sentences(&["Twenty one characters"], 900, &tokenizer),
            vec!["Twenty one characters"]
        );
        // Exactly 20 characters: dropped.
        assert!(chunk_sentences(&["Exactly twenty chars"], 900, &tokenizer).is_empty());
    }

    #[test]
    fn short_sentences_survive_inside_larger_chunks() {
        let tokenizer = WordTokenizer::default();
        let sentences = ["Hi.", "This sentence carries the real content."];
        let chunks = chunk_sentences(&sentences, 100, &tokenizer);
        assert_eq!(chunks, vec!["Hi. This sentence carries the real content."]);
    }

    #[test]
    fn unavailable_tokenizer_yields_no_chunks() {
        let sentences = ["A perfectly reasonable sentence of text."];
        assert!(chunk_sentences(&sentences, 900, &UnavailableTokenizer).is_empty());
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let tokenizer = WordTokenizer::default();
        let sentences: [&str; 0] = [];
        assert!(chunk_sentences(&sentences, 900, &tokenizer).is_empty());
    }

    #[test]
    fn bpe_budget_is_respected_per_sentence() {
        let tokenizer = TiktokenTokenizer::for_model("r50k_base").expect("r50k");
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(30);
        let sentences = split_into_sentences(&text);
        let chunks = chunk_sentences(&sentences, 40, &tokenizer);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            let sentence_tokens: usize = split_into_sentences(chunk)
                .iter()
                .map(|sentence| tokenizer.count_tokens(sentence).unwrap())
                .sum();
            assert!(sentence_tokens <= 40);
        }
    }
}
