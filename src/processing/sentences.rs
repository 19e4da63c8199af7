//! Heuristic sentence splitting.
//!
//! A boundary is a terminal mark (`.`, `!`, `?`) followed by one or more ASCII spaces. The mark
//! stays with the preceding sentence and the spaces are dropped. Newlines are not boundaries.
//! Abbreviations such as "e.g. " split too.

use regex::Regex;
use std::sync::OnceLock;

fn sentence_boundary() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| Regex::new(r"[.!?] +").expect("sentence boundary pattern is valid"))
}

/// Split `text` into trimmed, non-empty sentences in document order.
///
/// Text without terminal punctuation yields a single sentence; blank text yields none.
pub fn split_into_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in sentence_boundary().find_iter(text) {
        // The mark is a single ASCII byte.
        let end = boundary.start() + 1;
        push_trimmed(&mut sentences, &text[start..end]);
        start = boundary.end();
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, piece: &'a str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}
