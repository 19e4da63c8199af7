use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization and question answering activity.
#[derive(Default)]
pub struct AssistantMetrics {
    documents_summarized: AtomicU64,
    chunks_summarized: AtomicU64,
    chunk_failures: AtomicU64,
    final_pass_fallbacks: AtomicU64,
    questions_answered: AtomicU64,
}

impl AssistantMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summarized document with its chunk and failure counts.
    pub fn record_summary(&self, chunk_count: u64, failed_chunks: u64, used_fallback: bool) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized.fetch_add(chunk_count, Ordering::Relaxed);
        self.chunk_failures.fetch_add(failed_chunks, Ordering::Relaxed);
        if used_fallback {
            self.final_pass_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an answered question.
    pub fn record_answer(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            chunk_failures: self.chunk_failures.load(Ordering::Relaxed),
            final_pass_fallbacks: self.final_pass_fallbacks.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents summarized since startup.
    pub documents_summarized: u64,
    /// Total chunks sent to the summarization model.
    pub chunks_summarized: u64,
    /// Chunk summaries that failed and were dropped.
    pub chunk_failures: u64,
    /// Second-pass failures answered with concatenated chunk summaries.
    pub final_pass_fallbacks: u64,
    /// Number of free-text questions answered.
    pub questions_answered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_summaries_and_failures() {
        let metrics = AssistantMetrics::new();
        metrics.record_summary(3, 1, false);
        metrics.record_summary(2, 0, true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_summarized, 2);
        assert_eq!(snapshot.chunks_summarized, 5);
        assert_eq!(snapshot.chunk_failures, 1);
        assert_eq!(snapshot.final_pass_fallbacks, 1);
    }

    #[test]
    fn records_answers() {
        let metrics = AssistantMetrics::new();
        metrics.record_answer();
        metrics.record_answer();
        assert_eq!(metrics.snapshot().questions_answered, 2);
    }

    #[test]
    fn snapshot_starts_empty() {
        let snapshot = AssistantMetrics::new().snapshot();
        assert_eq!(snapshot.documents_summarized, 0);
        assert_eq!(snapshot.chunks_summarized, 0);
        assert_eq!(snapshot.questions_answered, 0);
    }
}
