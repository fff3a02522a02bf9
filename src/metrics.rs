use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing session activity.
#[derive(Default)]
pub struct SessionMetrics {
    documents_indexed: AtomicU64,
    passages_indexed: AtomicU64,
    questions_answered: AtomicU64,
}

impl SessionMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an indexed document and the number of passages produced for it.
    pub fn record_document(&self, passage_count: u64) {
        self.documents_indexed.fetch_add(1, Ordering::Relaxed);
        self.passages_indexed
            .fetch_add(passage_count, Ordering::Relaxed);
    }

    /// Record an answered question.
    pub fn record_question(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            passages_indexed: self.passages_indexed.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of session counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents that have been indexed since startup.
    pub documents_indexed: u64,
    /// Total passage count produced across all indexed documents.
    pub passages_indexed: u64,
    /// Number of questions answered since startup.
    pub questions_answered: u64,
}
