//! Core data types and error definitions for the session pipeline.

use crate::pdf::PdfError;
use anyhow::Error as TokenizerError;
use serde::Serialize;
use thiserror::Error;

/// Errors produced while segmenting pages into indexable passages.
#[derive(Debug, Error)]
pub enum PassageError {
    /// Segmentation configured an impossible token budget.
    #[error("passage token budget must be greater than zero")]
    InvalidBudget,
    /// Tokenizer resources were unavailable for the configured model.
    #[error("failed to initialize tokenizer for model '{model}': {source}")]
    Tokenizer {
        /// Embedding model we attempted to load.
        model: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Errors emitted by the conversational session pipeline.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No document has been loaded into the session yet.
    #[error("No document is loaded; upload a PDF first")]
    NoDocument,
    /// The uploaded document contains no extractable text on any page.
    #[error("The document contains no extractable text")]
    EmptyDocument,
    /// The submitted question was blank.
    #[error("The question is empty")]
    BlankQuestion,
    /// Retrieval produced no passages to answer from.
    #[error("No indexed passages matched the question")]
    NoMatches,
    /// Returned embedding dimension does not match configuration.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension configured on the server.
        expected: usize,
        /// Actual embedding dimension produced by the provider.
        actual: usize,
    },
    /// PDF parsing or excerpt writing failed.
    #[error("PDF handling failed: {0}")]
    Pdf(#[from] PdfError),
    /// Page segmentation failed.
    #[error("Failed to segment document: {0}")]
    Passages(#[from] PassageError),
    /// Embedding provider failed to produce vectors.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingClientError),
    /// Chat provider failed to produce a completion.
    #[error("Failed to generate answer: {0}")]
    Chat(#[from] crate::chat::ChatClientError),
    /// Qdrant interaction failed.
    #[error("Qdrant request failed: {0}")]
    Qdrant(#[from] crate::qdrant::QdrantError),
}

/// One passage of one page, ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePassage {
    /// Zero-based page the passage was read from.
    pub page: usize,
    /// Passage text.
    pub text: String,
}

/// One completed question/answer exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    /// Question exactly as the user asked it.
    pub question: String,
    /// Answer produced by the chat model.
    pub answer: String,
    /// One-based page the answer was grounded on.
    pub source_page: usize,
}

/// Summary of a completed document load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    /// SHA-256 fingerprint of the document bytes.
    pub document_id: String,
    /// Display name taken from the uploaded file.
    pub name: String,
    /// Total number of pages in the document.
    pub page_count: usize,
    /// Number of passages indexed for retrieval.
    pub passages_indexed: usize,
    /// Pages skipped because they contained no extractable text.
    pub skipped_pages: usize,
}

/// One-based inclusive page range of an excerpt within the original document.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnswerWindow {
    /// First page of the excerpt.
    pub first_page: usize,
    /// Last page of the excerpt.
    pub last_page: usize,
}

/// Answer to a question, with the excerpt shown beside it.
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    /// Answer produced by the chat model.
    pub answer: String,
    /// One-based page of the top-ranked passage.
    pub source_page: usize,
    /// Pages covered by the excerpt.
    pub window: AnswerWindow,
    /// One-based position of the source page inside the excerpt, for the
    /// viewer's `#page=` anchor.
    pub focus_page: usize,
    /// Excerpt PDF encoded as standard base64.
    pub excerpt_base64: String,
    /// Number of pages in the excerpt.
    pub excerpt_pages: usize,
    /// Number of completed turns in the conversation so far.
    pub turns: usize,
}

/// Summary of the currently loaded document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    /// SHA-256 fingerprint of the document bytes.
    pub document_id: String,
    /// Display name taken from the uploaded file.
    pub name: String,
    /// Total number of pages in the document.
    pub page_count: usize,
    /// Number of passages indexed for retrieval.
    pub passages_indexed: usize,
    /// When the document was indexed, RFC3339.
    pub loaded_at: String,
}

/// Point-in-time view of the session, used to redraw the page on reload.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Loaded document, when one is present.
    pub document: Option<DocumentSummary>,
    /// Completed conversation turns, oldest first.
    pub history: Vec<ChatTurn>,
}

/// Reachability and readiness snapshot for the vector store.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    /// Indicates whether the Qdrant HTTP endpoint responded successfully.
    pub qdrant_reachable: bool,
    /// Whether the active document's collection is currently present.
    pub collection_present: bool,
    /// Optional diagnostic string captured when Qdrant is unreachable.
    pub error: Option<String>,
}
