//! Session service coordinating document loading, retrieval, and answering.

use crate::{
    chat::{ChatClient, get_chat_client},
    config::get_config,
    embedding::{EmbeddingClient, EmbeddingClientError, get_embedding_client},
    metrics::{MetricsSnapshot, SessionMetrics},
    pdf,
    qdrant::{
        PointInsert, QdrantService, RetrievedPassage, compute_document_id,
        payload::current_timestamp_rfc3339,
    },
    session::{
        passages::{determine_token_budget, split_pages},
        prompts,
        types::{
            AnswerWindow, AskOutcome, ChatTurn, DocumentSummary, HealthSnapshot, LoadOutcome,
            SessionError, SessionSnapshot,
        },
    },
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// The document currently loaded into the session, together with the
/// conversation built on top of it.
struct ActiveDocument {
    document_id: String,
    name: String,
    collection: String,
    bytes: Vec<u8>,
    page_count: usize,
    passages_indexed: usize,
    history: Vec<ChatTurn>,
    loaded_at: String,
}

/// Coordinates the full pipeline: page extraction, segmentation, embedding,
/// Qdrant writes, retrieval, answering, and excerpt construction.
///
/// The service owns long-lived handles to the provider clients, the Qdrant
/// transport, and the metrics registry. One document is active at a time;
/// the session lock serializes loads and questions. Construct the service
/// once near process start and share it through an `Arc`.
pub struct SessionService {
    embedding_client: Box<dyn EmbeddingClient>,
    chat_client: Box<dyn ChatClient>,
    qdrant_service: QdrantService,
    metrics: Arc<SessionMetrics>,
    document: Mutex<Option<ActiveDocument>>,
}

/// Abstraction over the session pipeline used by the HTTP surface.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Extract, segment, embed, and index an uploaded PDF, replacing any
    /// previously loaded document.
    async fn load_document(
        &self,
        bytes: Vec<u8>,
        name: String,
    ) -> Result<LoadOutcome, SessionError>;

    /// Answer a question about the loaded document.
    async fn ask(&self, question: String) -> Result<AskOutcome, SessionError>;

    /// Return the loaded document summary and conversation history.
    async fn snapshot(&self) -> SessionSnapshot;

    /// Drop the loaded document and its collection.
    async fn reset(&self) -> Result<(), SessionError>;

    /// Probe the vector store for a lightweight health snapshot.
    async fn health(&self) -> HealthSnapshot;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SessionService {
    /// Build a new session service from the process configuration.
    pub fn new() -> Result<Self, SessionError> {
        tracing::info!("Initializing provider clients");
        let embedding_client = get_embedding_client()?;
        let chat_client = get_chat_client()?;
        let qdrant_service = QdrantService::new()?;

        Ok(Self {
            embedding_client,
            chat_client,
            qdrant_service,
            metrics: Arc::new(SessionMetrics::new()),
            document: Mutex::new(None),
        })
    }

    /// Extract, segment, embed, and index a document.
    ///
    /// Loading replaces the active document: the previous collection is
    /// dropped and the conversation starts over.
    pub async fn load_document(
        &self,
        bytes: Vec<u8>,
        name: String,
    ) -> Result<LoadOutcome, SessionError> {
        let config = get_config();
        tracing::info!(name = %name, bytes = bytes.len(), "Loading document");

        let mut guard = self.document.lock().await;

        let pages = pdf::extract_pages(&bytes)?;
        let page_count = pages.len();
        let skipped_pages = pages.iter().filter(|page| page.trim().is_empty()).count();
        if page_count == 0 || skipped_pages == page_count {
            return Err(SessionError::EmptyDocument);
        }

        let token_budget = determine_token_budget(
            config.passage_token_budget,
            config.embedding_provider,
            &config.embedding_model,
        );
        tracing::debug!(
            token_budget,
            provider = ?config.embedding_provider,
            model = %config.embedding_model,
            "Derived passage token budget"
        );
        let passages = split_pages(
            &pages,
            token_budget,
            config.embedding_provider,
            &config.embedding_model,
        )?;

        let texts: Vec<String> = passages.iter().map(|passage| passage.text.clone()).collect();
        let embeddings = self.embedding_client.generate_embeddings(texts).await?;

        let expected = config.embedding_dimension;
        if let Some(actual) = embeddings
            .iter()
            .map(|vector| vector.len())
            .find(|len| *len != expected)
        {
            return Err(SessionError::DimensionMismatch { expected, actual });
        }

        let document_id = compute_document_id(&bytes);
        let collection = format!("{}-{}", config.qdrant_collection_prefix, Uuid::new_v4());

        if let Some(previous) = guard.as_ref().map(|doc| doc.collection.clone()) {
            tracing::debug!(collection = %previous, "Dropping previous session collection");
            self.qdrant_service.delete_collection(&previous).await?;
        }

        self.qdrant_service
            .create_collection(&collection, expected as u64)
            .await?;

        let points: Vec<PointInsert> = passages
            .into_iter()
            .zip(embeddings)
            .map(|(passage, vector)| PointInsert {
                page: passage.page,
                text: passage.text,
                vector,
            })
            .collect();
        let passages_indexed = self
            .qdrant_service
            .index_points(&collection, points, &document_id)
            .await?;

        *guard = Some(ActiveDocument {
            document_id: document_id.clone(),
            name: name.clone(),
            collection,
            bytes,
            page_count,
            passages_indexed,
            history: Vec::new(),
            loaded_at: current_timestamp_rfc3339(),
        });
        drop(guard);

        self.metrics.record_document(passages_indexed as u64);
        tracing::info!(
            document = %document_id,
            pages = page_count,
            passages = passages_indexed,
            skipped_pages,
            "Document indexed"
        );

        Ok(LoadOutcome {
            document_id,
            name,
            page_count,
            passages_indexed,
            skipped_pages,
        })
    }

    /// Answer a question about the loaded document.
    ///
    /// Follow-ups are condensed into a standalone question against the
    /// transcript before retrieval; the answer prompt sees only the retrieved
    /// passages and the standalone question. The transcript records the
    /// question as the user asked it.
    pub async fn ask(&self, question: String) -> Result<AskOutcome, SessionError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(SessionError::BlankQuestion);
        }

        let config = get_config();
        let mut guard = self.document.lock().await;
        let document = guard.as_mut().ok_or(SessionError::NoDocument)?;

        let standalone = if document.history.is_empty() {
            trimmed.to_string()
        } else {
            let condense = prompts::condense_question_messages(&document.history, trimmed);
            match self.chat_client.complete(condense).await {
                Ok(condensed) if !condensed.trim().is_empty() => condensed.trim().to_string(),
                Ok(_) => trimmed.to_string(),
                Err(error) => {
                    tracing::warn!(error = %error, "Question condensation failed; using the raw question");
                    trimmed.to_string()
                }
            }
        };

        let mut vectors = self
            .embedding_client
            .generate_embeddings(vec![standalone.clone()])
            .await?;
        let vector = vectors.pop().ok_or_else(|| {
            SessionError::Embedding(EmbeddingClientError::InvalidResponse(
                "no vector returned for the question".into(),
            ))
        })?;
        let expected = config.embedding_dimension;
        if vector.len() != expected {
            return Err(SessionError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let hits = self
            .qdrant_service
            .search_points(&document.collection, vector, config.retrieval_top_k)
            .await?;
        let passages: Vec<RetrievedPassage> = hits
            .iter()
            .filter_map(|hit| hit.payload.as_ref().and_then(RetrievedPassage::from_payload))
            .collect();
        if passages.is_empty() {
            return Err(SessionError::NoMatches);
        }

        let answer = self
            .chat_client
            .complete(prompts::answer_messages(&passages, &standalone))
            .await?;

        let source_page = passages[0].page;
        let window = pdf::page_window(source_page, document.page_count);
        let excerpt = pdf::extract_page_range(&document.bytes, window)?;
        let excerpt_base64 = general_purpose::STANDARD.encode(&excerpt);

        document.history.push(ChatTurn {
            question: trimmed.to_string(),
            answer: answer.clone(),
            source_page: source_page + 1,
        });
        let turns = document.history.len();
        drop(guard);

        self.metrics.record_question();
        tracing::info!(
            source_page = source_page + 1,
            window_start = window.start + 1,
            window_end = window.end + 1,
            turns,
            "Question answered"
        );

        Ok(AskOutcome {
            answer,
            source_page: source_page + 1,
            window: AnswerWindow {
                first_page: window.start + 1,
                last_page: window.end + 1,
            },
            focus_page: window.focus_page(source_page),
            excerpt_base64,
            excerpt_pages: window.page_count(),
            turns,
        })
    }

    /// Return the loaded document summary and conversation history.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let guard = self.document.lock().await;
        match guard.as_ref() {
            Some(doc) => SessionSnapshot {
                document: Some(DocumentSummary {
                    document_id: doc.document_id.clone(),
                    name: doc.name.clone(),
                    page_count: doc.page_count,
                    passages_indexed: doc.passages_indexed,
                    loaded_at: doc.loaded_at.clone(),
                }),
                history: doc.history.clone(),
            },
            None => SessionSnapshot {
                document: None,
                history: Vec::new(),
            },
        }
    }

    /// Drop the loaded document and its collection.
    pub async fn reset(&self) -> Result<(), SessionError> {
        let mut guard = self.document.lock().await;
        if let Some(collection) = guard.as_ref().map(|doc| doc.collection.clone()) {
            self.qdrant_service.delete_collection(&collection).await?;
            *guard = None;
            tracing::info!("Session reset");
        }
        Ok(())
    }

    /// Probe Qdrant to surface a lightweight health snapshot.
    pub async fn health(&self) -> HealthSnapshot {
        let active = {
            let guard = self.document.lock().await;
            guard.as_ref().map(|doc| doc.collection.clone())
        };

        let probe = match active {
            Some(collection) => self.qdrant_service.collection_exists(&collection).await,
            None => self.qdrant_service.list_collections().await.map(|_| false),
        };

        match probe {
            Ok(collection_present) => HealthSnapshot {
                qdrant_reachable: true,
                collection_present,
                error: None,
            },
            Err(error) => {
                tracing::warn!(error = %error, "Qdrant health probe failed");
                HealthSnapshot {
                    qdrant_reachable: false,
                    collection_present: false,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    /// Return the current session metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl SessionApi for SessionService {
    async fn load_document(
        &self,
        bytes: Vec<u8>,
        name: String,
    ) -> Result<LoadOutcome, SessionError> {
        SessionService::load_document(self, bytes, name).await
    }

    async fn ask(&self, question: String) -> Result<AskOutcome, SessionError> {
        SessionService::ask(self, question).await
    }

    async fn snapshot(&self) -> SessionSnapshot {
        SessionService::snapshot(self).await
    }

    async fn reset(&self) -> Result<(), SessionError> {
        SessionService::reset(self).await
    }

    async fn health(&self) -> HealthSnapshot {
        SessionService::health(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SessionService::metrics_snapshot(self)
    }
}
