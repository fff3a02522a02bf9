//! Qdrant vector store integration.

pub mod client;
pub mod payload;
pub mod types;

pub use client::QdrantService;
pub use payload::{RetrievedPassage, compute_document_id};
pub use types::{PointInsert, QdrantError, SearchHit};
