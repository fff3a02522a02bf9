//! Wire types for the Qdrant REST surface.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by the Qdrant transport.
#[derive(Debug, Error)]
pub enum QdrantError {
    /// The configured base URL could not be parsed.
    #[error("Invalid Qdrant base URL: {0}")]
    InvalidUrl(String),
    /// The request failed before a response arrived.
    #[error("Qdrant transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Qdrant answered with a non-success status.
    #[error("Qdrant returned {status}: {body}")]
    Rejected {
        /// Status code of the failed response.
        status: StatusCode,
        /// Response body, when one was readable.
        body: String,
    },
}

/// One passage queued for indexing.
#[derive(Debug, Clone)]
pub struct PointInsert {
    /// Zero-based page the passage was read from.
    pub page: usize,
    /// Passage text stored alongside the vector.
    pub text: String,
    /// Vector the embedding provider produced for the text.
    pub vector: Vec<f32>,
}

/// One similarity match returned by a query.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Point id as a string, however Qdrant encoded it.
    pub id: String,
    /// Cosine similarity score.
    pub score: f32,
    /// Stored payload, when the point carries one.
    pub payload: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub(crate) struct CollectionList {
    pub(crate) result: CollectionListing,
}

#[derive(Deserialize)]
pub(crate) struct CollectionListing {
    pub(crate) collections: Vec<NamedCollection>,
}

#[derive(Deserialize)]
pub(crate) struct NamedCollection {
    pub(crate) name: String,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    pub(crate) result: QueryResult,
}

// Query results arrive either as a bare array or wrapped in an object,
// depending on the Qdrant version.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum QueryResult {
    Bare(Vec<RawHit>),
    Wrapped {
        #[serde(default)]
        points: Vec<RawHit>,
    },
}

#[derive(Deserialize)]
pub(crate) struct RawHit {
    pub(crate) id: Value,
    pub(crate) score: f32,
    #[serde(default)]
    pub(crate) payload: Option<Map<String, Value>>,
}
