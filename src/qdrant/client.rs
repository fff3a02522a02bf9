//! Minimal Qdrant REST client.
//!
//! Covers exactly the operations a session needs: collection lifecycle,
//! point upload, and similarity queries. Requests go through plain
//! `reqwest` against the HTTP API, so a mock server can stand in for
//! Qdrant in tests.

use crate::config::get_config;
use crate::qdrant::{
    payload::{build_payload, current_timestamp_rfc3339, generate_point_id},
    types::{CollectionList, PointInsert, QdrantError, QueryResponse, QueryResult, SearchHit},
};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

/// HTTP handle on the Qdrant instance holding the session's vectors.
pub struct QdrantService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl QdrantService {
    /// Build a client from the process configuration.
    pub fn new() -> Result<Self, QdrantError> {
        let config = get_config();
        let client = Client::builder().user_agent("pagechat/0.1").build()?;
        let base_url = normalize_url(&config.qdrant_url).map_err(QdrantError::InvalidUrl)?;

        tracing::debug!(
            url = %base_url,
            authenticated = config
                .qdrant_api_key
                .as_deref()
                .is_some_and(|key| !key.is_empty()),
            "Qdrant client ready"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.qdrant_api_key.clone(),
        })
    }

    /// Create a collection sized for the configured embedding vectors.
    pub async fn create_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> Result<(), QdrantError> {
        let response = self
            .request(Method::PUT, &format!("collections/{collection}"))
            .json(&json!({
                "vectors": {
                    "size": vector_size,
                    "distance": "Cosine"
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error = rejection(response).await;
            tracing::error!(collection, error = %error, "Failed to create collection");
            return Err(error);
        }
        tracing::debug!(collection, vector_size, "Created collection");
        Ok(())
    }

    /// Drop a collection. A collection that is already gone counts as dropped.
    pub async fn delete_collection(&self, collection: &str) -> Result<(), QdrantError> {
        let response = self
            .request(Method::DELETE, &format!("collections/{collection}"))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                tracing::debug!(collection, "Dropped collection");
                Ok(())
            }
            StatusCode::NOT_FOUND => Ok(()),
            _ => {
                let error = rejection(response).await;
                tracing::error!(collection, error = %error, "Failed to drop collection");
                Err(error)
            }
        }
    }

    /// Fetch the names of every collection on the instance.
    pub async fn list_collections(&self) -> Result<Vec<String>, QdrantError> {
        let response = self.request(Method::GET, "collections").send().await?;
        if !response.status().is_success() {
            let error = rejection(response).await;
            tracing::error!(error = %error, "Failed to list collections");
            return Err(error);
        }

        let listing: CollectionList = response.json().await?;
        Ok(listing
            .result
            .collections
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    /// Report whether a collection exists on the instance.
    pub async fn collection_exists(&self, collection: &str) -> Result<bool, QdrantError> {
        let response = self
            .request(Method::GET, &format!("collections/{collection}"))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => {
                let error = rejection(response).await;
                tracing::error!(collection, error = %error, "Failed to look up collection");
                Err(error)
            }
        }
    }

    /// Upload passage vectors into a collection and return how many went in.
    ///
    /// Each point receives a fresh UUID and a payload carrying the document
    /// fingerprint, its zero-based page, the passage text, and a timestamp.
    pub async fn index_points(
        &self,
        collection: &str,
        points: Vec<PointInsert>,
        document_id: &str,
    ) -> Result<usize, QdrantError> {
        if points.is_empty() {
            return Ok(0);
        }

        let stamped_at = current_timestamp_rfc3339();
        let uploads: Vec<Value> = points
            .into_iter()
            .map(|point| {
                json!({
                    "id": generate_point_id(),
                    "vector": point.vector,
                    "payload": build_payload(document_id, point.page, &point.text, &stamped_at),
                })
            })
            .collect();
        let uploaded = uploads.len();

        let response = self
            .request(Method::PUT, &format!("collections/{collection}/points"))
            .query(&[("wait", true)])
            .json(&json!({ "points": uploads }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error = rejection(response).await;
            tracing::error!(collection, error = %error, "Failed to index points");
            return Err(error);
        }
        tracing::debug!(collection, uploaded, "Indexed passage points");
        Ok(uploaded)
    }

    /// Run a similarity query and return the scored hits, best first.
    pub async fn search_points(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, QdrantError> {
        let response = self
            .request(Method::POST, &format!("collections/{collection}/points/query"))
            .json(&json!({
                "query": vector,
                "limit": limit,
                "with_payload": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error = rejection(response).await;
            tracing::error!(collection, error = %error, "Search query failed");
            return Err(error);
        }

        let parsed: QueryResponse = response.json().await?;
        let raw = match parsed.result {
            QueryResult::Bare(hits) => hits,
            QueryResult::Wrapped { points } => points,
        };
        Ok(raw
            .into_iter()
            .map(|hit| SearchHit {
                id: point_id_string(hit.id),
                score: hit.score,
                payload: hit.payload,
            })
            .collect())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut builder = self.client.request(method, url);
        if let Some(key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            builder = builder.header("api-key", key);
        }
        builder
    }
}

/// Consume a failed response into an error carrying status and body.
async fn rejection(response: reqwest::Response) -> QdrantError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    QdrantError::Rejected { status, body }
}

fn normalize_url(raw: &str) -> Result<String, String> {
    let mut url = reqwest::Url::parse(raw).map_err(|error| error.to_string())?;
    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed);
    Ok(url.to_string())
}

// Point ids come back as strings or integers; collections written by this
// crate always use UUID strings.
fn point_id_string(id: Value) -> String {
    match id {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}
