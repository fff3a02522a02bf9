//! HTTP surface for Pagechat.
//!
//! This module exposes a compact Axum router serving the chat UI and the
//! session API behind it:
//!
//! - `GET /` – Embedded single-page UI (conversation pane plus PDF viewer).
//! - `POST /document` – Multipart PDF upload; extracts, segments, embeds, and
//!   indexes the document, replacing whatever was loaded before.
//! - `POST /question` – Ask a question about the loaded document. Returns the
//!   answer, the one-based source page, the excerpt window, and the excerpt
//!   itself as base64 PDF bytes.
//! - `GET /session` – Loaded document summary and conversation history.
//! - `DELETE /session` – Drop the document and its collection.
//! - `GET /metrics` – Session counters for diagnostics.
//! - `GET /healthz` – Qdrant reachability probe.
//!
//! Page numbers are one-based everywhere on the wire; zero-based indices stay
//! internal to the pipeline.

use crate::config::get_config;
use crate::metrics::MetricsSnapshot;
use crate::session::{
    AskOutcome, HealthSnapshot, LoadOutcome, SessionApi, SessionError, SessionSnapshot,
};
use crate::ui;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the UI and session API.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SessionApi + 'static,
{
    Router::new()
        .route("/", get(index_page))
        .route("/document", post(upload_document::<S>))
        .route("/question", post(post_question::<S>))
        .route(
            "/session",
            get(get_session::<S>).delete(delete_session::<S>),
        )
        .route("/metrics", get(get_metrics::<S>))
        .route("/healthz", get(get_health::<S>))
        .layer(DefaultBodyLimit::max(get_config().max_upload_bytes))
        .with_state(service)
}

/// Serve the embedded chat page.
async fn index_page() -> Html<&'static str> {
    Html(ui::PAGE)
}

/// Accept a PDF upload and index it for retrieval.
///
/// The upload must be `multipart/form-data` with the PDF bytes in a `file`
/// field; the part's filename becomes the document name. Loading replaces
/// the previously active document and clears the conversation.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<LoadOutcome>, AppError>
where
    S: SessionApi,
{
    let mut upload: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::BadRequest(format!("Malformed upload: {error}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "document.pdf".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|error| AppError::BadRequest(format!("Malformed upload: {error}")))?;
        upload = Some((bytes.to_vec(), name));
        break;
    }

    let (bytes, name) =
        upload.ok_or_else(|| AppError::BadRequest("Upload must include a 'file' field".into()))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let outcome = service.load_document(bytes, name).await?;
    Ok(Json(outcome))
}

/// Request body for the `POST /question` endpoint.
#[derive(Deserialize)]
struct QuestionRequest {
    /// Question to answer against the loaded document.
    question: String,
}

/// Answer a question against the loaded document.
async fn post_question<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<AskOutcome>, AppError>
where
    S: SessionApi,
{
    let outcome = service.ask(request.question).await?;
    Ok(Json(outcome))
}

/// Report the loaded document and conversation history.
async fn get_session<S>(State(service): State<Arc<S>>) -> Json<SessionSnapshot>
where
    S: SessionApi,
{
    Json(service.snapshot().await)
}

/// Drop the loaded document and its collection.
async fn delete_session<S>(State(service): State<Arc<S>>) -> Result<StatusCode, AppError>
where
    S: SessionApi,
{
    service.reset().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Return the session counters snapshot.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: SessionApi,
{
    Json(service.metrics_snapshot())
}

/// Probe the vector store and report reachability.
async fn get_health<S>(State(service): State<Arc<S>>) -> Json<HealthSnapshot>
where
    S: SessionApi,
{
    Json(service.health().await)
}

enum AppError {
    BadRequest(String),
    Session(SessionError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Session(error) => (session_status(&error), error.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(inner: SessionError) -> Self {
        Self::Session(inner)
    }
}

fn session_status(error: &SessionError) -> StatusCode {
    match error {
        SessionError::NoDocument => StatusCode::CONFLICT,
        SessionError::BlankQuestion => StatusCode::BAD_REQUEST,
        SessionError::EmptyDocument | SessionError::Pdf(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::NoMatches => StatusCode::NOT_FOUND,
        SessionError::Embedding(_) | SessionError::Chat(_) | SessionError::Qdrant(_) => {
            StatusCode::BAD_GATEWAY
        }
        SessionError::DimensionMismatch { .. } | SessionError::Passages(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
