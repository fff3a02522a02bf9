#![deny(missing_docs)]

//! Core library for the Pagechat PDF question-answering server.

/// HTTP routing and REST handlers.
pub mod api;
/// Chat completion client abstraction and adapters.
pub mod chat;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Structured logging and tracing setup.
pub mod logging;
/// Session metrics helpers.
pub mod metrics;
/// PDF text extraction and page-range excerpts.
pub mod pdf;
/// Qdrant vector store integration.
pub mod qdrant;
/// Document session pipeline: segmentation, retrieval, and answering.
pub mod session;
/// Embedded browser UI.
pub mod ui;
