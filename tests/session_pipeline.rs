//! End-to-end pipeline test: a generated PDF goes in, an excerpt comes out.
//!
//! One mock server stands in for both Qdrant and Ollama; the paths the two
//! services use do not overlap. Each test builds its own `SessionService`,
//! so sessions never share state even though the mocks are shared.

use base64::{Engine as _, engine::general_purpose};
use httpmock::{Method::DELETE, Method::GET, Method::POST, Method::PUT, Mock, MockServer};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pagechat::{
    config, logging,
    session::{SessionError, SessionService},
};
use regex::Regex;
use serde_json::json;
use tokio::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::const_new();
static MOCK_HANDLES: OnceCell<Vec<Mock<'static>>> = OnceCell::const_new();

fn set_env(key: &str, value: &str) {
    // SAFETY: Tests run in a single process and establish deterministic configuration upfront.
    unsafe { std::env::set_var(key, value) }
}

async fn setup() {
    INIT.get_or_init(|| async {
        let server: &'static MockServer = Box::leak(Box::new(MockServer::start_async().await));
        let base_url = server.base_url();

        set_env("QDRANT_URL", &base_url);
        set_env("QDRANT_COLLECTION_PREFIX", "pagechat-int");
        set_env("EMBEDDING_PROVIDER", "ollama");
        set_env("EMBEDDING_MODEL", "nomic-embed-text");
        set_env("EMBEDDING_DIMENSION", "4");
        set_env("CHAT_PROVIDER", "ollama");
        set_env("CHAT_MODEL", "answer-model");
        set_env("OLLAMA_URL", &base_url);
        set_env("RETRIEVAL_TOP_K", "2");

        MOCK_HANDLES.set(register_mocks(server).await).ok();

        config::init_config();
        logging::init_tracing();
    })
    .await;
}

async fn register_mocks(server: &'static MockServer) -> Vec<Mock<'static>> {
    let collection = Regex::new(r"^/collections/pagechat-int-[0-9a-f-]+$").unwrap();
    let points = Regex::new(r"^/collections/pagechat-int-[0-9a-f-]+/points$").unwrap();
    let query = Regex::new(r"^/collections/pagechat-int-[0-9a-f-]+/points/query$").unwrap();

    vec![
        // Ollama: every embedding request in these tests carries one text.
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/embed");
                then.status(200).json_body(json!({
                    "model": "nomic-embed-text",
                    "embeddings": [[0.1, 0.2, 0.3, 0.4]]
                }));
            })
            .await,
        // Ollama: condensing a follow-up into a standalone question.
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat")
                    .body_contains("Follow-up question:");
                then.status(200).json_body(json!({
                    "model": "answer-model",
                    "message": {
                        "role": "assistant",
                        "content": "When are refunds issued?"
                    },
                    "done": true
                }));
            })
            .await,
        // Ollama: answering from retrieved page context.
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat").body_contains("[Page ");
                then.status(200).json_body(json!({
                    "model": "answer-model",
                    "message": {
                        "role": "assistant",
                        "content": "Refunds are issued within ten business days."
                    },
                    "done": true
                }));
            })
            .await,
        // Qdrant: collection creation with the configured vector size.
        server
            .mock_async({
                let collection = collection.clone();
                move |when, then| {
                    when.method(PUT)
                        .path_matches(collection.clone())
                        .json_body_partial(
                            r#"{"vectors": {"size": 4, "distance": "Cosine"}}"#,
                        );
                    then.status(200).json_body(json!({
                        "status": "ok",
                        "time": 0.0,
                        "result": true
                    }));
                }
            })
            .await,
        // Qdrant: point upload.
        server
            .mock_async({
                let points = points.clone();
                move |when, then| {
                    when.method(PUT)
                        .path_matches(points.clone())
                        .query_param("wait", "true");
                    then.status(200).json_body(json!({
                        "status": "ok",
                        "time": 0.0,
                        "result": { "operation_id": 0, "status": "completed" }
                    }));
                }
            })
            .await,
        // Qdrant: similarity query returning two passages from page six.
        server
            .mock_async({
                let query = query.clone();
                move |when, then| {
                    when.method(POST).path_matches(query.clone());
                    then.status(200).json_body(json!({
                        "status": "ok",
                        "time": 0.0,
                        "result": {
                            "points": [
                                {
                                    "id": "5d1f0d7c-0000-4000-8000-000000000001",
                                    "score": 0.87,
                                    "payload": {
                                        "document_id": "fixture",
                                        "page": 5,
                                        "text": "Refunds are issued within ten business days of a filed claim.",
                                        "indexed_at": "2025-01-01T00:00:00Z"
                                    }
                                },
                                {
                                    "id": "5d1f0d7c-0000-4000-8000-000000000002",
                                    "score": 0.55,
                                    "payload": {
                                        "document_id": "fixture",
                                        "page": 5,
                                        "text": "Claims must be filed in writing.",
                                        "indexed_at": "2025-01-01T00:00:00Z"
                                    }
                                }
                            ]
                        }
                    }));
                }
            })
            .await,
        // Qdrant: collection presence probe.
        server
            .mock_async({
                let collection = collection.clone();
                move |when, then| {
                    when.method(GET).path_matches(collection.clone());
                    then.status(200).json_body(json!({
                        "status": "ok",
                        "time": 0.0,
                        "result": { "status": "green" }
                    }));
                }
            })
            .await,
        // Qdrant: collection listing for the idle health probe.
        server
            .mock_async(|when, then| {
                when.method(GET).path("/collections");
                then.status(200).json_body(json!({
                    "status": "ok",
                    "time": 0.0,
                    "result": { "collections": [] }
                }));
            })
            .await,
        // Qdrant: collection drop.
        server
            .mock_async({
                let collection = collection.clone();
                move |when, then| {
                    when.method(DELETE).path_matches(collection.clone());
                    then.status(200).json_body(json!({
                        "status": "ok",
                        "time": 0.0,
                        "result": true
                    }));
                }
            })
            .await,
    ]
}

/// Build an uncompressed PDF with one line of text per page.
fn sample_pdf(page_texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_texts.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize test PDF");
    bytes
}

#[tokio::test]
async fn answers_question_and_builds_source_excerpt() {
    setup().await;
    let service = SessionService::new().expect("session service");

    // Nine pages; only page six carries text, so every embed request
    // in this test holds exactly one input.
    let mut pages = vec![" "; 9];
    pages[5] = "Refunds are issued within ten business days of a filed claim.";
    let bytes = sample_pdf(&pages);

    let loaded = service
        .load_document(bytes, "handbook.pdf".into())
        .await
        .expect("document loads");
    assert_eq!(loaded.name, "handbook.pdf");
    assert_eq!(loaded.page_count, 9);
    assert_eq!(loaded.passages_indexed, 1);
    assert_eq!(loaded.skipped_pages, 8);
    assert_eq!(loaded.document_id.len(), 64);

    let first = service
        .ask("What does the handbook say about refunds?".into())
        .await
        .expect("first answer");
    assert_eq!(first.answer, "Refunds are issued within ten business days.");
    assert_eq!(first.source_page, 6);
    assert_eq!(first.window.first_page, 4);
    assert_eq!(first.window.last_page, 8);
    assert_eq!(first.focus_page, 3);
    assert_eq!(first.excerpt_pages, 5);
    assert_eq!(first.turns, 1);

    let excerpt = general_purpose::STANDARD
        .decode(first.excerpt_base64.as_bytes())
        .expect("excerpt decodes");
    let doc = Document::load_mem(&excerpt).expect("excerpt parses");
    assert_eq!(doc.get_pages().len(), 5);
    assert!(String::from_utf8_lossy(&excerpt).contains("Refunds are issued"));

    let follow_up = service
        .ask("How quickly is that?".into())
        .await
        .expect("follow-up answer");
    assert_eq!(follow_up.source_page, 6);
    assert_eq!(follow_up.turns, 2);

    let snapshot = service.snapshot().await;
    let document = snapshot.document.expect("active document");
    assert_eq!(document.name, "handbook.pdf");
    assert_eq!(document.page_count, 9);
    assert_eq!(snapshot.history.len(), 2);
    assert_eq!(
        snapshot.history[0].question,
        "What does the handbook say about refunds?"
    );
    assert_eq!(snapshot.history[0].source_page, 6);
    assert_eq!(snapshot.history[1].question, "How quickly is that?");
}

#[tokio::test]
async fn rejects_questions_before_any_upload() {
    setup().await;
    let service = SessionService::new().expect("session service");

    let error = service
        .ask("Is anything loaded?".into())
        .await
        .expect_err("no document yet");
    assert!(matches!(error, SessionError::NoDocument));

    let blank = service
        .ask("   ".into())
        .await
        .expect_err("blank question");
    assert!(matches!(blank, SessionError::BlankQuestion));
}

#[tokio::test]
async fn reset_drops_document_and_collection() {
    setup().await;
    let service = SessionService::new().expect("session service");

    let mut pages = vec![" "; 3];
    pages[0] = "Parking passes renew every January.";
    service
        .load_document(sample_pdf(&pages), "parking.pdf".into())
        .await
        .expect("document loads");

    let health = service.health().await;
    assert!(health.qdrant_reachable);
    assert!(health.collection_present);

    service.reset().await.expect("reset succeeds");

    let snapshot = service.snapshot().await;
    assert!(snapshot.document.is_none());
    assert!(snapshot.history.is_empty());

    let health = service.health().await;
    assert!(health.qdrant_reachable);
    assert!(!health.collection_present);

    let metrics = service.metrics_snapshot();
    assert_eq!(metrics.documents_indexed, 1);
    assert_eq!(metrics.passages_indexed, 1);
}
