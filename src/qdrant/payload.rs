//! Helpers for constructing and reading Qdrant payloads.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Build the payload object stored alongside each indexed passage.
pub(crate) fn build_payload(
    document_id: &str,
    page: usize,
    text: &str,
    timestamp_rfc3339: &str,
) -> Value {
    let mut payload = Map::new();
    payload.insert("document_id".into(), Value::String(document_id.to_string()));
    payload.insert("page".into(), Value::from(page as u64));
    payload.insert("text".into(), Value::String(text.to_string()));
    payload.insert(
        "indexed_at".into(),
        Value::String(timestamp_rfc3339.to_string()),
    );
    Value::Object(payload)
}

/// Passage fields read back from a search hit's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedPassage {
    /// Zero-based page the passage was indexed from.
    pub page: usize,
    /// Raw passage text.
    pub text: String,
}

impl RetrievedPassage {
    /// Read the passage fields out of a payload, if both are present.
    pub fn from_payload(payload: &Map<String, Value>) -> Option<Self> {
        let page = payload.get("page")?.as_u64()? as usize;
        let text = payload.get("text")?.as_str()?.to_string();
        Some(Self { page, text })
    }
}

/// Compute a deterministic SHA-256 fingerprint for a document's bytes.
pub fn compute_document_id(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Construct an identifier suitable for Qdrant point ids.
pub(crate) fn generate_point_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_is_stable() {
        let bytes = b"%PDF-1.5 sample";
        let first = compute_document_id(bytes);
        let second = compute_document_id(bytes);
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = current_timestamp_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }

    #[test]
    fn payload_carries_page_text_and_provenance() {
        let payload = build_payload("doc-1", 7, "sample passage", "2025-01-01T00:00:00Z");
        assert_eq!(payload["document_id"], "doc-1");
        assert_eq!(payload["page"], 7);
        assert_eq!(payload["text"], "sample passage");
        assert_eq!(payload["indexed_at"], "2025-01-01T00:00:00Z");
    }

    #[test]
    fn retrieved_passage_round_trips_through_a_payload() {
        let payload = build_payload("doc-1", 3, "the answer", "2025-01-01T00:00:00Z");
        let map = payload.as_object().expect("payload object");
        let passage = RetrievedPassage::from_payload(map).expect("passage fields");
        assert_eq!(passage.page, 3);
        assert_eq!(passage.text, "the answer");
    }

    #[test]
    fn retrieved_passage_requires_both_fields() {
        let mut map = Map::new();
        map.insert("text".into(), Value::String("orphan".into()));
        assert!(RetrievedPassage::from_payload(&map).is_none());
    }
}
