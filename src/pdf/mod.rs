//! PDF loading and excerpt writing.
//!
//! Documents are parsed twice on purpose: `pdf-extract` reads the text of
//! every page for indexing, while `lopdf` slices page ranges out of the
//! original bytes when an answer needs a preview excerpt.

use thiserror::Error;

mod excerpt;

pub use excerpt::{PageWindow, WINDOW_MARGIN, extract_page_range, page_window};

/// Errors raised while reading documents or writing page excerpts.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The bytes could not be parsed as a PDF document.
    #[error("Failed to parse PDF: {0}")]
    Parse(#[from] lopdf::Error),
    /// The document parsed but its text could not be extracted.
    #[error("Failed to extract text: {0}")]
    TextExtraction(#[from] pdf_extract::OutputError),
    /// The requested page range does not exist in the document.
    #[error("Pages {start}-{end} are out of range for a document with {page_count} pages")]
    PageOutOfRange {
        /// First requested page (zero-based).
        start: usize,
        /// Last requested page (zero-based).
        end: usize,
        /// Number of pages actually present.
        page_count: usize,
    },
}

/// Extract the text of every page, in document order.
///
/// Index `i` of the returned vector holds the text of zero-based page `i`.
/// Pages without extractable text come back as empty strings; deciding what
/// to do about them is up to the caller.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, PdfError> {
    Ok(pdf_extract::extract_text_from_mem_by_pages(bytes)?)
}

/// Build an uncompressed PDF with one line of text per page.
#[cfg(test)]
pub(crate) fn test_document(page_texts: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_one_string_per_page() {
        let bytes = test_document(&["alpha page", "bravo page", "charlie page"]);
        let pages = extract_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages[0].contains("alpha"));
        assert!(pages[1].contains("bravo"));
        assert!(pages[2].contains("charlie"));
    }

    #[test]
    fn rejects_bytes_that_are_not_a_pdf() {
        assert!(extract_pages(b"not a pdf at all").is_err());
    }
}
