//! Clamped page windows and excerpt construction.
//!
//! An answer cites the page its top-ranked passage came from. The viewer
//! shows that page with up to [`WINDOW_MARGIN`] pages of context on each
//! side, sliced out of the original document into a standalone PDF.

use lopdf::Document;

use super::PdfError;

/// Number of context pages kept on each side of the source page.
pub const WINDOW_MARGIN: usize = 2;

/// Inclusive range of zero-based pages around a source page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// First page of the window (zero-based, inclusive).
    pub start: usize,
    /// Last page of the window (zero-based, inclusive).
    pub end: usize,
}

impl PageWindow {
    /// Number of pages covered by the window.
    pub fn page_count(&self) -> usize {
        self.end - self.start + 1
    }

    /// One-based position of `source_page` inside the window, suitable for a
    /// viewer `#page=` anchor.
    pub fn focus_page(&self, source_page: usize) -> usize {
        source_page.saturating_sub(self.start) + 1
    }
}

/// Compute the window of pages shown around `source_page`.
///
/// The window spans `source_page` plus [`WINDOW_MARGIN`] pages on each side,
/// clamped to the document bounds: at most five pages, fewer when the source
/// page sits near either edge.
pub fn page_window(source_page: usize, page_count: usize) -> PageWindow {
    let start = source_page.saturating_sub(WINDOW_MARGIN);
    let end = (source_page + WINDOW_MARGIN).min(page_count.saturating_sub(1));
    PageWindow { start, end }
}

/// Slice `window` out of a document into a standalone PDF.
///
/// The input bytes are parsed afresh on every call and are never modified;
/// pages outside the window are deleted from the parsed copy before it is
/// serialized.
pub fn extract_page_range(bytes: &[u8], window: PageWindow) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::load_mem(bytes)?;
    let page_count = doc.get_pages().len();
    if window.start > window.end || window.end >= page_count {
        return Err(PdfError::PageOutOfRange {
            start: window.start,
            end: window.end,
            page_count,
        });
    }

    // lopdf numbers pages from 1.
    let doomed: Vec<u32> = (1..=page_count as u32)
        .filter(|page| {
            let index = (*page - 1) as usize;
            index < window.start || index > window.end
        })
        .collect();
    if !doomed.is_empty() {
        doc.delete_pages(&doomed);
        doc.prune_objects();
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(lopdf::Error::from)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_document;

    #[test]
    fn window_is_clamped_at_the_start() {
        assert_eq!(page_window(0, 20), PageWindow { start: 0, end: 2 });
        assert_eq!(page_window(1, 20), PageWindow { start: 0, end: 3 });
    }

    #[test]
    fn window_is_clamped_at_the_end() {
        assert_eq!(page_window(19, 20), PageWindow { start: 17, end: 19 });
        assert_eq!(page_window(18, 20), PageWindow { start: 16, end: 19 });
    }

    #[test]
    fn window_covers_five_pages_in_the_interior() {
        let window = page_window(10, 20);
        assert_eq!(window, PageWindow { start: 8, end: 12 });
        assert_eq!(window.page_count(), 5);
    }

    #[test]
    fn short_documents_yield_the_whole_document() {
        assert_eq!(page_window(1, 3), PageWindow { start: 0, end: 2 });
        assert_eq!(page_window(0, 1), PageWindow { start: 0, end: 0 });
    }

    #[test]
    fn focus_page_points_at_the_source_page() {
        assert_eq!(page_window(10, 20).focus_page(10), 3);
        assert_eq!(page_window(0, 20).focus_page(0), 1);
        assert_eq!(page_window(1, 20).focus_page(1), 2);
        assert_eq!(page_window(19, 20).focus_page(19), 3);
    }

    #[test]
    fn excerpt_keeps_only_window_pages() {
        let bytes = test_document(&[
            "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf",
        ]);
        let excerpt = extract_page_range(&bytes, page_window(4, 7)).unwrap();

        let doc = Document::load_mem(&excerpt).unwrap();
        assert_eq!(doc.get_pages().len(), 5);

        let raw = String::from_utf8_lossy(&excerpt);
        assert!(raw.contains("charlie"));
        assert!(raw.contains("golf"));
        assert!(!raw.contains("alpha"));
        assert!(!raw.contains("bravo"));
    }

    #[test]
    fn excerpt_of_an_unclamped_window_is_the_whole_document() {
        let bytes = test_document(&["alpha", "bravo", "charlie"]);
        let excerpt = extract_page_range(&bytes, page_window(1, 3)).unwrap();

        let doc = Document::load_mem(&excerpt).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn excerpt_rejects_windows_outside_the_document() {
        let bytes = test_document(&["alpha", "bravo"]);
        let err = extract_page_range(&bytes, PageWindow { start: 0, end: 5 }).unwrap_err();
        assert!(matches!(err, PdfError::PageOutOfRange { page_count: 2, .. }));
    }
}
