//! Span persistence.
//!
//! A [`SpanStore`] holds the span index of every ingested document. Writes
//! happen once per document as an atomic bulk insert; reads are many and
//! concurrent. Both backends run [`validate_spans`] before accepting a span
//! set, so an index with non-monotonic offsets never reaches a reader.

mod memory;
mod sled_store;
mod validate;

pub use memory::MemorySpanStore;
pub use sled_store::SledSpanStore;
pub use validate::validate_spans;

use crate::error::Result;
use crate::extract::ExtractedDocument;
use crate::model::{IndexManifest, WordSpan};

/// Storage of per-document span indexes.
pub trait SpanStore: Send + Sync {
    /// Replace the span index of a document.
    ///
    /// `page_count` is recorded in the manifest and may exceed the highest
    /// page that carries spans.
    fn save_with_page_count(
        &self,
        document_id: &str,
        spans: &[WordSpan],
        page_count: u32,
    ) -> Result<()>;

    /// All spans of a document ordered by `(page_number, start_offset)`.
    ///
    /// Unknown documents yield an empty list.
    fn query(&self, document_id: &str) -> Result<Vec<WordSpan>>;

    /// Remove a document's index. Returns whether anything was removed.
    fn delete(&self, document_id: &str) -> Result<bool>;

    /// Manifest recorded by the last save, if the document is indexed.
    fn manifest(&self, document_id: &str) -> Result<Option<IndexManifest>>;

    /// Ids of every indexed document, sorted.
    fn documents(&self) -> Result<Vec<String>>;

    /// Bulk-insert the spans of one extraction run.
    fn save(&self, document_id: &str, spans: &[WordSpan]) -> Result<()> {
        let page_count = spans.iter().map(|s| s.page_number).max().unwrap_or(0);
        self.save_with_page_count(document_id, spans, page_count)
    }

    /// Persist an extracted document in one write.
    fn save_document(&self, document: &ExtractedDocument) -> Result<()> {
        let spans: Vec<WordSpan> = document.spans().cloned().collect();
        self.save_with_page_count(&document.document_id, &spans, document.page_count())
    }

    /// Spans of a single page in offset order.
    fn query_page(&self, document_id: &str, page: u32) -> Result<Vec<WordSpan>> {
        let spans = self.query(document_id)?;
        Ok(page_slice(&spans, page).to_vec())
    }

    /// Spans of `page` whose range overlaps `[start, end)`, in order.
    fn find_covering(
        &self,
        document_id: &str,
        page: u32,
        start: usize,
        end: usize,
    ) -> Result<Vec<WordSpan>> {
        let spans = self.query_page(document_id, page)?;
        Ok(covering_slice(&spans, start, end).to_vec())
    }

    /// Check if a document is indexed.
    fn contains(&self, document_id: &str) -> Result<bool> {
        Ok(self.manifest(document_id)?.is_some())
    }
}

/// Sub-slice of `spans` (sorted by page) that lies on `page`.
pub(crate) fn page_slice(spans: &[WordSpan], page: u32) -> &[WordSpan] {
    let lo = spans.partition_point(|s| s.page_number < page);
    let hi = spans.partition_point(|s| s.page_number <= page);
    &spans[lo..hi]
}

/// Sub-slice of one page's spans overlapping `[start, end)`.
///
/// Relies on the store invariant that spans are non-empty, sorted by start
/// and non-overlapping, which makes end offsets sorted as well.
pub fn covering_slice(spans: &[WordSpan], start: usize, end: usize) -> &[WordSpan] {
    if start >= end {
        return &[];
    }
    let lo = spans.partition_point(|s| s.end_offset <= start);
    let hi = spans.partition_point(|s| s.start_offset < end).max(lo);
    &spans[lo..hi]
}


#[cfg(test)]
mod tests {
    use super::test_support::page_spans;
    use super::*;

    #[test]
    fn test_covering_slice_single_and_multiple() {
        let spans = page_spans("d", 1, &["Hello", " world", "!"]);

        let hit = covering_slice(&spans, 1, 3);
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].text, "Hello");

        let hit = covering_slice(&spans, 3, 8);
        assert_eq!(hit.len(), 2);
        assert_eq!(hit[1].text, " world");

        let hit = covering_slice(&spans, 0, 12);
        assert_eq!(hit.len(), 3);
    }

    #[test]
    fn test_covering_slice_half_open_bounds() {
        let spans = page_spans("d", 1, &["Hello", " world"]);
        // [5, 6) starts exactly where the first span ends
        let hit = covering_slice(&spans, 5, 6);
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].start_offset, 5);
    }

    #[test]
    fn test_covering_slice_degenerate_and_out_of_range() {
        let spans = page_spans("d", 1, &["Hello"]);
        assert!(covering_slice(&spans, 3, 3).is_empty());
        assert!(covering_slice(&spans, 4, 2).is_empty());
        assert!(covering_slice(&spans, 5, 9).is_empty());
        assert!(covering_slice(&[], 0, 9).is_empty());
    }

    #[test]
    fn test_covering_slice_gap() {
        let mut spans = page_spans("d", 1, &["aaaa"]);
        let mut later = page_spans("d", 1, &["bbbb"]);
        later[0].start_offset = 10;
        later[0].end_offset = 14;
        spans.append(&mut later);

        assert!(covering_slice(&spans, 5, 9).is_empty());
        assert_eq!(covering_slice(&spans, 3, 11).len(), 2);
    }

    #[test]
    fn test_page_slice() {
        let mut spans = page_spans("d", 1, &["a", "b"]);
        spans.extend(page_spans("d", 3, &["c"]));

        assert_eq!(page_slice(&spans, 1).len(), 2);
        assert!(page_slice(&spans, 2).is_empty());
        assert_eq!(page_slice(&spans, 3)[0].text, "c");
        assert!(page_slice(&spans, 4).is_empty());
    }
}
