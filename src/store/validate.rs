//! Write-time checks on span sets.

use crate::error::{Error, Result};
use crate::model::WordSpan;

/// Check that `spans` form a well-ordered index for `document_id`.
///
/// Rejects a set when any span:
/// - belongs to another document, or the id contains a NUL byte
/// - has page number 0, or a page lower than the span before it
/// - is empty (no text, no offsets)
/// - starts before the previous span on its page ends (non-monotonic or overlapping)
/// - has `end_offset - start_offset` different from its text length in chars
///
/// Gaps between spans are accepted; lookups tolerate them.
pub fn validate_spans(document_id: &str, spans: &[WordSpan]) -> Result<()> {
    let invalid = |page: u32, reason: String| Error::InvalidSpans {
        document_id: document_id.to_string(),
        page,
        reason,
    };

    if document_id.is_empty() || document_id.contains('\0') {
        return Err(invalid(0, "document id must be non-empty and free of NUL".to_string()));
    }

    let mut prev: Option<&WordSpan> = None;
    for (i, span) in spans.iter().enumerate() {
        let page = span.page_number;

        if span.document_id != document_id {
            return Err(invalid(
                page,
                format!("span {} belongs to '{}'", i, span.document_id),
            ));
        }
        if page == 0 {
            return Err(invalid(page, format!("span {} has page number 0", i)));
        }
        if span.text.is_empty() {
            return Err(invalid(page, format!("span {} is empty", i)));
        }
        if span.end_offset < span.start_offset {
            return Err(invalid(
                page,
                format!(
                    "span {} ends before it starts ({}..{})",
                    i, span.start_offset, span.end_offset
                ),
            ));
        }
        let chars = span.text.chars().count();
        if span.len() != chars {
            return Err(invalid(
                page,
                format!(
                    "span {} covers {} offsets but its text has {} chars",
                    i,
                    span.len(),
                    chars
                ),
            ));
        }

        if let Some(p) = prev {
            if page < p.page_number {
                return Err(invalid(
                    page,
                    format!("span {} goes back from page {}", i, p.page_number),
                ));
            }
            if page == p.page_number && span.start_offset < p.end_offset {
                return Err(invalid(
                    page,
                    format!(
                        "span {} starts at {} before the previous span ends at {}",
                        i, span.start_offset, p.end_offset
                    ),
                ));
            }
        }
        prev = Some(span);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::page_spans;

    #[test]
    fn test_accepts_extractor_output() {
        let mut spans = page_spans("doc", 1, &["Hello", " world"]);
        spans.extend(page_spans("doc", 2, &["next"]));
        assert!(validate_spans("doc", &spans).is_ok());
        assert!(validate_spans("doc", &[]).is_ok());
    }

    #[test]
    fn test_rejects_non_monotonic_offsets() {
        let mut spans = page_spans("doc", 1, &["Hello", " world"]);
        spans.swap(0, 1);
        let err = validate_spans("doc", &spans).unwrap_err();
        assert!(matches!(err, Error::InvalidSpans { page: 1, .. }));
    }

    #[test]
    fn test_rejects_overlap() {
        let mut spans = page_spans("doc", 1, &["Hello", " world"]);
        spans[1].start_offset = 4;
        spans[1].end_offset = 10;
        assert!(validate_spans("doc", &spans).is_err());
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let mut spans = page_spans("doc", 1, &["Hello"]);
        spans[0].end_offset = 6;
        let err = validate_spans("doc", &spans).unwrap_err();
        assert!(err.to_string().contains("5 chars"));
    }

    #[test]
    fn test_rejects_page_order_and_zero() {
        let mut spans = page_spans("doc", 2, &["a"]);
        spans.extend(page_spans("doc", 1, &["b"]));
        assert!(validate_spans("doc", &spans).is_err());

        let spans = page_spans("doc", 0, &["a"]);
        assert!(validate_spans("doc", &spans).is_err());
    }

    #[test]
    fn test_rejects_foreign_document_and_bad_ids() {
        let spans = page_spans("other", 1, &["a"]);
        assert!(validate_spans("doc", &spans).is_err());
        assert!(validate_spans("", &[]).is_err());
        assert!(validate_spans("a\0b", &[]).is_err());
    }

    #[test]
    fn test_rejects_empty_span() {
        let mut spans = page_spans("doc", 1, &["ab"]);
        spans.extend(page_spans("doc", 1, &[""]));
        spans[1].start_offset = 2;
        spans[1].end_offset = 2;
        assert!(validate_spans("doc", &spans).is_err());
    }

    #[test]
    fn test_accepts_gaps() {
        let mut spans = page_spans("doc", 1, &["ab"]);
        let mut later = page_spans("doc", 1, &["cd"]);
        later[0].start_offset = 5;
        later[0].end_offset = 7;
        spans.append(&mut later);
        assert!(validate_spans("doc", &spans).is_ok());
    }
}
