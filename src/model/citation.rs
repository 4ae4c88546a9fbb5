//! Citation types produced by the citation parser.

use serde::{Deserialize, Serialize};

/// Which marker grammar produced a citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationKind {
    /// `[CITATION:doc,page,start,end]` with an explicit location
    Standard,
    /// `[n]` pointing at the n-th entry of an external span list
    Numbered,
    /// `Citation: "quoted excerpt"` with no location
    Freeform,
}

/// Page and half-open character range a citation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanLocation {
    /// 1-indexed page
    pub page: u32,
    /// Inclusive start offset into the page text
    pub start: usize,
    /// Exclusive end offset into the page text
    pub end: usize,
}

impl SpanLocation {
    /// Create a new location.
    pub fn new(page: u32, start: usize, end: usize) -> Self {
        Self { page, start, end }
    }
}

/// Entry of the ordered span list supplied alongside generated text.
///
/// Entry `i` backs the numbered marker `[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRef {
    /// Raw document reference (id or display name)
    pub document: String,
    /// 1-indexed page
    pub page: u32,
    /// Inclusive start offset
    pub start: usize,
    /// Exclusive end offset
    pub end: usize,
}

impl SpanRef {
    /// Create a new span reference.
    pub fn new(document: impl Into<String>, page: u32, start: usize, end: usize) -> Self {
        Self {
            document: document.into(),
            page,
            start,
            end,
        }
    }

    /// Location part of the reference.
    pub fn location(&self) -> SpanLocation {
        SpanLocation::new(self.page, self.start, self.end)
    }
}

/// A resolved or partially resolved reference found in generated text.
///
/// Citations are rebuilt each time text is rendered and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Marker grammar
    pub kind: CitationKind,
    /// Document reference as written (absent for freeform)
    pub doc_ref: Option<String>,
    /// Target location, when known
    pub location: Option<SpanLocation>,
    /// Number shown to the reader
    pub display_index: u32,
    /// Byte offset of the marker within the generated text
    pub source_position: usize,
    /// The marker exactly as it appeared
    pub marker: String,
    /// Quoted excerpt of a freeform citation
    pub excerpt: Option<String>,
    /// Concrete document id, filled in by the resolver
    pub document_id: Option<String>,
}

impl Citation {
    /// Byte offset just past the marker.
    pub fn source_end(&self) -> usize {
        self.source_position + self.marker.len()
    }

    /// A citation can be highlighted once it has a document and a location.
    pub fn is_clickable(&self) -> bool {
        self.document_id.is_some() && self.location.is_some()
    }

    /// Document id and location, if both are known.
    pub fn target(&self) -> Option<(&str, SpanLocation)> {
        match (&self.document_id, self.location) {
            (Some(id), Some(loc)) => Some((id.as_str(), loc)),
            _ => None,
        }
    }
}

/// One piece of rendered output: verbatim prose or a citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// Prose between markers, copied verbatim
    Text { text: String },
    /// A citation replacing its marker
    Citation(Citation),
}

impl Segment {
    /// Create a text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    /// The citation carried by this segment, if any.
    pub fn as_citation(&self) -> Option<&Citation> {
        match self {
            Segment::Citation(c) => Some(c),
            Segment::Text { .. } => None,
        }
    }

    /// Check if this segment is prose.
    pub fn is_text(&self) -> bool {
        matches!(self, Segment::Text { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation() -> Citation {
        Citation {
            kind: CitationKind::Standard,
            doc_ref: Some("A".to_string()),
            location: Some(SpanLocation::new(1, 0, 5)),
            display_index: 1,
            source_position: 4,
            marker: "[CITATION:A,1,0,5]".to_string(),
            excerpt: None,
            document_id: None,
        }
    }

    #[test]
    fn test_clickable_requires_document_and_location() {
        let mut c = citation();
        assert!(!c.is_clickable());
        c.document_id = Some("doc-a".to_string());
        assert!(c.is_clickable());
        assert_eq!(c.target(), Some(("doc-a", SpanLocation::new(1, 0, 5))));
        c.location = None;
        assert!(!c.is_clickable());
    }

    #[test]
    fn test_source_end() {
        assert_eq!(citation().source_end(), 4 + 18);
    }

    #[test]
    fn test_segment_serialization() {
        let json = serde_json::to_string(&Segment::text("hi")).unwrap();
        assert_eq!(json, r#"{"type":"text","text":"hi"}"#);

        let json = serde_json::to_string(&Segment::Citation(citation())).unwrap();
        assert!(json.contains(r#""type":"citation""#));
        assert!(json.contains(r#""kind":"standard""#));
    }
}
