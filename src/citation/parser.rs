//! Segmentation of generated text into prose and citations.

use super::grammar::{scan_all, MarkerData, MarkerMatch};
use crate::model::{Citation, CitationKind, Segment, SpanLocation, SpanRef};

/// Parses citation markers out of generated text.
///
/// Parsing is pure: the same input always yields the same segments, and no
/// input makes it fail. Markers that cannot be resolved degrade to inert
/// citations or stay in the prose.
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationParser;

impl CitationParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Split `text` into prose and citation segments in source order.
    ///
    /// `span_list` backs numbered markers: entry `i` is the target of `[i + 1]`.
    /// A numbered marker without an entry is still emitted, with no location.
    ///
    /// Text without markers comes back as a single text segment equal to the
    /// input.
    pub fn parse(&self, text: &str, span_list: Option<&[SpanRef]>) -> Vec<Segment> {
        let matches = scan_all(text);
        if matches.is_empty() {
            return vec![Segment::text(text)];
        }

        let mut segments = Vec::with_capacity(matches.len() * 2 + 1);
        let mut pending = String::new();
        let mut cursor = 0;
        let mut counter = 0u32;

        for m in &matches {
            pending.push_str(&text[cursor..m.start]);
            cursor = m.end;

            match build_citation(text, m, span_list, &mut counter) {
                Some(citation) => {
                    if !pending.is_empty() {
                        segments.push(Segment::text(std::mem::take(&mut pending)));
                    }
                    segments.push(Segment::Citation(citation));
                }
                None => {
                    log::debug!(
                        "malformed citation marker at byte {} left as text",
                        m.start
                    );
                    pending.push_str(&text[m.start..m.end]);
                }
            }
        }

        pending.push_str(&text[cursor..]);
        if !pending.is_empty() || segments.is_empty() {
            segments.push(Segment::text(pending));
        }
        segments
    }

    /// Citations only, in source order.
    pub fn citations(&self, text: &str, span_list: Option<&[SpanRef]>) -> Vec<Citation> {
        self.parse(text, span_list)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Citation(c) => Some(c),
                Segment::Text { .. } => None,
            })
            .collect()
    }

    /// The prose with every recognized marker removed.
    pub fn strip_markers(&self, text: &str) -> String {
        self.parse(text, None)
            .iter()
            .filter_map(|segment| match segment {
                Segment::Text { text } => Some(text.as_str()),
                Segment::Citation(_) => None,
            })
            .collect()
    }
}

/// Turn a match into a citation, assigning display numbers.
///
/// Standard and freeform citations draw from the shared counter; numbered
/// citations show their literal number. Returns `None` for a malformed
/// standard marker, which then consumes no number.
fn build_citation(
    text: &str,
    m: &MarkerMatch,
    span_list: Option<&[SpanRef]>,
    counter: &mut u32,
) -> Option<Citation> {
    let marker = text[m.start..m.end].to_string();

    let citation = match &m.data {
        MarkerData::Standard { doc_ref, location } => {
            let (page, start, end) = (*location)?;
            *counter += 1;
            Citation {
                kind: CitationKind::Standard,
                doc_ref: Some(doc_ref.clone()),
                location: Some(SpanLocation::new(page, start, end)),
                display_index: *counter,
                source_position: m.start,
                marker,
                excerpt: None,
                document_id: None,
            }
        }
        MarkerData::Numbered { number } => {
            let entry = number
                .checked_sub(1)
                .and_then(|i| span_list.and_then(|list| list.get(i as usize)));
            Citation {
                kind: CitationKind::Numbered,
                doc_ref: entry.map(|e| e.document.clone()),
                location: entry.map(SpanRef::location),
                display_index: *number,
                source_position: m.start,
                marker,
                excerpt: None,
                document_id: None,
            }
        }
        MarkerData::Freeform { excerpt } => {
            *counter += 1;
            Citation {
                kind: CitationKind::Freeform,
                doc_ref: None,
                location: None,
                display_index: *counter,
                source_position: m.start,
                marker,
                excerpt: Some(excerpt.clone()),
                document_id: None,
            }
        }
    };

    Some(citation)
}
