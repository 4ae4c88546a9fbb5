//! Projection of citation ranges onto page rectangles.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{BoundingBox, Citation, SpanLocation, WordSpan};
use crate::store::SpanStore;

/// Region to draw for a citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRegion {
    /// Document the region belongs to
    pub document_id: String,
    /// Page to navigate to
    pub page: u32,
    /// Union of every covering span's rectangle
    pub bbox: BoundingBox,
    /// Covering spans, in offset order
    pub spans: Vec<WordSpan>,
}

impl HighlightRegion {
    /// Text under the highlight.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Result of projecting a citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Projection {
    /// At least one span covers the range
    Highlight(HighlightRegion),
    /// Nothing to draw; the click is silently a no-op
    NoHighlight,
}

impl Projection {
    /// The region, if there is one.
    pub fn region(&self) -> Option<&HighlightRegion> {
        match self {
            Projection::Highlight(region) => Some(region),
            Projection::NoHighlight => None,
        }
    }

    /// Check if nothing can be highlighted.
    pub fn is_miss(&self) -> bool {
        matches!(self, Projection::NoHighlight)
    }
}

/// Maps `(document, page, [start, end))` to a rectangle on the page.
pub struct HighlightProjector<S: SpanStore + ?Sized> {
    store: Arc<S>,
}

impl<S: SpanStore + ?Sized> Clone for HighlightProjector<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SpanStore + ?Sized> HighlightProjector<S> {
    /// Create a projector reading from `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Store the projector reads from.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Project a location of a document.
    ///
    /// Never fails: no covering span, a degenerate range, or a store read
    /// error all give [`Projection::NoHighlight`].
    pub fn project(&self, document_id: &str, location: SpanLocation) -> Projection {
        let spans = match self.store.find_covering(
            document_id,
            location.page,
            location.start,
            location.end,
        ) {
            Ok(spans) => spans,
            Err(e) => {
                log::warn!("span lookup for '{}' failed: {}", document_id, e);
                return Projection::NoHighlight;
            }
        };

        let Some(bbox) = union_bbox(&spans) else {
            log::debug!(
                "no span covers '{}' page {} [{}, {})",
                document_id,
                location.page,
                location.start,
                location.end
            );
            return Projection::NoHighlight;
        };

        Projection::Highlight(HighlightRegion {
            document_id: document_id.to_string(),
            page: location.page,
            bbox,
            spans,
        })
    }

    /// Project a citation; citations without a resolved target are misses.
    pub fn project_citation(&self, citation: &Citation) -> Projection {
        match citation.target() {
            Some((document_id, location)) => self.project(document_id, location),
            None => Projection::NoHighlight,
        }
    }
}

/// Union of the rectangles of `spans`, `None` when empty.
pub fn union_bbox(spans: &[WordSpan]) -> Option<BoundingBox> {
    let (first, rest) = spans.split_first()?;
    Some(rest.iter().fold(first.bbox, |acc, s| acc.union(&s.bbox)))
}
