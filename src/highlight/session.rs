//! Click handling with stale-result suppression.
//!
//! Every click takes a ticket from a monotonically increasing generation
//! counter. A projection is only applied to the viewer if its ticket is
//! still the newest when the result arrives, so a slow lookup for an old
//! click cannot overwrite the highlight of a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::projector::{HighlightProjector, HighlightRegion, Projection};
use crate::model::{BoundingBox, Citation, SpanLocation};
use crate::store::SpanStore;

/// Viewing surface that renders pages and overlays.
pub trait Viewer {
    /// Bring a page into view.
    fn scroll_to_page(&mut self, page: u32);

    /// Draw the highlight overlay on a page.
    fn draw_highlight(&mut self, page: u32, bbox: BoundingBox);
}

/// Identifies one click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClickTicket(u64);

impl ClickTicket {
    /// Generation number of the click.
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// What a click did to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// The viewer scrolled to the page and drew the region
    Highlighted(HighlightRegion),
    /// No span covered the range; the viewer was not touched
    Miss,
    /// A newer click superseded this one; the viewer was not touched
    Stale,
    /// The citation has no resolved document or location
    NotClickable,
}

/// Serializes highlight clicks for one viewer.
pub struct HighlightSession<S: SpanStore + ?Sized> {
    projector: HighlightProjector<S>,
    generation: AtomicU64,
}

impl<S: SpanStore + ?Sized> HighlightSession<S> {
    /// Create a session over a projector.
    pub fn new(projector: HighlightProjector<S>) -> Self {
        Self {
            projector,
            generation: AtomicU64::new(0),
        }
    }

    /// Create a session reading directly from a store.
    pub fn with_store(store: Arc<S>) -> Self {
        Self::new(HighlightProjector::new(store))
    }

    /// Underlying projector.
    pub fn projector(&self) -> &HighlightProjector<S> {
        &self.projector
    }

    /// Start a click, invalidating every earlier ticket.
    pub fn begin(&self) -> ClickTicket {
        ClickTicket(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Check whether no newer click has started since `ticket`.
    pub fn is_current(&self, ticket: ClickTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.0
    }

    /// Apply a finished projection if its click is still the newest.
    pub fn apply<V: Viewer + ?Sized>(
        &self,
        ticket: ClickTicket,
        projection: Projection,
        viewer: &mut V,
    ) -> ClickOutcome {
        if !self.is_current(ticket) {
            log::debug!("discarding stale highlight for click {}", ticket.generation());
            return ClickOutcome::Stale;
        }

        match projection {
            Projection::Highlight(region) => {
                viewer.scroll_to_page(region.page);
                viewer.draw_highlight(region.page, region.bbox);
                ClickOutcome::Highlighted(region)
            }
            Projection::NoHighlight => ClickOutcome::Miss,
        }
    }

    /// Handle a click on a location of a document.
    pub fn click_location<V: Viewer + ?Sized>(
        &self,
        document_id: &str,
        location: SpanLocation,
        viewer: &mut V,
    ) -> ClickOutcome {
        let ticket = self.begin();
        let projection = self.projector.project(document_id, location);
        self.apply(ticket, projection, viewer)
    }

    /// Handle a click on a citation.
    pub fn click<V: Viewer + ?Sized>(&self, citation: &Citation, viewer: &mut V) -> ClickOutcome {
        match citation.target() {
            Some((document_id, location)) => self.click_location(document_id, location, viewer),
            None => {
                // Still supersedes any in-flight lookup
                self.begin();
                ClickOutcome::NotClickable
            }
        }
    }
}

#[cfg(feature = "async")]
impl<S: SpanStore + ?Sized + 'static> HighlightSession<S> {
    /// Handle a click with the store lookup on tokio's blocking pool.
    ///
    /// The ticket is taken before the lookup starts, so a click issued while
    /// this one is awaiting makes this one [`ClickOutcome::Stale`].
    pub async fn click_async<V: Viewer + ?Sized>(
        &self,
        citation: &Citation,
        viewer: &mut V,
    ) -> ClickOutcome {
        let ticket = self.begin();
        let Some((document_id, location)) = citation.target() else {
            return ClickOutcome::NotClickable;
        };

        let projector = self.projector.clone();
        let document_id = document_id.to_string();
        let projection =
            tokio::task::spawn_blocking(move || projector.project(&document_id, location))
                .await
                .unwrap_or_else(|e| {
                    log::warn!("highlight lookup task failed: {}", e);
                    Projection::NoHighlight
                });

        self.apply(ticket, projection, viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CitationKind, WordSpan};
    use crate::store::MemorySpanStore;

    #[derive(Default)]
    struct RecordingViewer {
        scrolled: Vec<u32>,
        drawn: Vec<(u32, BoundingBox)>,
    }

    impl Viewer for RecordingViewer {
        fn scroll_to_page(&mut self, page: u32) {
            self.scrolled.push(page);
        }

        fn draw_highlight(&mut self, page: u32, bbox: BoundingBox) {
            self.drawn.push((page, bbox));
        }
    }

    fn session() -> HighlightSession<MemorySpanStore> {
        let store = MemorySpanStore::new();
        let spans = vec![
            WordSpan {
                document_id: "doc".to_string(),
                page_number: 2,
                text: "Hello".to_string(),
                bbox: BoundingBox::new(0.0, 0.0, 40.0, 10.0),
                start_offset: 0,
                end_offset: 5,
            },
            WordSpan {
                document_id: "doc".to_string(),
                page_number: 2,
                text: " world".to_string(),
                bbox: BoundingBox::new(40.0, 0.0, 50.0, 10.0),
                start_offset: 5,
                end_offset: 11,
            },
        ];
        store.save("doc", &spans).unwrap();
        HighlightSession::with_store(Arc::new(store))
    }

    fn citation(document_id: Option<&str>, location: Option<SpanLocation>) -> Citation {
        Citation {
            kind: CitationKind::Numbered,
            doc_ref: document_id.map(str::to_string),
            location,
            display_index: 1,
            source_position: 0,
            marker: "[1]".to_string(),
            excerpt: None,
            document_id: document_id.map(str::to_string),
        }
    }

    #[test]
    fn test_click_scrolls_and_draws() {
        let session = session();
        let mut viewer = RecordingViewer::default();

        let outcome = session.click(
            &citation(Some("doc"), Some(SpanLocation::new(2, 3, 8))),
            &mut viewer,
        );

        assert!(matches!(outcome, ClickOutcome::Highlighted(_)));
        assert_eq!(viewer.scrolled, vec![2]);
        assert_eq!(viewer.drawn, vec![(2, BoundingBox::new(0.0, 0.0, 90.0, 10.0))]);
    }

    #[test]
    fn test_miss_leaves_viewer_untouched() {
        let session = session();
        let mut viewer = RecordingViewer::default();

        let outcome = session.click_location("doc", SpanLocation::new(2, 40, 50), &mut viewer);
        assert_eq!(outcome, ClickOutcome::Miss);
        assert!(viewer.scrolled.is_empty());
        assert!(viewer.drawn.is_empty());
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let session = session();
        let mut viewer = RecordingViewer::default();

        let first = session.begin();
        let slow = session.projector().project("doc", SpanLocation::new(2, 0, 5));

        let second = session.begin();
        let fast = session.projector().project("doc", SpanLocation::new(2, 6, 9));
        let outcome = session.apply(second, fast, &mut viewer);
        assert!(matches!(outcome, ClickOutcome::Highlighted(_)));

        // First lookup finishes after the second click
        assert_eq!(session.apply(first, slow, &mut viewer), ClickOutcome::Stale);
        assert_eq!(viewer.drawn, vec![(2, BoundingBox::new(40.0, 0.0, 50.0, 10.0))]);
    }

    #[test]
    fn test_unclickable_citation_supersedes_pending_click() {
        let session = session();
        let mut viewer = RecordingViewer::default();

        let pending = session.begin();
        let outcome = session.click(&citation(None, None), &mut viewer);
        assert_eq!(outcome, ClickOutcome::NotClickable);
        assert!(!session.is_current(pending));
    }

    #[test]
    fn test_tickets_increase() {
        let session = session();
        let a = session.begin();
        let b = session.begin();
        assert!(b > a);
        assert_eq!(b.generation(), a.generation() + 1);
        assert!(session.is_current(b));
        assert!(!session.is_current(a));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_click_async() {
        let session = session();
        let mut viewer = RecordingViewer::default();
        let outcome = session
            .click_async(
                &citation(Some("doc"), Some(SpanLocation::new(2, 0, 5))),
                &mut viewer,
            )
            .await;
        assert!(matches!(outcome, ClickOutcome::Highlighted(_)));
        assert_eq!(viewer.scrolled, vec![2]);
    }
}
