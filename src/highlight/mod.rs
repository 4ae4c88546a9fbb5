//! Highlight projection and click handling.

mod projector;
mod session;

pub use projector::{union_bbox, HighlightProjector, HighlightRegion, Projection};
pub use session::{ClickOutcome, ClickTicket, HighlightSession, Viewer};
