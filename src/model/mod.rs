//! Data model shared by extraction, storage, parsing and projection.
//!
//! [`WordSpan`] binds a literal text run to a page rectangle and a character
//! range of the page text. [`Citation`] is the parsed, ephemeral view of a
//! marker found in generated text.

mod citation;
mod document;
mod span;

pub use citation::{Citation, CitationKind, Segment, SpanLocation, SpanRef};
pub use document::{DocumentEntry, IndexManifest};
pub use span::{page_text_from_spans, BoundingBox, WordSpan};
