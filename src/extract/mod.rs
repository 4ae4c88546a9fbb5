//! Span extraction from PDF documents.

mod backend;
mod content;
mod extractor;
mod options;

pub use backend::{decode_text_simple, LopdfSource, TextRun, TextRunSource};
pub use extractor::{ExtractedDocument, PageSpans, SpanExtractor};
pub use options::{CoordinateOrigin, ExtractOptions};
