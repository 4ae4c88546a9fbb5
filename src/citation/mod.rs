//! Citation marker parsing.
//!
//! Three marker grammars are recognized in generated text:
//!
//! | Grammar | Example | Location |
//! |---|---|---|
//! | standard | `[CITATION:report.pdf, page 3, 120, 180]` | explicit |
//! | numbered | `[2]` | entry 2 of an external span list |
//! | freeform | `Citation: "revenue doubled"` | none |
//!
//! All grammars are scanned over the full text, then merged by source
//! position before numbering.

mod grammar;
mod parser;

pub use parser::CitationParser;

use crate::model::{Segment, SpanRef};

/// Parse `text` with a default [`CitationParser`].
pub fn parse_citations(text: &str, span_list: Option<&[SpanRef]>) -> Vec<Segment> {
    CitationParser::new().parse(text, span_list)
}
