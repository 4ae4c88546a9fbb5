//! Plain text rendering for parsed segments.

use crate::error::Result;
use crate::model::{CitationKind, Segment};

/// Convert segments to plain text.
///
/// Every citation shows as `[n]`; freeform excerpts are quoted before it.
pub fn to_text(segments: &[Segment]) -> Result<String> {
    let mut output = String::new();
    for segment in segments {
        match segment {
            Segment::Text { text } => output.push_str(text),
            Segment::Citation(citation) => {
                if citation.kind == CitationKind::Freeform {
                    if let Some(excerpt) = &citation.excerpt {
                        output.push_str(&format!("\"{}\" ", excerpt));
                    }
                }
                output.push_str(&format!("[{}]", citation.display_index));
            }
        }
    }
    Ok(output)
}
