//! Markdown rendering for parsed segments.

use crate::error::Result;
use crate::model::{Citation, CitationKind, Segment};

use super::{ExcerptStyle, RenderOptions};

/// Convert segments to Markdown.
pub fn to_markdown(segments: &[Segment], options: &RenderOptions) -> Result<String> {
    MarkdownRenderer::new(options.clone()).render(segments)
}

/// Markdown renderer.
///
/// Prose is copied through. A clickable citation becomes a link to its
/// target; anything else keeps its number but no link.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render segments to Markdown.
    pub fn render(&self, segments: &[Segment]) -> Result<String> {
        let mut output = String::new();
        for segment in segments {
            match segment {
                Segment::Text { text } => {
                    if self.options.escape_special_chars {
                        output.push_str(&escape_markdown(text));
                    } else {
                        output.push_str(text);
                    }
                }
                Segment::Citation(citation) => self.render_citation(citation, &mut output),
            }
        }
        Ok(output)
    }

    fn render_citation(&self, citation: &Citation, output: &mut String) {
        if citation.kind == CitationKind::Freeform {
            let excerpt = escape_markdown(citation.excerpt.as_deref().unwrap_or_default());
            match self.options.excerpt_style {
                ExcerptStyle::Italic => output.push_str(&format!("*\"{}\"*", excerpt)),
                ExcerptStyle::Quoted => output.push_str(&format!("\"{}\"", excerpt)),
            }
            output.push(' ');
        }

        match citation.target() {
            Some((document_id, location)) => {
                output.push_str(&format!(
                    "[{}]({}{}/{}/{}-{})",
                    citation.display_index,
                    self.options.link_prefix,
                    encode_path_segment(document_id),
                    location.page,
                    location.start,
                    location.end
                ));
            }
            None => {
                // Inert: the number stays visible, escaped so it is not read as a link
                output.push_str(&format!("\\[{}\\]", citation.display_index));
            }
        }
    }
}

/// Percent-encode everything outside the URL unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Escape special Markdown characters.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
