//! Rendering options and configuration.

use super::JsonFormat;

/// Options for rendering parsed segments.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Prefix of citation link targets; the link is
    /// `<prefix><document>/<page>/<start>-<end>`
    pub link_prefix: String,

    /// Escape Markdown special characters in prose
    pub escape_special_chars: bool,

    /// How freeform excerpts are set off from the prose
    pub excerpt_style: ExcerptStyle,

    /// JSON output format
    pub json_format: JsonFormat,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the link prefix.
    pub fn with_link_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.link_prefix = prefix.into();
        self
    }

    /// Enable or disable escaping of prose.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Set the excerpt style.
    pub fn with_excerpt_style(mut self, style: ExcerptStyle) -> Self {
        self.excerpt_style = style;
        self
    }

    /// Set the JSON format.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            link_prefix: "#cite/".to_string(),
            // Generated text is usually Markdown already
            escape_special_chars: false,
            excerpt_style: ExcerptStyle::Italic,
            json_format: JsonFormat::Pretty,
        }
    }
}

/// How a freeform excerpt is rendered in Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcerptStyle {
    /// `*"excerpt"* [n]`
    #[default]
    Italic,
    /// `"excerpt" [n]`
    Quoted,
}
