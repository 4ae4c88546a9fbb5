//! Rendering of parsed segments for display.

mod json;
mod markdown;
mod options;
mod text;

pub use json::{to_json, value_to_json, JsonFormat};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::{ExcerptStyle, RenderOptions};
pub use text::to_text;
