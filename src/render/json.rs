//! JSON rendering for parsed segments.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Segment;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert segments to JSON.
pub fn to_json(segments: &[Segment], format: JsonFormat) -> Result<String> {
    value_to_json(segments, format)
}

/// Serialize any value (spans, projections, manifests) in the given format.
pub fn value_to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
