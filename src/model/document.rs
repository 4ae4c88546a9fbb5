//! Document identity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document visible to the resolving context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Concrete document id
    pub id: String,
    /// Human-readable name (usually the uploaded file name)
    pub display_name: String,
}

impl DocumentEntry {
    /// Create a new entry.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Summary of one indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Document id
    pub document_id: String,
    /// Number of pages extracted
    pub page_count: u32,
    /// Number of spans stored
    pub span_count: usize,
    /// When the index was written
    pub indexed_at: DateTime<Utc>,
}

impl IndexManifest {
    /// Create a manifest stamped with the current time.
    pub fn new(document_id: impl Into<String>, page_count: u32, span_count: usize) -> Self {
        Self {
            document_id: document_id.into(),
            page_count,
            span_count,
            indexed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_roundtrips_through_json() {
        let manifest = IndexManifest::new("doc-1", 3, 42);
        let json = serde_json::to_vec(&manifest).unwrap();
        let back: IndexManifest = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
