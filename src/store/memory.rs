//! In-process span store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{covering_slice, page_slice, validate_spans, SpanStore};
use crate::error::{Error, Result};
use crate::model::{IndexManifest, WordSpan};

#[derive(Debug, Clone)]
struct Entry {
    spans: Arc<[WordSpan]>,
    manifest: IndexManifest,
}

/// Span store kept in memory.
///
/// Each document's spans live in an immutable `Arc` slice; a save swaps the
/// whole slice under a short write lock, so readers always see either the
/// old index or the new one.
#[derive(Debug, Default)]
pub struct MemorySpanStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemorySpanStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, document_id: &str) -> Result<Option<Entry>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(document_id).cloned())
    }
}

fn poisoned() -> Error {
    Error::Store("memory store lock poisoned".to_string())
}

impl SpanStore for MemorySpanStore {
    fn save_with_page_count(
        &self,
        document_id: &str,
        spans: &[WordSpan],
        page_count: u32,
    ) -> Result<()> {
        validate_spans(document_id, spans).map_err(|e| {
            log::warn!("rejected span set: {}", e);
            e
        })?;

        let entry = Entry {
            spans: spans.into(),
            manifest: IndexManifest::new(document_id, page_count, spans.len()),
        };

        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(document_id.to_string(), entry);
        log::debug!("stored {} spans for '{}'", spans.len(), document_id);
        Ok(())
    }

    fn query(&self, document_id: &str) -> Result<Vec<WordSpan>> {
        Ok(self
            .entry(document_id)?
            .map(|e| e.spans.to_vec())
            .unwrap_or_default())
    }

    fn query_page(&self, document_id: &str, page: u32) -> Result<Vec<WordSpan>> {
        Ok(self
            .entry(document_id)?
            .map(|e| page_slice(&e.spans, page).to_vec())
            .unwrap_or_default())
    }

    fn find_covering(
        &self,
        document_id: &str,
        page: u32,
        start: usize,
        end: usize,
    ) -> Result<Vec<WordSpan>> {
        Ok(self
            .entry(document_id)?
            .map(|e| covering_slice(page_slice(&e.spans, page), start, end).to_vec())
            .unwrap_or_default())
    }

    fn delete(&self, document_id: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        Ok(entries.remove(document_id).is_some())
    }

    fn manifest(&self, document_id: &str) -> Result<Option<IndexManifest>> {
        Ok(self.entry(document_id)?.map(|e| e.manifest))
    }

    fn documents(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
