//! Persistent span store backed by sled.
//!
//! Two trees:
//! - `spans`: `document_id \0 page(be32) start(be64)` -> JSON `WordSpan`
//! - `manifests`: `document_id` -> JSON `IndexManifest`
//!
//! Big-endian page and offset keys make a prefix scan return spans in
//! `(page_number, start_offset)` order without sorting.

use std::path::Path;

use sled::transaction::{TransactionError, TransactionResult};
use sled::Transactional;

use super::{validate_spans, SpanStore};
use crate::error::{Error, Result};
use crate::model::{IndexManifest, WordSpan};

const SPANS_TREE: &str = "spans";
const MANIFESTS_TREE: &str = "manifests";

fn document_prefix(document_id: &str) -> Vec<u8> {
    let mut key = document_id.as_bytes().to_vec();
    key.push(0);
    key
}

fn page_prefix(document_id: &str, page: u32) -> Vec<u8> {
    let mut key = document_prefix(document_id);
    key.extend_from_slice(&page.to_be_bytes());
    key
}

fn span_key(document_id: &str, page: u32, start: u64) -> Vec<u8> {
    let mut key = page_prefix(document_id, page);
    key.extend_from_slice(&start.to_be_bytes());
    key
}

/// Span store persisted in a sled database.
#[derive(Debug, Clone)]
pub struct SledSpanStore {
    db: sled::Db,
    spans: sled::Tree,
    manifests: sled::Tree,
}

impl SledSpanStore {
    /// Open (or create) a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Open a throwaway store that is removed when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    /// Use an already opened database.
    pub fn from_db(db: sled::Db) -> Result<Self> {
        let spans = db.open_tree(SPANS_TREE)?;
        let manifests = db.open_tree(MANIFESTS_TREE)?;
        Ok(Self {
            db,
            spans,
            manifests,
        })
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<sled::IVec>> {
        self.spans
            .scan_prefix(prefix)
            .keys()
            .map(|k| k.map_err(Error::from))
            .collect()
    }

    fn decode_values<I>(iter: I) -> Result<Vec<WordSpan>>
    where
        I: Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
    {
        iter.map(|entry| {
            let (_, value) = entry?;
            Ok(serde_json::from_slice::<WordSpan>(&value)?)
        })
        .collect()
    }

    /// Apply a span batch and a manifest change in one transaction.
    fn commit(&self, document_id: &str, batch: &sled::Batch, manifest: Option<&[u8]>) -> Result<()> {
        let result: TransactionResult<(), ()> =
            (&self.spans, &self.manifests).transaction(|(spans, manifests)| {
                spans.apply_batch(batch)?;
                match manifest {
                    Some(json) => {
                        manifests.insert(document_id.as_bytes(), json)?;
                    }
                    None => {
                        manifests.remove(document_id.as_bytes())?;
                    }
                }
                Ok(())
            });

        result.map_err(|e| match e {
            TransactionError::Abort(()) => Error::Store("span store transaction aborted".to_string()),
            TransactionError::Storage(e) => Error::from(e),
        })
    }
}

impl SpanStore for SledSpanStore {
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

        let mut batch = sled::Batch::default();
        for key in self.keys_with_prefix(&document_prefix(document_id))? {
            batch.remove(key);
        }
        for span in spans {
            let key = span_key(document_id, span.page_number, span.start_offset as u64);
            batch.insert(key, serde_json::to_vec(span)?);
        }

        let manifest = IndexManifest::new(document_id, page_count, spans.len());
        let manifest_json = serde_json::to_vec(&manifest)?;

        self.commit(document_id, &batch, Some(manifest_json.as_slice()))?;
        log::debug!("stored {} spans for '{}'", spans.len(), document_id);
        Ok(())
    }

    fn query(&self, document_id: &str) -> Result<Vec<WordSpan>> {
        Self::decode_values(self.spans.scan_prefix(document_prefix(document_id)))
    }

    fn query_page(&self, document_id: &str, page: u32) -> Result<Vec<WordSpan>> {
        Self::decode_values(self.spans.scan_prefix(page_prefix(document_id, page)))
    }

    fn find_covering(
        &self,
        document_id: &str,
        page: u32,
        start: usize,
        end: usize,
    ) -> Result<Vec<WordSpan>> {
        if start >= end {
            return Ok(Vec::new());
        }

        let lower = page_prefix(document_id, page);
        let mut covering = Vec::new();

        // The last span starting at or before `start` may reach into the range.
        let head = self
            .spans
            .range(lower..=span_key(document_id, page, start as u64))
            .next_back();
        covering.extend(Self::decode_values(head.into_iter())?);

        let rest = self.spans.range(
            span_key(document_id, page, start as u64 + 1)..span_key(document_id, page, end as u64),
        );
        covering.extend(Self::decode_values(rest)?);

        covering.retain(|s| s.overlaps(start, end));
        Ok(covering)
    }

    fn delete(&self, document_id: &str) -> Result<bool> {
        let existed = self.manifests.contains_key(document_id.as_bytes())?;

        let mut batch = sled::Batch::default();
        for key in self.keys_with_prefix(&document_prefix(document_id))? {
            batch.remove(key);
        }
        self.commit(document_id, &batch, None)?;

        Ok(existed)
    }

    fn manifest(&self, document_id: &str) -> Result<Option<IndexManifest>> {
        match self.manifests.get(document_id.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn documents(&self) -> Result<Vec<String>> {
        self.manifests
            .iter()
            .keys()
            .map(|k| Ok(String::from_utf8_lossy(&k?).into_owned()))
            .collect()
    }

    fn contains(&self, document_id: &str) -> Result<bool> {
        Ok(self.manifests.contains_key(document_id.as_bytes())?)
    }
}
