//! Span extraction: text runs to offset-addressed word spans.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::backend::{LopdfSource, TextRunSource};
use super::options::ExtractOptions;
use crate::detect::sniff_bytes;
use crate::error::Result;
use crate::model::WordSpan;

/// Spans of a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpans {
    /// 1-indexed page
    pub page_number: u32,
    /// Concatenation of every span's text, the string offsets index into
    pub text: String,
    /// Spans in extraction order
    pub spans: Vec<WordSpan>,
}

impl PageSpans {
    /// Length of the page text in characters.
    pub fn text_len(&self) -> usize {
        self.spans.last().map(|s| s.end_offset).unwrap_or(0)
    }
}

/// Result of extracting one document: every page, in page order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Document id the spans were stamped with
    pub document_id: String,
    /// Pages in order, including pages without text
    pub pages: Vec<PageSpans>,
}

impl ExtractedDocument {
    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Total number of spans across pages.
    pub fn span_count(&self) -> usize {
        self.pages.iter().map(|p| p.spans.len()).sum()
    }

    /// Concatenated text of a page (1-indexed).
    pub fn page_text(&self, page_number: u32) -> Option<&str> {
        page_number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .map(|p| p.text.as_str())
    }

    /// All spans, ordered by `(page_number, start_offset)`.
    pub fn spans(&self) -> impl Iterator<Item = &WordSpan> {
        self.pages.iter().flat_map(|p| p.spans.iter())
    }

    /// Consume into a flat span list ready for [`crate::store::SpanStore::save`].
    pub fn into_spans(self) -> Vec<WordSpan> {
        self.pages.into_iter().flat_map(|p| p.spans).collect()
    }
}

/// Builds word spans from a [`TextRunSource`].
///
/// For every page the running page text starts empty; each run gets
/// `start = len(page_text)`, its text is appended verbatim and
/// `end = len(page_text)`. No case, whitespace or Unicode normalization is
/// applied, so any consumer can recompute offsets by concatenation alone.
#[derive(Debug, Clone, Default)]
pub struct SpanExtractor {
    options: ExtractOptions,
}

impl SpanExtractor {
    /// Create an extractor with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with custom options.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Options in effect.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract all pages of a source.
    ///
    /// All-or-nothing: if any page fails, the whole document fails and no
    /// partial result is returned.
    pub fn extract<S>(&self, document_id: &str, source: &S) -> Result<ExtractedDocument>
    where
        S: TextRunSource + Sync,
    {
        let page_count = source.page_count();
        log::debug!(
            "extracting '{}' ({} pages, parallel={})",
            document_id,
            page_count,
            self.options.parallel
        );

        // Indexed parallel collect keeps page order.
        let pages: Result<Vec<PageSpans>> = if self.options.parallel {
            (1..=page_count)
                .into_par_iter()
                .map(|page| self.extract_page(document_id, source, page))
                .collect()
        } else {
            (1..=page_count)
                .map(|page| self.extract_page(document_id, source, page))
                .collect()
        };

        let pages = pages.map_err(|e| {
            log::warn!("extraction of '{}' failed: {}", document_id, e);
            e
        })?;

        Ok(ExtractedDocument {
            document_id: document_id.to_string(),
            pages,
        })
    }

    /// Extract a PDF held in memory.
    pub fn extract_bytes(&self, document_id: &str, data: &[u8]) -> Result<ExtractedDocument> {
        sniff_bytes(data)?;
        let source = LopdfSource::load_bytes(data, &self.options)?;
        self.extract(document_id, &source)
    }

    /// Extract a PDF file.
    pub fn extract_file<P: AsRef<Path>>(
        &self,
        document_id: &str,
        path: P,
    ) -> Result<ExtractedDocument> {
        let data = std::fs::read(path)?;
        self.extract_bytes(document_id, &data)
    }

    fn extract_page<S>(&self, document_id: &str, source: &S, page_number: u32) -> Result<PageSpans>
    where
        S: TextRunSource + ?Sized,
    {
        let runs = source.page_runs(page_number)?;

        let mut page_text = String::new();
        let mut text_len = 0usize;
        let mut spans = Vec::with_capacity(runs.len());

        for run in runs {
            if run.text.is_empty() {
                continue;
            }
            if self.options.skip_blank_runs && run.text.trim().is_empty() {
                continue;
            }

            let start = text_len;
            page_text.push_str(&run.text);
            text_len += run.text.chars().count();

            spans.push(WordSpan {
                document_id: document_id.to_string(),
                page_number,
                text: run.text,
                bbox: run.bbox,
                start_offset: start,
                end_offset: text_len,
            });
        }

        Ok(PageSpans {
            page_number,
            text: page_text,
            spans,
        })
    }
}
