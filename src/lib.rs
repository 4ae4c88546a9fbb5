//! # citespan
//!
//! Word-level span index for PDF documents and citation resolution for
//! generated analysis text.
//!
//! The pipeline has five parts:
//!
//! - **extract**: PDF bytes to per-page [`WordSpan`]s whose character offsets
//!   index the page text formed by concatenating every text run
//! - **store**: persistence of span indexes ([`MemorySpanStore`], [`SledSpanStore`])
//! - **citation**: markers in generated text to [`Segment`]s
//! - **resolve**: loose document references to concrete document ids
//! - **highlight**: a resolved citation to a rectangle on the page
//!
//! ## Quick Start
//!
//! ```no_run
//! use citespan::{CitationEngine, DocumentEntry, Projection};
//!
//! fn main() -> citespan::Result<()> {
//!     let engine = CitationEngine::new();
//!     engine.ingest_file("report-2023", "report.pdf")?;
//!
//!     let documents = vec![DocumentEntry::new("report-2023", "Annual Report 2023")];
//!     let segments = engine.parse(
//!         "Revenue doubled [CITATION:Annual Report 2023, page 2, 140, 171].",
//!         None,
//!         &documents,
//!     );
//!
//!     for citation in segments.iter().filter_map(|s| s.as_citation()) {
//!         if let Projection::Highlight(region) = engine.project(citation) {
//!             println!("page {} at {:?}", region.page, region.bbox);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Offset fidelity**: no normalization between extraction and lookup
//! - **All-or-nothing ingestion**: a document is indexed completely or not at all
//! - **Three citation grammars**: standard, numbered and freeform markers
//! - **Parallel processing**: Rayon across pages and documents
//! - **Stale click suppression**: late lookups never overwrite newer highlights

pub mod citation;
pub mod detect;
pub mod error;
pub mod extract;
pub mod highlight;
pub mod model;
pub mod render;
pub mod resolve;
pub mod store;

// Re-export commonly used types
pub use citation::{parse_citations, CitationParser};
pub use detect::{is_pdf_bytes, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use extract::{
    CoordinateOrigin, ExtractOptions, ExtractedDocument, LopdfSource, PageSpans, SpanExtractor,
    TextRun, TextRunSource,
};
pub use highlight::{
    ClickOutcome, ClickTicket, HighlightProjector, HighlightRegion, HighlightSession, Projection,
    Viewer,
};
pub use model::{
    page_text_from_spans, BoundingBox, Citation, CitationKind, DocumentEntry, IndexManifest,
    Segment, SpanLocation, SpanRef, WordSpan,
};
pub use render::{ExcerptStyle, JsonFormat, RenderOptions};
pub use resolve::{DocumentResolver, Resolution};
pub use store::{MemorySpanStore, SledSpanStore, SpanStore};

use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// Extract the spans of a PDF file.
///
/// # Example
///
/// ```no_run
/// use citespan::extract_spans;
///
/// let doc = extract_spans("contract", "contract.pdf").unwrap();
/// println!("{} spans on {} pages", doc.span_count(), doc.page_count());
/// ```
pub fn extract_spans<P: AsRef<Path>>(document_id: &str, path: P) -> Result<ExtractedDocument> {
    SpanExtractor::new().extract_file(document_id, path)
}

/// Extract the spans of a PDF held in memory.
pub fn extract_spans_from_bytes(document_id: &str, data: &[u8]) -> Result<ExtractedDocument> {
    SpanExtractor::new().extract_bytes(document_id, data)
}

/// Resolve a document reference against a list of candidates.
///
/// # Example
///
/// ```
/// use citespan::{resolve_reference, DocumentEntry, Resolution};
///
/// let candidates = vec![DocumentEntry::new("d1", "Acme Corp")];
/// assert_eq!(
///     resolve_reference("acme-corp-2023.pdf", &candidates),
///     Resolution::Fuzzy("d1".to_string())
/// );
/// ```
pub fn resolve_reference(reference: &str, candidates: &[DocumentEntry]) -> Resolution {
    DocumentResolver::new(candidates.to_vec()).resolve(reference)
}

/// Outcome of ingesting one document with [`CitationEngine::ingest_many`].
#[derive(Debug)]
pub struct IngestReport {
    /// Document the report is about
    pub document_id: String,
    /// Manifest of the stored index, or why nothing was stored
    pub result: Result<IndexManifest>,
}

/// Facade tying extraction, storage, parsing, resolution and projection
/// together over one span store.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use citespan::{CitationEngine, ExtractOptions, SledSpanStore};
///
/// let store = SledSpanStore::open("./span-index")?;
/// let engine = CitationEngine::with_store(Arc::new(store))
///     .with_extract_options(ExtractOptions::new().top_left());
/// engine.ingest_file("q3", "q3-report.pdf")?;
/// # Ok::<(), citespan::Error>(())
/// ```
pub struct CitationEngine {
    store: Arc<dyn SpanStore>,
    extractor: SpanExtractor,
    parser: CitationParser,
    render_options: RenderOptions,
}

impl CitationEngine {
    /// Create an engine over an in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemorySpanStore::new()))
    }

    /// Create an engine over a given store.
    pub fn with_store(store: Arc<dyn SpanStore>) -> Self {
        Self {
            store,
            extractor: SpanExtractor::new(),
            parser: CitationParser::new(),
            render_options: RenderOptions::default(),
        }
    }

    /// Set extraction options.
    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extractor = SpanExtractor::with_options(options);
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// The underlying span store.
    pub fn store(&self) -> &Arc<dyn SpanStore> {
        &self.store
    }

    /// Extract and store the spans of any text-run source.
    ///
    /// If extraction fails nothing is written and any previous index of the
    /// document is kept.
    pub fn ingest_source<S>(&self, document_id: &str, source: &S) -> Result<IndexManifest>
    where
        S: TextRunSource + Sync,
    {
        let document = self.extractor.extract(document_id, source)?;
        self.persist(&document)
    }

    /// Extract and store the spans of a PDF held in memory.
    pub fn ingest_bytes(&self, document_id: &str, data: &[u8]) -> Result<IndexManifest> {
        let document = self.extractor.extract_bytes(document_id, data)?;
        self.persist(&document)
    }

    /// Extract and store the spans of a PDF file.
    pub fn ingest_file<P: AsRef<Path>>(&self, document_id: &str, path: P) -> Result<IndexManifest> {
        let document = self.extractor.extract_file(document_id, path)?;
        self.persist(&document)
    }

    /// Ingest independent documents in parallel.
    ///
    /// Each document succeeds or fails on its own; reports come back in
    /// input order.
    pub fn ingest_many<P>(&self, documents: &[(String, P)]) -> Vec<IngestReport>
    where
        P: AsRef<Path> + Sync,
    {
        documents
            .par_iter()
            .map(|(document_id, path)| {
                let result = self.ingest_file(document_id, path);
                if let Err(e) = &result {
                    log::warn!("failed to ingest '{}': {}", document_id, e);
                }
                IngestReport {
                    document_id: document_id.clone(),
                    result,
                }
            })
            .collect()
    }

    fn persist(&self, document: &ExtractedDocument) -> Result<IndexManifest> {
        self.store.save_document(document)?;
        self.store
            .manifest(&document.document_id)?
            .ok_or_else(|| Error::Store(format!("no manifest for '{}'", document.document_id)))
    }

    /// Remove a document's span index.
    pub fn remove_document(&self, document_id: &str) -> Result<bool> {
        self.store.delete(document_id)
    }

    /// Page text of a stored document, rebuilt from its spans.
    pub fn page_text(&self, document_id: &str, page: u32) -> Result<String> {
        let spans = self.store.query_page(document_id, page)?;
        Ok(page_text_from_spans(&spans))
    }

    /// Parse generated text and resolve every citation against `documents`.
    pub fn parse(
        &self,
        text: &str,
        span_list: Option<&[SpanRef]>,
        documents: &[DocumentEntry],
    ) -> Vec<Segment> {
        let mut segments = self.parser.parse(text, span_list);
        DocumentResolver::new(documents.to_vec()).resolve_segments(&mut segments);
        segments
    }

    /// Parse, resolve and render generated text as Markdown.
    pub fn render_markdown(
        &self,
        text: &str,
        span_list: Option<&[SpanRef]>,
        documents: &[DocumentEntry],
    ) -> Result<String> {
        let segments = self.parse(text, span_list, documents);
        render::to_markdown(&segments, &self.render_options)
    }

    /// Parse, resolve and render generated text as JSON segments.
    pub fn render_json(
        &self,
        text: &str,
        span_list: Option<&[SpanRef]>,
        documents: &[DocumentEntry],
    ) -> Result<String> {
        let segments = self.parse(text, span_list, documents);
        render::to_json(&segments, self.render_options.json_format)
    }

    /// A projector over the engine's store.
    pub fn projector(&self) -> HighlightProjector<dyn SpanStore> {
        HighlightProjector::new(Arc::clone(&self.store))
    }

    /// A click session over the engine's store, one per viewer.
    pub fn session(&self) -> HighlightSession<dyn SpanStore> {
        HighlightSession::new(self.projector())
    }

    /// Project a resolved citation onto its page.
    pub fn project(&self, citation: &Citation) -> Projection {
        self.projector().project_citation(citation)
    }
}

impl Default for CitationEngine {
    fn default() -> Self {
        Self::new()
    }
}
