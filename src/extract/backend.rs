//! Text-run source abstraction.
//!
//! The extractor only needs one primitive from a PDF library: for each page,
//! the ordered text runs with their rectangles. [`TextRunSource`] isolates
//! that primitive so the offset bookkeeping never touches concrete PDF types.

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use super::content::{collect_runs, FontTable};
use super::options::{CoordinateOrigin, ExtractOptions};
use crate::error::{Error, Result};
use crate::model::BoundingBox;

/// One run of literal text with its rectangle in page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Literal text as decoded from the page
    pub text: String,
    /// Position rectangle
    pub bbox: BoundingBox,
}

impl TextRun {
    /// Create a new text run.
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Per-page access to ordered text runs.
pub trait TextRunSource {
    /// Number of pages; pages are numbered `1..=page_count`.
    fn page_count(&self) -> u32;

    /// Text runs of a page in content-stream order.
    ///
    /// Fails with [`Error::PageUnreadable`] when the page cannot be opened or
    /// decoded.
    fn page_runs(&self, page_number: u32) -> Result<Vec<TextRun>>;
}

/// In-memory source, one `Vec<TextRun>` per page.
impl TextRunSource for Vec<Vec<TextRun>> {
    fn page_count(&self) -> u32 {
        self.len() as u32
    }

    fn page_runs(&self, page_number: u32) -> Result<Vec<TextRun>> {
        page_number
            .checked_sub(1)
            .and_then(|i| self.get(i as usize))
            .cloned()
            .ok_or(Error::PageOutOfRange(page_number, self.len() as u32))
    }
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// [`TextRunSource`] backed by `lopdf::Document`.
pub struct LopdfSource {
    doc: LopdfDocument,
    pages: Vec<ObjectId>,
    origin: CoordinateOrigin,
    infer_tj_spaces: bool,
}

impl LopdfSource {
    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8], options: &ExtractOptions) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self::from_document(doc, options))
    }

    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P, options: &ExtractOptions) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::load_bytes(&data, options)
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument, options: &ExtractOptions) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self {
            doc,
            pages,
            origin: options.origin,
            infer_tj_spaces: options.infer_tj_spaces,
        }
    }

    /// MediaBox `[x0, y0, x1, y1]` of a page, following `/Parent` inheritance.
    pub fn media_box(&self, page_number: u32) -> Result<[f32; 4]> {
        let page_id = self.page_id(page_number)?;
        let mut current = self.doc.get_dictionary(page_id).ok();

        while let Some(dict) = current {
            if let Ok(array) = dict.get(b"MediaBox").and_then(|o| self.deref(o).as_array()) {
                if array.len() >= 4 {
                    let mut rect = [0.0f32; 4];
                    for (slot, value) in rect.iter_mut().zip(array.iter()) {
                        *slot = self.deref(value).as_float().unwrap_or(0.0);
                    }
                    return Ok(rect);
                }
            }
            current = dict
                .get(b"Parent")
                .and_then(|p| p.as_reference())
                .and_then(|id| self.doc.get_dictionary(id))
                .ok();
        }

        // Letter
        Ok([0.0, 0.0, 612.0, 792.0])
    }

    fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        page_number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .copied()
            .ok_or(Error::PageOutOfRange(page_number, self.pages.len() as u32))
    }

    fn deref<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    /// Concatenated, decompressed content streams of a page.
    ///
    /// A page without `/Contents` is blank. A stream that cannot be
    /// decompressed makes the page unreadable rather than silently shorter.
    fn page_content(&self, page_number: u32, page_id: ObjectId) -> Result<Vec<u8>> {
        let unreadable = |reason: String| Error::PageUnreadable {
            page: page_number,
            reason,
        };

        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| unreadable(e.to_string()))?;

        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        let refs: Vec<ObjectId> = match self.deref(contents) {
            Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
            Object::Stream(_) => match contents {
                Object::Reference(r) => vec![*r],
                _ => Vec::new(),
            },
            _ => return Err(unreadable("invalid /Contents entry".to_string())),
        };

        let mut content = Vec::new();
        for r in refs {
            match self.doc.get_object(r) {
                Ok(Object::Stream(s)) => {
                    let data = s
                        .decompressed_content()
                        .or_else(|_| {
                            if s.dict.get(b"Filter").is_err() {
                                Ok(s.content.clone())
                            } else {
                                Err(())
                            }
                        })
                        .map_err(|_| unreadable(format!("cannot decode stream {} {}", r.0, r.1)))?;
                    content.extend_from_slice(&data);
                    content.push(b' ');
                }
                _ => return Err(unreadable(format!("missing content stream {} {}", r.0, r.1))),
            }
        }
        Ok(content)
    }
}

impl TextRunSource for LopdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_runs(&self, page_number: u32) -> Result<Vec<TextRun>> {
        let page_id = self.page_id(page_number)?;
        let unreadable = |reason: String| Error::PageUnreadable {
            page: page_number,
            reason,
        };

        let content = self.page_content(page_number, page_id)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let operations = lopdf::content::Content::decode(&content)
            .map_err(|e| unreadable(e.to_string()))?
            .operations;

        let page_fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| unreadable(e.to_string()))?;
        let fonts = FontTable::from_page_fonts(&self.doc, page_fonts);

        let mut runs = collect_runs(&operations, &fonts, self.infer_tj_spaces);

        if self.origin == CoordinateOrigin::TopLeft {
            let [x0, _, _, y1] = self.media_box(page_number)?;
            for run in &mut runs {
                run.bbox = BoundingBox::new(
                    run.bbox.x - x0,
                    y1 - run.bbox.y - run.bbox.height,
                    run.bbox.width,
                    run.bbox.height,
                );
            }
        }

        log::debug!("page {}: {} text runs", page_number, runs.len());
        Ok(runs)
    }
}
