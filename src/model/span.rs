//! Span-level types.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in page coordinates.
///
/// The origin and y-axis direction are those chosen at extraction time
/// (see [`crate::extract::CoordinateOrigin`]); nothing here assumes either.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f32,
    /// Lower edge in PDF-native space, upper edge in top-left space
    pub y: f32,
    /// Width (non-negative)
    pub width: f32,
    /// Height (non-negative)
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box from two opposite corners, in any order.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let (left, right) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (low, high) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        Self::new(left, low, right - left, high - low)
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Edge opposite to `y`.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        BoundingBox::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Check whether the box has no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// One text run on one page of one document.
///
/// `start_offset..end_offset` is a half-open range of `char` positions into
/// the page text formed by concatenating every run of the page in
/// extraction order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSpan {
    /// Owning document identity
    pub document_id: String,
    /// 1-indexed page
    pub page_number: u32,
    /// Literal run text
    pub text: String,
    /// Run rectangle in page coordinates
    pub bbox: BoundingBox,
    /// Inclusive start offset
    pub start_offset: usize,
    /// Exclusive end offset
    pub end_offset: usize,
}

impl WordSpan {
    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// Check if the span covers no characters.
    pub fn is_empty(&self) -> bool {
        self.end_offset <= self.start_offset
    }

    /// Check whether `[start, end)` shares at least one offset with this span.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        start < end && self.start_offset < end && start < self.end_offset
    }
}

/// Rebuild a page's concatenated text from its spans.
///
/// Spans must belong to a single page and be in offset order; the result is
/// exactly the string that offsets index into.
pub fn page_text_from_spans<'a, I>(spans: I) -> String
where
    I: IntoIterator<Item = &'a WordSpan>,
{
    spans.into_iter().map(|s| s.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, start: usize) -> WordSpan {
        WordSpan {
            document_id: "doc".to_string(),
            page_number: 1,
            text: text.to_string(),
            bbox: BoundingBox::default(),
            start_offset: start,
            end_offset: start + text.chars().count(),
        }
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 40.0, 10.0);
        let b = BoundingBox::new(40.0, 0.0, 50.0, 10.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, 0.0, 90.0, 10.0));

        let c = BoundingBox::new(10.0, 20.0, 5.0, 5.0);
        assert_eq!(a.union(&c), BoundingBox::new(0.0, 0.0, 40.0, 25.0));
    }

    #[test]
    fn test_from_corners_normalizes() {
        let b = BoundingBox::from_corners(10.0, 30.0, 0.0, 20.0);
        assert_eq!(b, BoundingBox::new(0.0, 20.0, 10.0, 10.0));
    }

    #[test]
    fn test_overlaps_half_open() {
        let s = span("Hello", 0);
        assert!(s.overlaps(3, 8));
        assert!(s.overlaps(0, 1));
        assert!(!s.overlaps(5, 11));
        assert!(!s.overlaps(2, 2));
    }

    #[test]
    fn test_page_text_from_spans() {
        let spans = vec![span("Hello", 0), span(" world", 5)];
        assert_eq!(page_text_from_spans(&spans), "Hello world");
    }
}
