//! Extraction options and configuration.

/// Options for building a document's span index.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Whether pages are interpreted in parallel (results stay in page order)
    pub parallel: bool,

    /// Coordinate convention of emitted rectangles
    pub origin: CoordinateOrigin,

    /// Drop whitespace-only runs before offsets are assigned
    pub skip_blank_runs: bool,

    /// Insert a space into a TJ run where a large kerning gap separates words
    pub infer_tj_spaces: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel page processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel page processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the coordinate origin of emitted rectangles.
    pub fn with_origin(mut self, origin: CoordinateOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Emit rectangles with a top-left origin and downward y axis.
    pub fn top_left(mut self) -> Self {
        self.origin = CoordinateOrigin::TopLeft;
        self
    }

    /// Enable or disable dropping of whitespace-only runs.
    pub fn with_skip_blank_runs(mut self, skip: bool) -> Self {
        self.skip_blank_runs = skip;
        self
    }

    /// Enable or disable space inference inside TJ arrays.
    pub fn with_tj_spaces(mut self, infer: bool) -> Self {
        self.infer_tj_spaces = infer;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            origin: CoordinateOrigin::PdfNative,
            skip_blank_runs: false,
            infer_tj_spaces: true,
        }
    }
}

/// Coordinate convention for span rectangles.
///
/// Must match the renderer that draws highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateOrigin {
    /// PDF user space: origin at the bottom-left, y grows upward
    #[default]
    PdfNative,
    /// Origin at the top-left of the MediaBox, y grows downward
    TopLeft,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .sequential()
            .top_left()
            .with_skip_blank_runs(true)
            .with_tj_spaces(false);

        assert!(!options.parallel);
        assert_eq!(options.origin, CoordinateOrigin::TopLeft);
        assert!(options.skip_blank_runs);
        assert!(!options.infer_tj_spaces);
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert!(options.parallel);
        assert_eq!(options.origin, CoordinateOrigin::PdfNative);
        assert!(!options.skip_blank_runs);
        assert!(options.infer_tj_spaces);
    }
}
