//! Content stream interpretation.
//!
//! Walks the text-showing operators of a page and turns every `Tj`, `TJ`,
//! `'` and `"` into one [`TextRun`] whose rectangle is computed from the text
//! matrix, the current transformation matrix and the font's glyph widths.
//! Rectangles are in PDF user space; the backend converts them to the
//! requested origin.

use std::collections::HashMap;

use lopdf::content::Operation;
use lopdf::{Dictionary, Document as LopdfDocument, Object};

use super::backend::{decode_text_simple, TextRun};
use crate::model::BoundingBox;

/// Glyph width used when a font carries no metrics, in 1/1000 em.
const DEFAULT_GLYPH_WIDTH: f32 = 500.0;

/// Descender and ascender as fractions of the font size.
const DESCENT: f32 = 0.2;
const ASCENT: f32 = 0.8;

/// TJ adjustment (thousandths of an em) treated as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Glyph metrics of one font resource.
#[derive(Debug, Clone)]
pub(crate) struct FontMetrics {
    first_char: u32,
    widths: Vec<f32>,
    missing_width: f32,
    two_byte: bool,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            first_char: 0,
            widths: Vec::new(),
            missing_width: DEFAULT_GLYPH_WIDTH,
            two_byte: false,
        }
    }
}

impl FontMetrics {
    /// Read `/Widths`, `/FirstChar` and `/MissingWidth` (or `/DW` for Type0).
    pub(crate) fn from_dict(doc: &LopdfDocument, dict: &Dictionary) -> Self {
        let subtype = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or_default();

        if subtype == b"Type0" {
            let default_width = dict
                .get(b"DescendantFonts")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok())
                .and_then(|d| d.get(b"DW").ok())
                .and_then(number)
                .unwrap_or(1000.0);
            return Self {
                first_char: 0,
                widths: Vec::new(),
                missing_width: default_width,
                two_byte: true,
            };
        }

        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0)
            .max(0) as u32;

        let widths = dict
            .get(b"Widths")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| number(resolve(doc, w)).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();

        let missing_width = dict
            .get(b"FontDescriptor")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(number)
            .filter(|w| *w > 0.0)
            .unwrap_or(DEFAULT_GLYPH_WIDTH);

        Self {
            first_char,
            widths,
            missing_width,
            two_byte: false,
        }
    }

    fn glyph_width(&self, code: u32) -> f32 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.missing_width)
    }
}

/// Fonts of a single page, keyed by resource name.
pub(crate) struct FontTable<'a> {
    doc: Option<&'a LopdfDocument>,
    fonts: HashMap<Vec<u8>, (&'a Dictionary, FontMetrics)>,
    fallback: FontMetrics,
}

impl<'a> FontTable<'a> {
    /// A table with no fonts: text is decoded heuristically, widths default.
    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            doc: None,
            fonts: HashMap::new(),
            fallback: FontMetrics::default(),
        }
    }

    pub(crate) fn from_page_fonts<I>(doc: &'a LopdfDocument, fonts: I) -> Self
    where
        I: IntoIterator<Item = (Vec<u8>, &'a Dictionary)>,
    {
        let fonts = fonts
            .into_iter()
            .map(|(name, dict)| {
                let metrics = FontMetrics::from_dict(doc, dict);
                (name, (dict, metrics))
            })
            .collect();
        Self {
            doc: Some(doc),
            fonts,
            fallback: FontMetrics::default(),
        }
    }

    fn metrics(&self, font: &[u8]) -> &FontMetrics {
        self.fonts
            .get(font)
            .map(|(_, m)| m)
            .unwrap_or(&self.fallback)
    }

    fn decode(&self, font: &[u8], bytes: &[u8]) -> String {
        if let (Some(doc), Some((dict, _))) = (self.doc, self.fonts.get(font)) {
            if let Ok(enc) = dict.get_font_encoding(doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }
}

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: number(&operands[0])?,
            b: number(&operands[1])?,
            c: number(&operands[2])?,
            d: number(&operands[3])?,
            e: number(&operands[4])?,
            f: number(&operands[5])?,
        })
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

/// Text state parameters (PDF 32000-1, 9.3).
#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
    matrix: Matrix,
    line_matrix: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
        }
    }
}

impl TextState {
    fn begin_text(&mut self) {
        self.matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn advance(&mut self, tx: f32) {
        self.matrix = Matrix::translation(tx, 0.0).then(&self.matrix);
    }

    /// Horizontal displacement of `bytes` in unscaled text space.
    fn string_width(&self, metrics: &FontMetrics, bytes: &[u8]) -> f32 {
        let mut width = 0.0;
        if metrics.two_byte {
            for chunk in bytes.chunks(2) {
                let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
                width += metrics.glyph_width(code) / 1000.0 * self.font_size + self.char_spacing;
            }
        } else {
            for &byte in bytes {
                width += metrics.glyph_width(byte as u32) / 1000.0 * self.font_size
                    + self.char_spacing;
                if byte == b' ' {
                    width += self.word_spacing;
                }
            }
        }
        width * self.horizontal_scale
    }
}

/// Interpret a page's operations and collect its text runs in stream order.
pub(crate) fn collect_runs(
    operations: &[Operation],
    fonts: &FontTable<'_>,
    infer_tj_spaces: bool,
) -> Vec<TextRun> {
    let mut ctm = Matrix::IDENTITY;
    let mut saved: Vec<(Matrix, TextState)> = Vec::new();
    let mut state = TextState::default();
    let mut in_text = false;
    let mut runs = Vec::new();

    for op in operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => saved.push((ctm, state.clone())),
            "Q" => {
                if let Some((m, s)) = saved.pop() {
                    ctm = m;
                    state = s;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    ctm = m.then(&ctm);
                }
            }
            "BT" => {
                in_text = true;
                state.begin_text();
            }
            "ET" => in_text = false,
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    state.font = name.clone();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "Tc" => set_number(operands, &mut state.char_spacing),
            "Tw" => set_number(operands, &mut state.word_spacing),
            "TL" => set_number(operands, &mut state.leading),
            "Ts" => set_number(operands, &mut state.rise),
            "Tz" => {
                if let Some(scale) = operands.first().and_then(number) {
                    state.horizontal_scale = scale / 100.0;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(number),
                    operands.get(1).and_then(number),
                ) {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    state.line_matrix = m;
                    state.matrix = m;
                }
            }
            "T*" => state.next_line(),
            "Tj" if in_text => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    show_string(&mut state, &ctm, fonts, bytes, &mut runs);
                }
            }
            "'" if in_text => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    show_string(&mut state, &ctm, fonts, bytes, &mut runs);
                }
            }
            "\"" if in_text => {
                set_number(operands, &mut state.word_spacing);
                if let Some(tc) = operands.get(1).and_then(number) {
                    state.char_spacing = tc;
                }
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    show_string(&mut state, &ctm, fonts, bytes, &mut runs);
                }
            }
            "TJ" if in_text => {
                if let Some(Object::Array(items)) = operands.first() {
                    show_array(&mut state, &ctm, fonts, items, infer_tj_spaces, &mut runs);
                }
            }
            _ => {}
        }
    }

    runs
}

fn show_string(
    state: &mut TextState,
    ctm: &Matrix,
    fonts: &FontTable<'_>,
    bytes: &[u8],
    runs: &mut Vec<TextRun>,
) {
    let text = fonts.decode(&state.font, bytes);
    let width = state.string_width(fonts.metrics(&state.font), bytes);
    emit(state, ctm, text, width, runs);
    state.advance(width);
}

fn show_array(
    state: &mut TextState,
    ctm: &Matrix,
    fonts: &FontTable<'_>,
    items: &[Object],
    infer_tj_spaces: bool,
    runs: &mut Vec<TextRun>,
) {
    let mut text = String::new();
    let mut width = 0.0;

    for item in items {
        match item {
            Object::String(bytes, _) => {
                text.push_str(&fonts.decode(&state.font, bytes));
                width += state.string_width(fonts.metrics(&state.font), bytes);
            }
            other => {
                let Some(adjustment) = number(other) else {
                    continue;
                };
                // Negative adjustments move the next glyph to the right.
                width -= adjustment / 1000.0 * state.font_size * state.horizontal_scale;
                if infer_tj_spaces && -adjustment > TJ_SPACE_THRESHOLD && needs_space(&text) {
                    text.push(' ');
                }
            }
        }
    }

    emit(state, ctm, text, width, runs);
    state.advance(width);
}

/// A word gap becomes a space unless one is already there or the script
/// does not separate words with spaces.
fn needs_space(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && !is_spaceless_script_char(c),
        None => false,
    }
}

fn emit(state: &TextState, ctm: &Matrix, text: String, width: f32, runs: &mut Vec<TextRun>) {
    if text.is_empty() {
        return;
    }

    let to_user = state.matrix.then(ctm);
    let low = state.rise - DESCENT * state.font_size;
    let high = state.rise + ASCENT * state.font_size;
    let corners = [
        to_user.apply(0.0, low),
        to_user.apply(width, low),
        to_user.apply(0.0, high),
        to_user.apply(width, high),
    ];

    let (mut x0, mut y0) = corners[0];
    let (mut x1, mut y1) = corners[0];
    for &(x, y) in &corners[1..] {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }

    runs.push(TextRun {
        text,
        bbox: BoundingBox::from_corners(x0, y0, x1, y1),
    });
}

fn set_number(operands: &[Object], target: &mut f32) {
    if let Some(value) = operands.first().and_then(number) {
        *target = value;
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Scripts that do not put spaces between words (Chinese, Japanese).
/// Hangul is excluded: Korean uses word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}
