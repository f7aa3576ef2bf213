//! Positioned text extraction from page content streams.
//!
//! Tracks the text matrix through a page's operators and emits one
//! [`TextSpan`] per text-showing operation, which is what the table
//! detector works from.

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue};
use crate::error::Result;

/// TJ adjustments above this (thousandths of an em) read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A run of text at a position on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated advance width
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a span, estimating its width from the character count.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = text.chars().count() as f32 * font_size * 0.5;
        Self {
            text,
            x,
            y,
            width,
            font_size,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Affine transform `[a b c d e f]`, applied to row vectors as in PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// `self` followed by `other`.
    fn then(self, other: Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn origin(&self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }

    /// Length a horizontal unit vector is stretched to.
    fn scale(&self) -> f32 {
        let [a, b, ..] = self.0;
        (a * a + b * b).sqrt()
    }
}

/// Text matrix for tracking position in content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    /// Start of the current line; Td/T* are relative to this, not to `e/f`.
    line_e: f32,
    line_f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
            leading: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, m: [f32; 6]) {
        let [a, b, c, d, e, f] = m;
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
        self.line_e = e;
        self.line_f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    /// Move along the baseline by `tx` text-space units.
    fn advance(&mut self, tx: f32) {
        self.e += tx * self.a;
        self.f += tx * self.b;
    }

    fn matrix(&self) -> Matrix {
        Matrix([self.a, self.b, self.c, self.d, self.e, self.f])
    }
}

/// Walks a page's operators and collects spans.
struct SpanCollector<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    page: PageId,
    font: Vec<u8>,
    font_size: f32,
    matrix: TextMatrix,
    /// Current transformation matrix and the `q` save stack.
    ctm: Matrix,
    saved: Vec<Matrix>,
    in_text: bool,
    spans: Vec<TextSpan>,
}

impl<'a, B: PdfBackend + ?Sized> SpanCollector<'a, B> {
    fn new(backend: &'a B, page: PageId) -> Self {
        Self {
            backend,
            page,
            font: Vec::new(),
            font_size: 12.0,
            matrix: TextMatrix::default(),
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            in_text: false,
            spans: Vec::new(),
        }
    }

    fn apply(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            "q" => self.saved.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" if op.operands.len() >= 6 => {
                let m = Matrix([
                    op.number(0, 1.0),
                    op.number(1, 0.0),
                    op.number(2, 0.0),
                    op.number(3, 1.0),
                    op.number(4, 0.0),
                    op.number(5, 0.0),
                ]);
                self.ctm = m.then(self.ctm);
            }
            "BT" => {
                self.in_text = true;
                self.matrix = TextMatrix {
                    leading: self.matrix.leading,
                    ..TextMatrix::default()
                };
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.font = name.clone();
                }
                self.font_size = op.number(1, 12.0);
            }
            "TL" => self.matrix.leading = op.number(0, 0.0),
            "Td" => self.matrix.translate(op.number(0, 0.0), op.number(1, 0.0)),
            "TD" => {
                let ty = op.number(1, 0.0);
                self.matrix.leading = -ty;
                self.matrix.translate(op.number(0, 0.0), ty);
            }
            "Tm" if op.operands.len() >= 6 => self.matrix.set([
                op.number(0, 1.0),
                op.number(1, 0.0),
                op.number(2, 0.0),
                op.number(3, 1.0),
                op.number(4, 0.0),
                op.number(5, 0.0),
            ]),
            "T*" => self.matrix.next_line(),
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    let text = self.decode(bytes);
                    self.emit(text);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    let text = self.decode_array(items);
                    self.emit(text);
                }
            }
            "'" | "\"" => {
                self.matrix.next_line();
                let index = if op.operator == "\"" { 2 } else { 0 };
                if let Some(PdfValue::Str(bytes)) = op.operands.get(index) {
                    let text = self.decode(bytes);
                    self.emit(text);
                }
            }
            _ => {}
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        self.backend.decode_text(self.page, &self.font, bytes)
    }

    /// TJ: strings interleaved with kerning adjustments.
    fn decode_array(&self, items: &[PdfValue]) -> String {
        let mut combined = String::new();
        for item in items {
            match item {
                PdfValue::Str(bytes) => combined.push_str(&self.decode(bytes)),
                other => {
                    // Negative adjustments advance to the right.
                    let gap = other.as_number().map(|n| -n).unwrap_or(0.0);
                    if gap > TJ_SPACE_THRESHOLD
                        && !combined.is_empty()
                        && !combined.ends_with([' ', '\u{00A0}'])
                    {
                        combined.push(' ');
                    }
                }
            }
        }
        combined
    }

    fn emit(&mut self, text: String) {
        if !self.in_text || text.trim().is_empty() {
            return;
        }
        let render = self.matrix.matrix().then(self.ctm);
        let (x, y) = render.origin();
        let size = self.font_size * render.scale();
        // Estimated advance in text space, so a following Tj on the same
        // line lands after this one.
        let advance = text.chars().count() as f32 * self.font_size * 0.5;
        self.matrix.advance(advance);
        self.spans.push(TextSpan::new(text, x, y, size));
    }
}

/// Extract text spans from one page.
pub fn page_spans<B: PdfBackend + ?Sized>(backend: &B, page: PageId) -> Result<Vec<TextSpan>> {
    let content = backend.page_content(page)?;
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let ops = backend.decode_content(&content)?;
    let mut collector = SpanCollector::new(backend, page);
    for op in &ops {
        collector.apply(op);
    }
    Ok(collector.spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::backend::{decode_text_simple, ImageRef, RawImage};
    use crate::error::Error;
    use std::collections::BTreeMap;

    /// Backend that serves a fixed operator list for page (1, 0).
    struct OpsBackend(Vec<ContentOp>);

    impl PdfBackend for OpsBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::from([(1, (1, 0))])
        }
        fn page_images(&self, _page: PageId) -> Result<Vec<ImageRef>> {
            Ok(Vec::new())
        }
        fn image(&self, image: ImageRef) -> Result<RawImage> {
            Err(Error::image_decode(image, "no images"))
        }
        fn page_content(&self, _page: PageId) -> Result<Vec<u8>> {
            Ok(b"ops".to_vec())
        }
        fn decode_content(&self, _data: &[u8]) -> Result<Vec<ContentOp>> {
            Ok(self.0.clone())
        }
        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            decode_text_simple(bytes)
        }
    }

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    fn s(text: &str) -> PdfValue {
        PdfValue::Str(text.as_bytes().to_vec())
    }

    #[test]
    fn test_td_positions() {
        let backend = OpsBackend(vec![
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Integer(10)]),
            op("Td", vec![PdfValue::Integer(50), PdfValue::Integer(700)]),
            op("Tj", vec![s("Kerros")]),
            op("Td", vec![PdfValue::Integer(200), PdfValue::Integer(0)]),
            op("Tj", vec![s("6 / 6")]),
            op("ET", vec![]),
        ]);

        let spans = page_spans(&backend, (1, 0)).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].x, spans[0].y), (50.0, 700.0));
        assert_eq!((spans[1].x, spans[1].y), (250.0, 700.0));
        assert_eq!(spans[1].text, "6 / 6");
        assert_eq!(spans[0].font_size, 10.0);
    }

    #[test]
    fn test_tm_and_leading() {
        let backend = OpsBackend(vec![
            op("BT", vec![]),
            op("TL", vec![PdfValue::Integer(14)]),
            op(
                "Tm",
                vec![
                    PdfValue::Integer(1),
                    PdfValue::Integer(0),
                    PdfValue::Integer(0),
                    PdfValue::Integer(1),
                    PdfValue::Integer(72),
                    PdfValue::Integer(500),
                ],
            ),
            op("Tj", vec![s("first")]),
            op("T*", vec![]),
            op("Tj", vec![s("second")]),
            op("ET", vec![]),
        ]);

        let spans = page_spans(&backend, (1, 0)).unwrap();
        assert_eq!(spans[1].x, 72.0);
        assert_eq!(spans[1].y, 486.0);
    }

    fn n(values: &[i64]) -> Vec<PdfValue> {
        values.iter().map(|&v| PdfValue::Integer(v)).collect()
    }

    #[test]
    fn test_scaled_tm_advance() {
        let backend = OpsBackend(vec![
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Integer(1)]),
            op("Tm", n(&[10, 0, 0, 10, 50, 700])),
            op("Tj", vec![s("Asunnossa")]),
            op("Tj", vec![s(" sauna")]),
            op("ET", vec![]),
        ]);

        let spans = page_spans(&backend, (1, 0)).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].font_size, 10.0);
        // 9 chars * 1pt * 0.5 in text space, times the 10x text matrix.
        assert_eq!(spans[1].x, 95.0);
        assert_eq!(spans[1].y, 700.0);
    }

    #[test]
    fn test_cm_positions_cells() {
        let cell = |x: i64, y: i64, text: &str| {
            vec![
                op("q", vec![]),
                op("cm", n(&[1, 0, 0, 1, x, y])),
                op("BT", vec![]),
                op("Tf", vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Integer(10)]),
                op("Td", n(&[0, 0])),
                op("Tj", vec![s(text)]),
                op("ET", vec![]),
                op("Q", vec![]),
            ]
        };
        let mut ops = cell(50, 700, "Kerros");
        ops.extend(cell(250, 700, "2 / 4"));
        ops.extend(cell(50, 680, "Hissi"));
        let backend = OpsBackend(ops);

        let spans = page_spans(&backend, (1, 0)).unwrap();
        let positions: Vec<(f32, f32)> = spans.iter().map(|s| (s.x, s.y)).collect();
        assert_eq!(positions, vec![(50.0, 700.0), (250.0, 700.0), (50.0, 680.0)]);
    }

    #[test]
    fn test_cm_scales_font_size() {
        let backend = OpsBackend(vec![
            op("q", vec![]),
            op("cm", n(&[2, 0, 0, 2, 100, 100])),
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Integer(5)]),
            op("Td", n(&[10, 20])),
            op("Tj", vec![s("kunto")]),
            op("ET", vec![]),
            op("Q", vec![]),
            op("BT", vec![]),
            op("Td", n(&[10, 20])),
            op("Tj", vec![s("hyvä")]),
            op("ET", vec![]),
        ]);

        let spans = page_spans(&backend, (1, 0)).unwrap();
        assert_eq!((spans[0].x, spans[0].y), (120.0, 140.0));
        assert_eq!(spans[0].font_size, 10.0);
        // Q restored the identity.
        assert_eq!((spans[1].x, spans[1].y), (10.0, 20.0));
    }

    #[test]
    fn test_tj_array_inserts_word_gap() {
        let backend = OpsBackend(vec![
            op("BT", vec![]),
            op(
                "TJ",
                vec![PdfValue::Array(vec![
                    s("Vuokra"),
                    PdfValue::Integer(-20),
                    s("/kk"),
                    PdfValue::Integer(-300),
                    s("950"),
                ])],
            ),
            op("ET", vec![]),
        ]);

        let spans = page_spans(&backend, (1, 0)).unwrap();
        assert_eq!(spans[0].text, "Vuokra/kk 950");
    }

    #[test]
    fn test_text_outside_bt_is_ignored() {
        let backend = OpsBackend(vec![op("Tj", vec![s("stray")])]);
        assert!(page_spans(&backend, (1, 0)).unwrap().is_empty());
    }
}
