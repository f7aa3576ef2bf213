//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the document operations the
//! extractor needs, isolating the concrete PDF library (lopdf) from the
//! image and table logic.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Image XObject identifier: (object number, generation number).
pub type ImageRef = (u32, u16);

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    /// Numeric value, if the operand is a number.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Numeric operand at `index`, or `default`.
    pub fn number(&self, index: usize, default: f32) -> f32 {
        self.operands
            .get(index)
            .and_then(PdfValue::as_number)
            .unwrap_or(default)
    }
}

/// Color space of an image XObject, resolved to something decodable.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette lookup into a base space.
    Indexed {
        base: Box<ColorSpace>,
        hival: u8,
        lookup: Vec<u8>,
    },
    /// Anything else, kept by name for error reporting.
    Unsupported(String),
}

impl ColorSpace {
    /// Number of color components per sample.
    pub fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
            ColorSpace::Unsupported(_) => 0,
        }
    }
}

/// An image XObject as stored in the document.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub id: ImageRef,
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub color_space: ColorSpace,
    /// Last filter in the stream's filter chain, if any.
    pub filter: Option<String>,
    /// Encoded bytes for DCT/JPX streams, decompressed samples otherwise.
    pub data: Vec<u8>,
}

/// Abstract interface for PDF document access.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId), page numbers from 1.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Image XObjects referenced by a page's resources, in dictionary order,
    /// without duplicates.
    fn page_images(&self, page: PageId) -> Result<Vec<ImageRef>>;

    /// Load an image XObject.
    fn image(&self, image: ImageRef) -> Result<RawImage>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font: &[u8], bytes: &[u8]) -> String;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Check the `%PDF-x.y` header before handing bytes to the parser.
pub fn check_header(data: &[u8]) -> Result<String> {
    const MAGIC: &[u8] = b"%PDF-";

    let rest = data.strip_prefix(MAGIC).ok_or(Error::UnknownFormat)?;
    let version = rest.get(..3).ok_or(Error::UnknownFormat)?;
    match version {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Ok(String::from_utf8_lossy(version).into_owned())
        }
        _ => Err(Error::UnsupportedVersion(
            String::from_utf8_lossy(version).into_owned(),
        )),
    }
}

// ---------------------------------------------------------------------------
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::load_bytes(&data)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        check_header(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self { doc })
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Follow a reference to the object it points at.
    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).ok(),
            other => Some(other),
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj)? {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Resources of a page, inherited from the page tree when the page has none.
    fn page_resources(&self, page: PageId) -> Option<&Dictionary> {
        let mut node = self.doc.get_dictionary(page).ok()?;
        // Bounded walk; page trees are shallow and this guards against cycles.
        for _ in 0..32 {
            if let Some(res) = node.get(b"Resources").ok().and_then(|r| self.resolve_dict(r)) {
                return Some(res);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn color_space(&self, obj: &Object) -> ColorSpace {
        let Some(obj) = self.resolve(obj) else {
            return ColorSpace::Unsupported("unresolvable".to_string());
        };

        match obj {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" | b"G" => ColorSpace::Gray,
                b"DeviceRGB" | b"CalRGB" | b"RGB" => ColorSpace::Rgb,
                b"DeviceCMYK" | b"CMYK" => ColorSpace::Cmyk,
                other => ColorSpace::Unsupported(String::from_utf8_lossy(other).into_owned()),
            },
            Object::Array(arr) => {
                let family = arr
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .unwrap_or_default();
                match family {
                    b"ICCBased" => {
                        let n = arr
                            .get(1)
                            .and_then(|o| self.resolve_dict(o))
                            .and_then(|d| d.get(b"N").ok())
                            .and_then(|n| n.as_i64().ok());
                        match n {
                            Some(1) => ColorSpace::Gray,
                            Some(3) => ColorSpace::Rgb,
                            Some(4) => ColorSpace::Cmyk,
                            _ => ColorSpace::Unsupported("ICCBased".to_string()),
                        }
                    }
                    b"Indexed" | b"I" if arr.len() >= 4 => {
                        let base = self.color_space(&arr[1]);
                        let hival = arr[2].as_i64().unwrap_or(0).clamp(0, 255) as u8;
                        let lookup = match self.resolve(&arr[3]) {
                            Some(Object::String(bytes, _)) => bytes.clone(),
                            Some(Object::Stream(s)) => s
                                .decompressed_content()
                                .unwrap_or_else(|_| s.content.clone()),
                            _ => Vec::new(),
                        };
                        ColorSpace::Indexed {
                            base: Box::new(base),
                            hival,
                            lookup,
                        }
                    }
                    b"CalRGB" => ColorSpace::Rgb,
                    b"CalGray" => ColorSpace::Gray,
                    other => ColorSpace::Unsupported(String::from_utf8_lossy(other).into_owned()),
                }
            }
            _ => ColorSpace::Unsupported("malformed".to_string()),
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_images(&self, page: PageId) -> Result<Vec<ImageRef>> {
        let mut refs: Vec<ImageRef> = Vec::new();

        let Some(resources) = self.page_resources(page) else {
            return Ok(refs);
        };
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|x| self.resolve_dict(x))
        else {
            return Ok(refs);
        };

        for (_name, obj) in xobjects.iter() {
            let Ok(id) = obj.as_reference() else {
                continue;
            };
            let is_image = matches!(
                self.doc.get_object(id),
                Ok(Object::Stream(s)) if s.dict.get(b"Subtype").and_then(|t| t.as_name()).ok() == Some(b"Image".as_slice())
            );
            if is_image && !refs.contains(&id) {
                refs.push(id);
            }
        }

        Ok(refs)
    }

    fn image(&self, id: ImageRef) -> Result<RawImage> {
        let stream = match self.doc.get_object(id) {
            Ok(Object::Stream(s)) => s,
            Ok(_) => return Err(Error::image_decode(id, "not a stream")),
            Err(e) => return Err(Error::image_decode(id, e.to_string())),
        };
        let dict = &stream.dict;

        let dimension = |key: &[u8]| -> Result<u32> {
            dict.get(key)
                .ok()
                .and_then(|o| self.resolve(o))
                .and_then(|o| o.as_i64().ok())
                .filter(|v| *v > 0)
                .map(|v| v as u32)
                .ok_or_else(|| {
                    Error::image_decode(
                        id,
                        format!("missing {}", String::from_utf8_lossy(key)),
                    )
                })
        };
        let width = dimension(b"Width")?;
        let height = dimension(b"Height")?;

        let is_mask = dict
            .get(b"ImageMask")
            .and_then(|m| m.as_bool())
            .unwrap_or(false);

        let bits_per_component = if is_mask {
            1
        } else {
            dict.get(b"BitsPerComponent")
                .ok()
                .and_then(|b| b.as_i64().ok())
                .unwrap_or(8) as u8
        };

        let color_space = match dict.get(b"ColorSpace") {
            Ok(cs) => self.color_space(cs),
            Err(_) if is_mask => ColorSpace::Gray,
            Err(_) => ColorSpace::Unsupported("missing ColorSpace".to_string()),
        };

        let filter = match dict.get(b"Filter").ok().and_then(|f| self.resolve(f)) {
            Some(Object::Name(n)) => Some(String::from_utf8_lossy(n).into_owned()),
            Some(Object::Array(arr)) => arr
                .last()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).into_owned()),
            _ => None,
        };

        let data = match filter.as_deref() {
            Some("DCTDecode") | Some("JPXDecode") | Some("CCITTFaxDecode") | Some("JBIG2Decode") => {
                stream.content.clone()
            }
            None => stream.content.clone(),
            Some(_) => stream
                .decompressed_content()
                .map_err(|e| Error::image_decode(id, e.to_string()))?,
        };

        Ok(RawImage {
            id,
            width,
            height,
            bits_per_component,
            color_space,
            filter,
            data,
        })
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page)
            .map_err(|e| Error::ContentStream(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(c) => c,
            // A page without content is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        let streams: Vec<&Object> = match self.resolve(contents) {
            Some(Object::Array(arr)) => arr.iter().collect(),
            Some(single) => vec![single],
            None => return Err(Error::ContentStream("unresolvable Contents".to_string())),
        };

        let mut content = Vec::new();
        for obj in streams {
            match self.resolve(obj) {
                Some(Object::Stream(s)) => {
                    let data = s
                        .decompressed_content()
                        .unwrap_or_else(|_| s.content.clone());
                    content.extend_from_slice(&data);
                    content.push(b' ');
                }
                _ => return Err(Error::ContentStream("invalid content stream".to_string())),
            }
        }
        Ok(content)
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content = lopdf::content::Content::decode(data)
            .map_err(|e| Error::ContentStream(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font: &[u8], bytes: &[u8]) -> String {
        if let Ok(fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = fonts.get(font) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_simple_utf8() {
        assert_eq!(decode_text_simple(b"Sijainti"), "Sijainti");
    }

    #[test]
    fn test_decode_text_simple_latin1() {
        // 0xE4 = 'ä' in Latin-1
        let bytes = vec![0x6B, 0x79, 0x6C, 0x6C, 0xE4];
        assert_eq!(decode_text_simple(&bytes), "kyllä");
    }

    #[test]
    fn test_decode_text_simple_utf16be() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_simple(&bytes), "Hi");
    }

    #[test]
    fn test_check_header() {
        assert_eq!(check_header(b"%PDF-1.7\n%test").unwrap(), "1.7");
        assert!(matches!(check_header(b""), Err(Error::UnknownFormat)));
        assert!(matches!(check_header(b"%PDF"), Err(Error::UnknownFormat)));
        assert!(matches!(
            check_header(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(
            check_header(b"%PDF-x.y"),
            Err(Error::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_load_bytes_rejects_garbage() {
        assert!(LopdfBackend::load_bytes(b"not a pdf").is_err());
        assert!(LopdfBackend::load_bytes(b"%PDF-1.4\ngarbage").is_err());
    }

    #[test]
    fn test_content_op_number() {
        let op = ContentOp {
            operator: "Td".to_string(),
            operands: vec![PdfValue::Integer(72), PdfValue::Real(1.5)],
        };
        assert_eq!(op.number(0, 0.0), 72.0);
        assert_eq!(op.number(1, 0.0), 1.5);
        assert_eq!(op.number(2, 9.0), 9.0);
    }

    #[test]
    fn test_color_space_components() {
        assert_eq!(ColorSpace::Gray.components(), 1);
        assert_eq!(ColorSpace::Rgb.components(), 3);
        assert_eq!(ColorSpace::Cmyk.components(), 4);
    }
}
