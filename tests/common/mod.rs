//! Synthetic presentation sheets built with lopdf.

#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Label column and value column positions, in points.
pub const LABEL_X: i64 = 50;
pub const VALUE_X: i64 = 250;

/// How text cells are positioned in the content stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `BT /F1 10 Tf x y Td (...) Tj ET`
    Td,
    /// `q 1 0 0 1 x y cm BT /F1 10 Tf 0 0 Td (...) Tj ET Q`, as browsers print
    Cm,
    /// `BT /F1 1 Tf 10 0 0 10 x y Tm`, labels shown in two fragments split at
    /// the first space
    ScaledTm,
}

pub struct SheetBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<Object>,
}

impl SheetBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            doc,
            pages_id,
            font_id,
            kids: Vec::new(),
        }
    }

    /// A 2x2 uncompressed DeviceRGB image filled with one color.
    pub fn rgb_image(&mut self, rgb: [u8; 3]) -> ObjectId {
        let data: Vec<u8> = rgb.iter().copied().cycle().take(12).collect();
        self.raw_image(2, 2, data)
    }

    /// An image whose sample data is shorter than its dimensions need.
    pub fn truncated_image(&mut self) -> ObjectId {
        self.raw_image(4, 4, vec![0; 5])
    }

    fn raw_image(&mut self, width: i64, height: i64, data: Vec<u8>) -> ObjectId {
        self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            data,
        ))
    }

    /// An 8x8 DCT-encoded image.
    pub fn jpeg_image(&mut self, rgb: [u8; 3]) -> ObjectId {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb(rgb)));
        let mut jpeg = Vec::new();
        img.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, 95))
            .unwrap();

        self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ))
    }

    /// Add a page with label/value rows top to bottom and the given images.
    pub fn page(&mut self, rows: &[(&str, &str)], images: &[ObjectId]) -> &mut Self {
        self.page_with(Layout::Td, rows, images)
    }

    pub fn page_with(
        &mut self,
        layout: Layout,
        rows: &[(&str, &str)],
        images: &[ObjectId],
    ) -> &mut Self {
        let mut operations = Vec::new();
        let mut y: i64 = 760;
        for (label, value) in rows {
            for (x, text) in [(LABEL_X, *label), (VALUE_X, *value)] {
                if !text.is_empty() {
                    cell(&mut operations, layout, x, y, text, x == LABEL_X);
                }
            }
            y -= 20;
        }

        let mut xobjects = lopdf::Dictionary::new();
        for (i, id) in images.iter().enumerate() {
            let name = format!("Im{}", i + 1);
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![100.into(), 0.into(), 0.into(), 100.into(), 50.into(), (300 - 110 * i as i64).into()],
            ));
            operations.push(Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]));
            operations.push(Operation::new("Q", vec![]));
            xobjects.set(name, *id);
        }

        let content = Content { operations };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => self.font_id },
                "XObject" => xobjects,
            },
        });
        self.kids.push(page_id.into());
        self
    }

    pub fn build(&mut self) -> Vec<u8> {
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids.clone(),
            "Count" => self.kids.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        self.doc.save_to(&mut buf).unwrap();
        buf
    }
}

fn tj(text: &str) -> Operation {
    Operation::new("Tj", vec![Object::string_literal(win_ansi(text))])
}

fn cell(ops: &mut Vec<Operation>, layout: Layout, x: i64, y: i64, text: &str, is_label: bool) {
    match layout {
        Layout::Td => {
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
            ops.push(Operation::new("Td", vec![x.into(), y.into()]));
            ops.push(tj(text));
            ops.push(Operation::new("ET", vec![]));
        }
        Layout::Cm => {
            ops.push(Operation::new("q", vec![]));
            ops.push(Operation::new(
                "cm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), x.into(), y.into()],
            ));
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
            ops.push(Operation::new("Td", vec![0.into(), 0.into()]));
            ops.push(tj(text));
            ops.push(Operation::new("ET", vec![]));
            ops.push(Operation::new("Q", vec![]));
        }
        Layout::ScaledTm => {
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec!["F1".into(), 1.into()]));
            ops.push(Operation::new(
                "Tm",
                vec![10.into(), 0.into(), 0.into(), 10.into(), x.into(), y.into()],
            ));
            match text.find(' ') {
                Some(split) if is_label => {
                    ops.push(tj(&text[..split]));
                    ops.push(tj(&text[split..]));
                }
                _ => ops.push(tj(text)),
            }
            ops.push(Operation::new("ET", vec![]));
        }
    }
}

/// Latin-1 subset of WinAnsiEncoding, enough for Finnish labels.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(|c| c as u32 as u8).collect()
}

/// A typical one-page sheet.
pub fn listing_rows() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Sijainti", "Mannerheimintie 4 A 12, 00100 Helsinki"),
        ("Kaupunginosa", "Kamppi"),
        ("Kerros", "6 / 6"),
        ("Asuinpinta-ala", "54,5 m²"),
        ("Huoneiston kokoonpano", "2h + kk + s"),
        ("Huoneita", "2"),
        ("Vuokra/kk", "1 200,00"),
        ("Vakuus", "2 400"),
        ("Rakennusvuosi", "1962"),
        ("Rakennuksen tyyppi", "Kerrostalo"),
        ("Lämmitys", "Kaukolämpö"),
        ("Parveke", "Kyllä"),
        ("Hissi", "Kyllä"),
        ("Asunnossa sauna", "Ei"),
        ("Taloyhtiössä on sauna", "Kyllä"),
    ]
}
