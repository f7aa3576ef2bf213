//! Embedded image extraction with trailing duplicate-page detection.

use std::collections::BTreeSet;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};

use super::backend::{ColorSpace, ImageRef, PdfBackend, RawImage};
use super::options::ImageOutput;
use crate::error::{Error, Result};
use crate::model::ImageSet;

/// Collect images from the last page backwards.
///
/// The scan stops at the first page whose (non-empty) set of image
/// references equals that of the last page that had images: vendors append
/// the same cover pages to every listing, and everything from that point
/// back is boilerplate. Pages without images do not reset the comparison.
///
/// Any image that fails to decode fails the whole call.
pub fn extract_images<B: PdfBackend + ?Sized>(backend: &B, output: &ImageOutput) -> Result<ImageSet> {
    let mut images = ImageSet::new(output.extension());
    let mut previous: Option<BTreeSet<ImageRef>> = None;

    for (&page_num, &page_id) in backend.pages().iter().rev() {
        let refs = backend.page_images(page_id)?;
        if refs.is_empty() {
            continue;
        }

        let current: BTreeSet<ImageRef> = refs.iter().copied().collect();
        if previous.as_ref() == Some(&current) {
            log::debug!(
                "Page {}: same {} image(s) as the following page, stopping",
                page_num,
                current.len()
            );
            break;
        }

        for id in &refs {
            let raw = backend.image(*id)?;
            let decoded = decode_raw(&raw)?;
            images.push(encode(&decoded, output)?);
        }
        log::debug!("Page {}: {} image(s)", page_num, refs.len());

        previous = Some(current);
    }

    Ok(images)
}

/// Decode an image XObject into a raster.
pub fn decode_raw(raw: &RawImage) -> Result<DynamicImage> {
    match raw.filter.as_deref() {
        Some("DCTDecode") => image::load_from_memory_with_format(&raw.data, ImageFormat::Jpeg)
            .map_err(|e| Error::image_decode(raw.id, e.to_string())),
        None | Some("FlateDecode") | Some("LZWDecode") | Some("RunLengthDecode") => {
            decode_samples(raw)
        }
        Some(other) => Err(Error::image_decode(
            raw.id,
            format!("unsupported filter {}", other),
        )),
    }
}

/// Re-encode a raster per the configured output format.
pub fn encode(image: &DynamicImage, output: &ImageOutput) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match *output {
        ImageOutput::Jpeg { quality } => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            // JPEG has no alpha channel.
            match image {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => {
                    image.write_with_encoder(encoder)?
                }
                other => DynamicImage::ImageRgb8(other.to_rgb8()).write_with_encoder(encoder)?,
            }
        }
        ImageOutput::Png => image.write_with_encoder(PngEncoder::new(&mut buf))?,
    }
    Ok(buf)
}

/// Decode uncompressed sample data.
fn decode_samples(raw: &RawImage) -> Result<DynamicImage> {
    let (width, height) = (raw.width, raw.height);
    let components = match &raw.color_space {
        ColorSpace::Unsupported(name) => return Err(unsupported_space(raw, name)),
        space => space.components(),
    };

    let samples = unpack_samples(raw, components)?;

    let pixels = match &raw.color_space {
        ColorSpace::Gray => {
            let gray = scale_to_8bit(samples, raw.bits_per_component);
            return GrayImage::from_raw(width, height, gray)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| Error::image_decode(raw.id, "sample buffer size mismatch"));
        }
        ColorSpace::Rgb => scale_to_8bit(samples, raw.bits_per_component),
        ColorSpace::Cmyk => cmyk_to_rgb(&scale_to_8bit(samples, raw.bits_per_component)),
        ColorSpace::Indexed { base, hival, lookup } => {
            palette_to_rgb(&samples, base, *hival, lookup)
                .ok_or_else(|| Error::image_decode(raw.id, "unsupported palette"))?
        }
        ColorSpace::Unsupported(name) => return Err(unsupported_space(raw, name)),
    };

    RgbImage::from_raw(width, height, pixels)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| Error::image_decode(raw.id, "sample buffer size mismatch"))
}

fn unsupported_space(raw: &RawImage, name: &str) -> Error {
    Error::image_decode(raw.id, format!("unsupported color space {}", name))
}

/// Split packed rows into one byte per sample, unscaled.
///
/// Rows start on byte boundaries; 16-bit samples keep their high byte.
fn unpack_samples(raw: &RawImage, components: usize) -> Result<Vec<u8>> {
    let bpc = raw.bits_per_component as usize;
    if !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
        return Err(Error::image_decode(
            raw.id,
            format!("unsupported bits per component {}", bpc),
        ));
    }

    let samples_per_row = raw.width as usize * components;
    let row_bytes = (samples_per_row * bpc).div_ceil(8);
    let needed = row_bytes * raw.height as usize;
    if raw.data.len() < needed {
        return Err(Error::image_decode(
            raw.id,
            format!("truncated data ({} < {} bytes)", raw.data.len(), needed),
        ));
    }

    let mut out = Vec::with_capacity(samples_per_row * raw.height as usize);
    for row in raw.data[..needed].chunks_exact(row_bytes) {
        match bpc {
            8 => out.extend_from_slice(row),
            16 => out.extend(row.chunks_exact(2).map(|pair| pair[0])),
            _ => {
                let mask = (1u8 << bpc) - 1;
                let per_byte = 8 / bpc;
                out.extend((0..samples_per_row).map(|i| {
                    let shift = 8 - bpc * (i % per_byte + 1);
                    (row[i / per_byte] >> shift) & mask
                }));
            }
        }
    }
    Ok(out)
}

fn scale_to_8bit(samples: Vec<u8>, bits_per_component: u8) -> Vec<u8> {
    match bits_per_component {
        1 | 2 | 4 => {
            let max = (1u16 << bits_per_component) - 1;
            samples
                .into_iter()
                .map(|s| (s as u16 * 255 / max) as u8)
                .collect()
        }
        _ => samples,
    }
}

fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u16;
            [
                ((255 - px[0] as u16) * k / 255) as u8,
                ((255 - px[1] as u16) * k / 255) as u8,
                ((255 - px[2] as u16) * k / 255) as u8,
            ]
        })
        .collect()
}

/// Expand palette indices to RGB. Out-of-range indices clamp to `hival`.
fn palette_to_rgb(indices: &[u8], base: &ColorSpace, hival: u8, lookup: &[u8]) -> Option<Vec<u8>> {
    let n = match base {
        ColorSpace::Gray | ColorSpace::Rgb | ColorSpace::Cmyk => base.components(),
        _ => return None,
    };
    if lookup.len() < (hival as usize + 1) * n {
        return None;
    }

    let mut out = Vec::with_capacity(indices.len() * 3);
    for &index in indices {
        let start = index.min(hival) as usize * n;
        let entry = &lookup[start..start + n];
        match base {
            ColorSpace::Gray => out.extend_from_slice(&[entry[0]; 3]),
            ColorSpace::Rgb => out.extend_from_slice(entry),
            _ => out.extend(cmyk_to_rgb(entry)),
        }
    }
    Some(out)
}
