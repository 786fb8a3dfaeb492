//! Image XObject lookup and decoding.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::trace;

use crate::models::{ColorMode, ExtractedImage, ImageEncoding};

/// Color space of an image XObject.
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed { base: Box<ColorSpace>, lookup: Vec<u8> },
    Unknown(String),
}

impl ColorSpace {
    fn mode(&self) -> ColorMode {
        match self {
            ColorSpace::Gray => ColorMode::Gray,
            ColorSpace::Rgb => ColorMode::Rgb,
            ColorSpace::Cmyk => ColorMode::Cmyk,
            ColorSpace::Indexed { .. } => ColorMode::Indexed,
            ColorSpace::Unknown(_) => ColorMode::Unknown,
        }
    }

    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Cmyk => 4,
            ColorSpace::Rgb | ColorSpace::Unknown(_) => 3,
        }
    }
}

/// Walk up the page tree until `key` is found.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page_id;
    // Page trees are shallow; the bound only guards against /Parent cycles.
    for _ in 0..64 {
        let dict = doc.get_object(current).and_then(|o| o.as_dict()).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok()?;
    }
    None
}

/// Image XObjects referenced by a page, in resource dictionary order.
pub(crate) fn page_image_streams(doc: &Document, page_id: ObjectId) -> Vec<&Stream> {
    let Some(resources) = resolve_inherited(doc, page_id, b"Resources") else {
        return Vec::new();
    };
    let Ok((_, Object::Dictionary(resources))) = doc.dereference(resources) else {
        return Vec::new();
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Vec::new();
    };
    let Ok((_, Object::Dictionary(xobjects))) = doc.dereference(xobjects) else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, obj)| match doc.dereference(obj) {
            Ok((_, Object::Stream(stream))) if is_image(&stream.dict) => Some(stream),
            _ => None,
        })
        .collect()
}

fn is_image(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .and_then(|s| s.as_name())
        .map(|name| name == b"Image")
        .unwrap_or(false)
}

/// Decode an image XObject into JPEG passthrough or PNG bytes.
pub(crate) fn decode_image(
    doc: &Document,
    stream: &Stream,
    page: u32,
    index: u32,
) -> Result<ExtractedImage, String> {
    let dict = &stream.dict;
    let width = dimension(dict, b"Width")?;
    let height = dimension(dict, b"Height")?;
    let color_space = dict
        .get(b"ColorSpace")
        .map(|cs| color_space(doc, cs))
        .unwrap_or(ColorSpace::Rgb);

    trace!(
        "Decoding image {} on page {}: {}x{} {:?}",
        index, page, width, height, color_space.mode()
    );

    let filters = filters(dict);
    let (data, encoding) = if filters.iter().any(|f| f == "DCTDecode") {
        (stream.content.clone(), ImageEncoding::Jpeg)
    } else if let Some(unsupported) = filters
        .iter()
        .find(|f| matches!(f.as_str(), "JPXDecode" | "CCITTFaxDecode" | "JBIG2Decode"))
    {
        return Err(format!("unsupported image filter {}", unsupported));
    } else {
        let raw = if filters.is_empty() {
            stream.content.clone()
        } else {
            stream
                .decompressed_content()
                .map_err(|e| format!("failed to decompress image: {}", e))?
        };
        let bits = dict
            .get(b"BitsPerComponent")
            .and_then(|b| b.as_i64())
            .unwrap_or(8);
        let img = raw_to_image(&raw, width, height, &color_space, bits)?;
        (encode_png(&img)?, ImageEncoding::Png)
    };

    Ok(ExtractedImage {
        data,
        width,
        height,
        color_mode: color_space.mode(),
        encoding,
        page,
        index,
    })
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32, String> {
    dict.get(key)
        .and_then(|v| v.as_i64())
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|&v| v > 0)
        .ok_or_else(|| format!("missing or invalid /{}", String::from_utf8_lossy(key)))
}

fn filters(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

fn color_space(doc: &Document, obj: &Object) -> ColorSpace {
    let obj = match doc.dereference(obj) {
        Ok((_, resolved)) => resolved,
        Err(_) => return ColorSpace::Unknown("unresolvable".to_string()),
    };

    match obj {
        Object::Name(name) => named_color_space(name),
        Object::Array(arr) => {
            let family = arr.first().and_then(|o| o.as_name().ok()).unwrap_or(b"");
            match family {
                b"ICCBased" => icc_color_space(doc, arr.get(1)),
                b"Indexed" | b"I" => {
                    let base = arr
                        .get(1)
                        .map(|b| color_space(doc, b))
                        .unwrap_or(ColorSpace::Rgb);
                    let lookup = arr.get(3).map(|l| lookup_bytes(doc, l)).unwrap_or_default();
                    ColorSpace::Indexed { base: Box::new(base), lookup }
                }
                b"CalRGB" => ColorSpace::Rgb,
                b"CalGray" => ColorSpace::Gray,
                other => named_color_space(other),
            }
        }
        _ => ColorSpace::Unknown("non-name color space".to_string()),
    }
}

fn named_color_space(name: &[u8]) -> ColorSpace {
    match name {
        b"DeviceRGB" | b"RGB" => ColorSpace::Rgb,
        b"DeviceGray" | b"G" => ColorSpace::Gray,
        b"DeviceCMYK" | b"CMYK" => ColorSpace::Cmyk,
        other => ColorSpace::Unknown(String::from_utf8_lossy(other).into_owned()),
    }
}

/// ICC profiles are described by their component count.
fn icc_color_space(doc: &Document, profile: Option<&Object>) -> ColorSpace {
    let n = profile
        .and_then(|p| doc.dereference(p).ok())
        .and_then(|(_, o)| o.as_stream().ok())
        .and_then(|s| s.dict.get(b"N").and_then(|n| n.as_i64()).ok());
    match n {
        Some(1) => ColorSpace::Gray,
        Some(4) => ColorSpace::Cmyk,
        _ => ColorSpace::Rgb,
    }
}

fn lookup_bytes(doc: &Document, obj: &Object) -> Vec<u8> {
    match doc.dereference(obj) {
        Ok((_, Object::String(bytes, _))) => bytes.clone(),
        Ok((_, Object::Stream(stream))) => stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
        _ => Vec::new(),
    }
}

fn raw_to_image(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &ColorSpace,
    bits: i64,
) -> Result<DynamicImage, String> {
    let pixels = width as usize * height as usize;

    if bits == 1 && *color_space == ColorSpace::Gray {
        return Ok(DynamicImage::ImageLuma8(expand_bilevel(data, width, height)?));
    }
    if bits != 8 {
        return Err(format!("unsupported bits per component: {}", bits));
    }

    let expected = pixels * color_space.components();
    if data.len() < expected {
        return Err(format!(
            "image data too short: {} bytes, expected {}",
            data.len(),
            expected
        ));
    }
    let data = &data[..expected];

    let img = match color_space {
        ColorSpace::Gray => GrayImage::from_raw(width, height, data.to_vec()).map(DynamicImage::ImageLuma8),
        ColorSpace::Cmyk => RgbImage::from_raw(width, height, cmyk_to_rgb(data)).map(DynamicImage::ImageRgb8),
        ColorSpace::Indexed { base, lookup } => {
            let rgb = expand_indexed(data, base, lookup)?;
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
        ColorSpace::Rgb | ColorSpace::Unknown(_) => {
            RgbImage::from_raw(width, height, data.to_vec()).map(DynamicImage::ImageRgb8)
        }
    };

    img.ok_or_else(|| "failed to create image from raw data".to_string())
}

/// 1-bit rows are padded to a whole byte; a set bit is white.
fn expand_bilevel(data: &[u8], width: u32, height: u32) -> Result<GrayImage, String> {
    let row_bytes = (width as usize).div_ceil(8);
    if data.len() < row_bytes * height as usize {
        return Err("bilevel image data too short".to_string());
    }

    let mut out = Vec::with_capacity(width as usize * height as usize);
    for row in data.chunks_exact(row_bytes).take(height as usize) {
        for x in 0..width as usize {
            let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
            out.push(if bit == 1 { 255 } else { 0 });
        }
    }
    GrayImage::from_raw(width, height, out).ok_or_else(|| "failed to create bilevel image".to_string())
}

fn expand_indexed(indices: &[u8], base: &ColorSpace, lookup: &[u8]) -> Result<Vec<u8>, String> {
    let comps = base.components();
    let mut rgb = Vec::with_capacity(indices.len() * 3);
    for &i in indices {
        let start = i as usize * comps;
        let entry = lookup
            .get(start..start + comps)
            .ok_or_else(|| format!("palette index {} out of range", i))?;
        match base {
            ColorSpace::Gray => rgb.extend_from_slice(&[entry[0], entry[0], entry[0]]),
            ColorSpace::Cmyk => rgb.extend_from_slice(&cmyk_to_rgb(entry)),
            _ => rgb.extend_from_slice(entry),
        }
    }
    Ok(rgb)
}

/// Convert CMYK bytes to RGB.
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((cmyk.len() / 4) * 3);
    for chunk in cmyk.chunks_exact(4) {
        let k = 1.0 - f32::from(chunk[3]) / 255.0;
        for &c in &chunk[..3] {
            rgb.push((255.0 * (1.0 - f32::from(c) / 255.0) * k) as u8);
        }
    }
    rgb
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, String> {
    let mut data = Vec::new();
    img.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {}", e))?;
    Ok(data)
}
