//! Embedded image extraction from PDF documents

use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use log::{debug, info, warn};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::Path;

use super::workspace::TempWorkspace;
use crate::error::{IngestError, Result};
use crate::sequence::{ImagePath, ImageSequence};

const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Writes every image XObject of a PDF into a workspace, page by page.
///
/// Files land in `<workspace>/<pdf file name>/page_<p>_<i>_<name>.<ext>` where
/// `p` is the zero-based page index, `i` the image index within that page and
/// `name` the resource name the page uses for the image.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfImageExtractor;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PageImage {
    name: String,
    id: ObjectId,
}

struct EncodedImage {
    bytes: Vec<u8>,
    extension: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    Indexed {
        base: Box<ColorModel>,
        palette: Vec<u8>,
    },
}

impl ColorModel {
    fn components(&self) -> usize {
        match self {
            ColorModel::Gray | ColorModel::Indexed { .. } => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }
}

impl PdfImageExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, pdf: &Path, workspace: &TempWorkspace) -> Result<ImageSequence> {
        let mut sequence = ImageSequence::new();
        self.extract_into(pdf, workspace, &mut sequence)?;
        Ok(sequence)
    }

    /// Append extracted images to `out` and return how many were written.
    ///
    /// On error `out` keeps every image written before the failure.
    pub fn extract_into(
        &self,
        pdf: &Path,
        workspace: &TempWorkspace,
        out: &mut ImageSequence,
    ) -> Result<usize> {
        let root = workspace.path().ok_or_else(|| {
            IngestError::io(
                workspace.parent(),
                io::Error::new(io::ErrorKind::NotFound, "workspace has been released"),
            )
        })?;

        let bytes = fs::read(pdf).map_err(|e| IngestError::io(pdf, e))?;
        let doc = Document::load_mem(&bytes).map_err(|e| IngestError::parse(pdf, e.to_string()))?;

        let pdf_name = pdf
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let target = root.join(sanitize_filename(&pdf_name));
        fs::create_dir_all(&target).map_err(|e| IngestError::io(&target, e))?;

        let pages = doc.get_pages();
        debug!("{pdf:?} has {} pages", pages.len());

        let mut written = 0;
        for (page_index, page_id) in pages.into_values().enumerate() {
            for (image_index, image) in page_images(&doc, page_id).into_iter().enumerate() {
                let encoded = encode_image(&doc, image.id).map_err(|detail| {
                    IngestError::parse(
                        pdf,
                        format!("page {page_index}, image {}: {detail}", image.name),
                    )
                })?;

                let file_name = format!(
                    "page_{page_index}_{image_index}_{}.{}",
                    sanitize_filename(&image.name),
                    encoded.extension
                );
                let path = target.join(file_name);
                fs::write(&path, &encoded.bytes).map_err(|e| IngestError::io(&path, e))?;
                debug!("Extracted {path:?}");

                out.push(ImagePath::from(path));
                written += 1;
            }
        }

        info!("Extracted {written} images from {pdf:?}");
        Ok(written)
    }
}

fn page_images(doc: &Document, page_id: ObjectId) -> Vec<PageImage> {
    let mut images = Vec::new();
    let mut visited_forms = HashSet::new();
    if let Some(resources) = page_resources(doc, page_id) {
        collect_images(doc, resources, "", &mut images, &mut visited_forms);
    }
    images
}

/// Resources are inheritable, so walk up the page tree until a node has them
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn collect_images(
    doc: &Document,
    resources: &Dictionary,
    prefix: &str,
    images: &mut Vec<PageImage>,
    visited_forms: &mut HashSet<ObjectId>,
) {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return;
    };

    for (key, value) in xobjects.iter() {
        let name = format!("{prefix}{}", String::from_utf8_lossy(key));
        let Ok(id) = value.as_reference() else {
            continue;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(id) else {
            warn!("XObject {name} does not resolve to a stream");
            continue;
        };

        match name_value(stream.dict.get(b"Subtype").ok()).as_deref() {
            Some("Image") => images.push(PageImage { name, id }),
            Some("Form") if visited_forms.insert(id) => {
                if let Some(form_resources) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|obj| resolve_dict(doc, obj))
                {
                    collect_images(
                        doc,
                        form_resources,
                        &format!("{name}_"),
                        images,
                        visited_forms,
                    );
                }
            }
            _ => {}
        }
    }
}

fn encode_image(doc: &Document, id: ObjectId) -> std::result::Result<EncodedImage, String> {
    let stream = match doc.get_object(id) {
        Ok(Object::Stream(stream)) => stream,
        _ => return Err("not an image stream".to_string()),
    };

    // Compressed formats the viewer can open directly are written untouched
    let filters = stream_filters(stream);
    match filters.last().map(String::as_str) {
        Some("DCTDecode") | Some("DCT") if filters.len() == 1 => {
            return Ok(EncodedImage {
                bytes: stream.content.clone(),
                extension: "jpg",
            });
        }
        Some("JPXDecode") if filters.len() == 1 => {
            return Ok(EncodedImage {
                bytes: stream.content.clone(),
                extension: "jp2",
            });
        }
        _ => {}
    }

    let data = decoded_bytes(doc, stream)?;

    let width = positive_dimension(doc, &stream.dict, b"Width")?;
    let height = positive_dimension(doc, &stream.dict, b"Height")?;
    let image_mask = matches!(stream.dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let (model, bits) = if image_mask {
        (ColorModel::Gray, 1)
    } else {
        let bits = dict_integer(doc, &stream.dict, b"BitsPerComponent").unwrap_or(8);
        (color_model(doc, stream.dict.get(b"ColorSpace").ok())?, bits)
    };

    let image = decode_pixels(&model, bits, width, height, &data)?;
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| format!("failed to encode PNG: {e}"))?;

    Ok(EncodedImage {
        bytes,
        extension: "png",
    })
}

fn decoded_bytes(doc: &Document, stream: &Stream) -> std::result::Result<Vec<u8>, String> {
    let filters = stream_filters(stream);
    let filters: Vec<&str> = filters.iter().map(String::as_str).collect();
    match filters.as_slice() {
        [] => Ok(stream.content.clone()),
        ["FlateDecode"] | ["Fl"] => {
            let inflated = inflate(&stream.content)?;
            apply_predictor(doc, &stream.dict, inflated)
        }
        other => Err(format!("unsupported filter chain {other:?}")),
    }
}

fn inflate(data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decoded = Vec::new();
    decoder
        .read_to_end(&mut decoded)
        .map_err(|e| format!("corrupt Flate stream: {e}"))?;
    Ok(decoded)
}

fn apply_predictor(
    doc: &Document,
    dict: &Dictionary,
    data: Vec<u8>,
) -> std::result::Result<Vec<u8>, String> {
    let params = dict
        .get(b"DecodeParms")
        .ok()
        .and_then(|obj| match resolve(doc, obj) {
            Object::Array(items) => items.first().and_then(|first| resolve_dict(doc, first)),
            other => resolve_dict(doc, other),
        });
    let Some(params) = params else {
        return Ok(data);
    };

    let param = |key: &[u8], default: usize| {
        dict_integer(doc, params, key)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(default)
    };
    match param(b"Predictor", 1) {
        1 => Ok(data),
        10..=15 => undo_png_predictor(
            &data,
            param(b"Colors", 1),
            param(b"BitsPerComponent", 8),
            param(b"Columns", 1),
        ),
        other => Err(format!("unsupported predictor {other}")),
    }
}

/// Reverse the per-row PNG filters applied before Flate compression
fn undo_png_predictor(
    data: &[u8],
    colors: usize,
    bits: usize,
    columns: usize,
) -> std::result::Result<Vec<u8>, String> {
    let bits_per_pixel = colors
        .checked_mul(bits)
        .ok_or_else(|| "predictor pixel size overflows".to_string())?;
    let bytes_per_pixel = bits_per_pixel.div_ceil(8).max(1);
    let row_len = columns
        .checked_mul(bits_per_pixel)
        .ok_or_else(|| "predictor row size overflows".to_string())?
        .div_ceil(8);
    if row_len == 0 {
        return Err("predictor row has zero length".to_string());
    }
    if row_len >= data.len() {
        return Err(format!(
            "predictor row of {row_len} bytes exceeds {} bytes of data",
            data.len()
        ));
    }

    let mut out = Vec::with_capacity(data.len());
    let mut previous = vec![0u8; row_len];
    for chunk in data.chunks_exact(row_len + 1) {
        let filter = chunk[0];
        let mut row = chunk[1..].to_vec();
        for i in 0..row_len {
            let left = if i >= bytes_per_pixel { row[i - bytes_per_pixel] } else { 0 };
            let up = previous[i];
            let upper_left = if i >= bytes_per_pixel {
                previous[i - bytes_per_pixel]
            } else {
                0
            };
            let predicted = match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, upper_left),
                other => return Err(format!("invalid PNG row filter {other}")),
            };
            row[i] = row[i].wrapping_add(predicted);
        }
        out.extend_from_slice(&row);
        previous = row;
    }
    Ok(out)
}

fn paeth(left: u8, up: u8, upper_left: u8) -> u8 {
    let estimate = i16::from(left) + i16::from(up) - i16::from(upper_left);
    let distance_left = (estimate - i16::from(left)).abs();
    let distance_up = (estimate - i16::from(up)).abs();
    let distance_upper_left = (estimate - i16::from(upper_left)).abs();
    if distance_left <= distance_up && distance_left <= distance_upper_left {
        left
    } else if distance_up <= distance_upper_left {
        up
    } else {
        upper_left
    }
}

fn color_model(doc: &Document, obj: Option<&Object>) -> std::result::Result<ColorModel, String> {
    let Some(obj) = obj else {
        return Ok(ColorModel::Rgb);
    };

    match resolve(doc, obj) {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorModel::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorModel::Cmyk),
            other => Err(format!(
                "unsupported color space {}",
                String::from_utf8_lossy(other)
            )),
        },
        Object::Array(items) => {
            let family = name_value(items.first().map(|first| resolve(doc, first)));
            match family.as_deref() {
                Some("CalGray") => Ok(ColorModel::Gray),
                Some("CalRGB") => Ok(ColorModel::Rgb),
                Some("ICCBased") => {
                    let Some(Object::Stream(profile)) = items.get(1).map(|o| resolve(doc, o))
                    else {
                        return Err("ICCBased color space without profile".to_string());
                    };
                    match dict_integer(doc, &profile.dict, b"N") {
                        Some(1) => Ok(ColorModel::Gray),
                        Some(3) => Ok(ColorModel::Rgb),
                        Some(4) => Ok(ColorModel::Cmyk),
                        other => Err(format!("unsupported ICC component count {other:?}")),
                    }
                }
                Some("Indexed") | Some("I") => {
                    let base = color_model(doc, items.get(1))?;
                    if matches!(base, ColorModel::Indexed { .. }) {
                        return Err("nested Indexed color space".to_string());
                    }
                    let palette = match items.get(3).map(|o| resolve(doc, o)) {
                        Some(Object::String(bytes, _)) => bytes.clone(),
                        Some(Object::Stream(lookup)) => decoded_bytes(doc, lookup)?,
                        _ => return Err("Indexed color space without lookup table".to_string()),
                    };
                    Ok(ColorModel::Indexed {
                        base: Box::new(base),
                        palette,
                    })
                }
                other => Err(format!("unsupported color space {other:?}")),
            }
        }
        _ => Err("malformed color space".to_string()),
    }
}

fn decode_pixels(
    model: &ColorModel,
    bits: i64,
    width: u32,
    height: u32,
    data: &[u8],
) -> std::result::Result<DynamicImage, String> {
    let (w, h) = (width as usize, height as usize);
    let pixels = w
        .checked_mul(h)
        .ok_or_else(|| "image dimensions overflow".to_string())?;
    let byte_len = |per_pixel: usize| {
        pixels
            .checked_mul(per_pixel)
            .ok_or_else(|| "image byte length overflows".to_string())
    };

    let image = match (model, bits) {
        (ColorModel::Gray, 8) => {
            let raw = take(data, pixels)?.to_vec();
            GrayImage::from_raw(width, height, raw).map(DynamicImage::ImageLuma8)
        }
        (ColorModel::Gray, 1) => {
            let row_bytes = w.div_ceil(8);
            let packed_len = row_bytes
                .checked_mul(h)
                .ok_or_else(|| "image byte length overflows".to_string())?;
            let packed = take(data, packed_len)?;
            let mut raw = Vec::with_capacity(packed.len().saturating_mul(8));
            for row in packed.chunks_exact(row_bytes) {
                for x in 0..w {
                    let bit = (row[x / 8] >> (7 - x % 8)) & 1;
                    raw.push(if bit == 1 { 255 } else { 0 });
                }
            }
            GrayImage::from_raw(width, height, raw).map(DynamicImage::ImageLuma8)
        }
        (ColorModel::Rgb, 8) => {
            let raw = take(data, byte_len(3)?)?.to_vec();
            RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8)
        }
        (ColorModel::Cmyk, 8) => {
            let raw: Vec<u8> = take(data, byte_len(4)?)?
                .chunks_exact(4)
                .flat_map(cmyk_to_rgb)
                .collect();
            RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8)
        }
        (ColorModel::Indexed { base, palette }, 8) => {
            let components = base.components();
            let indices = take(data, pixels)?;
            let mut raw = Vec::with_capacity(indices.len() * 3);
            for &index in indices {
                let start = usize::from(index) * components;
                let entry = palette
                    .get(start..start + components)
                    .ok_or_else(|| format!("palette index {index} out of range"))?;
                raw.extend_from_slice(&palette_entry_to_rgb(base, entry));
            }
            RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8)
        }
        (model, bits) => return Err(format!("unsupported {bits}-bit {model:?} image")),
    };

    image.ok_or_else(|| "pixel buffer does not match image size".to_string())
}

fn palette_entry_to_rgb(base: &ColorModel, entry: &[u8]) -> [u8; 3] {
    match base {
        ColorModel::Gray => [entry[0]; 3],
        ColorModel::Rgb => [entry[0], entry[1], entry[2]],
        ColorModel::Cmyk => cmyk_to_rgb(entry),
        ColorModel::Indexed { .. } => [0; 3],
    }
}

fn cmyk_to_rgb(cmyk: &[u8]) -> [u8; 3] {
    let key = 255 - u16::from(cmyk[3]);
    let channel = |ink: u8| ((255 - u16::from(ink)) * key / 255) as u8;
    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
}

fn take(data: &[u8], len: usize) -> std::result::Result<&[u8], String> {
    data.get(..len).ok_or_else(|| {
        format!(
            "truncated image data: {} bytes, expected {len}",
            data.len()
        )
    })
}

fn stream_filters(stream: &Stream) -> Vec<String> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| name_value(Some(item)))
            .collect(),
        _ => Vec::new(),
    }
}

fn positive_dimension(
    doc: &Document,
    dict: &Dictionary,
    key: &[u8],
) -> std::result::Result<u32, String> {
    dict_integer(doc, dict, key)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("missing or invalid {}", String::from_utf8_lossy(key)))
}

fn dict_integer(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match resolve(doc, dict.get(key).ok()?) {
        Object::Integer(n) => Some(*n),
        _ => None,
    }
}

fn name_value(obj: Option<&Object>) -> Option<String> {
    match obj? {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
