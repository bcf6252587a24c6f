//! Embedded image extraction and page-level keyword linking
//!
//! Every image XObject on every page is written to the output directory as
//! `page{N}_img{M}.{ext}`. A keyword found (whole word, case-insensitive) in a
//! page's text is linked to the first image written for that page, unless an
//! earlier page already claimed it. The association is page co-occurrence
//! only: nothing ties the keyword to the specific image.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{ExtractedImage, ImageFormat};

use super::keywords::{KeywordImageMap, KeywordMatcher, KeywordVocabulary};
use super::parser::PdfTextExtractor;

/// Limit on `/Parent` hops when looking for inherited page resources
const MAX_PARENT_DEPTH: usize = 32;

/// Limit on Form XObjects nested inside each other
const MAX_FORM_DEPTH: usize = 8;

/// Output of an extraction pass
#[derive(Debug, Clone, Default)]
pub struct ImageExtraction {
    /// Keyword to first co-occurring image
    pub keyword_map: KeywordImageMap,
    /// Every image written, in page then encounter order
    pub images: Vec<ExtractedImage>,
}

/// Writes page images to disk and links them to vocabulary keywords
pub struct ImageExtractor {
    output_dir: PathBuf,
    matcher: KeywordMatcher,
}

impl ImageExtractor {
    /// Create an extractor writing under `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, vocabulary: &KeywordVocabulary) -> Result<Self> {
        Ok(Self {
            output_dir: output_dir.into(),
            matcher: KeywordMatcher::new(vocabulary)?,
        })
    }

    /// Directory the extracted images are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Load `path` and extract its images
    pub fn extract(&self, path: &Path) -> Result<ImageExtraction> {
        let doc = PdfTextExtractor::load(path)?;
        self.extract_from_document(&doc)
    }

    /// Extract images from an already loaded document.
    ///
    /// Files written before a failure are left in place.
    pub fn extract_from_document(&self, doc: &Document) -> Result<ImageExtraction> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut extraction = ImageExtraction::default();

        for (page_number, page_id) in doc.get_pages() {
            let streams = page_image_streams(doc, page_id);
            if streams.is_empty() {
                continue;
            }

            let page_text = PdfTextExtractor::page_text(doc, page_number).to_lowercase();
            let keywords = self.matcher.matches(&page_text);

            for (idx, stream) in streams.into_iter().enumerate() {
                let image = self.write_image(doc, stream, page_number, idx as u32 + 1)?;

                for keyword in &keywords {
                    if extraction.keyword_map.link_if_absent(keyword, &image.path) {
                        tracing::debug!("Linked '{}' to {}", keyword, image.path.display());
                    }
                }

                extraction.images.push(image);
            }
        }

        tracing::info!(
            "Extracted {} images, {} keywords linked",
            extraction.images.len(),
            extraction.keyword_map.len()
        );

        Ok(extraction)
    }

    fn write_image(
        &self,
        doc: &Document,
        stream: &Stream,
        page_number: u32,
        image_index: u32,
    ) -> Result<ExtractedImage> {
        let (format, bytes) = decode_image(doc, stream);
        let path = self
            .output_dir
            .join(ExtractedImage::file_name(page_number, image_index, format));

        std::fs::write(&path, &bytes)?;

        Ok(ExtractedImage {
            page_number,
            image_index,
            format,
            path,
            byte_len: bytes.len(),
        })
    }
}

/// Follow a reference to a dictionary, or accept an inline one
fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Resources of a page, inherited from ancestors when absent on the page
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut current = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(resources) = current.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }

    None
}

/// Image XObjects of a page in encounter order, each object once.
///
/// Form XObjects are entered through their own `/Resources/XObject`, so an
/// image drawn inside a form is numbered where the form is listed.
fn page_image_streams(doc: &Document, page_id: ObjectId) -> Vec<&Stream> {
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut streams = Vec::new();

    if let Some(xobjects) = page_resources(doc, page_id)
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|obj| resolve_dict(doc, obj))
    {
        collect_image_streams(doc, xobjects, 0, &mut seen, &mut streams);
    }

    streams
}

fn collect_image_streams<'a>(
    doc: &'a Document,
    xobjects: &'a Dictionary,
    depth: usize,
    seen: &mut HashSet<ObjectId>,
    streams: &mut Vec<&'a Stream>,
) {
    for (_name, obj) in xobjects.iter() {
        if let Object::Reference(id) = obj {
            if !seen.insert(*id) {
                continue;
            }
        }

        let Ok(stream) = resolve(doc, obj).as_stream() else {
            continue;
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => streams.push(stream),
            Ok(b"Form") if depth < MAX_FORM_DEPTH => {
                if let Some(nested) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|res| resolve_dict(doc, res))
                    .and_then(|res| res.get(b"XObject").ok())
                    .and_then(|obj| resolve_dict(doc, obj))
                {
                    collect_image_streams(doc, nested, depth + 1, seen, streams);
                }
            }
            Ok(b"Form") => {
                tracing::warn!("Form XObjects nested deeper than {}; skipping", MAX_FORM_DEPTH)
            }
            _ => {}
        }
    }
}

/// Filter names in application order
fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter").map(|obj| resolve(doc, obj)) {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| resolve(doc, item).as_name().ok().map(|n| n.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

fn dict_integer(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key)
        .ok()
        .and_then(|obj| resolve(doc, obj).as_i64().ok())
}

/// Format of a filter that yields a displayable file as stored
fn native_format(filter: &[u8]) -> Option<ImageFormat> {
    match filter {
        b"DCTDecode" => Some(ImageFormat::Jpeg),
        b"JPXDecode" => Some(ImageFormat::Jpx),
        b"JBIG2Decode" => Some(ImageFormat::Jbig2),
        b"CCITTFaxDecode" => Some(ImageFormat::Ccitt),
        _ => None,
    }
}

fn is_pixel_filter(filter: &[u8]) -> bool {
    matches!(filter, b"FlateDecode" | b"LZWDecode")
}

/// How samples map to PNG
#[derive(Debug, Clone, PartialEq, Eq)]
enum PixelLayout {
    Gray,
    Rgb,
    /// Palette expanded to RGB triples
    Indexed(Vec<u8>),
}

impl PixelLayout {
    fn channels(&self) -> usize {
        match self {
            PixelLayout::Gray | PixelLayout::Indexed(_) => 1,
            PixelLayout::Rgb => 3,
        }
    }

    fn supports_depth(&self, bits: u8) -> bool {
        match self {
            PixelLayout::Gray => matches!(bits, 1 | 2 | 4 | 8 | 16),
            PixelLayout::Rgb => matches!(bits, 8 | 16),
            PixelLayout::Indexed(_) => matches!(bits, 1 | 2 | 4 | 8),
        }
    }
}

/// Channels of a device, calibrated or ICC-based color space (1 or 3)
fn base_channels(doc: &Document, color_space: &Object) -> Option<usize> {
    let family: &[u8] = match resolve(doc, color_space) {
        Object::Name(name) => name,
        Object::Array(items) => {
            let family = resolve(doc, items.first()?).as_name().ok()?;
            if family == b"ICCBased" {
                let profile = resolve(doc, items.get(1)?).as_stream().ok()?;
                return match dict_integer(doc, &profile.dict, b"N")? {
                    1 => Some(1),
                    3 => Some(3),
                    _ => None,
                };
            }
            family
        }
        _ => return None,
    };

    match family {
        b"DeviceRGB" | b"CalRGB" => Some(3),
        b"DeviceGray" | b"CalGray" => Some(1),
        _ => None,
    }
}

/// `[/Indexed base hival lookup]` with the palette widened to RGB
fn indexed_palette(doc: &Document, items: &[Object]) -> Option<Vec<u8>> {
    let channels = base_channels(doc, items.get(1)?)?;
    let hival = usize::try_from(resolve(doc, items.get(2)?).as_i64().ok()?).ok()?;
    let entries = hival.checked_add(1)?.min(256);

    let lookup = match resolve(doc, items.get(3)?) {
        Object::String(bytes, _) => bytes.clone(),
        Object::Stream(stream) => stream
            .get_plain_content()
            .unwrap_or_else(|_| stream.content.clone()),
        _ => return None,
    };
    let table = lookup.get(..entries * channels)?;

    Some(match channels {
        1 => table.iter().flat_map(|&g| [g, g, g]).collect(),
        _ => table.to_vec(),
    })
}

fn pixel_layout(doc: &Document, dict: &Dictionary) -> Option<PixelLayout> {
    let color_space = dict.get(b"ColorSpace").ok()?;

    if let Object::Array(items) = resolve(doc, color_space) {
        if resolve(doc, items.first()?).as_name().ok()? == b"Indexed" {
            return indexed_palette(doc, items).map(PixelLayout::Indexed);
        }
    }

    match base_channels(doc, color_space)? {
        1 => Some(PixelLayout::Gray),
        _ => Some(PixelLayout::Rgb),
    }
}

fn encode_png(
    width: u32,
    height: u32,
    layout: &PixelLayout,
    depth: png::BitDepth,
    pixels: &[u8],
) -> std::result::Result<Vec<u8>, png::EncodingError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        match layout {
            PixelLayout::Gray => encoder.set_color(png::ColorType::Grayscale),
            PixelLayout::Rgb => encoder.set_color(png::ColorType::Rgb),
            PixelLayout::Indexed(palette) => {
                encoder.set_color(png::ColorType::Indexed);
                encoder.set_palette(palette.clone());
            }
        }
        encoder.set_depth(depth);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(pixels)?;
        writer.finish()?;
    }
    Ok(out)
}

/// Bytes of a packed sample grid; rows start on a byte boundary
fn packed_len(width: u32, height: u32, channels: usize, bits: u8) -> Option<usize> {
    let row_bits = usize::try_from(width)
        .ok()?
        .checked_mul(channels)?
        .checked_mul(usize::from(bits))?;
    row_bits
        .checked_add(7)
        .map(|b| b / 8)?
        .checked_mul(usize::try_from(height).ok()?)
}

/// Re-encode raw samples as PNG when the geometry checks out
fn pixels_to_png(doc: &Document, dict: &Dictionary, pixels: &[u8]) -> Result<Vec<u8>> {
    let width = dict_integer(doc, dict, b"Width").unwrap_or(0);
    let height = dict_integer(doc, dict, b"Height").unwrap_or(0);
    let bits = dict_integer(doc, dict, b"BitsPerComponent").unwrap_or(8);

    let Some(layout) = pixel_layout(doc, dict) else {
        return Err(Error::image_encode("pixels", "unsupported color space"));
    };

    let geometry = (
        u32::try_from(width).ok().filter(|w| *w > 0),
        u32::try_from(height).ok().filter(|h| *h > 0),
        u8::try_from(bits).ok().filter(|b| layout.supports_depth(*b)),
    );
    let (Some(width), Some(height), Some(bits)) = geometry else {
        return Err(Error::image_encode(
            "pixels",
            format!("unsupported geometry {}x{} at {} bpc", width, height, bits),
        ));
    };
    let Some(depth) = png::BitDepth::from_u8(bits) else {
        return Err(Error::image_encode("pixels", format!("unsupported depth {}", bits)));
    };

    let Some(expected) = packed_len(width, height, layout.channels(), bits) else {
        return Err(Error::image_encode(
            "pixels",
            format!("image size {}x{} overflows", width, height),
        ));
    };
    if pixels.len() != expected {
        return Err(Error::image_encode(
            "pixels",
            format!("expected {} bytes, found {}", expected, pixels.len()),
        ));
    }

    encode_png(width, height, &layout, depth, pixels)
        .map_err(|e| Error::image_encode("pixels", e.to_string()))
}

/// Run the Flate/LZW filters of an image stream.
///
/// lopdf refuses to decompress streams marked `/Subtype /Image`, so the
/// filters run on a copy without it.
fn decompress_samples(stream: &Stream) -> lopdf::Result<Vec<u8>> {
    let mut dict = stream.dict.clone();
    dict.remove(b"Subtype");
    Stream::new(dict, stream.content.clone()).decompressed_content()
}

/// Undo a single leading Flate/LZW filter, leaving the rest of the chain
fn strip_leading_filter(stream: &Stream, filter: &[u8]) -> Option<Vec<u8>> {
    let mut dict = stream.dict.clone();
    dict.remove(b"Subtype");
    dict.set("Filter", Object::Name(filter.to_vec()));
    if let Ok(Object::Array(params)) = dict.get(b"DecodeParms").cloned() {
        match params.into_iter().next() {
            Some(Object::Dictionary(first)) => dict.set("DecodeParms", first),
            _ => {
                dict.remove(b"DecodeParms");
            }
        }
    }
    Stream::new(dict, stream.content.clone())
        .decompressed_content()
        .ok()
}

/// Decode an image stream into its native format and bytes.
///
/// Encoded formats are written as stored, including when wrapped in one
/// Flate/LZW layer. Flate/LZW/unfiltered samples become PNG when possible and
/// fall back to raw bytes otherwise.
fn decode_image(doc: &Document, stream: &Stream) -> (ImageFormat, Vec<u8>) {
    let filters = filter_names(doc, &stream.dict);

    match filters.as_slice() {
        [only] => {
            if let Some(format) = native_format(only) {
                return (format, stream.content.clone());
            }
        }
        [outer, inner] if is_pixel_filter(outer) => {
            if let Some(format) = native_format(inner) {
                match strip_leading_filter(stream, outer) {
                    Some(bytes) => return (format, bytes),
                    None => {
                        tracing::debug!("Could not unwrap {:?} image", filters);
                        return (ImageFormat::Raw, stream.content.clone());
                    }
                }
            }
        }
        _ => {}
    }

    if !filters.iter().all(|f| is_pixel_filter(f)) {
        tracing::debug!("Keeping image with filters {:?} as raw bytes", filters);
        return (ImageFormat::Raw, stream.content.clone());
    }

    let pixels = if filters.is_empty() {
        stream.content.clone()
    } else {
        match decompress_samples(stream) {
            Ok(pixels) => pixels,
            Err(e) => {
                tracing::debug!("Could not decompress image stream: {}", e);
                return (ImageFormat::Raw, stream.content.clone());
            }
        }
    };

    match pixels_to_png(doc, &stream.dict, &pixels) {
        Ok(png) => (ImageFormat::Png, png),
        Err(e) => {
            tracing::debug!("Keeping decoded pixels as raw bytes: {}", e);
            (ImageFormat::Raw, pixels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn image_stream(dict: Dictionary, content: Vec<u8>) -> Stream {
        Stream::new(dict, content).with_compression(false)
    }

    #[test]
    fn test_output_dir_is_the_configured_directory() {
        let extractor = ImageExtractor::new("guide_images", &KeywordVocabulary::default()).unwrap();
        assert_eq!(extractor.output_dir(), Path::new("guide_images"));
    }

    #[test]
    fn test_dct_is_written_verbatim() {
        let doc = Document::with_version("1.5");
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];
        let stream = image_stream(
            dictionary! { "Type" => "XObject", "Subtype" => "Image", "Filter" => "DCTDecode" },
            bytes.clone(),
        );

        let (format, out) = decode_image(&doc, &stream);
        assert_eq!(format, ImageFormat::Jpeg);
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_unfiltered_rgb_becomes_png() {
        let doc = Document::with_version("1.5");
        let stream = image_stream(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255, 0, 0, 0, 255, 0],
        );

        let (format, out) = decode_image(&doc, &stream);
        assert_eq!(format, ImageFormat::Png);
        assert_eq!(&out[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_wrong_pixel_count_falls_back_to_raw() {
        let doc = Document::with_version("1.5");
        let stream = image_stream(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 4,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0; 3],
        );

        let (format, out) = decode_image(&doc, &stream);
        assert_eq!(format, ImageFormat::Raw);
        assert_eq!(out, vec![0; 3]);
    }

    #[test]
    fn test_cmyk_pixels_stay_raw() {
        let doc = Document::with_version("1.5");
        let stream = image_stream(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceCMYK",
                "BitsPerComponent" => 8,
            },
            vec![0, 0, 0, 255],
        );

        let (format, _) = decode_image(&doc, &stream);
        assert_eq!(format, ImageFormat::Raw);
    }

    fn flate_image(mut dict: Dictionary, content: Vec<u8>) -> Stream {
        dict.set("Type", "XObject");
        dict.set("Subtype", "Image");
        let mut stream = Stream::new(dict, content);
        stream.compress().unwrap();
        assert!(stream.dict.get(b"Filter").is_ok(), "sample data should compress");
        stream
    }

    #[test]
    fn test_flate_rgb_becomes_png() {
        let doc = Document::with_version("1.5");
        let stream = flate_image(
            dictionary! {
                "Width" => 16,
                "Height" => 16,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            [200u8, 40, 40].repeat(256),
        );

        let (format, out) = decode_image(&doc, &stream);
        assert_eq!(format, ImageFormat::Png);
        assert_eq!(&out[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_flate_wrapped_jpeg_is_unwrapped() {
        let doc = Document::with_version("1.5");
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0];
        jpeg.extend(std::iter::repeat(0u8).take(200));
        jpeg.extend([0xFF, 0xD9]);

        let mut stream = flate_image(dictionary! {}, jpeg.clone());
        stream.dict.set(
            "Filter",
            vec![Object::Name(b"FlateDecode".to_vec()), Object::Name(b"DCTDecode".to_vec())],
        );

        let (format, out) = decode_image(&doc, &stream);
        assert_eq!(format, ImageFormat::Jpeg);
        assert_eq!(out, jpeg);
    }

    #[test]
    fn test_huge_dimensions_fall_back_to_raw() {
        let doc = Document::with_version("1.5");
        let stream = image_stream(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1_i64 << 40,
                "Height" => 1_i64 << 40,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![1, 2, 3],
        );

        let (format, out) = decode_image(&doc, &stream);
        assert_eq!(format, ImageFormat::Raw);
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_packed_len_overflow_is_none() {
        assert_eq!(packed_len(u32::MAX, u32::MAX, 3, 16), None);
        assert_eq!(packed_len(3, 2, 1, 1), Some(2));
        assert_eq!(packed_len(2, 2, 3, 8), Some(12));
    }

    #[test]
    fn test_indexed_and_low_depth_become_png() {
        let doc = Document::with_version("1.5");
        let indexed = image_stream(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 3,
                "Height" => 1,
                "ColorSpace" => vec![
                    Object::Name(b"Indexed".to_vec()),
                    Object::Name(b"DeviceRGB".to_vec()),
                    Object::Integer(1),
                    Object::string_literal(vec![255u8, 0, 0, 0, 0, 255]),
                ],
                "BitsPerComponent" => 8,
            },
            vec![0, 1, 0],
        );
        assert_eq!(decode_image(&doc, &indexed).0, ImageFormat::Png);

        let bilevel = image_stream(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 10,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 1,
            },
            vec![0b1010_1010, 0b1100_0000, 0b0101_0101, 0b0100_0000],
        );
        assert_eq!(decode_image(&doc, &bilevel).0, ImageFormat::Png);
    }

    #[test]
    fn test_self_referencing_form_is_visited_once() {
        let mut doc = Document::with_version("1.5");
        let image_id = doc.add_object(image_stream(
            dictionary! { "Type" => "XObject", "Subtype" => "Image", "Filter" => "DCTDecode" },
            vec![0xFF, 0xD8, 0xFF, 0xD9],
        ));
        let form_id = doc.new_object_id();
        doc.objects.insert(
            form_id,
            Object::Stream(image_stream(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "Resources" => dictionary! {
                        "XObject" => dictionary! { "Fm1" => form_id, "Im1" => image_id },
                    },
                },
                Vec::new(),
            )),
        );
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Resources" => dictionary! { "XObject" => dictionary! { "Fm1" => form_id } },
        });

        let streams = page_image_streams(&doc, page_id);
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].content, vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }
}
