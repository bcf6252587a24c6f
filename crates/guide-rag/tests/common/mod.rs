//! Shared fixtures: small PDFs built with lopdf and stub providers

#![allow(dead_code)]

use async_trait::async_trait;
use guide_rag::providers::{EmbeddingProvider, LlmProvider};
use guide_rag::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Minimal JPEG framing; written to disk untouched
pub const FAKE_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0xFF, 0xD9,
];

/// One page of a test guide
pub struct PageSpec {
    pub text: &'static str,
    /// DCT images listed directly in the page resources
    pub images: usize,
    /// Flate-compressed 8-bit RGB images listed after the DCT ones
    pub rgb_images: usize,
    /// DCT images drawn through a Form XObject listed last
    pub wrapped_images: usize,
}

pub fn page(text: &'static str, images: usize) -> PageSpec {
    PageSpec {
        text,
        images,
        rgb_images: 0,
        wrapped_images: 0,
    }
}

impl PageSpec {
    pub fn with_rgb(mut self, count: usize) -> Self {
        self.rgb_images = count;
        self
    }

    pub fn with_wrapped(mut self, count: usize) -> Self {
        self.wrapped_images = count;
        self
    }
}

fn jpeg_xobject() -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        FAKE_JPEG.to_vec(),
    )
}

/// 8x8 RGB gradient; compresses well enough for lopdf to apply FlateDecode
fn rgb_xobject(seed: u8) -> Stream {
    let pixels: Vec<u8> = (0..64u8)
        .flat_map(|i| [seed, i.wrapping_mul(4), 255 - seed])
        .collect();
    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 8,
            "Height" => 8,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        pixels,
    );
    stream.compress().expect("compress rgb image");
    stream
}

/// Build a PDF with one text line (none when empty) and the page's images
pub fn build_pdf(pages: &[PageSpec]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for (page_index, layout) in pages.iter().enumerate() {
        let mut xobjects = lopdf::Dictionary::new();
        let mut operations = Vec::new();
        if !layout.text.is_empty() {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(layout.text)]),
                Operation::new("ET", vec![]),
            ]);
        }

        let direct = (0..layout.images)
            .map(|_| jpeg_xobject())
            .chain((0..layout.rgb_images).map(|i| rgb_xobject((page_index * 16 + i) as u8)))
            .collect::<Vec<_>>();
        for (i, stream) in direct.into_iter().enumerate() {
            let image_id = doc.add_object(stream);
            let name = format!("Im{}", i + 1);
            xobjects.set(name.as_bytes().to_vec(), image_id);
            operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        }

        if layout.wrapped_images > 0 {
            let mut inner = lopdf::Dictionary::new();
            let mut form_ops = Vec::new();
            for i in 0..layout.wrapped_images {
                let image_id = doc.add_object(jpeg_xobject());
                let name = format!("Im{}", i + 1);
                inner.set(name.as_bytes().to_vec(), image_id);
                form_ops.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
            }
            let form_content = Content { operations: form_ops };
            let form_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
                    "Resources" => dictionary! { "XObject" => inner },
                },
                form_content.encode().expect("encode form content"),
            ));
            xobjects.set("Fm1", form_id);
            operations.push(Operation::new("Do", vec![Object::Name(b"Fm1".to_vec())]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Write a test guide to `dir/name`
pub fn write_pdf(dir: &Path, name: &str, pages: &[PageSpec]) -> PathBuf {
    let path = dir.join(name);
    build_pdf(pages).save(&path).expect("save test pdf");
    path
}

/// Embeds text by counting skincare marker words; deterministic and offline
#[derive(Default)]
pub struct MarkerEmbedder {
    pub calls: AtomicUsize,
}

const MARKERS: &[&str] = &["benzoyl", "peroxide", "retinoid", "sunscreen", "moisturizer"];

#[async_trait]
impl EmbeddingProvider for MarkerEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = text.to_lowercase();
        Ok(MARKERS
            .iter()
            .map(|m| text.matches(m).count() as f32 + 0.01)
            .collect())
    }

    fn name(&self) -> &str {
        "marker"
    }
}

/// Replies with a fixed answer and records the context it was grounded in
pub struct ScriptedLlm {
    pub reply: String,
    pub contexts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.contexts.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate_answer(&self, _question: &str, context: &str) -> Result<String> {
        self.contexts.lock().push(context.to_string());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}
