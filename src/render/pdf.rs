//! PDF serialisation of a laid-out report.
//!
//! Produces a PDF 1.5 file with one content stream per page. Text uses the
//! base-14 fonts with WinAnsiEncoding; images are DeviceRGB XObjects,
//! Flate-compressed, with an optional soft mask for transparency.

use crate::error::ReportError;
use crate::render::layout::{DrawOp, PAGE_HEIGHT, PAGE_WIDTH};
use crate::render::metrics::{encode_win_ansi, StandardFont, PT_PER_MM};
use crate::render::report::{ImageSize, RenderedDocument};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use indexmap::IndexMap;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;
use std::path::Path;
use tracing::debug;

const PRODUCER: &str = concat!("edgequake-report ", env!("CARGO_PKG_VERSION"));

/// A decoded raster image ready to be embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    /// Packed 8-bit RGB samples, row-major.
    pub rgb: Vec<u8>,
    /// 8-bit alpha samples when the source had transparency.
    pub alpha: Option<Vec<u8>>,
}

impl EmbeddedImage {
    /// Decode a PNG or JPEG file.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        if !path.exists() {
            return Err(ReportError::ImageLoad {
                path: path.to_path_buf(),
                detail: "file not found".into(),
            });
        }
        let img = image::open(path).map_err(|e| ReportError::ImageLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        if img.width() == 0 || img.height() == 0 {
            return Err(ReportError::ImageLoad {
                path: path.to_path_buf(),
                detail: "image has no pixels".into(),
            });
        }

        let alpha = if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            Some(rgba.pixels().map(|p| p.0[3]).collect())
        } else {
            None
        };
        let rgb = img.to_rgb8();
        debug!(
            "Loaded signature image {} ({}x{}, alpha: {})",
            path.display(),
            rgb.width(),
            rgb.height(),
            alpha.is_some()
        );
        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            rgb: rgb.into_raw(),
            alpha,
        })
    }

    pub fn size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }
}

fn mm_to_pt(v: f32) -> f32 {
    v * PT_PER_MM
}

/// Flip a top-down millimetre y coordinate into PDF user space.
fn y_to_pt(y: f32) -> f32 {
    (PAGE_HEIGHT - y) * PT_PER_MM
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ReportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| ReportError::PdfSerialize(format!("deflate: {e}")))?;
    encoder
        .finish()
        .map_err(|e| ReportError::PdfSerialize(format!("deflate: {e}")))
}

fn image_stream(
    width: u32,
    height: u32,
    color_space: &str,
    samples: &[u8],
    smask: Option<ObjectId>,
) -> Result<Stream, ReportError> {
    let mut dict = Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(color_space.as_bytes().to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ]);
    if let Some(id) = smask {
        dict.set("SMask", Object::Reference(id));
    }
    Ok(Stream::new(dict, deflate(samples)?).with_compression(false))
}

fn page_content(
    ops: &[DrawOp],
    fonts: &IndexMap<StandardFont, String>,
) -> Result<Vec<u8>, ReportError> {
    let mut operations = Vec::new();
    for op in ops {
        match op {
            DrawOp::Text {
                x,
                y,
                font,
                size,
                text,
            } => {
                let Some(name) = fonts.get(font) else {
                    continue;
                };
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(name.as_bytes().to_vec()), (*size).into()],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![mm_to_pt(*x).into(), y_to_pt(*y).into()],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                width,
            } => {
                operations.push(Operation::new("w", vec![mm_to_pt(*width).into()]));
                operations.push(Operation::new(
                    "m",
                    vec![mm_to_pt(*x1).into(), y_to_pt(*y1).into()],
                ));
                operations.push(Operation::new(
                    "l",
                    vec![mm_to_pt(*x2).into(), y_to_pt(*y2).into()],
                ));
                operations.push(Operation::new("S", vec![]));
            }
            DrawOp::Image { x, y, w, h, image } => {
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![
                        mm_to_pt(*w).into(),
                        0.into(),
                        0.into(),
                        mm_to_pt(*h).into(),
                        mm_to_pt(*x).into(),
                        y_to_pt(*y + *h).into(),
                    ],
                ));
                operations.push(Operation::new(
                    "Do",
                    vec![Object::Name(image_name(*image).into_bytes())],
                ));
                operations.push(Operation::new("Q", vec![]));
            }
        }
    }
    Ok(Content { operations }.encode()?)
}

fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

/// Serialise `doc` into PDF bytes. `images` is indexed by the image ops.
pub fn to_pdf_bytes(
    doc: &RenderedDocument,
    images: &[EmbeddedImage],
) -> Result<Vec<u8>, ReportError> {
    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    // Resource names in order of first use.
    let mut fonts: IndexMap<StandardFont, String> = IndexMap::new();
    for page in &doc.pages {
        for op in &page.ops {
            if let DrawOp::Text { font, .. } = op {
                let next = format!("F{}", fonts.len() + 1);
                fonts.entry(*font).or_insert(next);
            }
        }
    }

    let mut font_dict = Dictionary::new();
    for (font, name) in &fonts {
        let id = pdf.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(font.base_font().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        font_dict.set(name.as_str(), Object::Reference(id));
    }

    let mut xobjects = Dictionary::new();
    for (index, img) in images.iter().enumerate() {
        let smask = match &img.alpha {
            Some(alpha) => Some(pdf.add_object(image_stream(
                img.width,
                img.height,
                "DeviceGray",
                alpha,
                None,
            )?)),
            None => None,
        };
        let id = pdf.add_object(image_stream(
            img.width,
            img.height,
            "DeviceRGB",
            &img.rgb,
            smask,
        )?);
        xobjects.set(image_name(index).as_str(), Object::Reference(id));
    }

    let mut resources = Dictionary::from_iter([("Font", Object::Dictionary(font_dict))]);
    if !images.is_empty() {
        resources.set("XObject", Object::Dictionary(xobjects));
    }
    let resources_id = pdf.add_object(resources);

    let media_box = Object::Array(vec![
        0.into(),
        0.into(),
        mm_to_pt(PAGE_WIDTH).into(),
        mm_to_pt(PAGE_HEIGHT).into(),
    ]);

    let mut kids = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let content_id = pdf.add_object(Stream::new(
            Dictionary::new(),
            page_content(&page.ops, &fonts)?,
        ));
        let page_id = pdf.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            ("MediaBox", media_box.clone()),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = pdf.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    pdf.trailer.set("Root", Object::Reference(catalog_id));

    let info_id = pdf.add_object(Dictionary::from_iter([
        ("Title", Object::String(utf16_text_string(&doc.title), StringFormat::Hexadecimal)),
        ("Producer", Object::string_literal(PRODUCER)),
    ]));
    pdf.trailer.set("Info", Object::Reference(info_id));

    pdf.compress();

    let mut output = Vec::new();
    pdf.save_to(&mut output)
        .map_err(|e| ReportError::PdfSerialize(format!("save: {e}")))?;
    Ok(output)
}

/// Serialise `doc` and write it to `path`, replacing any existing file.
pub fn write_pdf(
    doc: &RenderedDocument,
    images: &[EmbeddedImage],
    path: &Path,
) -> Result<(), ReportError> {
    let bytes = to_pdf_bytes(doc, images)?;
    std::fs::write(path, &bytes).map_err(|source| ReportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// PDF text string for document metadata: UTF-16BE with a byte-order mark,
/// so titles outside Latin-1 survive in viewers' document properties.
fn utf16_text_string(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    bytes
}
