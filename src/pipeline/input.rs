//! Input-document preprocessing: make an uploaded document text-searchable.
//!
//! An uploaded document is either an image (photo or scan) or a PDF. Images
//! always go through OCR; PDFs only when their text layer is missing or too
//! thin to be useful. OCR itself is an external collaborator behind the
//! [`DocumentOcr`] trait; the default [`NoOcr`] declines every request.
//!
//! The OCR'd copy is written next to the input as `<stem>_ocr.pdf`.

use crate::error::ReportError;
use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Minimum number of characters (after trimming) a PDF text layer must
/// have to skip OCR.
pub const MIN_EXTRACTABLE_CHARS: usize = 10;

/// OCR engine turning images or scanned PDFs into text-searchable PDFs.
pub trait DocumentOcr: Send + Sync {
    /// OCR an image file into a PDF at `output`.
    fn image_to_pdf(&self, input: &Path, output: &Path) -> Result<(), ReportError>;

    /// OCR a scanned PDF into a text-searchable PDF at `output`.
    fn pdf_to_pdf(&self, input: &Path, output: &Path) -> Result<(), ReportError>;
}

/// Placeholder OCR engine used when none is configured. Always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOcr;

impl DocumentOcr for NoOcr {
    fn image_to_pdf(&self, input: &Path, _output: &Path) -> Result<(), ReportError> {
        Err(ReportError::Preprocess {
            path: input.to_path_buf(),
            detail: "no OCR engine is configured".into(),
        })
    }

    fn pdf_to_pdf(&self, input: &Path, _output: &Path) -> Result<(), ReportError> {
        Err(ReportError::Preprocess {
            path: input.to_path_buf(),
            detail: "no OCR engine is configured".into(),
        })
    }
}

/// Whether the path names a PDF (by extension, case-insensitive).
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Path of the OCR'd copy of `input`: `<dir>/<stem>_ocr.pdf`.
pub fn ocr_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}_ocr.pdf"))
}

/// Check whether at least `min_chars` characters of text can be extracted
/// from the PDF. Unreadable PDFs count as not extractable.
pub fn is_pdf_text_extractable(path: &Path, min_chars: usize) -> bool {
    let doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Error processing PDF for text extraction '{}': {}", path.display(), e);
            return false;
        }
    };

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let extracted = match doc.extract_text(&pages) {
        Ok(text) => text,
        Err(e) => {
            warn!("Text extraction failed for '{}': {}", path.display(), e);
            String::new()
        }
    };

    let extractable = extracted.trim().chars().count() >= min_chars;
    info!("Text extractable from '{}': {}", path.display(), extractable);
    extractable
}

/// Make `input` text-searchable, returning the path of the document to use
/// downstream (the input itself when no OCR was needed).
pub fn preprocess_document(input: &Path, ocr: &dyn DocumentOcr) -> Result<PathBuf, ReportError> {
    if !input.exists() {
        return Err(ReportError::FileNotFound {
            path: input.to_path_buf(),
        });
    }

    if !is_pdf_path(input) {
        let output = ocr_output_path(input);
        debug!("Running image OCR: {} → {}", input.display(), output.display());
        ocr.image_to_pdf(input, &output)?;
        return Ok(output);
    }

    if is_pdf_text_extractable(input, MIN_EXTRACTABLE_CHARS) {
        return Ok(input.to_path_buf());
    }

    warn!("PDF text is not extractable, preparing for OCR: {}", input.display());
    let output = ocr_output_path(input);
    ocr.pdf_to_pdf(input, &output)?;
    Ok(output)
}
