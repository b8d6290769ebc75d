//! Deterministic PDF rendering of a flattened report.
//!
//! ```text
//! content ──▶ report (layout + page hooks) ──▶ pdf (lopdf objects) ──▶ file
//! ```
//!
//! 1. [`metrics`] — base-14 font widths, WinAnsi encoding, word wrap
//! 2. [`layout`]  — cursor-driven page engine with [`layout::PageLifecycle`]
//!    hooks and automatic page breaks
//! 3. [`report`]  — header/footer decoration, sections, signature block
//! 4. [`pdf`]     — serialisation to PDF 1.5
//!
//! Rendering is CPU-bound and synchronous; async callers should run it on
//! `tokio::task::spawn_blocking`.

pub mod layout;
pub mod metrics;
pub mod pdf;
pub mod report;

use crate::config::ReportConfig;
use crate::error::ReportError;
use indexmap::IndexMap;
use pdf::{write_pdf, EmbeddedImage};
use report::{layout_report, local_timestamp, RenderedDocument, SignaturePlacement};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, info_span};

/// Outcome of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub path: PathBuf,
    pub pages: usize,
    pub signature: SignaturePlacement,
}

/// Renders reports with one fixed visual style.
#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer {
    config: ReportConfig,
}

impl DocumentRenderer {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Lay out a report without touching the filesystem.
    ///
    /// `signature` is the decoded signature image, if any. When `date` is
    /// `None` the local wall clock is used.
    pub fn layout(
        &self,
        content: &IndexMap<String, String>,
        title: &str,
        signature: Option<&EmbeddedImage>,
        date: Option<&str>,
    ) -> RenderedDocument {
        let date = date.map_or_else(local_timestamp, str::to_string);
        layout_report(
            title,
            content,
            &self.config,
            signature.map(|img| (0, img.size())),
            &date,
        )
    }

    /// Render `content` under `title` into the PDF at `filename`.
    ///
    /// Sections appear in the map's order. A missing or undecodable
    /// signature image is an error; pass `None` for an unsigned report.
    pub fn render_report(
        &self,
        content: &IndexMap<String, String>,
        filename: &Path,
        title: &str,
        signature: Option<&Path>,
        date: Option<&str>,
    ) -> Result<RenderSummary, ReportError> {
        let _span = info_span!("render", file = %filename.display()).entered();
        let start = Instant::now();

        let images = match signature {
            Some(path) => vec![EmbeddedImage::load(path)?],
            None => Vec::new(),
        };
        let doc = self.layout(content, title, images.first(), date);
        write_pdf(&doc, &images, filename)?;

        info!(
            "Rendered '{}': {} sections, {} pages in {:?}",
            title,
            content.len(),
            doc.page_count(),
            start.elapsed()
        );
        Ok(RenderSummary {
            path: filename.to_path_buf(),
            pages: doc.page_count(),
            signature: doc.signature,
        })
    }

    /// [`render_report`](Self::render_report) collapsed to a success flag.
    /// Failures are logged.
    pub fn render(
        &self,
        content: &IndexMap<String, String>,
        filename: &Path,
        title: &str,
        signature: Option<&Path>,
        date: Option<&str>,
    ) -> bool {
        match self.render_report(content, filename, title, signature, date) {
            Ok(_) => true,
            Err(e) => {
                let _span = info_span!("render", file = %filename.display()).entered();
                error!("Error generating PDF: {}", e);
                false
            }
        }
    }
}
