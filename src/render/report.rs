//! Report layout: header/footer decoration, sections and the signature block.

use crate::config::{ReportConfig, TextStyle};
use crate::render::layout::{
    Align, CursorMove, Layout, Page, PageLifecycle, CELL_PADDING, MARGIN_BOTTOM, MARGIN_LEFT,
    MARGIN_RIGHT, PAGE_HEIGHT, PAGE_WIDTH,
};
use crate::render::metrics::{sanitize_text, BaseFamily, StandardFont};
use indexmap::IndexMap;
use tracing::debug;

/// Height of the header title cell.
pub const HEADER_CELL_HEIGHT: f32 = 10.0;
/// Y position of the rule under the header.
pub const HEADER_RULE_Y: f32 = 25.0;
pub const HEADER_RULE_WIDTH: f32 = 0.5;
/// Gap between the header cell and the first content line.
pub const HEADER_GAP: f32 = 5.0;
/// Footer cell position, measured up from the bottom edge.
pub const FOOTER_OFFSET: f32 = 15.0;
pub const FOOTER_CELL_HEIGHT: f32 = 10.0;
/// Smallest size a long header title is shrunk to before it is truncated.
pub const MIN_HEADER_SIZE: f32 = 8.0;

pub const SECTION_HEADING_HEIGHT: f32 = 10.0;
pub const BODY_LINE_HEIGHT: f32 = 8.0;
/// Gap after each section.
pub const SECTION_GAP: f32 = 5.0;

/// Reserved height of the signature block.
pub const SIGNATURE_BLOCK_HEIGHT: f32 = 30.0;
pub const SIGNATURE_LABEL: &str = "Authorized Signature:";
pub const SIGNATURE_LABEL_WIDTH: f32 = 60.0;
/// Signature image overlaps the tail of the label cell by this much.
pub const SIGNATURE_IMAGE_OVERLAP: f32 = 20.0;
pub const SIGNATURE_IMAGE_WIDTH: f32 = 40.0;
/// Vertical distance from the label line to the creation-date line.
pub const SIGNATURE_DATE_OFFSET: f32 = 15.0;

/// Y coordinate where content starts on a fresh page.
pub const CONTENT_TOP: f32 = HEADER_RULE_Y;

/// Pixel size of the signature image, used to keep its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Where the signature block ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignaturePlacement {
    /// 1-based page number.
    pub page: usize,
    /// Top of the block.
    pub y: f32,
    /// Whether an image was drawn.
    pub has_image: bool,
}

/// A fully laid-out report, ready for serialisation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub title: String,
    pub pages: Vec<Page>,
    pub signature: SignaturePlacement,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Resolved fonts of a [`ReportConfig`].
#[derive(Debug, Clone, Copy)]
struct Fonts {
    header: (StandardFont, f32),
    subheader: (StandardFont, f32),
    body: (StandardFont, f32),
    footer: (StandardFont, f32),
}

impl Fonts {
    fn from_config(config: &ReportConfig) -> Self {
        let family = BaseFamily::resolve(&config.font_family);
        let pick = |s: TextStyle| (StandardFont::new(family, s.style), s.size);
        Self {
            header: pick(config.header),
            subheader: pick(config.subheader),
            body: pick(config.body),
            footer: pick(config.footer),
        }
    }
}

/// Header/footer decoration shared by every page of a report.
pub struct ReportPages {
    title: String,
    fonts: Fonts,
}

impl ReportPages {
    pub fn new(title: impl Into<String>, config: &ReportConfig) -> Self {
        Self {
            title: title.into(),
            fonts: Fonts::from_config(config),
        }
    }
}

impl PageLifecycle for ReportPages {
    fn on_page_start(&self, layout: &mut Layout<'_>) {
        let (font, size) = self.fonts.header;
        let max_width = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT - 2.0 * CELL_PADDING;
        let (size, title) = fit_header_title(font, size, &self.title, max_width);
        layout.set_font(font, size);
        layout.cell(
            0.0,
            HEADER_CELL_HEIGHT,
            &title,
            Align::Center,
            CursorMove::NextLine,
        );
        layout.line(
            MARGIN_LEFT,
            HEADER_RULE_Y,
            PAGE_WIDTH - MARGIN_RIGHT,
            HEADER_RULE_Y,
            HEADER_RULE_WIDTH,
        );
        layout.ln(HEADER_GAP);
    }

    fn on_page_end(&self, layout: &mut Layout<'_>) {
        layout.set_y(-FOOTER_OFFSET);
        let (font, size) = self.fonts.footer;
        layout.set_font(font, size);
        let label = format!("Page {}", layout.page_no());
        layout.cell(0.0, FOOTER_CELL_HEIGHT, &label, Align::Center, CursorMove::Right);
    }
}

/// Lay out a report: sections in the given order, then the signature block.
///
/// `signature` is the index and pixel size of the signature image in the
/// document's image list, if one was supplied.
pub fn layout_report(
    title: &str,
    content: &IndexMap<String, String>,
    config: &ReportConfig,
    signature: Option<(usize, ImageSize)>,
    date: &str,
) -> RenderedDocument {
    let decor = ReportPages::new(title, config);
    let fonts = decor.fonts;
    let mut layout = Layout::new(&decor);
    layout.add_page();

    for (heading, text) in content {
        let (font, size) = fonts.subheader;
        layout.set_font(font, size);
        layout.multi_cell(0.0, SECTION_HEADING_HEIGHT, heading);

        let (font, size) = fonts.body;
        layout.set_font(font, size);
        let lines = layout.multi_cell(0.0, BODY_LINE_HEIGHT, text);
        layout.ln(SECTION_GAP);
        debug!(
            "Section '{}': {} lines, cursor now page {} y={:.1}",
            heading,
            lines,
            layout.page_no(),
            layout.y()
        );
    }

    let placement = place_signature_block(&mut layout, fonts, signature, date);
    let pages = layout.finish();

    RenderedDocument {
        title: title.to_string(),
        pages,
        signature: placement,
    }
}

/// Draw the signature block, starting a new page first when the block
/// would not fit entirely above the bottom margin.
fn place_signature_block(
    layout: &mut Layout<'_>,
    fonts: Fonts,
    signature: Option<(usize, ImageSize)>,
    date: &str,
) -> SignaturePlacement {
    let target_y = PAGE_HEIGHT - MARGIN_BOTTOM - SIGNATURE_BLOCK_HEIGHT;
    if layout.y() > target_y {
        debug!(
            "Signature block does not fit (y={:.1} > {:.1}); starting page {}",
            layout.y(),
            target_y,
            layout.page_no() + 1
        );
        layout.add_page();
    }
    layout.set_y(target_y);

    let (font, size) = fonts.body;
    layout.set_font(font, size);
    layout.cell(
        SIGNATURE_LABEL_WIDTH,
        10.0,
        SIGNATURE_LABEL,
        Align::Left,
        CursorMove::Right,
    );

    let image_x = layout.x() - SIGNATURE_IMAGE_OVERLAP;
    if let Some((index, px)) = signature {
        let (w, h) = fit_signature_image(px);
        layout.image(index, image_x, target_y, w, h);
    }

    layout.ln(SIGNATURE_DATE_OFFSET);
    layout.cell(
        0.0,
        10.0,
        &format!("Creation date: {date}"),
        Align::Left,
        CursorMove::NextLine,
    );

    SignaturePlacement {
        page: layout.page_no(),
        y: target_y,
        has_image: signature.is_some(),
    }
}

/// Size of the signature image in mm: 40 mm wide by aspect ratio, scaled
/// down so it never extends below the reserved block.
pub fn fit_signature_image(px: ImageSize) -> (f32, f32) {
    if px.width == 0 || px.height == 0 {
        return (SIGNATURE_IMAGE_WIDTH, 0.0);
    }
    let ratio = px.height as f32 / px.width as f32;
    let h = SIGNATURE_IMAGE_WIDTH * ratio;
    if h <= SIGNATURE_BLOCK_HEIGHT {
        (SIGNATURE_IMAGE_WIDTH, h)
    } else {
        (SIGNATURE_BLOCK_HEIGHT / ratio, SIGNATURE_BLOCK_HEIGHT)
    }
}

/// Shrink the header font, then truncate, until `title` fits `max_width`.
fn fit_header_title(
    font: StandardFont,
    size: f32,
    title: &str,
    max_width: f32,
) -> (f32, String) {
    let title = sanitize_text(title);
    let width = font.string_width(&title, size);
    if width <= max_width {
        return (size, title);
    }
    // Glyph widths scale linearly with size.
    let scaled = size * max_width / width;
    if scaled >= MIN_HEADER_SIZE {
        return (scaled, title);
    }
    let shrunk = MIN_HEADER_SIZE;

    let mut chars: Vec<char> = title.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}...", chars.iter().collect::<String>().trim_end());
        if font.string_width(&candidate, shrunk) <= max_width {
            return (shrunk, candidate);
        }
    }
    (shrunk, String::new())
}

/// Current local wall-clock time as `YYYY-MM-DD HH:MM:SS <zone>`.
///
/// The zone is the abbreviation of the host's IANA time zone (e.g. `CET`);
/// when the zone cannot be determined the numeric UTC offset is used.
pub fn local_timestamp() -> String {
    let now = chrono::Local::now();
    let zone = iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse::<chrono_tz::Tz>().ok());
    match zone {
        Some(tz) => now
            .with_timezone(&tz)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string(),
        None => now.format("%Y-%m-%d %H:%M:%S %:z").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::DrawOp;

    fn sections(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn long_text(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn single_page_report_has_header_footer_and_signature() {
        let doc = layout_report(
            "Inspection",
            &sections(&[("Summary", "All good.")]),
            &ReportConfig::default(),
            None,
            "2024-01-01 00:00:00 UTC",
        );
        assert_eq!(doc.page_count(), 1);
        let page = &doc.pages[0];
        assert!(page.has_text("Inspection"));
        assert!(page.has_text("Page 1"));
        assert!(page.has_text("Summary"));
        assert!(page.has_text("All good."));
        assert!(page.has_text(SIGNATURE_LABEL));
        assert!(page.has_text("Creation date: 2024-01-01 00:00:00 UTC"));
        assert_eq!(doc.signature.page, 1);
        assert!(!doc.signature.has_image);
        assert_eq!(page.images().count(), 0);
    }

    #[test]
    fn header_rule_is_drawn() {
        let doc = layout_report("T", &IndexMap::new(), &ReportConfig::default(), None, "d");
        assert!(doc.pages[0].ops.iter().any(|op| matches!(
            op,
            DrawOp::Line { y1, y2, .. } if *y1 == HEADER_RULE_Y && *y2 == HEADER_RULE_Y
        )));
    }

    #[test]
    fn long_body_paginates_with_header_and_footer_on_every_page() {
        let doc = layout_report(
            "Long Report",
            &sections(&[("Body", &long_text(2000))]),
            &ReportConfig::default(),
            None,
            "d",
        );
        assert!(doc.page_count() > 1);
        for page in &doc.pages {
            assert!(page.has_text("Long Report"), "page {} lacks header", page.number);
            assert!(
                page.has_text(&format!("Page {}", page.number)),
                "page {} lacks footer",
                page.number
            );
        }
    }

    #[test]
    fn body_lines_never_cross_bottom_margin() {
        let doc = layout_report(
            "T",
            &sections(&[("A", &long_text(1500)), ("B", &long_text(700))]),
            &ReportConfig::default(),
            None,
            "d",
        );
        let footer_baseline_min = PAGE_HEIGHT - FOOTER_OFFSET;
        for page in &doc.pages {
            for op in &page.ops {
                if let DrawOp::Text { y, text, .. } = op {
                    if !text.starts_with("Page ") {
                        assert!(
                            *y < PAGE_HEIGHT - MARGIN_BOTTOM,
                            "'{text}' at y={y} crosses the margin"
                        );
                    } else {
                        assert!(*y > footer_baseline_min);
                    }
                }
            }
        }
    }

    #[test]
    fn signature_moves_to_new_page_when_cursor_is_too_low() {
        // Fill the first page until the cursor sits below the signature target.
        let target_y = PAGE_HEIGHT - MARGIN_BOTTOM - SIGNATURE_BLOCK_HEIGHT;
        let mut lines = 1;
        loop {
            let body = vec!["x"; lines].join("\n");
            let doc = layout_report(
                "T",
                &sections(&[("S", &body)]),
                &ReportConfig::default(),
                None,
                "d",
            );
            // 25 (content top) + 10 (heading) + 8n (lines) + 5 (gap)
            let cursor = CONTENT_TOP + SECTION_HEADING_HEIGHT + 8.0 * lines as f32 + SECTION_GAP;
            if cursor > target_y && cursor <= PAGE_HEIGHT - MARGIN_BOTTOM + SECTION_GAP {
                assert_eq!(doc.pages[0].texts().filter(|t| *t == "x").count(), lines);
                assert_eq!(doc.page_count(), 2);
                assert_eq!(doc.signature.page, 2);
                assert!(doc.signature.y >= CONTENT_TOP);
                assert!(!doc.pages[0].has_text(SIGNATURE_LABEL));
                assert!(doc.pages[1].has_text(SIGNATURE_LABEL));
                assert!(doc.pages[1].has_text("T"));
                assert!(doc.pages[1].has_text("Page 2"));
                break;
            }
            assert_eq!(doc.signature.page, 1, "signature split early at {lines} lines");
            lines += 1;
            assert!(lines < 40);
        }
    }

    #[test]
    fn signature_image_is_placed_beside_label() {
        let doc = layout_report(
            "T",
            &IndexMap::new(),
            &ReportConfig::default(),
            Some((0, ImageSize { width: 200, height: 100 })),
            "d",
        );
        assert!(doc.signature.has_image);
        let target_y = PAGE_HEIGHT - MARGIN_BOTTOM - SIGNATURE_BLOCK_HEIGHT;
        let image = doc.pages[0].images().next().unwrap();
        match image {
            DrawOp::Image { x, y, w, h, image } => {
                assert_eq!(*image, 0);
                assert_eq!(*x, MARGIN_LEFT + SIGNATURE_LABEL_WIDTH - SIGNATURE_IMAGE_OVERLAP);
                assert_eq!(*y, target_y);
                assert_eq!(*w, SIGNATURE_IMAGE_WIDTH);
                assert_eq!(*h, 20.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn tall_signature_image_stays_inside_reserved_block() {
        let doc = layout_report(
            "T",
            &IndexMap::new(),
            &ReportConfig::default(),
            Some((0, ImageSize { width: 100, height: 400 })),
            "d",
        );
        let image = doc.pages[0].images().next().unwrap();
        match image {
            DrawOp::Image { y, w, h, .. } => {
                assert_eq!(*h, SIGNATURE_BLOCK_HEIGHT);
                assert!((*w - 7.5).abs() < 1e-4, "aspect ratio kept, got w={w}");
                assert!(*y + *h <= PAGE_HEIGHT - MARGIN_BOTTOM);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn fit_signature_image_keeps_wide_images_at_full_width() {
        assert_eq!(fit_signature_image(ImageSize { width: 400, height: 100 }), (40.0, 10.0));
        assert_eq!(fit_signature_image(ImageSize { width: 0, height: 10 }).1, 0.0);
    }

    fn assert_within_content_width(op: &DrawOp) {
        if let DrawOp::Text { x, font, size, text, .. } = op {
            let right = x + font.string_width(text, *size);
            assert!(*x >= MARGIN_LEFT, "'{text}' starts at x={x}");
            assert!(
                right <= PAGE_WIDTH - MARGIN_RIGHT + 1e-3,
                "'{text}' ends at x={right}"
            );
        }
    }

    #[test]
    fn long_title_is_shrunk_to_fit_header() {
        let title = "Quarterly Maintenance Summary ".repeat(3);
        let doc = layout_report(&title, &IndexMap::new(), &ReportConfig::default(), None, "d");
        let header = doc.pages[0]
            .ops
            .iter()
            .find(|op| matches!(op, DrawOp::Text { text, .. } if text.starts_with("Quarterly")))
            .unwrap();
        match header {
            DrawOp::Text { size, text, .. } => {
                assert!(*size < ReportConfig::default().header.size);
                assert_eq!(text, &title);
            }
            _ => unreachable!(),
        }
        assert_within_content_width(header);
    }

    #[test]
    fn very_long_title_is_truncated_in_header() {
        let title = "X".repeat(300);
        let doc = layout_report(&title, &IndexMap::new(), &ReportConfig::default(), None, "d");
        let header = doc.pages[0]
            .ops
            .iter()
            .find(|op| matches!(op, DrawOp::Text { text, .. } if text.starts_with('X')))
            .unwrap();
        match header {
            DrawOp::Text { size, text, .. } => {
                assert_eq!(*size, MIN_HEADER_SIZE);
                assert!(text.ends_with("..."));
                assert!(text.len() < title.len());
            }
            _ => unreachable!(),
        }
        assert_within_content_width(header);
    }

    #[test]
    fn long_section_heading_wraps() {
        let heading = "Findings from the extended inspection of the north boiler house \
                       including pumps valves and the condensate return lines";
        let doc = layout_report(
            "T",
            &sections(&[(heading, "Body.")]),
            &ReportConfig::default(),
            None,
            "d",
        );
        let subheader = ReportConfig::default().subheader.size;
        let heading_ops: Vec<&DrawOp> = doc.pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { size, text, .. }
                if *size == subheader && heading.contains(text.as_str())))
            .collect();
        assert!(heading_ops.len() > 1, "heading should span several lines");
        for op in heading_ops {
            assert_within_content_width(op);
        }
        assert!(doc.pages[0].has_text("Body."));
    }

    #[test]
    fn local_timestamp_shape() {
        let ts = local_timestamp();
        // "YYYY-MM-DD HH:MM:SS " prefix followed by a zone designator.
        assert!(ts.len() > 20, "got {ts}");
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[13..14], ":");
        assert!(!ts[20..].trim().is_empty());
    }
}
