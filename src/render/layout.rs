//! Page model and the flowing-layout engine.
//!
//! Coordinates are millimetres measured from the top-left corner of an A4
//! portrait page; [`crate::render::pdf`] converts them to PDF user space.
//!
//! The engine works like a typewriter: a cursor `(x, y)` advances as cells
//! are placed. Before a cell is placed, if its bottom edge would cross the
//! page-break trigger (`PAGE_HEIGHT - MARGIN_BOTTOM`), the current page is
//! closed and a fresh one opened. Opening and closing pages always goes
//! through the [`PageLifecycle`] hooks, so headers and footers appear on
//! every page, including the ones inserted by automatic breaks.

use crate::render::metrics::{sanitize_text, wrap_text, StandardFont, PT_PER_MM};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN_LEFT: f32 = 10.0;
pub const MARGIN_TOP: f32 = 10.0;
pub const MARGIN_RIGHT: f32 = 10.0;
/// Distance from the bottom edge at which automatic page breaks trigger.
pub const MARGIN_BOTTOM: f32 = 20.0;
/// Horizontal padding inside a cell.
pub const CELL_PADDING: f32 = 1.0;

/// Horizontal alignment of text inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Where the cursor goes after a cell is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    /// Stay on the line, to the right of the cell.
    Right,
    /// Go to the left margin of the next line.
    NextLine,
}

/// One drawing instruction on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A single line of text. `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        font: StandardFont,
        size: f32,
        text: String,
    },
    /// A straight stroke.
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
    },
    /// An image; `y` is the top edge. `image` indexes the document's image list.
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: usize,
    },
}

/// A laid-out page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// All text runs on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Whether any text run on the page equals `needle`.
    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t == needle)
    }

    pub fn images(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Image { .. }))
    }
}

/// Hooks invoked whenever the engine opens or closes a page.
///
/// `on_page_start` runs right after a page is opened and before any content
/// is placed on it; `on_page_end` runs when the page is closed, either
/// because a new page was requested or because the document was finished.
/// The engine suspends automatic page breaks while either hook runs.
pub trait PageLifecycle {
    fn on_page_start(&self, layout: &mut Layout<'_>);
    fn on_page_end(&self, layout: &mut Layout<'_>);
}

/// Lifecycle with no header or footer.
pub struct BarePages;

impl PageLifecycle for BarePages {
    fn on_page_start(&self, _layout: &mut Layout<'_>) {}
    fn on_page_end(&self, _layout: &mut Layout<'_>) {}
}

/// Flowing-layout engine producing a list of [`Page`]s.
pub struct Layout<'a> {
    lifecycle: &'a dyn PageLifecycle,
    pages: Vec<Page>,
    x: f32,
    y: f32,
    font: Option<(StandardFont, f32)>,
    in_hook: bool,
}

impl<'a> Layout<'a> {
    pub fn new(lifecycle: &'a dyn PageLifecycle) -> Self {
        Self {
            lifecycle,
            pages: Vec::new(),
            x: MARGIN_LEFT,
            y: MARGIN_TOP,
            font: None,
            in_hook: false,
        }
    }

    /// Current 1-based page number (0 before the first page).
    pub fn page_no(&self) -> usize {
        self.pages.len()
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Y coordinate at which automatic page breaks trigger.
    pub fn break_trigger(&self) -> f32 {
        PAGE_HEIGHT - MARGIN_BOTTOM
    }

    /// Move the cursor to the left margin at `y`. Negative values are
    /// measured from the bottom edge.
    pub fn set_y(&mut self, y: f32) {
        self.x = MARGIN_LEFT;
        self.y = if y < 0.0 { PAGE_HEIGHT + y } else { y };
    }

    pub fn set_font(&mut self, font: StandardFont, size: f32) {
        self.font = Some((font, size));
    }

    /// Line break: left margin, `h` mm down.
    pub fn ln(&mut self, h: f32) {
        self.x = MARGIN_LEFT;
        self.y += h;
    }

    /// Close the current page (if any) and open a new one.
    pub fn add_page(&mut self) {
        let font = self.font;
        if !self.pages.is_empty() {
            self.run_hook(|lifecycle, layout| lifecycle.on_page_end(layout));
        }
        let number = self.pages.len() + 1;
        self.pages.push(Page {
            number,
            ops: Vec::new(),
        });
        self.x = MARGIN_LEFT;
        self.y = MARGIN_TOP;
        self.run_hook(|lifecycle, layout| lifecycle.on_page_start(layout));
        // Content continues in the font that was active before the break.
        if font.is_some() {
            self.font = font;
        }
    }

    /// Close the last page and return the finished pages.
    pub fn finish(mut self) -> Vec<Page> {
        if !self.pages.is_empty() {
            self.run_hook(|lifecycle, layout| lifecycle.on_page_end(layout));
        }
        self.pages
    }

    fn run_hook(&mut self, hook: impl FnOnce(&dyn PageLifecycle, &mut Self)) {
        let lifecycle = self.lifecycle;
        self.in_hook = true;
        hook(lifecycle, self);
        self.in_hook = false;
    }

    /// Place a one-line cell of width `w` (0 = up to the right margin) and
    /// height `h`, breaking the page first if it would not fit.
    pub fn cell(&mut self, w: f32, h: f32, text: &str, align: Align, cursor: CursorMove) {
        if self.pages.is_empty() {
            self.add_page();
        }
        if !self.in_hook && self.y + h > self.break_trigger() {
            let x = self.x;
            self.add_page();
            self.x = x;
        }

        let w = if w == 0.0 {
            PAGE_WIDTH - MARGIN_RIGHT - self.x
        } else {
            w
        };

        let text = sanitize_text(text);
        if !text.is_empty() {
            if let Some((font, size)) = self.font {
                let text_x = match align {
                    Align::Left => self.x + CELL_PADDING,
                    Align::Center => self.x + (w - font.string_width(&text, size)) / 2.0,
                };
                // Vertically centred baseline: half the cell plus 0.3 em.
                let size_mm = size / PT_PER_MM;
                let baseline = self.y + 0.5 * h + 0.3 * size_mm;
                self.push(DrawOp::Text {
                    x: text_x,
                    y: baseline,
                    font,
                    size,
                    text,
                });
            }
        }

        match cursor {
            CursorMove::Right => self.x += w,
            CursorMove::NextLine => self.ln(h),
        }
    }

    /// Word-wrapped text across width `w` (0 = up to the right margin), one
    /// cell of height `h` per line. Returns the number of lines placed.
    pub fn multi_cell(&mut self, w: f32, h: f32, text: &str) -> usize {
        let Some((font, size)) = self.font else {
            return 0;
        };
        let w = if w == 0.0 {
            PAGE_WIDTH - MARGIN_RIGHT - self.x
        } else {
            w
        };
        let lines = wrap_text(&sanitize_text_keep_newlines(text), font, size, w - 2.0 * CELL_PADDING);
        for line in &lines {
            self.cell(w, h, line, Align::Left, CursorMove::NextLine);
        }
        lines.len()
    }

    /// Stroke a line between two points.
    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) {
        self.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width,
        });
    }

    /// Draw image number `image` with its top-left corner at `(x, y)`.
    pub fn image(&mut self, image: usize, x: f32, y: f32, w: f32, h: f32) {
        self.push(DrawOp::Image { x, y, w, h, image });
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }
}

fn sanitize_text_keep_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
        .split('\n')
        .map(sanitize_text)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FontStyle;
    use crate::render::metrics::BaseFamily;

    struct Numbered;

    impl PageLifecycle for Numbered {
        fn on_page_start(&self, layout: &mut Layout<'_>) {
            let n = layout.page_no();
            layout.cell(0.0, 10.0, &format!("start {n}"), Align::Left, CursorMove::NextLine);
        }

        fn on_page_end(&self, layout: &mut Layout<'_>) {
            let n = layout.page_no();
            layout.set_y(-15.0);
            layout.cell(0.0, 10.0, &format!("end {n}"), Align::Center, CursorMove::Right);
        }
    }

    fn font() -> StandardFont {
        StandardFont::new(BaseFamily::Helvetica, FontStyle::Regular)
    }

    #[test]
    fn hooks_run_for_every_page() {
        let hooks = Numbered;
        let mut layout = Layout::new(&hooks);
        layout.set_font(font(), 12.0);
        layout.add_page();
        for i in 0..60 {
            layout.cell(0.0, 8.0, &format!("line {i}"), Align::Left, CursorMove::NextLine);
        }
        let pages = layout.finish();
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(page.has_text(&format!("start {}", page.number)));
            assert!(page.has_text(&format!("end {}", page.number)));
        }
    }

    #[test]
    fn cell_breaks_before_crossing_trigger() {
        let mut layout = Layout::new(&BarePages);
        layout.set_font(font(), 12.0);
        layout.add_page();
        layout.set_y(269.0);
        layout.cell(0.0, 8.0, "fits", Align::Left, CursorMove::NextLine);
        assert_eq!(layout.page_no(), 1);
        assert_eq!(layout.y(), 277.0);
        layout.cell(0.0, 8.0, "breaks", Align::Left, CursorMove::NextLine);
        assert_eq!(layout.page_no(), 2);
        assert_eq!(layout.y(), MARGIN_TOP + 8.0);
    }

    #[test]
    fn footer_hook_never_breaks() {
        let hooks = Numbered;
        let mut layout = Layout::new(&hooks);
        layout.set_font(font(), 12.0);
        layout.add_page();
        let pages = layout.finish();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn centered_text_is_centered() {
        let mut layout = Layout::new(&BarePages);
        layout.set_font(font(), 16.0);
        layout.add_page();
        layout.cell(0.0, 10.0, "Title", Align::Center, CursorMove::NextLine);
        let pages = layout.finish();
        let DrawOp::Text { x, .. } = &pages[0].ops[0] else {
            panic!("expected text");
        };
        let w = font().string_width("Title", 16.0);
        let content = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        assert!((*x - (MARGIN_LEFT + (content - w) / 2.0)).abs() < 1e-3);
    }

    #[test]
    fn multi_cell_counts_lines() {
        let mut layout = Layout::new(&BarePages);
        layout.set_font(font(), 12.0);
        layout.add_page();
        let n = layout.multi_cell(0.0, 8.0, "a\nb\nc");
        assert_eq!(n, 3);
        assert_eq!(layout.y(), MARGIN_TOP + 24.0);
    }

    #[test]
    fn font_survives_page_break() {
        let hooks = Numbered;
        let mut layout = Layout::new(&hooks);
        let bold = StandardFont::new(BaseFamily::Helvetica, FontStyle::Bold);
        layout.set_font(bold, 12.0);
        layout.add_page();
        layout.set_y(275.0);
        layout.cell(0.0, 8.0, "after break", Align::Left, CursorMove::NextLine);
        let pages = layout.finish();
        let op = pages[1]
            .ops
            .iter()
            .find(|op| matches!(op, DrawOp::Text { text, .. } if text == "after break"))
            .unwrap();
        let DrawOp::Text { font, .. } = op else { unreachable!() };
        assert_eq!(*font, bold);
    }
}
