//! Standard-14 font selection, glyph metrics, WinAnsi encoding and word wrap.
//!
//! The renderer only uses the PDF base-14 faces, which every viewer ships,
//! so nothing is embedded. Widths come from the Adobe AFM files, in
//! thousandths of an em, for the printable ASCII range. Latin-1 characters
//! outside that range use the face's average width.

use crate::config::FontStyle;

/// Base-14 font family a configured family name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseFamily {
    Helvetica,
    Times,
    Courier,
}

impl BaseFamily {
    /// Resolve a configured family name. Arial and unknown families map to
    /// Helvetica, which shares Arial's metrics.
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "times" | "times new roman" | "times-roman" | "serif" => BaseFamily::Times,
            "courier" | "courier new" | "monospace" => BaseFamily::Courier,
            _ => BaseFamily::Helvetica,
        }
    }
}

/// A concrete base-14 face: family plus style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandardFont {
    pub family: BaseFamily,
    pub style: FontStyle,
}

impl StandardFont {
    pub fn new(family: BaseFamily, style: FontStyle) -> Self {
        Self { family, style }
    }

    /// PostScript name used as `/BaseFont` in the font dictionary.
    pub fn base_font(&self) -> &'static str {
        match (self.family, self.style) {
            (BaseFamily::Helvetica, FontStyle::Regular) => "Helvetica",
            (BaseFamily::Helvetica, FontStyle::Bold) => "Helvetica-Bold",
            (BaseFamily::Helvetica, FontStyle::Italic) => "Helvetica-Oblique",
            (BaseFamily::Helvetica, FontStyle::BoldItalic) => "Helvetica-BoldOblique",
            (BaseFamily::Times, FontStyle::Regular) => "Times-Roman",
            (BaseFamily::Times, FontStyle::Bold) => "Times-Bold",
            (BaseFamily::Times, FontStyle::Italic) => "Times-Italic",
            (BaseFamily::Times, FontStyle::BoldItalic) => "Times-BoldItalic",
            (BaseFamily::Courier, FontStyle::Regular) => "Courier",
            (BaseFamily::Courier, FontStyle::Bold) => "Courier-Bold",
            (BaseFamily::Courier, FontStyle::Italic) => "Courier-Oblique",
            (BaseFamily::Courier, FontStyle::BoldItalic) => "Courier-BoldOblique",
        }
    }

    /// Advance width of one character in thousandths of an em.
    pub fn glyph_width(&self, ch: char) -> u16 {
        let code = ch as u32;
        if !(32..=126).contains(&code) {
            return match self.family {
                BaseFamily::Helvetica => 556,
                BaseFamily::Times => 500,
                BaseFamily::Courier => 600,
            };
        }
        let idx = (code - 32) as usize;
        match self.family {
            BaseFamily::Courier => 600,
            // Times faces share the Roman metrics.
            BaseFamily::Times => TIMES_ROMAN_WIDTHS[idx],
            BaseFamily::Helvetica if self.style.is_bold() => HELVETICA_BOLD_WIDTHS[idx],
            BaseFamily::Helvetica => HELVETICA_WIDTHS[idx],
        }
    }

    /// Width of `text` in millimetres at `size_pt`.
    pub fn string_width(&self, text: &str, size_pt: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.glyph_width(c))).sum();
        units as f32 * size_pt / 1000.0 / PT_PER_MM
    }
}

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

/// Map text to the character repertoire of WinAnsiEncoding.
///
/// Tabs become spaces, other control characters are dropped and anything the
/// encoding cannot represent becomes `?`.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c if encode_char(c).is_some() => Some(c),
            _ => Some('?'),
        })
        .collect()
}

/// Encode text as WinAnsi bytes. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(|c| encode_char(c).unwrap_or(b'?')).collect()
}

/// Decode WinAnsi bytes (used when reading back rendered text).
pub fn decode_win_ansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            WIN_ANSI_HIGH
                .iter()
                .find(|(_, code)| *code == b)
                .map(|(c, _)| *c)
                .unwrap_or(b as char)
        })
        .collect()
}

/// Code points in the 0x80–0x9F block of WinAnsiEncoding.
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('\u{20AC}', 0x80), ('\u{201A}', 0x82), ('\u{0192}', 0x83), ('\u{201E}', 0x84),
    ('\u{2026}', 0x85), ('\u{2020}', 0x86), ('\u{2021}', 0x87), ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89), ('\u{0160}', 0x8A), ('\u{2039}', 0x8B), ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E), ('\u{2018}', 0x91), ('\u{2019}', 0x92), ('\u{201C}', 0x93),
    ('\u{201D}', 0x94), ('\u{2022}', 0x95), ('\u{2013}', 0x96), ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98), ('\u{2122}', 0x99), ('\u{0161}', 0x9A), ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C), ('\u{017E}', 0x9E), ('\u{0178}', 0x9F),
];

fn encode_char(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, b)| *b),
    }
}

/// Break `text` into lines no wider than `max_width` mm.
///
/// Explicit newlines always break. Words wider than a full line are split
/// by character. Runs of spaces collapse at line ends. An empty paragraph
/// (blank line in the input) yields an empty line.
pub fn wrap_text(text: &str, font: StandardFont, size_pt: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let space = font.string_width(" ", size_pt);

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let word_width = font.string_width(word, size_pt);

            if !current.is_empty() && current_width + space + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }

            if word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
                continue;
            }

            // Break an over-long word by character.
            for ch in word.chars() {
                let w = font.string_width(ch.encode_utf8(&mut [0; 4]), size_pt);
                if !current.is_empty() && current_width + w > max_width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                current.push(ch);
                current_width += w;
            }
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helvetica() -> StandardFont {
        StandardFont::new(BaseFamily::Helvetica, FontStyle::Regular)
    }

    #[test]
    fn resolve_families() {
        assert_eq!(BaseFamily::resolve("Arial"), BaseFamily::Helvetica);
        assert_eq!(BaseFamily::resolve("Times"), BaseFamily::Times);
        assert_eq!(BaseFamily::resolve("courier"), BaseFamily::Courier);
        assert_eq!(BaseFamily::resolve("Comic Sans"), BaseFamily::Helvetica);
    }

    #[test]
    fn base_font_names() {
        assert_eq!(
            StandardFont::new(BaseFamily::Helvetica, FontStyle::Bold).base_font(),
            "Helvetica-Bold"
        );
        assert_eq!(
            StandardFont::new(BaseFamily::Helvetica, FontStyle::Italic).base_font(),
            "Helvetica-Oblique"
        );
        assert_eq!(
            StandardFont::new(BaseFamily::Times, FontStyle::Regular).base_font(),
            "Times-Roman"
        );
    }

    #[test]
    fn string_width_matches_afm() {
        // "Hi" = 722 + 222 units; at 1000 pt that is 944 pt.
        let w = helvetica().string_width("Hi", 1000.0);
        assert!((w - 944.0 / PT_PER_MM).abs() < 1e-3);
        let bold = StandardFont::new(BaseFamily::Helvetica, FontStyle::Bold);
        assert!(bold.string_width("abc", 12.0) > helvetica().string_width("abc", 12.0));
    }

    #[test]
    fn wrap_basic() {
        let font = helvetica();
        let width = font.string_width("Hello world this", 12.0);
        let lines = wrap_text("Hello world this is a test", font, 12.0, width);
        assert!(lines.len() >= 2);
        assert_eq!(lines.join(" "), "Hello world this is a test");
        for line in &lines {
            assert!(font.string_width(line, 12.0) <= width + 1e-3);
        }
    }

    #[test]
    fn wrap_keeps_explicit_newlines() {
        let lines = wrap_text("one\n\ntwo", helvetica(), 12.0, 100.0);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn wrap_breaks_long_word() {
        let font = helvetica();
        let lines = wrap_text("Superlongword", font, 12.0, 10.0);
        assert!(lines.len() >= 2);
        assert_eq!(lines.concat(), "Superlongword");
    }

    #[test]
    fn wrap_empty_is_one_empty_line() {
        assert_eq!(wrap_text("", helvetica(), 12.0, 100.0), vec![String::new()]);
    }

    #[test]
    fn win_ansi_round_trip_for_latin1_and_quotes() {
        let text = "Café – “quoted” €5";
        let bytes = encode_win_ansi(text);
        assert_eq!(decode_win_ansi(&bytes), text);
    }

    #[test]
    fn sanitize_replaces_unmappable() {
        assert_eq!(sanitize_text("a\tb\u{7}c 日本"), "a bc ??");
    }
}
