//! Post-processing: deterministic cleanup of raw LLM replies.
//!
//! Even when told to "respond with JSON only", models occasionally wrap the
//! object in ` ```json ` fences, prepend a sentence, or leak zero-width
//! characters. These rules fix the envelope without touching the content.
//! Schema validation happens afterwards on the cleaned string, so a reply
//! that is still not a valid report is rejected as a whole.
//!
//! ## Rule Order
//!
//! Invisible characters are removed first so the fence regex sees a clean
//! first line; the object is isolated last because fences may contain braces
//! of their own.

use crate::schema::StructuredReport;
use once_cell::sync::Lazy;
use regex::Regex;

/// Clean the raw reply text so it can be handed to the JSON parser.
///
/// Rules (applied in order):
/// 1. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 2. Strip outer markdown fences (` ```json … ``` ` or bare ` ``` `)
/// 3. Isolate the outermost `{ … }` object, dropping leading/trailing prose
pub fn clean_json_reply(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = strip_json_fences(&s);
    isolate_object(&s)
}

/// Normalise the text fields of a parsed report.
///
/// CRLF line endings become LF, trailing whitespace is trimmed from every
/// line and headings lose surrounding whitespace. Paragraph order and count
/// are never changed.
pub fn normalise_report(mut report: StructuredReport) -> StructuredReport {
    report.title = report.title.trim().to_string();
    for p in &mut report.paragraphs {
        p.key = p.key.trim().to_string();
        p.text = trim_trailing_whitespace(&normalise_line_endings(&p.text))
            .trim()
            .to_string();
    }
    report
}

// ── Rule 1: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 2: Strip outer fences ───────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n```\s*$").expect("valid regex")
});

fn strip_json_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    }
}

// ── Rule 3: Isolate the JSON object ──────────────────────────────────────────

fn isolate_object(input: &str) -> String {
    match (input.find('{'), input.rfind('}')) {
        (Some(start), Some(end)) if start < end => input[start..=end].to_string(),
        _ => input.trim().to_string(),
    }
}

// ── Text normalisation helpers ───────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Paragraph;

    #[test]
    fn test_strip_json_fences() {
        let input = "```json\n{\"Title\":\"T\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"Title\":\"T\"}");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = "```\n{\"Title\":\"T\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"Title\":\"T\"}");
    }

    #[test]
    fn test_no_fences_passthrough() {
        assert_eq!(strip_json_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_isolate_object_drops_prose() {
        let input = "Here is your report:\n{\"Title\":\"T\"}\nHope it helps!";
        assert_eq!(isolate_object(input), "{\"Title\":\"T\"}");
    }

    #[test]
    fn test_isolate_object_without_braces() {
        assert_eq!(isolate_object("  not json "), "not json");
    }

    #[test]
    fn test_remove_invisible() {
        assert_eq!(remove_invisible_chars("\u{FEFF}{\u{200B}}"), "{}");
    }

    #[test]
    fn test_clean_json_reply_full_pipeline() {
        let raw = "\u{FEFF}```json\n{\"Title\":\"Audit\",\"paragraphs\":[]}\n```\n";
        let cleaned = clean_json_reply(raw);
        let report = StructuredReport::from_json(&cleaned).unwrap();
        assert_eq!(report.title, "Audit");
    }

    #[test]
    fn test_normalise_report_keeps_order() {
        let report = StructuredReport::new(
            "  Audit ",
            vec![
                Paragraph::new(" B ", "line one  \r\nline two \r\n"),
                Paragraph::new("A", "x"),
            ],
        );
        let out = normalise_report(report);
        assert_eq!(out.title, "Audit");
        assert_eq!(out.paragraphs[0].key, "B");
        assert_eq!(out.paragraphs[0].text, "line one\nline two");
        assert_eq!(out.paragraphs[1].key, "A");
    }
}
