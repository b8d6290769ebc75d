//! Flattening: ordered paragraph list → ordered section map.
//!
//! The renderer consumes a single `name → body` map. Building it is a pure
//! fold over the paragraphs:
//!
//! * the map is seeded with `"Title" → report.title`;
//! * each paragraph with a non-blank key and non-blank text is inserted;
//! * a repeated key overwrites the earlier value **in place**, so the section
//!   keeps the position of its first occurrence (last write wins on content,
//!   first write wins on position);
//! * blank keys or bodies are skipped silently.

use crate::schema::StructuredReport;
use indexmap::IndexMap;

/// Key under which the report title is stored in a [`FlatReport`].
pub const TITLE_KEY: &str = "Title";

/// Title used when a flat report carries no `Title` entry.
pub const DEFAULT_TITLE: &str = "Generated Report";

/// Ordered `section name → section body` mapping with the title under
/// [`TITLE_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatReport {
    entries: IndexMap<String, String>,
}

impl FlatReport {
    /// The title entry, if present.
    pub fn title(&self) -> Option<&str> {
        self.entries.get(TITLE_KEY).map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order, including [`TITLE_KEY`].
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pop the title and return it with the remaining sections in order.
    ///
    /// The title is rendered by the page header, never as a section.
    pub fn into_parts(mut self) -> (String, IndexMap<String, String>) {
        let title = self
            .entries
            .shift_remove(TITLE_KEY)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        (title, self.entries)
    }
}

/// Flatten a structured report. Pure and deterministic.
pub fn flatten(report: &StructuredReport) -> FlatReport {
    let mut entries = IndexMap::with_capacity(report.paragraphs.len() + 1);
    entries.insert(TITLE_KEY.to_string(), report.title.clone());

    for paragraph in &report.paragraphs {
        if paragraph.key.trim().is_empty() || paragraph.text.trim().is_empty() {
            continue;
        }
        // IndexMap::insert on an existing key replaces the value and keeps
        // the original slot.
        entries.insert(paragraph.key.clone(), paragraph.text.clone());
    }

    FlatReport { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Paragraph;

    fn report(title: &str, paragraphs: &[(&str, &str)]) -> StructuredReport {
        StructuredReport::new(
            title,
            paragraphs
                .iter()
                .map(|(k, t)| Paragraph::new(*k, *t))
                .collect(),
        )
    }

    #[test]
    fn last_write_wins_in_place() {
        let flat = flatten(&report("T", &[("A", "1"), ("B", "2"), ("A", "3")]));
        assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["Title", "A", "B"]);
        assert_eq!(flat.get("Title"), Some("T"));
        assert_eq!(flat.get("A"), Some("3"));
        assert_eq!(flat.get("B"), Some("2"));
    }

    #[test]
    fn blank_key_is_dropped() {
        let flat = flatten(&report("T", &[(" ", "x"), ("", "y")]));
        assert_eq!(flat.len(), 1);
    }

    #[test]
    fn empty_text_is_dropped() {
        let flat = flatten(&report("T", &[("K", "")]));
        assert_eq!(flat.get("K"), None);
        assert_eq!(flat.len(), 1);
    }

    #[test]
    fn empty_paragraphs_yield_title_only() {
        let flat = flatten(&report("Only", &[]));
        assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["Title"]);
        assert_eq!(flat.title(), Some("Only"));
    }

    #[test]
    fn empty_title_is_kept() {
        let flat = flatten(&StructuredReport::default());
        assert_eq!(flat.title(), Some(""));
    }

    #[test]
    fn into_parts_pops_title_and_keeps_order() {
        let flat = flatten(&report("T", &[("Z", "z"), ("A", "a")]));
        let (title, sections) = flat.into_parts();
        assert_eq!(title, "T");
        assert_eq!(sections.keys().collect::<Vec<_>>(), vec!["Z", "A"]);
    }

    #[test]
    fn paragraph_keyed_title_overwrites_title() {
        let flat = flatten(&report("T", &[("Title", "Better")]));
        let (title, sections) = flat.into_parts();
        assert_eq!(title, "Better");
        assert!(sections.is_empty());
    }

    #[test]
    fn into_parts_without_title_uses_default() {
        let (title, _) = FlatReport::default().into_parts();
        assert_eq!(title, DEFAULT_TITLE);
    }
}
