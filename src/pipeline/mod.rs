//! Generation stages: from free text to an ordered section map.
//!
//! ## Data Flow
//!
//! ```text
//! [input] ──▶ agent ──▶ postprocess ──▶ flatten
//! (OCR)      (LLM)      (clean/parse)   (ordered map)
//! ```
//!
//! 1. [`input`]  — optional preprocessing of an uploaded document; OCR sits
//!    behind the [`input::DocumentOcr`] trait
//! 2. [`agent`]  — the single schema-constrained LLM call, bounded by a
//!    timeout and cancellable; the only stage with network I/O
//! 3. [`postprocess`] — strip fences and stray characters from the reply,
//!    then normalise whitespace in the parsed report
//! 4. [`flatten`] — pure conversion into an insertion-ordered map with the
//!    title under `"Title"`

pub mod agent;
pub mod flatten;
pub mod input;
pub mod postprocess;
