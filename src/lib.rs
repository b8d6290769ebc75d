//! # edgequake-report
//!
//! Turn free-form notes into a formatted, signed PDF report.
//!
//! ## Why this crate?
//!
//! Field notes, chat messages and dictated memos rarely arrive in a shape
//! anyone wants to file. This crate asks an LLM to restructure the text into
//! a titled report with named sections, validates the reply against a strict
//! JSON schema, and lays it out as a paginated PDF with a header, page
//! numbers and a signature block. The model call is the only
//! non-deterministic step; layout and serialisation are pure functions of
//! their inputs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text
//!  │
//!  ├─ 1. Agent    one schema-constrained call to gpt-4o-mini / claude / …
//!  ├─ 2. Parse    strip fences, strict serde parse, whitespace cleanup
//!  ├─ 3. Flatten  ordered section map, title popped for the header
//!  ├─ 4. Layout   A4 pages, header/footer hooks, auto page breaks (spawn_blocking)
//!  └─ 5. Write    PDF 1.5 via lopdf, signature image as an XObject
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_report::{PipelineConfig, ReportPipeline, ReportRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let pipeline = ReportPipeline::new(PipelineConfig::default())?;
//!     let request = ReportRequest::new("Pump P-101 tripped at 03:10 ...", "incident.pdf")
//!         .signature("signature.png");
//!     let path = pipeline.process(&request).await?;
//!     eprintln!("wrote {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `text2report` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-report = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    FontStyle, PipelineConfig, PipelineConfigBuilder, ReportConfig, ReportConfigBuilder,
    TextStyle,
};
pub use error::{ErrorKind, ReportError};
pub use pipeline::agent::{BackendRequest, LlmBackend, ReportAgent, ReportBackend};
pub use pipeline::flatten::{flatten, FlatReport};
pub use pipeline::input::{DocumentOcr, NoOcr};
pub use process::{
    process_input_document, process_input_document_sync, ReportPipeline, ReportRequest,
    Transcriber,
};
pub use progress::{NoopProgressCallback, ProgressCallback, ReportProgressCallback, Stage};
pub use render::{DocumentRenderer, RenderSummary};
pub use schema::{Paragraph, StructuredReport};
