//! Error types for the edgequake-report library.
//!
//! A single [`ReportError`] enum covers the whole pipeline, but each variant
//! belongs to one of three families reported by [`ReportError::kind`]:
//!
//! * [`ErrorKind::Backend`] — the LLM call failed or its reply did not match
//!   the report schema. The agent never returns a partial report.
//! * [`ErrorKind::Render`] — drawing or writing the PDF failed (bad signature
//!   image, unwritable destination).
//! * [`ErrorKind::Orchestration`] — everything else: bad configuration,
//!   missing input files, document preprocessing, internal faults.
//!
//! The boolean entry points ([`crate::process_input_document`],
//! [`crate::render::DocumentRenderer::render`]) log these errors and collapse
//! them to `false`; the `Result`-returning forms hand them to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`ReportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// LLM call or schema validation failure.
    Backend,
    /// PDF drawing or serialisation failure.
    Render,
    /// Any other pipeline failure.
    Orchestration,
}

/// All errors returned by the edgequake-report library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Backend errors ────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error from model '{model}': {message}")]
    LlmApiError { model: String, message: String },

    /// The LLM call did not finish before the deadline.
    #[error("LLM call to model '{model}' timed out after {secs}s")]
    ApiTimeout { model: String, secs: u64 },

    /// The reply could not be parsed as a structured report.
    #[error("Response from model '{model}' does not match the report schema: {detail}")]
    SchemaViolation { model: String, detail: String },

    /// The caller cancelled the LLM call before it completed.
    #[error("Report generation was cancelled")]
    Cancelled,

    /// There was no text to build a report from.
    #[error("Input text is empty")]
    EmptyInput,

    // ── Render errors ─────────────────────────────────────────────────────
    /// The signature image could not be read or decoded.
    #[error("Failed to load signature image '{path}': {detail}")]
    ImageLoad { path: PathBuf, detail: String },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// lopdf refused to encode the document.
    #[error("Failed to serialise PDF: {0}")]
    PdfSerialize(String),

    // ── Orchestration errors ──────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// OCR or text-extraction preprocessing of an input document failed.
    #[error("Preprocessing of '{path}' failed: {detail}")]
    Preprocess { path: PathBuf, detail: String },

    /// The requested operation has no implementation in this build.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// Which family of the error taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportError::ProviderNotConfigured { .. }
            | ReportError::LlmApiError { .. }
            | ReportError::ApiTimeout { .. }
            | ReportError::SchemaViolation { .. }
            | ReportError::Cancelled
            | ReportError::EmptyInput => ErrorKind::Backend,
            ReportError::ImageLoad { .. }
            | ReportError::OutputWriteFailed { .. }
            | ReportError::PdfSerialize(_) => ErrorKind::Render,
            ReportError::InvalidConfig(_)
            | ReportError::FileNotFound { .. }
            | ReportError::Preprocess { .. }
            | ReportError::Unsupported(_)
            | ReportError::Internal(_) => ErrorKind::Orchestration,
        }
    }
}

impl From<lopdf::Error> for ReportError {
    fn from(e: lopdf::Error) -> Self {
        ReportError::PdfSerialize(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_timeout_display() {
        let e = ReportError::ApiTimeout {
            model: "gpt-4o-mini".into(),
            secs: 60,
        };
        let msg = e.to_string();
        assert!(msg.contains("60s"), "got: {msg}");
        assert!(msg.contains("gpt-4o-mini"));
    }

    #[test]
    fn schema_violation_display() {
        let e = ReportError::SchemaViolation {
            model: "llama3".into(),
            detail: "missing field `Title`".into(),
        };
        assert!(e.to_string().contains("missing field `Title`"));
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(ReportError::Cancelled.kind(), ErrorKind::Backend);
        assert_eq!(
            ReportError::PdfSerialize("x".into()).kind(),
            ErrorKind::Render
        );
        assert_eq!(
            ReportError::ImageLoad {
                path: "sig.png".into(),
                detail: "bad".into()
            }
            .kind(),
            ErrorKind::Render
        );
        assert_eq!(
            ReportError::Unsupported("edit".into()).kind(),
            ErrorKind::Orchestration
        );
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = ReportError::OutputWriteFailed {
            path: "/nope/report.pdf".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no dir"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/nope/report.pdf"));
    }
}
