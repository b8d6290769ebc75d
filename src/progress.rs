//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to observe a
//! request as it moves from generation to rendering. The CLI uses it to drive
//! its spinner; an HTTP layer could forward the events to a client.
//!
//! # Example
//!
//! ```rust
//! use edgequake_report::{PipelineConfig, ReportProgressCallback};
//! use std::sync::Arc;
//!
//! struct PrintPages;
//!
//! impl ReportProgressCallback for PrintPages {
//!     fn on_render_complete(&self, pages: usize) {
//!         eprintln!("rendered {pages} pages");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(PrintPages))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// Pipeline stage named in failure events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preprocess,
    Generate,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Preprocess => "preprocess",
            Stage::Generate => "generate",
            Stage::Render => "render",
        })
    }
}

/// Called by the pipeline as it processes one request.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ReportProgressCallback: Send + Sync {
    /// Called just before the LLM request is sent.
    ///
    /// # Arguments
    /// * `model`     — model identifier in effect
    /// * `input_len` — byte length of the input text
    fn on_generation_start(&self, model: &str, input_len: usize) {
        let _ = (model, input_len);
    }

    /// Called when the model returned a valid report.
    ///
    /// # Arguments
    /// * `sections` — number of sections left after flattening (title excluded)
    fn on_generation_complete(&self, sections: usize) {
        let _ = sections;
    }

    /// Called once the PDF has been written.
    fn on_render_complete(&self, pages: usize) {
        let _ = pages;
    }

    /// Called when a stage fails; the request ends after this event.
    fn on_failure(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        sections: AtomicUsize,
        pages: AtomicUsize,
        failures: Mutex<Vec<(Stage, String)>>,
    }

    impl ReportProgressCallback for TrackingCallback {
        fn on_generation_complete(&self, sections: usize) {
            self.sections.store(sections, Ordering::SeqCst);
        }

        fn on_render_complete(&self, pages: usize) {
            self.pages.store(pages, Ordering::SeqCst);
        }

        fn on_failure(&self, stage: Stage, error: &str) {
            self.failures.lock().unwrap().push((stage, error.to_string()));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_generation_start("gpt-4o-mini", 10);
        cb.on_generation_complete(3);
        cb.on_render_complete(2);
        cb.on_failure(Stage::Render, "disk full");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_generation_complete(4);
        tracker.on_render_complete(2);
        tracker.on_failure(Stage::Generate, "timeout");

        assert_eq!(tracker.sections.load(Ordering::SeqCst), 4);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        let failures = tracker.failures.lock().unwrap();
        assert_eq!(failures[0].0, Stage::Generate);
        assert_eq!(failures[0].1, "timeout");
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Preprocess.to_string(), "preprocess");
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_failure(Stage::Preprocess, "ocr unavailable");
    }
}
