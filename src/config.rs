//! Configuration types for report generation and rendering.
//!
//! Two structs, two lifetimes:
//!
//! * [`PipelineConfig`] — how to reach the model and run the pipeline. Built
//!   once and reused across requests.
//! * [`ReportConfig`] — the visual style of one rendered document. Built per
//!   render call and never mutated afterwards.
//!
//! Both are built through validating builders.

use crate::error::ReportError;
use crate::pipeline::agent::ReportBackend;
use crate::pipeline::input::DocumentOcr;
use crate::progress::ReportProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for the text → PDF pipeline.
///
/// # Example
/// ```rust
/// use edgequake_report::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .model("gpt-4o-mini")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// LLM model identifier, e.g. "gpt-4o-mini". If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed report backend. Takes precedence over every provider
    /// setting; used by tests and by callers with their own structured-output
    /// client.
    pub backend: Option<Arc<dyn ReportBackend>>,

    /// Sampling temperature. Default: 0.0.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2048.
    pub max_tokens: usize,

    /// Deadline for the single LLM call in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom system instruction. If None, uses the built-in writer prompt.
    /// The schema contract is appended either way.
    pub system_prompt: Option<String>,

    /// Visual style of the rendered report.
    pub report: ReportConfig,

    /// Fixed creation date for the signature block. If None, the local wall
    /// clock at render time is used.
    pub date: Option<String>,

    /// OCR collaborator for scanned input documents.
    pub ocr: Option<Arc<dyn DocumentOcr>>,

    /// Optional progress observer.
    pub progress_callback: Option<Arc<dyn ReportProgressCallback>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            backend: None,
            temperature: 0.0,
            max_tokens: 2048,
            api_timeout_secs: 60,
            system_prompt: None,
            report: ReportConfig::default(),
            date: None,
            ocr: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn ReportBackend>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("system_prompt", &self.system_prompt)
            .field("report", &self.report)
            .field("date", &self.date)
            .field("ocr", &self.ocr.as_ref().map(|_| "<dyn DocumentOcr>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ReportProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model identifier in effect.
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ReportBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn report(mut self, report: ReportConfig) -> Self {
        self.config.report = report;
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.config.date = Some(date.into());
        self
    }

    pub fn ocr(mut self, ocr: Arc<dyn DocumentOcr>) -> Self {
        self.config.ocr = Some(ocr);
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ReportProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, ReportError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(ReportError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ReportError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if matches!(c.model.as_deref(), Some(m) if m.trim().is_empty()) {
            return Err(ReportError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Report style ─────────────────────────────────────────────────────────

/// Font weight/slant of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    /// The classic one-letter style token (`""`, `"B"`, `"I"`, `"BI"`).
    pub fn token(self) -> &'static str {
        match self {
            FontStyle::Regular => "",
            FontStyle::Bold => "B",
            FontStyle::Italic => "I",
            FontStyle::BoldItalic => "BI",
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

impl FromStr for FontStyle {
    type Err = ReportError;

    /// Parse a style token. Accepts `""`, `"B"`, `"I"`, `"BI"`, `"IB"`
    /// in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_uppercase();
        if token.chars().any(|c| c != 'B' && c != 'I') {
            return Err(ReportError::InvalidConfig(format!(
                "unknown font style token '{s}'"
            )));
        }
        Ok(match (token.contains('B'), token.contains('I')) {
            (false, false) => FontStyle::Regular,
            (true, false) => FontStyle::Bold,
            (false, true) => FontStyle::Italic,
            (true, true) => FontStyle::BoldItalic,
        })
    }
}

/// Style and point size for one class of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub style: FontStyle,
    /// Font size in points.
    pub size: f32,
}

impl TextStyle {
    pub const fn new(style: FontStyle, size: f32) -> Self {
        Self { style, size }
    }
}

/// Visual configuration of a rendered report.
///
/// Defaults: `Arial`, header bold 16 pt, subheader bold 14 pt, body regular
/// 12 pt, footer italic 8 pt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub font_family: String,
    pub header: TextStyle,
    pub subheader: TextStyle,
    pub body: TextStyle,
    pub footer: TextStyle,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            header: TextStyle::new(FontStyle::Bold, 16.0),
            subheader: TextStyle::new(FontStyle::Bold, 14.0),
            body: TextStyle::new(FontStyle::Regular, 12.0),
            footer: TextStyle::new(FontStyle::Italic, 8.0),
        }
    }
}

impl ReportConfig {
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.config.font_family = family.into();
        self
    }

    pub fn header(mut self, style: FontStyle, size: f32) -> Self {
        self.config.header = TextStyle::new(style, size);
        self
    }

    pub fn subheader(mut self, style: FontStyle, size: f32) -> Self {
        self.config.subheader = TextStyle::new(style, size);
        self
    }

    pub fn body(mut self, style: FontStyle, size: f32) -> Self {
        self.config.body = TextStyle::new(style, size);
        self
    }

    pub fn footer(mut self, style: FontStyle, size: f32) -> Self {
        self.config.footer = TextStyle::new(style, size);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if c.font_family.trim().is_empty() {
            return Err(ReportError::InvalidConfig(
                "font family must not be empty".into(),
            ));
        }
        for (name, style) in [
            ("header", c.header),
            ("subheader", c.subheader),
            ("body", c.body),
            ("footer", c.footer),
        ] {
            if !(style.size.is_finite() && style.size > 0.0) {
                return Err(ReportError::InvalidConfig(format!(
                    "{name} font size must be > 0, got {}",
                    style.size
                )));
            }
        }
        Ok(self.config)
    }
}
