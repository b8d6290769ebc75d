//! Report generation: one schema-constrained LLM call per request.
//!
//! [`ReportAgent`] sends two messages: the writer instruction with the
//! schema contract appended, and the user instruction embedding the input
//! text. It then cleans and strictly parses the reply into a
//! [`StructuredReport`].
//!
//! ## Failure policy
//!
//! Exactly one attempt is made. Transport errors, a missed deadline, a
//! cancelled call and a reply that does not validate all end the request
//! with an `Err`; nothing is salvaged from a partially valid object. Each
//! failure is logged at `error` with the model name and the first
//! [`LOG_INPUT_CHARS`] characters of the input; the full text only ever
//! appears at `trace`.

use crate::config::PipelineConfig;
use crate::error::ReportError;
use crate::pipeline::postprocess::{clean_json_reply, normalise_report};
use crate::prompts::{system_message, user_message, DEFAULT_SYSTEM_PROMPT};
use crate::schema::StructuredReport;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, trace, Instrument};

/// Characters of input text included in log lines.
pub const LOG_INPUT_CHARS: usize = 80;

/// The two prompt messages plus sampling settings for one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    /// System message: writer instruction followed by the JSON-schema contract.
    pub system: String,
    /// User message embedding the input text.
    pub user: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// A language-model backend able to answer a [`BackendRequest`] with raw
/// JSON text.
///
/// Implementations return the reply verbatim; cleaning and schema
/// validation are done by [`ReportAgent`].
#[async_trait]
pub trait ReportBackend: Send + Sync {
    /// Model identifier, used in logs and errors.
    fn model(&self) -> &str;

    /// Perform one completion call.
    async fn complete(&self, request: &BackendRequest) -> Result<String, ReportError>;
}

/// [`ReportBackend`] over an `edgequake-llm` provider.
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl LlmBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ReportBackend for LlmBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &BackendRequest) -> Result<String, ReportError> {
        let messages = vec![
            ChatMessage::system(request.system.as_str()),
            ChatMessage::user(request.user.as_str()),
        ];
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ReportError::LlmApiError {
                model: self.model.clone(),
                message: e.to_string(),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.model, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Turns free text into a validated [`StructuredReport`].
pub struct ReportAgent {
    backend: Arc<dyn ReportBackend>,
    instruction: String,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl ReportAgent {
    /// Create an agent using the prompt, sampling and timeout settings of `config`.
    pub fn new(backend: Arc<dyn ReportBackend>, config: &PipelineConfig) -> Self {
        let instruction = config
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
            .to_string();
        info!("Initializing ReportAgent with model={}", backend.model());
        Self {
            backend,
            instruction,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Build the request sent to the backend for `text`.
    pub fn build_request(&self, text: &str) -> BackendRequest {
        BackendRequest {
            system: system_message(&self.instruction),
            user: user_message(text),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Generate a report, bounded by the configured timeout.
    pub async fn generate(&self, text: &str) -> Result<StructuredReport, ReportError> {
        self.generate_with_cancel(text, std::future::pending::<()>())
            .await
    }

    /// Generate a report, abandoning the call with [`ReportError::Cancelled`]
    /// as soon as `cancel` completes.
    pub async fn generate_with_cancel<F>(
        &self,
        text: &str,
        cancel: F,
    ) -> Result<StructuredReport, ReportError>
    where
        F: Future<Output = ()>,
    {
        let span = info_span!("report_agent", model = %self.model());
        let result = self.run(text, cancel).instrument(span.clone()).await;

        if let Err(ref e) = result {
            span.in_scope(|| {
                error!(
                    model = %self.model(),
                    input = %truncate_for_log(text, LOG_INPUT_CHARS),
                    "Error during report generation: {}",
                    e
                );
            });
        }
        result
    }

    async fn run<F>(&self, text: &str, cancel: F) -> Result<StructuredReport, ReportError>
    where
        F: Future<Output = ()>,
    {
        if text.trim().is_empty() {
            return Err(ReportError::EmptyInput);
        }

        let request = self.build_request(text);
        trace!("Full input text: {}", text);

        let start = Instant::now();
        let call = tokio::time::timeout(self.timeout, self.backend.complete(&request));

        let raw = tokio::select! {
            outcome = call => match outcome {
                Ok(reply) => reply?,
                Err(_) => {
                    return Err(ReportError::ApiTimeout {
                        model: self.model().to_string(),
                        secs: self.timeout.as_secs(),
                    })
                }
            },
            _ = cancel => return Err(ReportError::Cancelled),
        };

        debug!("Backend replied in {:?} ({} bytes)", start.elapsed(), raw.len());
        trace!("Raw reply: {}", raw);

        let cleaned = clean_json_reply(&raw);
        let report =
            StructuredReport::from_json(&cleaned).map_err(|e| ReportError::SchemaViolation {
                model: self.model().to_string(),
                detail: e.to_string(),
            })?;
        let report = normalise_report(report);

        info!(
            "LLM returned structured report '{}' with {} paragraphs",
            report.title,
            report.paragraphs.len()
        );
        Ok(report)
    }
}

/// Truncate `text` to at most `max_chars` characters for logging, marking
/// the cut with an ellipsis.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &text[..idx]),
        None => text.to_string(),
    }
}
