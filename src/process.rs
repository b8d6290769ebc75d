//! Request orchestration: text in, signed PDF out.
//!
//! ```text
//! text ──▶ ReportAgent ──▶ flatten ──▶ pop Title ──▶ DocumentRenderer ──▶ PDF
//! ```
//!
//! [`ReportPipeline::process`] returns a `Result`; the boolean
//! [`process_input_document`] logs every failure and returns `false`, which
//! is all an upstream caller (chat handler, web form) needs.
//!
//! On a generation failure no output file is created.

use crate::config::PipelineConfig;
use crate::error::ReportError;
use crate::pipeline::agent::{LlmBackend, ReportAgent, ReportBackend};
use crate::pipeline::flatten::{flatten, FlatReport, TITLE_KEY};
use crate::pipeline::input::{preprocess_document, DocumentOcr, NoOcr};
use crate::progress::{ReportProgressCallback, Stage};
use crate::render::{DocumentRenderer, RenderSummary};
use async_trait::async_trait;
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

/// One report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    /// Free-form notes to turn into a report.
    pub text: String,
    /// Destination PDF path.
    pub output: PathBuf,
    /// Optional signature image (PNG or JPEG).
    pub signature: Option<PathBuf>,
    /// Optional document to preprocess instead of generating a new report.
    pub input_document: Option<PathBuf>,
}

impl ReportRequest {
    pub fn new(text: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            output: output.into(),
            signature: None,
            input_document: None,
        }
    }

    pub fn signature(mut self, path: impl Into<PathBuf>) -> Self {
        self.signature = Some(path.into());
        self
    }

    pub fn input_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_document = Some(path.into());
        self
    }
}

/// Speech-to-text collaborator feeding audio notes into the pipeline.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, ReportError>;
}

/// A configured pipeline. Cheap to reuse across requests.
pub struct ReportPipeline {
    config: PipelineConfig,
    agent: ReportAgent,
    renderer: DocumentRenderer,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl ReportPipeline {
    /// Build a pipeline, resolving the LLM backend from `config` and the
    /// environment.
    pub fn new(config: PipelineConfig) -> Result<Self, ReportError> {
        let backend = resolve_backend(&config)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Build a pipeline around an explicit backend.
    pub fn with_backend(config: PipelineConfig, backend: Arc<dyn ReportBackend>) -> Self {
        let agent = ReportAgent::new(backend, &config);
        let renderer = DocumentRenderer::new(config.report.clone());
        Self {
            config,
            agent,
            renderer,
            transcriber: None,
        }
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        self.agent.model()
    }

    fn progress(&self) -> Option<&dyn ReportProgressCallback> {
        self.config.progress_callback.as_deref()
    }

    fn report_failure(&self, stage: Stage, err: &ReportError) {
        if let Some(cb) = self.progress() {
            cb.on_failure(stage, &err.to_string());
        }
    }

    /// Transcribe an audio note with the configured [`Transcriber`].
    pub async fn transcribe(&self, audio: &Path) -> Result<String, ReportError> {
        let Some(transcriber) = &self.transcriber else {
            return Err(ReportError::Unsupported(
                "audio input requires a speech-to-text backend; none is configured".into(),
            ));
        };
        if !audio.exists() {
            return Err(ReportError::FileNotFound {
                path: audio.to_path_buf(),
            });
        }
        transcriber.transcribe(audio).await
    }

    /// Generate and flatten a report without rendering it.
    pub async fn generate(&self, text: &str) -> Result<FlatReport, ReportError> {
        if let Some(cb) = self.progress() {
            cb.on_generation_start(self.model(), text.len());
        }
        let report = match self.agent.generate(text).await {
            Ok(report) => report,
            Err(e) => {
                self.report_failure(Stage::Generate, &e);
                return Err(e);
            }
        };
        let flat = flatten(&report);
        if let Some(cb) = self.progress() {
            let sections = flat.keys().filter(|k| *k != TITLE_KEY).count();
            cb.on_generation_complete(sections);
        }
        Ok(flat)
    }

    /// Run one request end to end, returning the written PDF path.
    pub async fn process(&self, request: &ReportRequest) -> Result<PathBuf, ReportError> {
        let span = info_span!("process", output = %request.output.display());
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &ReportRequest) -> Result<PathBuf, ReportError> {
        let start = Instant::now();

        if let Some(document) = &request.input_document {
            return self.preprocess(document).await;
        }

        let flat = self.generate(&request.text).await?;
        let (title, content) = flat.into_parts();

        let renderer = self.renderer.clone();
        let output = request.output.clone();
        let signature = request.signature.clone();
        let date = self.config.date.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            renderer.render_report(
                &content,
                &output,
                &title,
                signature.as_deref(),
                date.as_deref(),
            )
        })
        .await
        .map_err(|e| ReportError::Internal(format!("render task failed: {e}")))
        .and_then(|result| result);

        let summary: RenderSummary = match rendered {
            Ok(summary) => summary,
            Err(e) => {
                self.report_failure(Stage::Render, &e);
                return Err(e);
            }
        };
        if let Some(cb) = self.progress() {
            cb.on_render_complete(summary.pages);
        }

        info!(
            "Report written to {} ({} pages) in {:?}",
            summary.path.display(),
            summary.pages,
            start.elapsed()
        );
        Ok(summary.path)
    }

    /// Make an uploaded document text-searchable. Editing the document
    /// afterwards is not available, so a successful preprocessing still
    /// ends with [`ReportError::Unsupported`].
    async fn preprocess(&self, document: &Path) -> Result<PathBuf, ReportError> {
        let ocr: Arc<dyn DocumentOcr> = self
            .config
            .ocr
            .clone()
            .unwrap_or_else(|| Arc::new(NoOcr));
        let input = document.to_path_buf();
        let prepared = tokio::task::spawn_blocking(move || preprocess_document(&input, ocr.as_ref()))
            .await
            .map_err(|e| ReportError::Internal(format!("preprocess task failed: {e}")))
            .and_then(|result| result);

        let prepared = match prepared {
            Ok(path) => path,
            Err(e) => {
                self.report_failure(Stage::Preprocess, &e);
                return Err(e);
            }
        };
        info!("Document ready for editing: {}", prepared.display());

        let err = ReportError::Unsupported(format!(
            "editing existing documents is not available ({})",
            prepared.display()
        ));
        warn!("{}", err);
        Err(err)
    }

    /// [`process`](Self::process) collapsed to a success flag. Every
    /// failure is logged, including a panic in the backend or a callback.
    pub async fn process_input_document(&self, request: &ReportRequest) -> bool {
        match AssertUnwindSafe(self.process(request)).catch_unwind().await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                error!(
                    kind = ?e.kind(),
                    output = %request.output.display(),
                    "Error processing request: {}",
                    e
                );
                false
            }
            Err(payload) => {
                error!(
                    output = %request.output.display(),
                    "Error processing request: panicked: {}",
                    panic_message(payload.as_ref())
                );
                false
            }
        }
    }
}

/// Process one request with the default configuration.
///
/// Returns `true` when the PDF was written. Any failure (no provider,
/// generation, rendering, or an input document) is logged and yields
/// `false`.
pub async fn process_input_document(
    text: &str,
    output: impl AsRef<Path>,
    signature: Option<&Path>,
    input_document: Option<&Path>,
) -> bool {
    let mut request = ReportRequest::new(text, output.as_ref());
    request.signature = signature.map(Path::to_path_buf);
    request.input_document = input_document.map(Path::to_path_buf);

    let created = std::panic::catch_unwind(|| ReportPipeline::new(PipelineConfig::default()));
    let pipeline = match created {
        Ok(Ok(pipeline)) => pipeline,
        Ok(Err(e)) => {
            error!("Error processing request: {}", e);
            return false;
        }
        Err(payload) => {
            error!(
                "Error processing request: panicked: {}",
                panic_message(payload.as_ref())
            );
            return false;
        }
    };
    pipeline.process_input_document(&request).await
}

/// Synchronous wrapper around [`process_input_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_input_document_sync(
    text: &str,
    output: impl AsRef<Path>,
    signature: Option<&Path>,
    input_document: Option<&Path>,
) -> bool {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(process_input_document(
            text,
            output,
            signature,
            input_document,
        )),
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            false
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ReportError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReportError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the report backend, from most-specific to least-specific:
///
/// 1. a pre-built backend (`config.backend`)
/// 2. a pre-built provider (`config.provider`)
/// 3. a named provider (`config.provider_name`) with the configured model
/// 4. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 5. OpenAI, when `OPENAI_API_KEY` is set
/// 6. whatever [`ProviderFactory::from_env`] detects
pub fn resolve_backend(config: &PipelineConfig) -> Result<Arc<dyn ReportBackend>, ReportError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    let model = config.model_name().to_string();

    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(LlmBackend::new(Arc::clone(provider), model)));
    }

    if let Some(ref name) = config.provider_name {
        let provider = create_provider(name, &model)?;
        return Ok(Arc::new(LlmBackend::new(provider, model)));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            let provider = create_provider(&prov, &env_model)?;
            return Ok(Arc::new(LlmBackend::new(provider, env_model)));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let provider = create_provider("openai", &model)?;
            return Ok(Arc::new(LlmBackend::new(provider, model)));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReportError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;
    Ok(Arc::new(LlmBackend::new(llm_provider, model)))
}
