//! CLI binary for edgequake-report.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and reports the outcome.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_report::{
    PipelineConfig, ReportPipeline, ReportProgressCallback, ReportRequest, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that follows the request through generation and rendering.
struct CliProgressCallback {
    spinner: ProgressBar,
    started: Instant,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        spinner.set_style(style);
        spinner.set_prefix("Preparing");
        spinner.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            spinner,
            started: Instant::now(),
        })
    }
}

impl ReportProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, model: &str, input_len: usize) {
        self.spinner.set_prefix("Generating");
        self.spinner
            .set_message(format!("{model}  {}", dim(&format!("{input_len} bytes of notes"))));
    }

    fn on_generation_complete(&self, sections: usize) {
        self.spinner.println(format!(
            "  {} {} sections  {}",
            green("✓"),
            sections,
            dim(&format!("{:.1}s", self.started.elapsed().as_secs_f64()))
        ));
        self.spinner.set_prefix("Rendering");
        self.spinner.set_message("laying out pages…");
    }

    fn on_render_complete(&self, pages: usize) {
        self.spinner.finish_and_clear();
        eprintln!(
            "{} {} page(s) rendered in {:.1}s",
            green("✔"),
            bold(&pages.to_string()),
            self.started.elapsed().as_secs_f64()
        );
    }

    fn on_failure(&self, stage: Stage, error: &str) {
        self.spinner.finish_and_clear();
        let msg = match error.char_indices().nth(120) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error.to_string(),
        };
        eprintln!("{} {} failed: {}", red("✘"), stage, red(&msg));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Notes on the command line
  text2report "Pump P-101 tripped twice overnight, seal replaced at 14:00" -o incident.pdf

  # Notes from a file, with a signature image
  text2report --text-file notes.txt --signature sig.png -o report.pdf

  # Notes from stdin
  cat notes.txt | text2report --text-file - -o report.pdf

  # Pin the creation date (reproducible output)
  text2report --date "2024-05-01 09:00:00 CET" notes... -o report.pdf

  # Use a specific model
  text2report --provider anthropic --model claude-sonnet-4-20250514 --text-file notes.txt

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Turn free-form notes into a formatted, signed PDF report.
#[derive(Parser, Debug)]
#[command(
    name = "text2report",
    version,
    about = "Turn free-form notes into a formatted, signed PDF report",
    long_about = "Restructure free-form notes into a titled report with named sections using an \
LLM, then lay it out as a paginated PDF with a header, page numbers and a signature block. \
Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Notes to turn into a report.
    #[arg(conflicts_with_all = ["text_file", "audio"])]
    text: Option<String>,

    /// Read notes from this file ("-" for stdin).
    #[arg(long, conflicts_with = "audio")]
    text_file: Option<PathBuf>,

    /// Transcribe an audio note instead of reading text.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Destination PDF.
    #[arg(short, long, env = "TEXT2REPORT_OUTPUT", default_value = "report.pdf")]
    output: PathBuf,

    /// Signature image (PNG or JPEG) placed in the signature block.
    #[arg(long, env = "TEXT2REPORT_SIGNATURE")]
    signature: Option<PathBuf>,

    /// Existing document (image or PDF) to preprocess instead of generating.
    #[arg(long)]
    document: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4o-mini, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "TEXT2REPORT_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// LLM call timeout in seconds.
    #[arg(long, env = "TEXT2REPORT_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Creation date printed in the signature block (default: now).
    #[arg(long)]
    date: Option<String>,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers stage feedback, so library INFO logs stay quiet
    // unless -v is given.
    let show_progress = !cli.no_progress && cli.verbose == 0;
    let filter = match cli.verbose {
        0 if show_progress => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress: Option<Arc<dyn ReportProgressCallback>> = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };

    let config = build_config(&cli, progress)?;
    let pipeline = ReportPipeline::new(config).context("Failed to initialise the LLM backend")?;

    let text = read_notes(&cli, &pipeline).await?;

    let mut request = ReportRequest::new(text, &cli.output);
    request.signature = cli.signature.clone();
    request.input_document = cli.document.clone();

    let path = pipeline
        .process(&request)
        .await
        .with_context(|| format!("Failed to produce {}", cli.output.display()))?;

    if !show_progress {
        eprintln!("{} {}", green("✔"), path.display());
    } else {
        eprintln!("   {}", dim(&path.display().to_string()));
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<Arc<dyn ReportProgressCallback>>,
) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .temperature(cli.temperature)
        .api_timeout_secs(cli.timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref date) = cli.date {
        builder = builder.date(date.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Collect the notes from the positional argument, a file, stdin or audio.
async fn read_notes(cli: &Cli, pipeline: &ReportPipeline) -> Result<String> {
    if let Some(ref audio) = cli.audio {
        return pipeline
            .transcribe(audio)
            .await
            .with_context(|| format!("Failed to transcribe {}", audio.display()));
    }

    let text = match (&cli.text, &cli.text_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read notes from stdin")?;
            buf
        }
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read notes from {}", path.display()))?,
        (None, None) if cli.document.is_some() => String::new(),
        (None, None) => bail!("no notes given: pass TEXT, --text-file or --audio"),
    };
    Ok(text)
}
