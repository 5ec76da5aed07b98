//! CLI binary for edgequake-summarize.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SummaryConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_summarize::{
    load_document, PipelineStage, ProgressCallback, SummarizeError, Summarizer, SummaryConfig,
    SummaryOutput, SummaryProgressCallback, SummaryStats, SummaryTier,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while the single-call stages run, a chunk counter while the
/// fan-out runs. Chunk events may arrive out of order.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(Self::spinner_style());
        bar.set_prefix("Preparing");
        bar.set_message("loading input…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS)
    }

    fn chunk_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} chunks  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS)
    }
}

impl SummaryProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: PipelineStage) {
        match stage {
            PipelineStage::Received => {
                self.bar.set_prefix("Received");
                self.bar.set_message("validating input…");
            }
            PipelineStage::Normalizing => {
                self.bar.set_prefix("Normalizing");
                self.bar.set_message("cleaning extracted text…");
            }
            PipelineStage::Chunking => self.bar.set_prefix("Chunking"),
            PipelineStage::SummarizingChunks => {
                self.bar.set_style(Self::chunk_style());
                self.bar.set_prefix("Summarizing");
                self.bar.reset_eta();
            }
            PipelineStage::Synthesizing => {
                self.bar.set_style(Self::spinner_style());
                self.bar.set_prefix("Synthesizing");
                self.bar.set_message("writing final summary…");
            }
            PipelineStage::Done | PipelineStage::Failed => self.bar.finish_and_clear(),
        }
    }

    fn on_chunks_planned(&self, total_chunks: usize) {
        self.bar.set_length(total_chunks as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Summarizing {total_chunks} chunks…"))
        ));
    }

    fn on_chunk_complete(&self, index: usize, total: usize, fragment_len: usize) {
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{fragment_len:>5} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_chunk_error(&self, index: usize, total: usize, error: String) {
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error
        };
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_summary_complete(&self, input_len: usize, output_len: usize) {
        eprintln!(
            "{} {} chars summarized into {}",
            green("✔"),
            bold(&input_len.to_string()),
            bold(&output_len.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Medium summary of a PDF (stdout)
  summarize report.pdf

  # Executive bullet points of a slide deck
  summarize --tier short deck.pptx

  # Detailed sectioned summary written to a file
  summarize --tier long thesis.docx -o thesis-summary.md

  # Summarize raw text or stdin
  summarize --text "$(cat notes.txt)"
  pbpaste | summarize - --tier short

  # From a URL, JSON output
  summarize https://arxiv.org/pdf/1706.03762 --json > attention.json

TIERS:
  short    7–10 executive bullet points
  medium   180–250 words of coherent prose (default)
  long     Introduction / Main Sections / Key Findings / Conclusion

SUPPORTED INPUTS:
  .pdf  .docx  .pptx  .txt  .md   (local path or http(s) URL)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID

SETUP:
  1. Set API key:     export OPENAI_API_KEY=sk-...
  2. Summarize:       summarize document.pdf --tier short
"#;

/// Summarize documents into short, medium or long summaries using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "summarize",
    version,
    about = "Summarize documents into short, medium or long summaries using LLMs",
    long_about = "Summarize PDF, DOCX, PPTX, text and Markdown documents (local files or URLs) \
with a normalize → chunk → summarize → synthesize pipeline. Supports OpenAI, Anthropic, \
Google Gemini, Azure OpenAI, and any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local document path, HTTP/HTTPS URL, or `-` for stdin.
    input: Option<String>,

    /// Raw text to summarize. Used when INPUT is absent or yields no text.
    #[arg(long, env = "SUMMARIZE_TEXT")]
    text: Option<String>,

    /// Summary tier.
    #[arg(short, long, env = "SUMMARIZE_TIER", value_enum, default_value = "medium")]
    tier: TierArg,

    /// Write the summary to this file instead of stdout.
    #[arg(short, long, env = "SUMMARIZE_OUTPUT")]
    output: Option<PathBuf>,

    /// Output JSON (summary, summary_type, lengths, stats) instead of plain text.
    #[arg(long, env = "SUMMARIZE_JSON")]
    json: bool,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Number of concurrent chunk-summary calls.
    #[arg(short, long, env = "SUMMARIZE_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Maximum chunk length in characters.
    #[arg(long, env = "SUMMARIZE_CHUNK_SIZE", default_value_t = 2000)]
    chunk_size: usize,

    /// Characters shared between neighbouring chunks.
    #[arg(long, env = "SUMMARIZE_CHUNK_OVERLAP", default_value_t = 200)]
    chunk_overlap: usize,

    /// Retries per call on retryable LLM failures.
    #[arg(long, env = "SUMMARIZE_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "SUMMARIZE_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Deadline for the whole summary in seconds.
    #[arg(long, env = "SUMMARIZE_REQUEST_TIMEOUT", default_value_t = 600)]
    request_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "SUMMARIZE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "SUMMARIZE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SUMMARIZE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SUMMARIZE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TierArg {
    Short,
    Medium,
    Long,
}

impl From<TierArg> for SummaryTier {
    fn from(v: TierArg) -> Self {
        match v {
            TierArg::Short => SummaryTier::Short,
            TierArg::Medium => SummaryTier::Medium,
            TierArg::Long => SummaryTier::Long,
        }
    }
}

/// JSON body printed with `--json`.
#[derive(Serialize)]
struct JsonResponse<'a> {
    summary: &'a str,
    summary_type: SummaryTier,
    original_length: usize,
    summary_length: usize,
    stats: &'a SummaryStats,
}

impl<'a> From<&'a SummaryOutput> for JsonResponse<'a> {
    fn from(o: &'a SummaryOutput) -> Self {
        Self {
            summary: &o.summary,
            summary_type: o.tier,
            original_length: o.input_length,
            summary_length: o.output_length,
            stats: &o.stats,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgressCallback::new);
    let (text, summarizer) = prepare(&cli, progress).await?;

    // ── Run pipeline ─────────────────────────────────────────────────────
    let output = summarizer
        .summarize(&text, cli.tier.into())
        .await
        .map_err(user_facing)?;

    // ── Emit ─────────────────────────────────────────────────────────────
    let rendered = if cli.json {
        serde_json::to_string_pretty(&JsonResponse::from(&output))
            .context("Failed to serialise output")?
    } else {
        output.summary.clone()
    };

    if let Some(ref output_path) = cli.output {
        edgequake_summarize::summarize::write_atomic(output_path, &rendered)
            .await
            .context("Failed to write summary")?;
        if !cli.quiet {
            eprintln!("{}  →  {}", green("✔"), bold(&output_path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet && !cli.json {
        let s = &output.stats;
        eprintln!(
            "   {} chunks  /  {} calls ({} retries)  /  {} tokens in  /  {} tokens out  —  {}ms total",
            s.chunk_count,
            s.completion_calls,
            s.retries,
            dim(&s.total_input_tokens.to_string()),
            dim(&s.total_output_tokens.to_string()),
            s.total_duration_ms,
        );
    }

    Ok(())
}

/// Pipeline errors: caller errors keep their message, everything else becomes
/// the generic one. Full detail goes to the debug log.
fn user_facing(e: SummarizeError) -> anyhow::Error {
    tracing::debug!("{e}");
    anyhow::anyhow!(e.user_message())
}

/// Build the config, gather input text and resolve the provider.
///
/// Any failure here happens before the pipeline reports a stage, so the
/// spinner is cleared before the error reaches the terminal.
async fn prepare(
    cli: &Cli,
    progress: Option<Arc<CliProgressCallback>>,
) -> Result<(String, Summarizer)> {
    let callback = progress
        .clone()
        .map(|cb| cb as ProgressCallback);
    let ready = async {
        let config = build_config(cli, callback)?;
        let text = read_input(cli, &config)
            .await
            .context("Failed to read input")?;
        let summarizer =
            Summarizer::from_config(config).context("Failed to set up LLM provider")?;
        Ok::<_, anyhow::Error>((text, summarizer))
    }
    .await;

    if ready.is_err() {
        if let Some(cb) = progress {
            cb.bar.finish_and_clear();
        }
    }
    ready
}

/// Document text if INPUT yields any, otherwise `--text`.
async fn read_input(cli: &Cli, config: &SummaryConfig) -> Result<String, SummarizeError> {
    let from_input = match cli.input.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| SummarizeError::Internal(format!("Failed to read stdin: {e}")))?;
            Some(buf)
        }
        Some(path) => Some(load_document(path, config).await?),
        None => None,
    };

    match (from_input, cli.text.as_ref()) {
        (Some(doc), _) if !doc.trim().is_empty() => Ok(doc),
        (_, Some(raw)) => Ok(raw.clone()),
        (Some(doc), None) => Ok(doc),
        (None, None) => Err(SummarizeError::InvalidInput {
            reason: "Provide a document path, URL, `-` or --text".into(),
        }),
    }
}

/// Map CLI args to `SummaryConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SummaryConfig> {
    let mut builder = SummaryConfig::builder()
        .concurrency(cli.concurrency)
        .chunk_size(cli.chunk_size)
        .chunk_overlap(cli.chunk_overlap)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .request_timeout_secs(cli.request_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_input_clears_the_spinner() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.txt");
        let cli = Cli::try_parse_from(["summarize", missing.to_str().unwrap()]).unwrap();
        let progress = CliProgressCallback::new();

        let err = prepare(&cli, Some(progress.clone()))
            .await
            .err()
            .expect("prepare should fail");

        assert!(format!("{err:#}").contains("Failed to read input"));
        assert!(progress.bar.is_finished());
    }

    #[tokio::test]
    async fn invalid_config_clears_the_spinner() {
        let cli = Cli::try_parse_from([
            "summarize",
            "--text",
            "anything",
            "--chunk-size",
            "100",
            "--chunk-overlap",
            "100",
        ])
        .unwrap();
        let progress = CliProgressCallback::new();

        let err = prepare(&cli, Some(progress.clone()))
            .await
            .err()
            .expect("prepare should fail");

        assert!(format!("{err:#}").contains("Invalid configuration"));
        assert!(progress.bar.is_finished());
    }
}
