//! Summarization entry points and the pipeline orchestrator.
//!
//! [`Summarizer`] owns the completion client and the configuration and runs
//! one request through the stages:
//!
//! ```text
//! received → normalizing → chunking → summarizing-chunks → synthesizing → done
//! ```
//!
//! Any error moves the request to `failed` and is returned as-is; no partial
//! summary ever escapes. Input validation happens before the first call, so
//! rejected input costs nothing.
//!
//! The free functions ([`summarize`], [`summarize_file`], [`summarize_sync`],
//! [`summarize_to_file`]) resolve the client from the configuration on each
//! call. Hold a [`Summarizer`] to reuse one client across requests.

use crate::client::{resolve_client, CompletionClient};
use crate::config::{SummaryConfig, SummaryTier};
use crate::error::SummarizeError;
use crate::output::{PipelineStage, SummaryOutput, SummaryStats};
use crate::pipeline::chunk::{Chunk, Chunker};
use crate::pipeline::llm::Deadline;
use crate::pipeline::{fragments, input, normalize, synthesize, StageContext};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Input text plus the tier it should be summarized to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub text: String,
    pub tier: SummaryTier,
}

impl SummaryRequest {
    pub fn new(text: impl Into<String>, tier: SummaryTier) -> Self {
        Self {
            text: text.into(),
            tier,
        }
    }

    /// Build a request from a caller-supplied tier name (`short`, `medium`, `long`).
    pub fn parse(text: impl Into<String>, tier_name: &str) -> Result<Self, SummarizeError> {
        let tier = tier_name.parse::<SummaryTier>()?;
        Ok(Self::new(text, tier))
    }
}

/// Check the input precondition and return the trimmed text.
pub fn validate_input(text: &str, min_chars: usize) -> Result<&str, SummarizeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SummarizeError::invalid_input("Input text is empty"));
    }
    let chars = trimmed.chars().count();
    if chars < min_chars {
        return Err(SummarizeError::invalid_input(format!(
            "Input text is too short to summarize ({chars} chars, minimum {min_chars})"
        )));
    }
    Ok(trimmed)
}

/// Runs summary requests against one completion client.
///
/// Cheap to share: wrap it in an `Arc` and call it from as many tasks as
/// needed. Requests hold no state in the summarizer.
pub struct Summarizer {
    client: Arc<dyn CompletionClient>,
    config: SummaryConfig,
}

impl Summarizer {
    /// Use an explicit client, e.g. a test double or a wrapped provider.
    pub fn new(client: Arc<dyn CompletionClient>, config: SummaryConfig) -> Self {
        Self { client, config }
    }

    /// Resolve the client from `config` (explicit provider, named provider or
    /// environment). Fails with [`SummarizeError::ProviderNotConfigured`]
    /// when no credential is available.
    pub fn from_config(config: SummaryConfig) -> Result<Self, SummarizeError> {
        let client = resolve_client(&config)?;
        Ok(Self::new(client, config))
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Summarize `text` to `tier`.
    pub async fn summarize(&self, text: &str, tier: SummaryTier) -> Result<SummaryOutput, SummarizeError> {
        let result = self.run(text, tier).await;
        match &result {
            Ok(output) => {
                self.enter(PipelineStage::Done);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_summary_complete(output.input_length, output.output_length);
                }
            }
            Err(e) => {
                error!("Summary request failed: {}", e);
                self.enter(PipelineStage::Failed);
            }
        }
        result
    }

    /// Summarize `text` to the tier named by `tier_name`.
    ///
    /// An unknown tier name is rejected before any call is made.
    pub async fn summarize_request(&self, text: &str, tier_name: &str) -> Result<SummaryOutput, SummarizeError> {
        let request = SummaryRequest::parse(text, tier_name)?;
        self.summarize(&request.text, request.tier).await
    }

    /// 7–10 executive bullet points.
    pub async fn short_summary(&self, text: &str) -> Result<SummaryOutput, SummarizeError> {
        self.summarize(text, SummaryTier::Short).await
    }

    /// 180–250 words of coherent prose.
    pub async fn medium_summary(&self, text: &str) -> Result<SummaryOutput, SummarizeError> {
        self.summarize(text, SummaryTier::Medium).await
    }

    /// Headed sections: Introduction, Main Sections, Key Findings, Conclusion.
    pub async fn long_summary(&self, text: &str) -> Result<SummaryOutput, SummarizeError> {
        self.summarize(text, SummaryTier::Long).await
    }

    async fn run(&self, text: &str, tier: SummaryTier) -> Result<SummaryOutput, SummarizeError> {
        let total_start = Instant::now();
        self.enter(PipelineStage::Received);

        // ── Step 1: Validate before any external call ───────────────────────
        let input = validate_input(text, self.config.min_input_chars)?;
        let input_length = input.chars().count();
        let chunker = Chunker::new(self.config.chunk_size, self.config.chunk_overlap)?;
        info!("Summarizing {} chars to a {} summary", input_length, tier);

        let deadline = Deadline::after(Duration::from_secs(self.config.request_timeout_secs));
        let ctx = StageContext::new(self.client.as_ref(), &self.config, deadline);
        let mut stats = SummaryStats::default();

        // ── Step 2: Normalize ───────────────────────────────────────────────
        self.enter(PipelineStage::Normalizing);
        let stage_start = Instant::now();
        let (normalized, usage) = normalize::normalize(&ctx, input).await?;
        stats.normalize_duration_ms = stage_start.elapsed().as_millis() as u64;
        stats.normalized_length = normalized.chars().count();
        stats.add_usage(usage);

        // ── Step 3: Chunk ───────────────────────────────────────────────────
        self.enter(PipelineStage::Chunking);
        let chunks: Vec<Chunk<'_>> = chunker.chunks(&normalized).collect();
        stats.chunk_count = chunks.len();
        debug!(
            "{} chunks (size {}, overlap {})",
            chunks.len(),
            chunker.max_len(),
            chunker.overlap()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_chunks_planned(chunks.len());
        }

        // ── Step 4: Summarize chunks ────────────────────────────────────────
        self.enter(PipelineStage::SummarizingChunks);
        let stage_start = Instant::now();
        let (fragments, usage) = fragments::summarize_chunks(&ctx, &chunks).await?;
        stats.chunk_duration_ms = stage_start.elapsed().as_millis() as u64;
        stats.add_usage(usage);

        // ── Step 5: Synthesize ──────────────────────────────────────────────
        self.enter(PipelineStage::Synthesizing);
        let stage_start = Instant::now();
        let (summary, usage) = synthesize::synthesize(&ctx, tier, &fragments).await?;
        stats.synthesize_duration_ms = stage_start.elapsed().as_millis() as u64;
        stats.add_usage(usage);

        stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
        let output_length = summary.chars().count();

        info!(
            "Summary complete: {} → {} chars, {} calls ({} retries), {}ms total",
            input_length, output_length, stats.completion_calls, stats.retries, stats.total_duration_ms
        );

        Ok(SummaryOutput {
            summary,
            tier,
            input_length,
            output_length,
            stats,
        })
    }

    fn enter(&self, stage: PipelineStage) {
        debug!("Pipeline stage: {}", stage);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage(stage);
        }
    }
}

// ── Free-function entry points ──────────────────────────────────────────────

/// Summarize `text` with a client resolved from `config`.
///
/// Input is validated before the provider is resolved, so bad input is
/// reported as [`SummarizeError::InvalidInput`] even with no credentials set.
pub async fn summarize(
    text: &str,
    tier: SummaryTier,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummarizeError> {
    validate_input(text, config.min_input_chars)?;
    Summarizer::from_config(config.clone())?
        .summarize(text, tier)
        .await
}

/// Extract the text of a local file or HTTP(S) URL.
///
/// Does not require an LLM provider or API key.
pub async fn load_document(input_str: impl AsRef<str>, config: &SummaryConfig) -> Result<String, SummarizeError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    input::extract_text(resolved.path()).await
}

/// Summarize a document (pdf, docx, pptx, txt, md) given as a path or URL.
pub async fn summarize_file(
    input_str: impl AsRef<str>,
    tier: SummaryTier,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummarizeError> {
    let input_str = input_str.as_ref();
    info!("Loading document: {}", input_str);
    let text = load_document(input_str, config).await?;
    summarize(&text, tier, config).await
}

/// Synchronous wrapper around [`summarize`].
///
/// Creates a temporary tokio runtime internally.
pub fn summarize_sync(
    text: &str,
    tier: SummaryTier,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummarizeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SummarizeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(summarize(text, tier, config))
}

/// Summarize a document and write the summary text to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn summarize_to_file(
    input_str: impl AsRef<str>,
    tier: SummaryTier,
    output_path: impl AsRef<Path>,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummarizeError> {
    let output = summarize_file(input_str, tier, config).await?;
    write_atomic(output_path.as_ref(), &output.summary).await?;
    Ok(output)
}

/// Write `contents` (plus a trailing newline) via a sibling temp file and rename.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), SummarizeError> {
    let write_failed = |source| SummarizeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, format!("{}\n", contents.trim_end()))
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;
    Ok(())
}
