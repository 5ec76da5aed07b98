//! Configuration types for document summarization.
//!
//! All pipeline behaviour is controlled through [`SummaryConfig`], built via
//! its [`SummaryConfigBuilder`]. Every knob that used to be a hard-coded
//! constant (model, per-stage temperature and output budget, chunk geometry,
//! retry policy, timeouts) lives here, so two pipelines with different
//! settings can run side by side in one process.

use crate::error::SummarizeError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Configuration for a summary request.
///
/// Built via [`SummaryConfig::builder()`] or using [`SummaryConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_summarize::SummaryConfig;
///
/// let config = SummaryConfig::builder()
///     .chunk_size(3000)
///     .chunk_overlap(300)
///     .concurrency(8)
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SummaryConfig {
    /// LLM model identifier, e.g. "gpt-4.1-nano", "claude-sonnet-4-20250514".
    /// If None, uses [`DEFAULT_MODEL`] or `EDGEQUAKE_MODEL`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Override for the analyst system prompt used by the chunk and synthesis stages.
    pub system_prompt: Option<String>,

    /// Generation parameters for the normalizer. Default: 0.2 / 3000 tokens.
    ///
    /// Low temperature keeps the cleanup faithful; the budget is generous
    /// because the output is roughly as long as the input.
    pub normalize: GenerationParams,

    /// Generation parameters for each chunk summary. Default: 0.3 / 700 tokens.
    pub chunk_summary: GenerationParams,

    /// Sampling temperature for the final synthesis call. Default: 0.3.
    pub synthesis_temperature: f32,

    /// Output-token budget per tier for the synthesis call.
    pub tier_budgets: TierBudgets,

    /// Target maximum chunk length in characters. Default: 2000.
    pub chunk_size: usize,

    /// Characters shared between neighbouring chunks. Default: 200.
    ///
    /// Must be smaller than `chunk_size`. A sentence cut at a boundary is seen
    /// whole by at least one of the two chunk summaries.
    pub chunk_overlap: usize,

    /// Number of concurrent chunk-summary calls. Default: 4.
    ///
    /// The calls are network-bound; raise it for long documents, lower it if
    /// the provider starts answering with 429.
    pub concurrency: usize,

    /// Maximum retry attempts on a retryable completion failure. Default: 3.
    ///
    /// Permanent failures (bad credential, rejected request, exhausted
    /// quota) are never retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Deadline for the whole request in seconds. Default: 600.
    ///
    /// Per-call timeouts are clamped to whatever is left of this budget.
    pub request_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Minimum trimmed input length in characters. Default: 20.
    pub min_input_chars: usize,

    /// Raw-text length above which the normalizer logs a truncation warning. Default: 12 000.
    pub normalize_warn_chars: usize,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            system_prompt: None,
            normalize: GenerationParams::new(0.2, 3000),
            chunk_summary: GenerationParams::new(0.3, 700),
            synthesis_temperature: 0.3,
            tier_budgets: TierBudgets::default(),
            chunk_size: 2000,
            chunk_overlap: 200,
            concurrency: 4,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            request_timeout_secs: 600,
            download_timeout_secs: 120,
            min_input_chars: 20,
            normalize_warn_chars: 12_000,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("normalize", &self.normalize)
            .field("chunk_summary", &self.chunk_summary)
            .field("synthesis_temperature", &self.synthesis_temperature)
            .field("tier_budgets", &self.tier_budgets)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("concurrency", &self.concurrency)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl SummaryConfig {
    /// Create a new builder for `SummaryConfig`.
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder {
            config: Self::default(),
        }
    }

    /// Generation parameters for the synthesis call of `tier`.
    pub fn synthesis_params(&self, tier: SummaryTier) -> GenerationParams {
        GenerationParams::new(self.synthesis_temperature, self.tier_budgets.for_tier(tier))
    }

    /// The model that will be requested from a named or auto-detected provider.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`SummaryConfig`].
pub struct SummaryConfigBuilder {
    config: SummaryConfig,
}

impl fmt::Debug for SummaryConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl SummaryConfigBuilder {
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

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn normalize(mut self, params: GenerationParams) -> Self {
        self.config.normalize = params.clamped();
        self
    }

    pub fn chunk_summary(mut self, params: GenerationParams) -> Self {
        self.config.chunk_summary = params.clamped();
        self
    }

    pub fn synthesis_temperature(mut self, t: f32) -> Self {
        self.config.synthesis_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn tier_budgets(mut self, budgets: TierBudgets) -> Self {
        self.config.tier_budgets = budgets;
        self
    }

    pub fn chunk_size(mut self, chars: usize) -> Self {
        self.config.chunk_size = chars;
        self
    }

    pub fn chunk_overlap(mut self, chars: usize) -> Self {
        self.config.chunk_overlap = chars;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn min_input_chars(mut self, chars: usize) -> Self {
        self.config.min_input_chars = chars;
        self
    }

    pub fn normalize_warn_chars(mut self, chars: usize) -> Self {
        self.config.normalize_warn_chars = chars;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummaryConfig, SummarizeError> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(SummarizeError::InvalidConfig(
                "Chunk size must be ≥ 1".into(),
            ));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(SummarizeError::InvalidConfig(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.concurrency == 0 {
            return Err(SummarizeError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 || c.request_timeout_secs == 0 {
            return Err(SummarizeError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.normalize.max_tokens == 0
            || c.chunk_summary.max_tokens == 0
            || c.tier_budgets.short == 0
            || c.tier_budgets.medium == 0
            || c.tier_budgets.long == 0
        {
            return Err(SummarizeError::InvalidConfig(
                "Output token budgets must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Temperature and output budget for one completion call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: usize,
}

impl GenerationParams {
    pub const fn new(temperature: f32, max_tokens: usize) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }

    fn clamped(self) -> Self {
        Self {
            temperature: self.temperature.clamp(0.0, 2.0),
            max_tokens: self.max_tokens,
        }
    }
}

/// Synthesis output budgets, one per tier.
///
/// The shape contract of each tier (bullet count, word count, headings) is
/// only requested in the prompt; the budget is the one hard limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBudgets {
    pub short: usize,
    pub medium: usize,
    pub long: usize,
}

impl Default for TierBudgets {
    fn default() -> Self {
        Self {
            short: 600,
            medium: 900,
            long: 1800,
        }
    }
}

impl TierBudgets {
    pub fn for_tier(&self, tier: SummaryTier) -> usize {
        match tier {
            SummaryTier::Short => self.short,
            SummaryTier::Medium => self.medium,
            SummaryTier::Long => self.long,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Output shape of the final summary.
///
/// | Tier | Shape |
/// |------|-------|
/// | short  | 7–10 executive bullet points |
/// | medium | 180–250 words of coherent prose (default) |
/// | long   | headed sections: Introduction / Main Sections / Key Findings / Conclusion |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryTier {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryTier {
    pub const ALL: [SummaryTier; 3] = [SummaryTier::Short, SummaryTier::Medium, SummaryTier::Long];

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryTier::Short => "short",
            SummaryTier::Medium => "medium",
            SummaryTier::Long => "long",
        }
    }
}

impl fmt::Display for SummaryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryTier {
    type Err = SummarizeError;

    /// Parse a tier name. Surrounding whitespace and case are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(SummaryTier::Short),
            "medium" => Ok(SummaryTier::Medium),
            "long" => Ok(SummaryTier::Long),
            _ => Err(SummarizeError::invalid_input(format!(
                "Invalid summary type '{s}': expected short, medium or long"
            ))),
        }
    }
}
