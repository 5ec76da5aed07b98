//! Result types returned by the summarization entry points.

use crate::config::SummaryTier;
use crate::pipeline::llm::Usage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a summary request currently is.
///
/// ```text
/// received → normalizing → chunking → summarizing-chunks → synthesizing → done
///     └──────────┴────────────┴──────────────┴───────────────────┴──────→ failed
/// ```
///
/// Nothing is persisted between states; the value exists for logging,
/// progress reporting and for tagging which stage a [`crate::CompletionError`]
/// came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    Received,
    Normalizing,
    Chunking,
    SummarizingChunks,
    Synthesizing,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::Chunking => "chunking",
            PipelineStage::SummarizingChunks => "summarizing-chunks",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single result of a summary request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    /// Final summary text, post-processed.
    pub summary: String,
    /// Tier the synthesizer was asked for.
    pub tier: SummaryTier,
    /// Characters in the trimmed input text.
    pub input_length: usize,
    /// Characters in `summary`.
    pub output_length: usize,
    /// Per-stage accounting.
    pub stats: SummaryStats,
}

/// Call counts, token usage and wall-clock timings for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Characters of normalized text handed to the chunker.
    pub normalized_length: usize,
    /// Number of chunks (and therefore chunk-summary calls).
    pub chunk_count: usize,
    /// Successful completion calls across all stages.
    pub completion_calls: usize,
    /// Extra attempts spent on retryable failures.
    pub retries: u32,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub normalize_duration_ms: u64,
    pub chunk_duration_ms: u64,
    pub synthesize_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl SummaryStats {
    /// Fold one stage's call accounting into the totals.
    pub fn add_usage(&mut self, usage: Usage) {
        self.completion_calls += usage.calls;
        self.retries += usage.retries;
        self.total_input_tokens += usage.input_tokens;
        self.total_output_tokens += usage.output_tokens;
    }
}
