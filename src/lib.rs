//! # edgequake-summarize
//!
//! Summarize documents into short, medium or long summaries using LLMs.
//!
//! ## Why a pipeline instead of one prompt?
//!
//! A single "summarize this" call degrades badly on long inputs: the model
//! skims, runs out of context, or drops the second half. This crate first
//! cleans the extracted text, then summarizes overlapping chunks in
//! parallel, and only then writes the final tier-shaped summary from the
//! ordered chunk summaries.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Document (pdf / docx / pptx / txt / md, path or URL)
//!  │
//!  ├─ 1. Extract     text layer / OOXML runs / UTF-8 (spawn_blocking)
//!  ├─ 2. Normalize   one call: strip headers, page numbers, noise
//!  ├─ 3. Chunk       overlapping, boundary-aware, lazily produced
//!  ├─ 4. Fragments   concurrent per-chunk summaries, kept in chunk order
//!  ├─ 5. Synthesize  one call: short / medium / long
//!  └─ 6. Output      summary + lengths + call/token stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_summarize::{summarize_file, SummaryConfig, SummaryTier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = SummaryConfig::default();
//!     let output = summarize_file("report.pdf", SummaryTier::Short, &config).await?;
//!     println!("{}", output.summary);
//!     eprintln!("{} → {} chars, {} calls",
//!         output.input_length,
//!         output.output_length,
//!         output.stats.completion_calls);
//!     Ok(())
//! }
//! ```
//!
//! ## Bringing your own client
//!
//! Every stage talks to the model through [`CompletionClient`]. Implement it
//! to add caching or rate limiting, or to run the pipeline against a fake in
//! tests, and hand it to [`Summarizer::new`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `summarize` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ```toml
//! edgequake-summarize = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{resolve_client, Completion, CompletionClient, CompletionRequest, ProviderClient};
pub use config::{
    GenerationParams, SummaryConfig, SummaryConfigBuilder, SummaryTier, TierBudgets, DEFAULT_MODEL,
};
pub use error::{CompletionError, SummarizeError, GENERIC_ERROR_MESSAGE};
pub use output::{PipelineStage, SummaryOutput, SummaryStats};
pub use pipeline::chunk::{Chunk, Chunker};
pub use progress::{NoopProgressCallback, ProgressCallback, SummaryProgressCallback};
pub use summarize::{
    load_document, summarize, summarize_file, summarize_sync, summarize_to_file, validate_input,
    Summarizer, SummaryRequest,
};
