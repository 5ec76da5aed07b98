//! Progress-callback trait for summary pipeline events.
//!
//! Inject an [`Arc<dyn SummaryProgressCallback>`] via
//! [`crate::config::SummaryConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves between stages and works through chunks.
//!
//! # Example
//!
//! ```rust
//! use edgequake_summarize::{SummaryConfig, SummaryProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl SummaryProgressCallback for CountingCallback {
//!     fn on_chunk_complete(&self, index: usize, total: usize, fragment_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("chunk {}/{} summarized ({} chars)", index + 1, total, fragment_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = SummaryConfig::builder()
//!     .progress_callback(counter as Arc<dyn SummaryProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PipelineStage;
use std::sync::Arc;

/// Called by the pipeline as a summary request advances.
///
/// Implementations must be `Send + Sync`: chunk events fire from
/// concurrently running chunk calls and may arrive out of index order.
/// All methods default to no-ops.
pub trait SummaryProgressCallback: Send + Sync {
    /// Called on every state transition, including the terminal one.
    fn on_stage(&self, stage: PipelineStage) {
        let _ = stage;
    }

    /// Called once the chunker has run.
    ///
    /// # Arguments
    /// * `total_chunks` — number of chunk-summary calls that will be made
    fn on_chunks_planned(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called just before the completion request for a chunk is sent.
    ///
    /// # Arguments
    /// * `index` — 0-indexed chunk position
    /// * `total` — total chunks
    fn on_chunk_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a chunk is summarized.
    ///
    /// # Arguments
    /// * `index`        — 0-indexed chunk position
    /// * `total`        — total chunks
    /// * `fragment_len` — characters in the produced fragment
    fn on_chunk_complete(&self, index: usize, total: usize, fragment_len: usize) {
        let _ = (index, total, fragment_len);
    }

    /// Called when a chunk fails after all retries; the request is about to fail.
    ///
    /// `error` is owned so implementations can move it into a spawned task.
    fn on_chunk_error(&self, index: usize, total: usize, error: String) {
        let _ = (index, total, error);
    }

    /// Called once when the summary has been produced.
    ///
    /// # Arguments
    /// * `input_len`  — characters of trimmed input
    /// * `output_len` — characters of the final summary
    fn on_summary_complete(&self, input_len: usize, output_len: usize) {
        let _ = (input_len, output_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SummaryProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SummaryConfig`].
pub type ProgressCallback = Arc<dyn SummaryProgressCallback>;
