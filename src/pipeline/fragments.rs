//! Chunk summarizer stage: one completion per chunk, run concurrently.
//!
//! Calls are driven through `buffer_unordered(concurrency)`, so they finish
//! in any order. Each reply is written into the slot of its chunk index and
//! the returned fragments are in chunk order regardless of completion order.
//!
//! The first chunk that fails after retries fails the stage. Returning drops
//! the stream, which cancels every call still in flight.

use crate::client::CompletionRequest;
use crate::error::SummarizeError;
use crate::output::PipelineStage;
use crate::pipeline::chunk::Chunk;
use crate::pipeline::llm::{call_with_retry, Usage};
use crate::pipeline::StageContext;
use crate::prompts;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// Summarize every chunk. `fragments[i]` is the summary of `chunks[i]`.
pub async fn summarize_chunks(
    ctx: &StageContext<'_>,
    chunks: &[Chunk<'_>],
) -> Result<(Vec<String>, Usage), SummarizeError> {
    let total = chunks.len();
    let callback = ctx.config.progress_callback.as_ref();
    let policy = ctx.retry_policy();

    let mut in_flight = stream::iter(chunks.iter().enumerate().map(|(index, chunk)| async move {
        if let Some(cb) = callback {
            cb.on_chunk_start(index, total);
        }
        let request = CompletionRequest::new(
            PipelineStage::SummarizingChunks,
            ctx.analyst_prompt(),
            prompts::chunk_message(chunk.text),
            ctx.config.chunk_summary,
        );
        let result = call_with_retry(ctx.client, request, policy, ctx.deadline).await;
        if let Some(cb) = callback {
            match &result {
                Ok(outcome) => cb.on_chunk_complete(index, total, outcome.completion.text.chars().count()),
                Err(e) => cb.on_chunk_error(index, total, e.to_string()),
            }
        }
        (index, result)
    }))
    .buffer_unordered(ctx.config.concurrency.max(1));

    let mut slots: Vec<Option<String>> = vec![None; total];
    let mut usage = Usage::default();

    while let Some((index, result)) = in_flight.next().await {
        match result {
            Ok(outcome) => {
                debug!("Chunk {}/{} summarized", index + 1, total);
                usage.record(&outcome);
                slots[index] = Some(outcome.completion.text);
            }
            Err(source) => {
                warn!("Chunk {}/{} failed: {}; aborting request", index + 1, total, source);
                return Err(SummarizeError::CompletionFailed {
                    stage: PipelineStage::SummarizingChunks,
                    source,
                });
            }
        }
    }

    let fragments = slots
        .into_iter()
        .collect::<Option<Vec<String>>>()
        .ok_or_else(|| SummarizeError::Internal("chunk summary missing after fan-out".into()))?;

    Ok((fragments, usage))
}
