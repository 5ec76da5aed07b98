//! Normalizer stage: one completion that strips extraction noise.
//!
//! The whole raw text goes out in a single call with a 3000-token output
//! budget. Documents far above [`crate::SummaryConfig::normalize_warn_chars`]
//! will be cut short by that budget; the stage logs a warning and carries on.

use crate::client::CompletionRequest;
use crate::error::SummarizeError;
use crate::output::PipelineStage;
use crate::pipeline::llm::{call_with_retry, Usage};
use crate::pipeline::StageContext;
use crate::prompts;
use tracing::{debug, warn};

/// Clean `raw_text`. Returns the normalized text and the call's usage.
pub async fn normalize(ctx: &StageContext<'_>, raw_text: &str) -> Result<(String, Usage), SummarizeError> {
    let raw_chars = raw_text.chars().count();
    if raw_chars > ctx.config.normalize_warn_chars {
        warn!(
            "Normalizer input is {} chars (> {}); output may be truncated by the {}-token budget",
            raw_chars, ctx.config.normalize_warn_chars, ctx.config.normalize.max_tokens
        );
    }

    let request = CompletionRequest::new(
        PipelineStage::Normalizing,
        prompts::NORMALIZE_SYSTEM_PROMPT,
        prompts::normalize_message(raw_text),
        ctx.config.normalize,
    );

    let outcome = call_with_retry(ctx.client, request, ctx.retry_policy(), ctx.deadline)
        .await
        .map_err(|source| SummarizeError::CompletionFailed {
            stage: PipelineStage::Normalizing,
            source,
        })?;

    let mut usage = Usage::default();
    usage.record(&outcome);
    debug!(
        "Normalized {} → {} chars",
        raw_chars,
        outcome.completion.text.chars().count()
    );
    Ok((outcome.completion.text, usage))
}
