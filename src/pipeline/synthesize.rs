//! Synthesizer stage: the tier-shaped final summary.

use crate::client::CompletionRequest;
use crate::config::SummaryTier;
use crate::error::SummarizeError;
use crate::output::PipelineStage;
use crate::pipeline::llm::{call_with_retry, Usage};
use crate::pipeline::StageContext;
use crate::prompts;
use tracing::debug;

/// Fragments in chunk order, joined by [`prompts::FRAGMENT_SEPARATOR`].
///
/// This string is exactly what the synthesis call sees as document content.
pub fn combine_fragments(fragments: &[String]) -> String {
    fragments.join(prompts::FRAGMENT_SEPARATOR)
}

/// Write the `tier` summary of the combined fragments.
pub async fn synthesize(
    ctx: &StageContext<'_>,
    tier: SummaryTier,
    fragments: &[String],
) -> Result<(String, Usage), SummarizeError> {
    let combined = combine_fragments(fragments);
    debug!(
        "Synthesizing {} summary from {} fragments ({} chars)",
        tier,
        fragments.len(),
        combined.chars().count()
    );

    let request = CompletionRequest::new(
        PipelineStage::Synthesizing,
        ctx.analyst_prompt(),
        prompts::synthesis_message(tier, &combined),
        ctx.config.synthesis_params(tier),
    );

    let outcome = call_with_retry(ctx.client, request, ctx.retry_policy(), ctx.deadline)
        .await
        .map_err(|source| SummarizeError::CompletionFailed {
            stage: PipelineStage::Synthesizing,
            source,
        })?;

    let mut usage = Usage::default();
    usage.record(&outcome);
    Ok((outcome.completion.text, usage))
}
