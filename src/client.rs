//! The completion-service seam.
//!
//! Every pipeline stage talks to the language model through the
//! [`CompletionClient`] trait: one request in, one generated text out. The
//! production implementation, [`ProviderClient`], is a thin adapter over an
//! [`edgequake_llm::LLMProvider`]; tests substitute call-recording fakes.
//!
//! The client holds no mutable state. A single `Arc<dyn CompletionClient>`
//! is shared by every concurrent chunk call and by concurrent requests.

use crate::config::{GenerationParams, SummaryConfig};
use crate::error::{CompletionError, SummarizeError};
use crate::output::PipelineStage;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// One completion call: a system instruction, a user message and sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Stage issuing the call; used for logging and by test doubles.
    pub stage: PipelineStage,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl CompletionRequest {
    pub fn new(
        stage: PipelineStage,
        system: impl Into<String>,
        user: impl Into<String>,
        params: GenerationParams,
    ) -> Self {
        Self {
            stage,
            system: system.into(),
            user: user.into(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }
}

/// Generated text plus token usage reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Completion {
    /// A completion with no token accounting, handy for fakes.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A language-model completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Perform one round trip. No retry, no timeout: both are applied by the caller.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError>;
}

/// [`CompletionClient`] backed by an edgequake-llm provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }

    /// Provider label used in logs ("openai/gpt-4.1-nano", "custom", …).
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[async_trait]
impl CompletionClient for ProviderClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        let messages = vec![
            ChatMessage::system(request.system.as_str()),
            ChatMessage::user(request.user.as_str()),
        ];
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| {
                debug!("{} [{}]: provider error: {}", self.label, request.stage, e);
                CompletionError::from(&e)
            })?;

        debug!(
            "{} [{}]: {} input tokens, {} output tokens",
            self.label, request.stage, response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }

        Ok(Completion {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

/// Resolve the completion client from config, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key (`OPENAI_API_KEY`, …) from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **`OPENAI_API_KEY`** present: OpenAI with the configured model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
///
/// A missing credential fails here, before any pipeline stage runs, with
/// [`SummarizeError::ProviderNotConfigured`].
pub fn resolve_client(config: &SummaryConfig) -> Result<Arc<dyn CompletionClient>, SummarizeError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderClient::new(Arc::clone(provider), "custom")));
    }

    if let Some(ref name) = config.provider_name {
        return create_client(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_client(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_client("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SummarizeError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(ProviderClient::new(llm_provider, "auto")))
}

fn create_client(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn CompletionClient>, SummarizeError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SummarizeError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderClient::new(
        provider,
        format!("{provider_name}/{model}"),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_copies_generation_params() {
        let req = CompletionRequest::new(
            PipelineStage::Normalizing,
            "sys",
            "user",
            GenerationParams::new(0.2, 3000),
        );
        assert_eq!(req.temperature, 0.2);
        assert_eq!(req.max_tokens, 3000);
        assert_eq!(req.stage, PipelineStage::Normalizing);
    }

    #[test]
    fn completion_text_has_no_usage() {
        let c = Completion::text("hello");
        assert_eq!(c.text, "hello");
        assert_eq!(c.input_tokens + c.output_tokens, 0);
    }
}
