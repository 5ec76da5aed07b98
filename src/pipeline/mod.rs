//! Pipeline stages for document summarization.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ chunk ──▶ fragments ──▶ synthesize
//! (path/URL)  (1 call)    (pure)    (N calls,      (1 call,
//!                                    bounded)       per tier)
//! ```
//!
//! 1. [`input`]      — resolve a path or URL and extract its text
//! 2. [`normalize`]  — one call that cleans extraction noise without summarizing
//! 3. [`chunk`]      — split the normalized text into overlapping chunks
//! 4. [`fragments`]  — summarize every chunk concurrently, keyed by index
//! 5. [`synthesize`] — join fragments in order and write the tier summary
//!
//! Every completion goes through [`llm::call_with_retry`], and every reply
//! through [`postprocess::clean_completion`].

pub mod chunk;
pub mod fragments;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod postprocess;
pub mod synthesize;

use crate::client::CompletionClient;
use crate::config::SummaryConfig;
use crate::prompts;
use llm::{Deadline, RetryPolicy};

/// What every completion-issuing stage needs: the client, the settings and
/// the request deadline. Borrowed, so one request's stages share it freely.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub client: &'a dyn CompletionClient,
    pub config: &'a SummaryConfig,
    pub deadline: Deadline,
}

impl<'a> StageContext<'a> {
    pub fn new(client: &'a dyn CompletionClient, config: &'a SummaryConfig, deadline: Deadline) -> Self {
        Self {
            client,
            config,
            deadline,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(self.config)
    }

    /// System prompt for the chunk and synthesis stages.
    pub fn analyst_prompt(&self) -> &'a str {
        self.config
            .system_prompt
            .as_deref()
            .unwrap_or(prompts::ANALYST_SYSTEM_PROMPT)
    }
}
