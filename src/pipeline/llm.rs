//! Completion calls with timeout, deadline and retry.
//!
//! Every stage funnels its request through [`call_with_retry`]. The client
//! itself does one round trip; this module wraps it with:
//!
//! * a per-call timeout (`api_timeout_secs`), clamped to whatever is left of
//!   the request [`Deadline`];
//! * exponential backoff (`retry_backoff_ms * 2^(retry - 1)`) for retryable
//!   failures only. With 500 ms base and 3 retries the waits are
//!   500 ms → 1 s → 2 s;
//! * post-processing of the returned text. A reply that cleans down to
//!   nothing counts as [`CompletionError::EmptyResponse`].
//!
//! Permanent failures (auth, invalid request, exhausted quota) return on the
//! first attempt.

use crate::client::{Completion, CompletionClient, CompletionRequest};
use crate::config::SummaryConfig;
use crate::error::CompletionError;
use crate::pipeline::postprocess;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

/// Retry and timeout settings for one completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SummaryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
            call_timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Absolute point in time after which no call or retry is started.
///
/// A budget too large to represent as an [`Instant`] never expires.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(budget),
            budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        match self.at {
            Some(at) => at.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        }
    }

    fn expired_error(&self) -> CompletionError {
        CompletionError::Timeout {
            secs: self.budget.as_secs(),
        }
    }
}

/// A successful call and what it cost.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub completion: Completion,
    pub retries: u32,
    pub duration_ms: u64,
}

/// Completion calls and token usage accumulated by a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub calls: usize,
    pub retries: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn record(&mut self, outcome: &CallOutcome) {
        self.calls += 1;
        self.retries += outcome.retries;
        self.input_tokens += outcome.completion.input_tokens;
        self.output_tokens += outcome.completion.output_tokens;
    }
}

/// Issue `request`, retrying retryable failures within `policy` and `deadline`.
pub async fn call_with_retry(
    client: &dyn CompletionClient,
    request: CompletionRequest,
    policy: RetryPolicy,
    deadline: Deadline,
) -> Result<CallOutcome, CompletionError> {
    let start = std::time::Instant::now();
    let stage = request.stage;
    let mut attempt: u32 = 0;

    loop {
        let remaining = deadline.remaining();
        if remaining.is_zero() {
            warn!("{}: request deadline exceeded before attempt {}", stage, attempt + 1);
            return Err(deadline.expired_error());
        }
        let budget = policy.call_timeout.min(remaining);

        let err = match timeout(budget, client.complete(request.clone())).await {
            Ok(Ok(mut completion)) => {
                completion.text = postprocess::clean_completion(&completion.text);
                if completion.text.is_empty() {
                    CompletionError::EmptyResponse
                } else {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    debug!(
                        "{}: completed in {}ms after {} retries ({} chars)",
                        stage,
                        duration_ms,
                        attempt,
                        completion.text.chars().count()
                    );
                    return Ok(CallOutcome {
                        completion,
                        retries: attempt,
                        duration_ms,
                    });
                }
            }
            Ok(Err(e)) => e,
            Err(_) => CompletionError::Timeout {
                secs: budget.as_secs().max(1),
            },
        };

        warn!("{}: attempt {} failed: {}", stage, attempt + 1, err);

        if !err.is_retryable() || attempt >= policy.max_retries {
            return Err(err);
        }

        attempt += 1;
        let backoff = policy.backoff_for(attempt).min(deadline.remaining());
        warn!(
            "{}: retry {}/{} after {}ms",
            stage,
            attempt,
            policy.max_retries,
            backoff.as_millis()
        );
        sleep(backoff).await;
    }
}
