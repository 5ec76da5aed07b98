//! Error types for the edgequake-summarize library.
//!
//! Two distinct error types reflect two distinct layers:
//!
//! * [`SummarizeError`] — **Fatal**: the summary request cannot complete
//!   (input too short, unsupported file, provider not configured, a stage
//!   failed after retries). Returned as `Err(SummarizeError)` from every
//!   public entry point. No partial summary is ever returned alongside it.
//!
//! * [`CompletionError`] — a single call to the completion service failed.
//!   It is classified as retryable (timeouts, transport blips, 429/5xx) or
//!   permanent (bad credential, rejected request, exhausted quota) so the
//!   retry loop in [`crate::pipeline::llm`] knows whether another attempt can
//!   help. Once retries are exhausted it is wrapped in
//!   [`SummarizeError::CompletionFailed`] together with the stage it hit.

use crate::output::PipelineStage;
use edgequake_llm::LlmError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use thiserror::Error;

/// Message shown to end users for every error that is not a caller error.
///
/// Backend error detail (status codes, provider bodies) stays in the logs.
pub const GENERIC_ERROR_MESSAGE: &str = "Internal summarization error";

/// All fatal errors returned by the edgequake-summarize library.
#[derive(Debug, Error)]
pub enum SummarizeError {
    // ── Caller errors ─────────────────────────────────────────────────────
    /// Text is empty or too short, or the tier name is not recognised.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one of pdf, docx, pptx, txt, md.
    #[error("Unsupported file format: .{extension}\nSupported formats: pdf, docx, pptx, txt, md")]
    UnsupportedFormat { extension: String },

    /// The container was recognised but its text could not be read.
    #[error("Failed to extract text from '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A pipeline stage failed; retries (if any applied) were exhausted.
    #[error("Completion failed during {stage}: {source}")]
    CompletionFailed {
        stage: PipelineStage,
        #[source]
        source: CompletionError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SummarizeError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        SummarizeError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// `true` for errors caused by what the caller sent (HTTP 400 territory).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SummarizeError::InvalidInput { .. } | SummarizeError::UnsupportedFormat { .. }
        )
    }

    /// The message safe to show an end user.
    ///
    /// Caller errors carry a specific, actionable message; everything else
    /// collapses to [`GENERIC_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            SummarizeError::InvalidInput { reason } => reason.clone(),
            SummarizeError::UnsupportedFormat { extension } => {
                format!("Unsupported file type: .{extension}")
            }
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// A failed call to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    // ── Retryable ─────────────────────────────────────────────────────────
    /// The call did not finish within its per-call budget or the request deadline.
    #[error("call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection reset, DNS failure, TLS error and similar.
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP 429 without a quota-exhaustion marker.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// HTTP 5xx / overloaded backend.
    #[error("server error: {0}")]
    ServerError(String),

    /// The backend answered, but with no usable text.
    #[error("empty or malformed response")]
    EmptyResponse,

    // ── Permanent ─────────────────────────────────────────────────────────
    /// HTTP 401/403 or a missing/invalid API key.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// HTTP 400-class rejection (context too long, bad parameters).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Billing quota exhausted; waiting will not help.
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Anything the classifier could not place.
    #[error("{0}")]
    Other(String),
}

impl CompletionError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::Timeout { .. }
                | CompletionError::Transport(_)
                | CompletionError::RateLimited(_)
                | CompletionError::ServerError(_)
                | CompletionError::EmptyResponse
        )
    }

    /// Classify a free-form provider message.
    ///
    /// Used for the untyped [`LlmError::ApiError`] / [`LlmError::Unknown`]
    /// cases, where the provider only renders its status code or error type
    /// into the text. Status codes are matched as whole tokens, and
    /// permanent classes are checked before transient ones.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
        let msg = message.to_string();

        if has(&["insufficient_quota", "quota exceeded", "exceeded your current quota", "billing"]) {
            CompletionError::QuotaExhausted(msg)
        } else if RE_AUTH_STATUS.is_match(&lower)
            || has(&["unauthorized", "forbidden", "invalid api key", "invalid_api_key", "authentication"])
        {
            CompletionError::Auth(msg)
        } else if RE_RATE_STATUS.is_match(&lower) || has(&["rate limit", "rate_limit", "too many requests"]) {
            CompletionError::RateLimited(msg)
        } else if has(&["timed out", "timeout", "deadline"]) {
            CompletionError::Timeout { secs: 0 }
        } else if RE_CLIENT_STATUS.is_match(&lower)
            || has(&["invalid request", "invalid_request", "context length", "maximum context", "not found"])
        {
            CompletionError::InvalidRequest(msg)
        } else if RE_SERVER_STATUS.is_match(&lower)
            || has(&["overloaded", "internal server error", "service unavailable", "bad gateway"])
        {
            CompletionError::ServerError(msg)
        } else if has(&["connection", "network", "dns", "tls", "broken pipe", "reset by peer", "error sending request"]) {
            CompletionError::Transport(msg)
        } else {
            CompletionError::Other(msg)
        }
    }
}

static RE_AUTH_STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b40[13]\b").unwrap());
static RE_RATE_STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b429\b").unwrap());
static RE_CLIENT_STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b4\d\d\b").unwrap());
static RE_SERVER_STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b5\d\d\b").unwrap());

impl From<&LlmError> for CompletionError {
    /// Map a provider error by variant. Only the untyped variants fall back
    /// to [`CompletionError::classify`].
    fn from(e: &LlmError) -> Self {
        match e {
            LlmError::AuthError(_) => CompletionError::Auth(e.to_string()),
            LlmError::InvalidRequest(_)
            | LlmError::ModelNotFound(_)
            | LlmError::ConfigError(_)
            | LlmError::NotSupported(_)
            | LlmError::TokenLimitExceeded { .. } => CompletionError::InvalidRequest(e.to_string()),
            LlmError::RateLimited(m) => match CompletionError::classify(m) {
                quota @ CompletionError::QuotaExhausted(_) => quota,
                _ => CompletionError::RateLimited(e.to_string()),
            },
            LlmError::NetworkError(_) => CompletionError::Transport(e.to_string()),
            LlmError::Timeout => CompletionError::Timeout { secs: 0 },
            LlmError::ProviderError(_) => CompletionError::ServerError(e.to_string()),
            LlmError::SerializationError(_) => CompletionError::EmptyResponse,
            LlmError::ApiError(m) | LlmError::Unknown(m) => CompletionError::classify(m),
        }
    }
}
