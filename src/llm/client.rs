//! Streaming chat-completion client with reconfigure-and-retry.

use std::env;
use std::sync::LazyLock;
use std::time::Duration;

use regex_lite::Regex;
use reqwest::header::CONTENT_TYPE;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::commit::{CommitFormat, extract_candidate};
use crate::config::{ProviderConfig, ProviderStore};
use crate::error::ConfigError;

use super::request::{ChatRequest, RequestShape};
use super::retry::{GenerationResult, Remediation, RetryPolicy, RetryReason};
use super::sse::{SseDecoder, SseEvent, StreamDelta, TokenUsage};

/// Environment variable overriding the read timeout, in seconds.
pub const READ_TIMEOUT_ENV_VAR: &str = "AICM_READ_TIMEOUT";

const DEFAULT_READ_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Content beyond this many characters is not a one-line commit title;
/// the stream is dropped instead of read to the end.
pub const MAX_CONTENT_CHARS: usize = 300;

static PARAMETER_REJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)parameter|reasoning|unsupported").expect("Invalid regex")
});

/// Get the read timeout from environment or use default.
///
/// Logs a warning if the environment variable is set but invalid.
fn get_read_timeout() -> Duration {
    match env::var(READ_TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    READ_TIMEOUT_ENV_VAR, v, DEFAULT_READ_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
    }
}

/// Receives stream fragments as they arrive. All methods default to no-ops.
pub trait ProgressSink {
    fn on_reasoning(&mut self, _text: &str) {}
    fn on_content(&mut self, _text: &str) {}
    fn on_usage(&mut self, _usage: &TokenUsage) {}
}

/// A sink that ignores everything.
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Asked for a larger `max_tokens` when a reasoning model ran out of budget.
pub trait BudgetPrompter {
    /// `None` aborts generation.
    fn choose_budget(&mut self, current: u32) -> Option<u32>;
}

/// Both accumulators of one streaming attempt.
#[derive(Debug, Default)]
struct StreamText {
    reasoning: String,
    content: String,
    content_chars: usize,
}

impl StreamText {
    /// Apply one delta. Returns false when the content fragment would
    /// cross the hard stop; that fragment is dropped.
    fn apply(&mut self, delta: StreamDelta, progress: &mut dyn ProgressSink) -> bool {
        if let Some(reasoning) = delta.reasoning {
            progress.on_reasoning(&reasoning);
            self.reasoning.push_str(&reasoning);
        }
        if let Some(usage) = delta.usage {
            progress.on_usage(&usage);
        }
        if let Some(content) = delta.content {
            let chars = content.chars().count();
            if self.content_chars + chars > MAX_CONTENT_CHARS {
                debug!(
                    "Content reached {} chars, dropping stream",
                    self.content_chars
                );
                return false;
            }
            progress.on_content(&content);
            self.content.push_str(&content);
            self.content_chars += chars;
        }
        true
    }

    fn into_result(self) -> GenerationResult {
        if self.content.is_empty() {
            if self.reasoning.is_empty() {
                return GenerationResult::FatalFailure(
                    "The provider returned an empty response".to_string(),
                );
            }
            return GenerationResult::RetryableFailure(RetryReason::ReasoningExhausted);
        }

        match extract_candidate(&self.content) {
            Some(message) => GenerationResult::Success(message),
            None => GenerationResult::FatalFailure("no usable response".to_string()),
        }
    }
}

/// Client for `POST {base_url}/chat/completions` with `stream: true`.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    read_timeout: Duration,
}

impl CompletionClient {
    /// Build a client with the 10s connect timeout and the read timeout
    /// from `AICM_READ_TIMEOUT`.
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            read_timeout: get_read_timeout(),
        })
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Generate a commit message for `diff`.
    ///
    /// Runs at most one remediation per failure category. Remediations are
    /// persisted through `store` and the provider is re-read before the
    /// next attempt. Never returns `RetryableFailure`.
    pub async fn generate(
        &self,
        diff: &str,
        provider: &ProviderConfig,
        format: CommitFormat,
        store: &dyn ProviderStore,
        budget: &mut dyn BudgetPrompter,
        progress: &mut dyn ProgressSink,
    ) -> GenerationResult {
        if let Err(e) = provider.ensure_ready() {
            return GenerationResult::FatalFailure(format!(
                "{}. Configure the provider before generating.",
                e
            ));
        }

        let mut provider = provider.clone();
        let mut policy = RetryPolicy::new();

        loop {
            let request = ChatRequest::new(&provider, format, diff);
            let shape = request.shape();
            debug!(
                "Requesting {} from {} (disable_reasoning={}, max_tokens={})",
                provider.model, provider.name, shape.disable_reasoning, shape.max_tokens
            );

            let reason = match self.attempt(&request, &provider, progress).await {
                GenerationResult::RetryableFailure(reason) => reason,
                done => return done,
            };
            debug!("Attempt failed, {}", reason);

            provider = match policy.decide(&reason, shape) {
                Remediation::StopDisablingReasoning => {
                    provider.can_disable_reasoning = Some(false);
                    let persisted = store.set_can_disable_reasoning(&provider.name, false);
                    reload_after_write(store, provider, persisted)
                }
                Remediation::RaiseBudget { current } => {
                    let Some(value) = budget.choose_budget(current) else {
                        return GenerationResult::FatalFailure(
                            "Generation aborted: the model needs a larger max_tokens".to_string(),
                        );
                    };
                    provider.max_tokens = Some(value);
                    let persisted = store.set_max_tokens(&provider.name, value);
                    reload_after_write(store, provider, persisted)
                }
                Remediation::GiveUp(message) => {
                    return GenerationResult::FatalFailure(message);
                }
            };
        }
    }

    /// Run a single streaming request.
    pub async fn attempt(
        &self,
        request: &ChatRequest,
        provider: &ProviderConfig,
        progress: &mut dyn ProgressSink,
    ) -> GenerationResult {
        let url = provider.endpoint("chat/completions");
        let mut builder = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(request);
        if let Some(key) = provider.api_key() {
            builder = builder.bearer_auth(key);
        }

        let response = match timeout(self.read_timeout, builder.send()).await {
            Err(_) => return self.timed_out(),
            Ok(Err(e)) => {
                return GenerationResult::FatalFailure(format!("Request to {} failed: {}", url, e));
            }
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if !status.is_success() {
            let body = match timeout(self.read_timeout, response.text()).await {
                Ok(Ok(body)) => body,
                _ => String::new(),
            };
            let detail = error_detail(status.as_u16(), &body);
            debug!("HTTP {} from {}: {}", status.as_u16(), url, detail);

            if is_parameter_rejection(request.shape(), status.as_u16(), &detail) {
                return GenerationResult::RetryableFailure(RetryReason::ParameterRejected(detail));
            }
            return GenerationResult::FatalFailure(format!(
                "API error (HTTP {}): {}",
                status.as_u16(),
                detail
            ));
        }

        self.read_stream(response, progress).await
    }

    async fn read_stream(
        &self,
        mut response: reqwest::Response,
        progress: &mut dyn ProgressSink,
    ) -> GenerationResult {
        let mut decoder = SseDecoder::new();
        let mut text = StreamText::default();

        while !decoder.is_done() {
            let chunk = match timeout(self.read_timeout, response.chunk()).await {
                Err(_) => return self.timed_out(),
                Ok(Err(e)) => {
                    return GenerationResult::FatalFailure(format!("Stream interrupted: {}", e));
                }
                Ok(Ok(None)) => break,
                Ok(Ok(Some(chunk))) => chunk,
            };

            for event in decoder.feed(&chunk) {
                if let SseEvent::Delta(delta) = event
                    && !text.apply(delta, progress)
                {
                    return text.into_result();
                }
            }
        }

        for event in decoder.finish() {
            if let SseEvent::Delta(delta) = event
                && !text.apply(delta, progress)
            {
                break;
            }
        }

        text.into_result()
    }

    fn timed_out(&self) -> GenerationResult {
        GenerationResult::FatalFailure(format!(
            "Timed out after {}s waiting for the provider",
            self.read_timeout.as_secs()
        ))
    }
}

/// Re-read the provider after a remediation write, keeping `updated` when
/// the write or the read fails.
fn reload_after_write(
    store: &dyn ProviderStore,
    updated: ProviderConfig,
    persisted: Result<(), ConfigError>,
) -> ProviderConfig {
    if let Err(e) = persisted {
        warn!("Could not save settings for {}: {}", updated.name, e);
        return updated;
    }

    match store.load_provider(&updated.name) {
        Ok(reloaded) => reloaded,
        Err(e) => {
            warn!("Could not re-read settings for {}: {}", updated.name, e);
            updated
        }
    }
}

fn is_parameter_rejection(shape: RequestShape, status: u16, detail: &str) -> bool {
    shape.disable_reasoning && (status == 400 || PARAMETER_REJECTION.is_match(detail))
}

/// Best human-readable error text from a failed response body.
fn error_detail(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let message = json
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| json.get("message").and_then(|v| v.as_str()))
            .or_else(|| json.get("error").and_then(|v| v.as_str()))
            .map(str::trim)
            .filter(|m| !m.is_empty());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_string()
    }
}
