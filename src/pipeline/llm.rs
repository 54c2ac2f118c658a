//! Text generation: the one seam through which every LLM call passes.
//!
//! Stages talk to a [`TextGenerator`] rather than to `edgequake_llm`
//! directly, so tests can script responses and the orchestrator can wrap the
//! real provider in [`MeteredGenerator`] to count calls and tokens.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent. Each call
//! gets a per-attempt timeout and exponential backoff between attempts
//! (`retry_backoff_ms * 2^attempt`): with 500 ms base and 3 retries the wait
//! sequence is 500 ms → 1 s → 2 s.

use crate::config::SummaryConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Appended to the system prompt when a request asks for JSON output.
const JSON_ONLY_INSTRUCTION: &str =
    "\n\nRespond with a single valid JSON object only. Do not wrap it in markdown fences.";

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: usize,
    /// Ask for a JSON object; callers still parse defensively.
    pub json_response: bool,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.3,
            max_tokens: 1000,
            json_response: false,
        }
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.max_tokens = n;
        self
    }

    pub fn json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// A successful completion.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Anything that can turn a prompt pair into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError>;
}

/// [`TextGenerator`] backed by an `edgequake_llm` provider.
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
    max_retries: u32,
    retry_backoff_ms: u64,
    timeout_secs: u64,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &SummaryConfig) -> Self {
        Self {
            provider,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            timeout_secs: config.api_timeout_secs,
        }
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let messages = build_messages(request);
        let options = build_options(request);
        let per_call = Duration::from_secs(self.timeout_secs.max(1));

        let mut last_err: Option<GenerationError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "LLM retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match timeout(per_call, self.provider.chat(&messages, Some(&options))).await {
                Ok(Ok(response)) => {
                    if response.content.trim().is_empty() {
                        warn!("LLM attempt {} returned an empty response", attempt + 1);
                        last_err = Some(GenerationError::EmptyResponse);
                        continue;
                    }
                    return Ok(Generation {
                        text: response.content,
                        prompt_tokens: response.prompt_tokens,
                        completion_tokens: response.completion_tokens,
                    });
                }
                Ok(Err(e)) => {
                    warn!("LLM attempt {} failed: {}", attempt + 1, e);
                    last_err = Some(GenerationError::Failed {
                        retries: self.max_retries,
                        detail: e.to_string(),
                    });
                }
                Err(_) => {
                    warn!("LLM attempt {} timed out after {}s", attempt + 1, self.timeout_secs);
                    last_err = Some(GenerationError::Timeout {
                        secs: self.timeout_secs,
                    });
                }
            }
        }

        Err(last_err.unwrap_or(GenerationError::EmptyResponse))
    }
}

fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt(request)),
        ChatMessage::user(&request.user),
    ]
}

fn system_prompt(request: &GenerationRequest) -> String {
    if request.json_response {
        format!("{}{}", request.system, JSON_ONLY_INSTRUCTION)
    } else {
        request.system.clone()
    }
}

fn build_options(request: &GenerationRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

/// Usage counters collected by [`MeteredGenerator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub calls: usize,
    pub failed: usize,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub duration_ms: u64,
}

/// Wraps a generator and counts what goes through it.
pub struct MeteredGenerator {
    inner: Arc<dyn TextGenerator>,
    calls: AtomicUsize,
    failed: AtomicUsize,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    duration_ms: AtomicU64,
}

impl MeteredGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            prompt_tokens: AtomicU64::new(0),
            completion_tokens: AtomicU64::new(0),
            duration_ms: AtomicU64::new(0),
        }
    }

    pub fn usage(&self) -> Usage {
        Usage {
            calls: self.calls.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            prompt_tokens: self.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.completion_tokens.load(Ordering::Relaxed),
            duration_ms: self.duration_ms.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl TextGenerator for MeteredGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let start = Instant::now();
        self.calls.fetch_add(1, Ordering::Relaxed);
        let result = self.inner.generate(request).await;
        let elapsed = start.elapsed().as_millis() as u64;
        self.duration_ms.fetch_add(elapsed, Ordering::Relaxed);

        match &result {
            Ok(generation) => {
                self.prompt_tokens
                    .fetch_add(generation.prompt_tokens as u64, Ordering::Relaxed);
                self.completion_tokens
                    .fetch_add(generation.completion_tokens as u64, Ordering::Relaxed);
                debug!(
                    "LLM call: {} input tokens, {} output tokens, {}ms",
                    generation.prompt_tokens, generation.completion_tokens, elapsed
                );
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Result<Generation, GenerationError>);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _: &GenerationRequest) -> Result<Generation, GenerationError> {
            self.0.clone()
        }
    }

    #[test]
    fn build_options_carries_request_settings() {
        let req = GenerationRequest::new("sys", "user").temperature(0.2).max_tokens(1500);
        let opts = build_options(&req);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(1500));
    }

    #[test]
    fn json_requests_extend_the_system_prompt() {
        let plain = GenerationRequest::new("sys", "user");
        let json = GenerationRequest::new("sys", "user").json();
        assert_eq!(system_prompt(&plain), "sys");
        assert!(system_prompt(&json).starts_with("sys"));
        assert!(system_prompt(&json).contains("valid JSON"));
        assert_eq!(build_messages(&json).len(), 2);
    }

    #[tokio::test]
    async fn metered_counts_tokens_and_failures() {
        let ok = MeteredGenerator::new(Arc::new(Canned(Ok(Generation {
            text: "fine".into(),
            prompt_tokens: 10,
            completion_tokens: 4,
        }))));
        let req = GenerationRequest::new("s", "u");
        ok.generate(&req).await.unwrap();
        ok.generate(&req).await.unwrap();
        let usage = ok.usage();
        assert_eq!(usage.calls, 2);
        assert_eq!(usage.failed, 0);
        assert_eq!(usage.prompt_tokens, 20);
        assert_eq!(usage.completion_tokens, 8);

        let bad = MeteredGenerator::new(Arc::new(Canned(Err(GenerationError::EmptyResponse))));
        assert!(bad.generate(&req).await.is_err());
        assert_eq!(bad.usage().failed, 1);
    }
}
