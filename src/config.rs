//! Configuration types for paper summarisation.
//!
//! All pipeline behaviour is controlled through [`SummaryConfig`], built via
//! its [`SummaryConfigBuilder`]. The config is an immutable value handed to
//! the entry points; nothing in the library reads process-wide mutable state
//! apart from provider auto-detection through environment variables.

use crate::error::PaperSumError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Heading fragments recognised by the primary section-detection tier.
///
/// Each entry is a regex fragment; they are OR-ed together and matched
/// case-insensitively, optionally preceded by an ordinal such as `3.`.
pub const DEFAULT_SECTION_TITLE_PATTERNS: &[&str] = &[
    r"abstract",
    r"introduction",
    r"related work",
    r"background",
    r"methodology|methods|method",
    r"experiment(s|al setup)?",
    r"implementation|architecture",
    r"results",
    r"discussion",
    r"(future work|limitations)",
    r"conclusion(s)?",
    r"reference(s)?|bibliography",
];

/// Configuration for summarising one or more papers.
///
/// # Example
/// ```rust
/// use edgequake_papersum::SummaryConfig;
///
/// let config = SummaryConfig::builder()
///     .chunk_size(10_000)
///     .min_similarity(0.2)
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.chunk_size, 10_000);
/// ```
#[derive(Clone)]
pub struct SummaryConfig {
    /// Maximum characters of section content sent in one LLM call. Default: 15 000.
    ///
    /// Longer sections are split on paragraph boundaries into
    /// "`<title>` (Part n)" sections.
    pub chunk_size: usize,

    /// Ordered heading regex fragments for the primary detection tier.
    pub section_title_patterns: Vec<String>,

    /// Minimum TF-IDF cosine similarity to the topic map. Default: 0.15.
    pub min_similarity: f64,

    /// Minimum 0–10 title-relevance score a section needs. Default: 6.0.
    pub min_title_relevance: f64,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Maximum retry attempts on a failed LLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-LLM-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Concurrent section summaries in the map phase. Default: 1 (sequential).
    ///
    /// Results are always reassembled in document order before reduction.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// How extracted page text is normalised before section detection.
    pub text_layout: TextLayout,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional observer for stage and section events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            chunk_size: 15_000,
            section_title_patterns: DEFAULT_SECTION_TITLE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            min_similarity: 0.15,
            min_title_relevance: 6.0,
            model: None,
            provider_name: None,
            provider: None,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            concurrency: 1,
            password: None,
            text_layout: TextLayout::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("chunk_size", &self.chunk_size)
            .field("section_title_patterns", &self.section_title_patterns)
            .field("min_similarity", &self.min_similarity)
            .field("min_title_relevance", &self.min_title_relevance)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("text_layout", &self.text_layout)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SummaryProgressCallback>"),
            )
            .finish()
    }
}

impl SummaryConfig {
    /// Create a new builder for `SummaryConfig`.
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`SummaryConfig`].
#[derive(Debug)]
pub struct SummaryConfigBuilder {
    config: SummaryConfig,
}

impl SummaryConfigBuilder {
    pub fn chunk_size(mut self, chars: usize) -> Self {
        self.config.chunk_size = chars;
        self
    }

    /// Replace the heading patterns entirely.
    pub fn section_title_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.section_title_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn min_similarity(mut self, threshold: f64) -> Self {
        self.config.min_similarity = threshold;
        self
    }

    pub fn min_title_relevance(mut self, score: f64) -> Self {
        self.config.min_title_relevance = score;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn text_layout(mut self, layout: TextLayout) -> Self {
        self.config.text_layout = layout;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummaryConfig, PaperSumError> {
        let c = &self.config;
        if c.chunk_size < 100 {
            return Err(PaperSumError::InvalidConfig(format!(
                "chunk size must be ≥ 100 characters, got {}",
                c.chunk_size
            )));
        }
        if !(0.0..=1.0).contains(&c.min_similarity) {
            return Err(PaperSumError::InvalidConfig(format!(
                "min similarity must be within 0–1, got {}",
                c.min_similarity
            )));
        }
        if !(0.0..=10.0).contains(&c.min_title_relevance) {
            return Err(PaperSumError::InvalidConfig(format!(
                "min title relevance must be within 0–10, got {}",
                c.min_title_relevance
            )));
        }
        if c.section_title_patterns.is_empty() {
            return Err(PaperSumError::InvalidConfig(
                "at least one section title pattern is required".into(),
            ));
        }
        for pattern in &c.section_title_patterns {
            if let Err(e) = Regex::new(pattern) {
                return Err(PaperSumError::InvalidConfig(format!(
                    "section title pattern '{pattern}' is not a valid regex: {e}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How raw page text is normalised before section detection.
///
/// | Layout | Behaviour |
/// |--------|-----------|
/// | `Collapsed` | every line break and its surrounding whitespace becomes one space; pages joined by a space (default) |
/// | `Paragraphs` | line structure kept, blank-line runs squeezed, pages joined by a blank line |
///
/// `Collapsed` yields one flowing string, so detection relies on the
/// proportional fallback. `Paragraphs` keeps the blank-line-delimited headings
/// the primary tier looks for, at the cost of more layout noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextLayout {
    #[default]
    Collapsed,
    Paragraphs,
}
