//! Summarisation entry points: one paper in, one [`SummaryOutput`] (and
//! optionally one summary PDF) out.
//!
//! ## Stage order
//!
//! ```text
//! extract ─▶ normalize ─▶ topics ─▶ sections ─▶ relevance ─▶ coherence
//!   ─▶ title validation ─▶ topic model ─▶ map ─▶ reduce ─▶ takeaways ─▶ corner
//! ```
//!
//! Only extraction, provider resolution and output I/O can fail. Every LLM
//! call degrades to a placeholder or a fail-open default, so a readable
//! PDF always comes out of a readable paper.

use crate::config::SummaryConfig;
use crate::error::PaperSumError;
use crate::output::{DocumentInfo, SummaryOutput, SummaryStats};
use crate::pipeline::llm::{LlmGenerator, MeteredGenerator, TextGenerator};
use crate::pipeline::markup::SummaryDocument;
use crate::pipeline::{
    coherence, extract, input, insights, normalize, relevance, render, sections, summarize as mapreduce,
    topic, validate,
};
use crate::progress::{NoopProgressCallback, Stage, SummaryProgressCallback};
use edgequake_llm::{LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("valid regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Suffix of every summary PDF written by [`summarize_to_file`].
pub const OUTPUT_SUFFIX: &str = "-engineering-summary.pdf";

/// A configured pipeline bound to one text generator.
///
/// The free functions ([`summarize`], [`summarize_text`], …) build one of
/// these per call. Construct it directly with [`Summarizer::with_generator`]
/// to plug in a custom [`TextGenerator`], e.g. a cache or a test double.
pub struct Summarizer {
    config: SummaryConfig,
    generator: Arc<dyn TextGenerator>,
}

impl Summarizer {
    /// Resolve the LLM provider from `config` and the environment.
    pub async fn new(config: SummaryConfig) -> Result<Self, PaperSumError> {
        let provider = resolve_provider(&config).await?;
        let generator = Arc::new(LlmGenerator::new(provider, &config));
        Ok(Self { config, generator })
    }

    pub fn with_generator(config: SummaryConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self { config, generator }
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    fn progress(&self) -> &dyn SummaryProgressCallback {
        match self.config.progress_callback.as_deref() {
            Some(cb) => cb,
            None => &NoopProgressCallback,
        }
    }

    /// Summarise a local PDF or an HTTP(S) URL.
    pub async fn summarize(&self, input_str: &str) -> Result<SummaryOutput, PaperSumError> {
        let start = Instant::now();
        info!("Starting summary: {}", input_str);

        let resolved = input::resolve_input(input_str, self.config.download_timeout_secs).await?;
        self.progress().on_stage_start(Stage::Extraction);
        let extracted = extract::extract(resolved.path(), self.config.password.as_deref()).await?;
        let text = normalize::normalize_pages(&extracted.pages, self.config.text_layout);
        self.progress()
            .on_stage_complete(Stage::Extraction, extracted.page_count, extracted.page_count);

        if text.trim().is_empty() {
            return Err(PaperSumError::NoExtractableText {
                path: resolved.path().to_path_buf(),
                pages: extracted.page_count,
            });
        }

        let info = DocumentInfo {
            title: extracted.title,
            source: input_str.to_string(),
            page_count: extracted.page_count,
            text_chars: text.chars().count(),
        };
        Ok(self.run(info, &text, start).await)
    }

    /// Run the pipeline on text that is already extracted.
    ///
    /// The text goes through the same normaliser as PDF pages.
    pub async fn summarize_text(&self, text: &str, title: &str) -> Result<SummaryOutput, PaperSumError> {
        let start = Instant::now();
        let text = normalize::normalize_pages(&[text], self.config.text_layout);
        if text.trim().is_empty() {
            return Err(PaperSumError::InvalidInput {
                input: "empty document text".to_string(),
            });
        }
        let info = DocumentInfo {
            title: title.to_string(),
            source: String::new(),
            page_count: 0,
            text_chars: text.chars().count(),
        };
        Ok(self.run(info, &text, start).await)
    }

    /// Summarise `input_str` and write `<title>-engineering-summary.pdf`
    /// into `out_dir`. Returns the written path.
    pub async fn summarize_to_file(
        &self,
        input_str: &str,
        out_dir: &Path,
    ) -> Result<(PathBuf, SummaryOutput), PaperSumError> {
        let mut output = self.summarize(input_str).await?;
        let path = out_dir.join(summary_filename(&output.document.title));

        self.progress().on_stage_start(Stage::Render);
        let render_start = Instant::now();
        render::write_summary_pdf(
            SummaryDocument {
                title: &output.document.title,
                summary: &output.summary,
                key_takeaways: &output.key_takeaways,
                engineers_corner: &output.engineers_corner,
            },
            &path,
        )
        .await?;
        output.stats.total_duration_ms += render_start.elapsed().as_millis() as u64;
        self.progress().on_stage_complete(Stage::Render, 1, 1);

        info!("Summary saved to {}", path.display());
        Ok((path, output))
    }

    /// Summarise every PDF in `dir` into `out_dir`.
    ///
    /// A failing paper is logged and reported in its slot; the others still
    /// run. Only an unreadable `dir` fails the whole call.
    pub async fn summarize_directory(
        &self,
        dir: &Path,
        out_dir: &Path,
    ) -> Result<Vec<DirectoryEntry>, PaperSumError> {
        let pdfs = input::list_pdfs(dir)?;
        info!("Found {} PDFs in {}", pdfs.len(), dir.display());

        let mut results = Vec::with_capacity(pdfs.len());
        for pdf in pdfs {
            let input_str = pdf.to_string_lossy().into_owned();
            let outcome = self
                .summarize_to_file(&input_str, out_dir)
                .await
                .map(|(path, _)| path);
            if let Err(ref e) = outcome {
                error!("Failed to summarise {}: {}", pdf.display(), e);
            }
            results.push(DirectoryEntry { input: pdf, outcome });
        }
        Ok(results)
    }

    /// The text pipeline proper. Never fails: generation problems become
    /// placeholders and filter over-aggression falls back to the top three.
    async fn run(&self, document: DocumentInfo, text: &str, start: Instant) -> SummaryOutput {
        let config = &self.config;
        let progress = self.progress();
        let metered = MeteredGenerator::new(Arc::clone(&self.generator));
        let generator: &dyn TextGenerator = &metered;
        let title = document.title.as_str();

        progress.on_document_start(title, document.text_chars);

        // ── Topics from title + abstract ─────────────────────────────────
        progress.on_stage_start(Stage::TopicExtraction);
        let abstract_text = sections::extract_abstract(text);
        let topics = topic::extract_topics(generator, title, &abstract_text).await;
        progress.on_stage_complete(Stage::TopicExtraction, topics.len(), topics.len());

        // ── Sections ─────────────────────────────────────────────────────
        progress.on_stage_start(Stage::SectionDetection);
        let detected =
            sections::detect_sections(text, &config.section_title_patterns, config.chunk_size);
        progress.on_stage_complete(Stage::SectionDetection, detected.len(), detected.len());

        // ── Filters ──────────────────────────────────────────────────────
        progress.on_stage_start(Stage::RelevanceFilter);
        let relevant = relevance::filter(&detected, &topics, config.min_similarity);
        progress.on_stage_complete(Stage::RelevanceFilter, relevant.len(), detected.len());

        progress.on_stage_start(Stage::CoherenceCheck);
        let coherent = coherence::check_coherence(&relevant);
        progress.on_stage_complete(Stage::CoherenceCheck, coherent.len(), relevant.len());

        progress.on_stage_start(Stage::TitleValidation);
        let validated =
            validate::validate(generator, title, &coherent, config.min_title_relevance).await;
        progress.on_stage_complete(Stage::TitleValidation, validated.len(), coherent.len());

        // ── Guidance ─────────────────────────────────────────────────────
        progress.on_stage_start(Stage::TopicModeling);
        let topic_model = topic::model_topics(generator, &validated).await;
        let guidance = topic::topic_guidance(&topic_model);
        let guided: Vec<_> = validated
            .into_iter()
            .map(|s| s.with_topic_guidance(guidance.clone()))
            .collect();
        progress.on_stage_complete(Stage::TopicModeling, topic_model.len(), topic_model.len());

        // ── Map / reduce ─────────────────────────────────────────────────
        progress.on_stage_start(Stage::MapSummaries);
        let reports =
            mapreduce::map_sections(generator, title, &guided, config.concurrency, progress).await;
        let ok = reports.iter().filter(|r| r.error.is_none()).count();
        progress.on_stage_complete(Stage::MapSummaries, ok, reports.len());

        progress.on_stage_start(Stage::ReduceSummary);
        let summary = mapreduce::reduce_summaries(generator, title, &reports).await;
        progress.on_stage_complete(Stage::ReduceSummary, 1, 1);

        // ── Whole-paper insights ─────────────────────────────────────────
        progress.on_stage_start(Stage::KeyTakeaways);
        let key_takeaways = insights::key_takeaways(generator, title, text).await;
        progress.on_stage_complete(Stage::KeyTakeaways, 1, 1);

        progress.on_stage_start(Stage::EngineersCorner);
        let engineers_corner = insights::engineers_corner(generator, title, text).await;
        progress.on_stage_complete(Stage::EngineersCorner, 1, 1);

        let usage = metered.usage();
        let stats = SummaryStats {
            sections_detected: detected.len(),
            sections_after_relevance: relevant.len(),
            sections_after_coherence: coherent.len(),
            sections_after_validation: guided.len(),
            llm_calls: usage.calls,
            failed_calls: usage.failed,
            total_input_tokens: usage.prompt_tokens,
            total_output_tokens: usage.completion_tokens,
            total_duration_ms: start.elapsed().as_millis() as u64,
            llm_duration_ms: usage.duration_ms,
        };

        info!(
            "Summary complete: {} → {} sections, {} LLM calls ({} failed), {}ms",
            stats.sections_detected,
            stats.sections_after_validation,
            stats.llm_calls,
            stats.failed_calls,
            stats.total_duration_ms
        );
        progress.on_document_complete(title, usage.failed);

        SummaryOutput {
            document,
            topics,
            topic_model,
            summary,
            key_takeaways,
            engineers_corner,
            sections: reports,
            stats,
        }
    }
}

/// Outcome for one file of a directory batch.
#[derive(Debug)]
pub struct DirectoryEntry {
    pub input: PathBuf,
    /// The written summary PDF, or why this paper failed.
    pub outcome: Result<PathBuf, PaperSumError>,
}

/// Summarise a PDF file or URL.
///
/// # Example
///
/// ```rust,no_run
/// use edgequake_papersum::{summarize, SummaryConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SummaryConfig::default();
/// let output = summarize("https://arxiv.org/pdf/1706.03762", &config).await?;
/// println!("{}", output.summary);
/// # Ok(())
/// # }
/// ```
pub async fn summarize(
    input_str: impl AsRef<str>,
    config: &SummaryConfig,
) -> Result<SummaryOutput, PaperSumError> {
    Summarizer::new(config.clone())
        .await?
        .summarize(input_str.as_ref())
        .await
}

/// Summarise already-extracted text under `title`.
pub async fn summarize_text(
    text: &str,
    title: &str,
    config: &SummaryConfig,
) -> Result<SummaryOutput, PaperSumError> {
    Summarizer::new(config.clone())
        .await?
        .summarize_text(text, title)
        .await
}

/// Summarise and write the summary PDF into `out_dir`; returns its path.
pub async fn summarize_to_file(
    input_str: impl AsRef<str>,
    out_dir: impl AsRef<Path>,
    config: &SummaryConfig,
) -> Result<PathBuf, PaperSumError> {
    Summarizer::new(config.clone())
        .await?
        .summarize_to_file(input_str.as_ref(), out_dir.as_ref())
        .await
        .map(|(path, _)| path)
}

/// Summarise every `*.pdf` directly inside `dir`.
pub async fn summarize_directory(
    dir: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &SummaryConfig,
) -> Result<Vec<DirectoryEntry>, PaperSumError> {
    Summarizer::new(config.clone())
        .await?
        .summarize_directory(dir.as_ref(), out_dir.as_ref())
        .await
}

/// Synchronous wrapper around [`summarize`].
///
/// Creates a temporary tokio runtime internally.
pub fn summarize_sync(
    input_str: impl AsRef<str>,
    config: &SummaryConfig,
) -> Result<SummaryOutput, PaperSumError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PaperSumError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(summarize(input_str, config))
}

/// Replace characters that are unsafe in file names, and whitespace runs,
/// with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let safe = UNSAFE_FILENAME_CHARS.replace_all(name.trim(), "_");
    WHITESPACE_RUN.replace_all(&safe, "_").into_owned()
}

/// `<sanitized title>-engineering-summary.pdf`.
pub fn summary_filename(title: &str) -> String {
    let stem = sanitize_filename(title);
    let stem = if stem.is_empty() { "paper".to_string() } else { stem };
    format!("{stem}{OUTPUT_SUFFIX}")
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PaperSumError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PaperSumError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. `config.provider`, used as-is.
/// 2. `config.provider_name` with `config.model` (or [`crate::config::DEFAULT_MODEL`]).
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set.
/// 4. OpenAI, when `OPENAI_API_KEY` is set.
/// 5. [`ProviderFactory::from_env`] auto-detection.
pub async fn resolve_provider(config: &SummaryConfig) -> Result<Arc<dyn LLMProvider>, PaperSumError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PaperSumError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
