//! CLI binary for edgequake-papersum.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `SummaryConfig` and reports progress.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_papersum::{
    ProgressCallback, Stage, SummaryConfig, SummaryProgressCallback, Summarizer, TextLayout,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner for the filtering stages, then a bar over the map phase.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<HashMap<Stage, Instant>>,
    section_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(HashMap::new()),
            section_errors: AtomicUsize::new(0),
        })
    }

    fn spinner_style(&self) {
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        self.bar.set_style(style);
    }

    fn bar_style(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} sections  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(style);
    }

    fn elapsed(&self, stage: Stage) -> f64 {
        self.stage_started
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&stage))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl SummaryProgressCallback for CliProgressCallback {
    fn on_document_start(&self, title: &str, text_len: usize) {
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(title),
            dim(&format!("{text_len} chars"))
        ));
    }

    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut m) = self.stage_started.lock() {
            m.insert(stage, Instant::now());
        }
        if stage != Stage::MapSummaries {
            self.spinner_style();
        }
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message("");
    }

    fn on_stage_complete(&self, stage: Stage, kept: usize, total: usize) {
        let secs = self.elapsed(stage);
        let counts = match stage {
            Stage::RelevanceFilter
            | Stage::CoherenceCheck
            | Stage::TitleValidation
            | Stage::MapSummaries => format!("{kept}/{total} sections"),
            Stage::SectionDetection => format!("{total} sections"),
            Stage::TopicExtraction => format!("{total} topics"),
            Stage::TopicModeling => format!("{total} topic groups"),
            Stage::Extraction => format!("{total} pages"),
            _ => String::new(),
        };
        self.bar.println(format!(
            "  {} {:<24} {:<16} {}",
            green("✓"),
            stage.to_string(),
            dim(&counts),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_section_start(&self, position: usize, total: usize, title: &str) {
        if position == 0 {
            self.bar_style(total);
        }
        self.bar.set_message(title.to_string());
    }

    fn on_section_complete(&self, _position: usize, _total: usize, _summary_len: usize) {
        self.bar.inc(1);
    }

    fn on_section_error(&self, position: usize, total: usize, error: &str) {
        self.section_errors.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Section {:>2}/{:<2}  {}",
            red("✗"),
            position + 1,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, _title: &str, failed_calls: usize) {
        self.bar.finish_and_clear();
        if failed_calls > 0 {
            eprintln!(
                "{} {} LLM calls failed; placeholders were used",
                cyan("⚠"),
                red(&failed_calls.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise one paper into the current directory
  papersum paper.pdf

  # Summarise from arXiv into ./summaries
  papersum https://arxiv.org/pdf/1706.03762 -o summaries

  # Every PDF in a directory
  papersum papers/ -o summaries

  # Use a specific model and provider
  papersum --provider anthropic --model claude-sonnet-4-20250514 paper.pdf

  # Structured JSON (summary, sections, stats) instead of a PDF
  papersum --json paper.pdf > summary.json

OUTPUT:
  <title>-engineering-summary.pdf with Key Takeaways, Research Summary and
  Engineer's Corner sections.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (else ./ then the system library)
"#;

/// Summarise research papers for engineers.
#[derive(Parser, Debug)]
#[command(
    name = "papersum",
    version,
    about = "Summarise research paper PDFs into engineer-oriented summary PDFs",
    long_about = "Extract a research paper's text, split it into sections, keep the sections \
relevant to the paper's subject and summarise them with an LLM into a PDF with key takeaways, \
a research summary and an Engineer's Corner. Supports OpenAI, Anthropic, Google Gemini, \
Azure OpenAI, and any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file, HTTP/HTTPS URL, or a directory of PDFs.
    input: String,

    /// Directory for the summary PDFs.
    #[arg(short, long, env = "PAPERSUM_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// LLM model ID (default: gpt-4o).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Maximum characters of one section sent to the LLM.
    #[arg(long, env = "PAPERSUM_CHUNK_SIZE", default_value_t = 15_000)]
    chunk_size: usize,

    /// Minimum topic similarity (0–1) for a section to be kept.
    #[arg(long, env = "PAPERSUM_MIN_SIMILARITY", default_value_t = 0.15)]
    min_similarity: f64,

    /// Minimum LLM title-relevance score (0–10) for a section to be kept.
    #[arg(long, env = "PAPERSUM_MIN_RELEVANCE", default_value_t = 6.0)]
    min_relevance: f64,

    /// Number of concurrent section summaries.
    #[arg(short, long, env = "PAPERSUM_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PAPERSUM_PASSWORD")]
    password: Option<String>,

    /// Retries per LLM call.
    #[arg(long, env = "PAPERSUM_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "PAPERSUM_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PAPERSUM_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Keep line and paragraph breaks from the PDF text layer.
    #[arg(long, env = "PAPERSUM_KEEP_LAYOUT")]
    keep_layout: bool,

    /// Print the structured summary as JSON instead of writing a PDF.
    #[arg(long, env = "PAPERSUM_JSON")]
    json: bool,

    /// Disable the progress display.
    #[arg(long, env = "PAPERSUM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAPERSUM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAPERSUM_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress display replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn SummaryProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let summarizer = Summarizer::new(config)
        .await
        .context("Failed to configure the LLM provider")?;

    let input_path = Path::new(&cli.input);
    if input_path.is_dir() {
        if cli.json {
            bail!("--json cannot be combined with a directory input");
        }
        let results = summarizer
            .summarize_directory(input_path, &cli.output_dir)
            .await
            .with_context(|| format!("Failed to read directory {}", cli.input))?;

        let failed = results.iter().filter(|r| r.outcome.is_err()).count();
        for entry in &results {
            match &entry.outcome {
                Ok(path) => eprintln!("{} {}", green("✔"), bold(&path.display().to_string())),
                Err(e) => eprintln!("{} {}: {}", red("✘"), entry.input.display(), e),
            }
        }
        if !cli.quiet {
            eprintln!(
                "{}/{} papers summarised",
                results.len() - failed,
                results.len()
            );
        }
        if failed > 0 && failed == results.len() {
            bail!("every paper in {} failed", cli.input);
        }
        return Ok(());
    }

    if cli.json {
        let output = summarizer
            .summarize(&cli.input)
            .await
            .context("Summarisation failed")?;
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let (path, output) = summarizer
        .summarize_to_file(&cli.input, &cli.output_dir)
        .await
        .context("Summarisation failed")?;

    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} → {} sections  {} LLM calls  {}ms  →  {}",
            if stats.failed_calls == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.sections_detected,
            stats.sections_after_validation,
            stats.llm_calls,
            stats.total_duration_ms,
            bold(&path.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `SummaryConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SummaryConfig> {
    let mut builder = SummaryConfig::builder()
        .chunk_size(cli.chunk_size)
        .min_similarity(cli.min_similarity)
        .min_title_relevance(cli.min_relevance)
        .concurrency(cli.concurrency)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .text_layout(if cli.keep_layout {
            TextLayout::Paragraphs
        } else {
            TextLayout::Collapsed
        });

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
