//! # edgequake-papersum
//!
//! Turn a research paper PDF into an engineer-oriented summary PDF.
//!
//! ## Why this crate?
//!
//! Feeding a whole paper to an LLM in one prompt wastes tokens on references,
//! acknowledgements and boilerplate, and long papers overflow the context.
//! This crate splits the paper into sections, throws away the ones that do not
//! talk about the paper's subject, summarises the rest one by one, and merges
//! the result into a narrative with practical takeaways.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract    text layer + title via pdfium (spawn_blocking)
//!  ├─ 2. Sections   heading regexes, structural fallbacks, chunking
//!  ├─ 3. Filter     topic TF-IDF similarity → coherence outlier → LLM title score
//!  ├─ 4. Map        one engineering-focused summary per section
//!  ├─ 5. Reduce     one synthesised summary
//!  ├─ 6. Insights   key takeaways + Engineer's Corner
//!  └─ 7. Render     summary PDF (US Letter, Helvetica)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_papersum::{summarize_to_file, SummaryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = SummaryConfig::default();
//!     let pdf = summarize_to_file("paper.pdf", "summaries", &config).await?;
//!     println!("wrote {}", pdf.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `papersum` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ```toml
//! edgequake-papersum = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod section;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SummaryConfig, SummaryConfigBuilder, TextLayout};
pub use error::{GenerationError, PaperSumError};
pub use output::{DocumentInfo, SectionReport, SummaryOutput, SummaryStats};
pub use pipeline::llm::{Generation, GenerationRequest, TextGenerator};
pub use progress::{NoopProgressCallback, ProgressCallback, Stage, SummaryProgressCallback};
pub use section::{Section, TopicMap};
pub use summarize::{
    sanitize_filename, summarize, summarize_directory, summarize_sync, summarize_text,
    summarize_to_file, summary_filename, DirectoryEntry, Summarizer,
};
