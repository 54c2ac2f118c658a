//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn SummaryProgressCallback>`] via
//! [`crate::config::SummaryConfigBuilder::progress_callback`] to receive
//! events as a paper moves through detection, filtering and generation.
//!
//! # Example
//!
//! ```rust
//! use edgequake_papersum::{Stage, SummaryConfig, SummaryProgressCallback};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl SummaryProgressCallback for StageLogger {
//!     fn on_stage_complete(&self, stage: Stage, kept: usize, total: usize) {
//!         eprintln!("{stage}: {kept}/{total}");
//!     }
//! }
//!
//! let config = SummaryConfig::builder()
//!     .progress_callback(Arc::new(StageLogger))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A named step of the per-document pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Extraction,
    TopicExtraction,
    SectionDetection,
    RelevanceFilter,
    CoherenceCheck,
    TitleValidation,
    TopicModeling,
    MapSummaries,
    ReduceSummary,
    KeyTakeaways,
    EngineersCorner,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extraction => "text extraction",
            Stage::TopicExtraction => "topic extraction",
            Stage::SectionDetection => "section detection",
            Stage::RelevanceFilter => "topic relevance filter",
            Stage::CoherenceCheck => "coherence check",
            Stage::TitleValidation => "title validation",
            Stage::TopicModeling => "topic modeling",
            Stage::MapSummaries => "section summaries",
            Stage::ReduceSummary => "summary synthesis",
            Stage::KeyTakeaways => "key takeaways",
            Stage::EngineersCorner => "engineer's corner",
            Stage::Render => "PDF rendering",
        };
        f.write_str(name)
    }
}

/// Called by the pipeline as it processes a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: with
/// `concurrency > 1` the section events arrive from concurrent futures.
pub trait SummaryProgressCallback: Send + Sync {
    /// Called once the document text has been extracted.
    fn on_document_start(&self, title: &str, text_len: usize) {
        let _ = (title, text_len);
    }

    /// Called before a stage runs.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after a stage finishes.
    ///
    /// # Arguments
    /// * `kept`: items the stage produced (sections kept, topics found, …)
    /// * `total`: items the stage received
    fn on_stage_complete(&self, stage: Stage, kept: usize, total: usize) {
        let _ = (stage, kept, total);
    }

    /// Called just before a section is summarised (map phase).
    ///
    /// `position` is 1-indexed within the validated sections.
    fn on_section_start(&self, position: usize, total: usize, title: &str) {
        let _ = (position, total, title);
    }

    /// Called when a section summary was produced.
    fn on_section_complete(&self, position: usize, total: usize, summary_len: usize) {
        let _ = (position, total, summary_len);
    }

    /// Called when a section summary failed and a placeholder was used.
    fn on_section_error(&self, position: usize, total: usize, error: &str) {
        let _ = (position, total, error);
    }

    /// Called once per document after every stage has run.
    fn on_document_complete(&self, title: &str, failed_calls: usize) {
        let _ = (title, failed_calls);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SummaryProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SummaryConfig`].
pub type ProgressCallback = Arc<dyn SummaryProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        stages: Mutex<Vec<(Stage, usize, usize)>>,
        sections: AtomicUsize,
        errors: AtomicUsize,
    }

    impl SummaryProgressCallback for TrackingCallback {
        fn on_stage_complete(&self, stage: Stage, kept: usize, total: usize) {
            self.stages.lock().unwrap().push((stage, kept, total));
        }

        fn on_section_complete(&self, _position: usize, _total: usize, _len: usize) {
            self.sections.fetch_add(1, Ordering::SeqCst);
        }

        fn on_section_error(&self, _position: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_document_start("Paper", 1000);
        cb.on_stage_start(Stage::SectionDetection);
        cb.on_stage_complete(Stage::SectionDetection, 5, 5);
        cb.on_section_start(1, 5, "Introduction");
        cb.on_section_complete(1, 5, 420);
        cb.on_section_error(2, 5, "timeout");
        cb.on_document_complete("Paper", 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_stage_complete(Stage::RelevanceFilter, 4, 6);
        tracker.on_stage_complete(Stage::CoherenceCheck, 3, 4);
        tracker.on_section_complete(1, 3, 100);
        tracker.on_section_complete(2, 3, 100);
        tracker.on_section_error(3, 3, "quota");

        let stages = tracker.stages.lock().unwrap();
        assert_eq!(stages[0], (Stage::RelevanceFilter, 4, 6));
        assert_eq!(stages[1], (Stage::CoherenceCheck, 3, 4));
        assert_eq!(tracker.sections.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stage_display_is_human_readable() {
        assert_eq!(Stage::EngineersCorner.to_string(), "engineer's corner");
        assert_eq!(Stage::RelevanceFilter.to_string(), "topic relevance filter");
    }
}
