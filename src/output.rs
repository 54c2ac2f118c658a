//! Output types returned by the summarisation entry points.

use crate::error::GenerationError;
use crate::section::TopicMap;
use serde::{Deserialize, Serialize};

/// Everything produced for one paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub document: DocumentInfo,
    /// Weighted terms extracted from title + abstract.
    pub topics: TopicMap,
    /// Keyword groups from topic modeling; empty when it failed.
    pub topic_model: Vec<Vec<String>>,
    /// Reduce-phase synthesis (markup-lite).
    pub summary: String,
    pub key_takeaways: String,
    pub engineers_corner: String,
    /// One report per section that reached the map phase, in document order.
    pub sections: Vec<SectionReport>,
    pub stats: SummaryStats,
}

/// Source document facts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Metadata title, or the file stem when the PDF has none.
    pub title: String,
    /// The path or URL the text came from.
    pub source: String,
    pub page_count: usize,
    /// Characters of normalised text fed to the pipeline.
    pub text_chars: usize,
}

/// The map-phase result for one validated section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionReport {
    pub index: usize,
    pub title: String,
    pub content_chars: usize,
    pub topic_similarity: Option<f64>,
    pub title_relevance: Option<f64>,
    /// The generated summary, or the placeholder when `error` is set.
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<GenerationError>,
}

/// Counters and timings for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub sections_detected: usize,
    pub sections_after_relevance: usize,
    pub sections_after_coherence: usize,
    pub sections_after_validation: usize,
    /// LLM requests issued (retries not counted).
    pub llm_calls: usize,
    /// Requests that exhausted their retries.
    pub failed_calls: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
    pub llm_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_round_trips_through_json() {
        let output = SummaryOutput {
            document: DocumentInfo {
                title: "Attention Is All You Need".into(),
                source: "paper.pdf".into(),
                page_count: 15,
                text_chars: 40_000,
            },
            topics: TopicMap::from([("attention".to_string(), 1.0)]),
            topic_model: vec![vec!["transformer".into(), "attention".into()]],
            summary: "# Summary".into(),
            key_takeaways: "- one".into(),
            engineers_corner: "## Practical Applications".into(),
            sections: vec![SectionReport {
                index: 0,
                title: "Introduction".into(),
                content_chars: 1200,
                topic_similarity: Some(0.4),
                title_relevance: Some(8.0),
                summary: "Intro summary".into(),
                error: None,
            }],
            stats: SummaryStats {
                sections_detected: 6,
                llm_calls: 12,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(!json.contains("\"error\""));
        let back: SummaryOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.document.page_count, 15);
        assert_eq!(back.stats.llm_calls, 12);
        assert_eq!(back.sections[0].title, "Introduction");
    }
}
