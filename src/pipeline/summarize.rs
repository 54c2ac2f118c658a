//! Map-reduce summarisation over the validated sections.

use crate::output::SectionReport;
use crate::pipeline::llm::{GenerationRequest, TextGenerator};
use crate::progress::SummaryProgressCallback;
use crate::prompts::{final_summary_prompt, section_summary_prompt, SUMMARY_SYSTEM_PROMPT};
use crate::section::Section;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

pub const FINAL_SUMMARY_PLACEHOLDER: &str = "Error generating final summary.";

/// Summarise every section independently.
///
/// Up to `concurrency` requests run at once; reports come back in section
/// order regardless. A failed section gets a placeholder summary and its
/// error recorded in the report.
pub async fn map_sections(
    generator: &dyn TextGenerator,
    paper_title: &str,
    sections: &[Section],
    concurrency: usize,
    progress: &dyn SummaryProgressCallback,
) -> Vec<SectionReport> {
    let total = sections.len();
    stream::iter(sections.iter().enumerate())
        .map(|(position, section)| async move {
            progress.on_section_start(position, total, &section.title);
            let request = GenerationRequest::new(
                SUMMARY_SYSTEM_PROMPT,
                section_summary_prompt(
                    paper_title,
                    &section.title,
                    &section.content,
                    section.topic_guidance.as_deref(),
                ),
            )
            .temperature(0.3)
            .max_tokens(1000);

            let (summary, error) = match generator.generate(&request).await {
                Ok(generation) => {
                    let summary = generation.text.trim().to_string();
                    progress.on_section_complete(position, total, summary.len());
                    (summary, None)
                }
                Err(e) => {
                    warn!("Summary of section '{}' failed: {}", section.title, e);
                    progress.on_section_error(position, total, &e.to_string());
                    (format!("Error generating summary: {e}"), Some(e))
                }
            };

            SectionReport {
                index: section.index,
                title: section.title.clone(),
                content_chars: section.len(),
                topic_similarity: section.topic_similarity,
                title_relevance: section.title_relevance,
                summary,
                error,
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// The reduce input: `## <title>\n\n<summary>\n\n` per section.
pub fn combine_summaries(reports: &[SectionReport]) -> String {
    reports
        .iter()
        .map(|r| format!("## {}\n\n{}\n\n", r.title, r.summary))
        .collect()
}

/// Synthesise the section summaries into one narrative.
pub async fn reduce_summaries(
    generator: &dyn TextGenerator,
    paper_title: &str,
    reports: &[SectionReport],
) -> String {
    let request = GenerationRequest::new(
        SUMMARY_SYSTEM_PROMPT,
        final_summary_prompt(paper_title, &combine_summaries(reports)),
    )
    .temperature(0.3)
    .max_tokens(2000);

    match generator.generate(&request).await {
        Ok(generation) => {
            info!("Final summary: {} chars", generation.text.len());
            generation.text.trim().to_string()
        }
        Err(e) => {
            warn!("Final summary failed: {}", e);
            FINAL_SUMMARY_PLACEHOLDER.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::pipeline::llm::Generation;
    use crate::progress::NoopProgressCallback;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Echoes the section title back, failing for titles containing "bad".
    /// Earlier sections answer more slowly to shake out ordering bugs.
    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, req: &GenerationRequest) -> Result<Generation, GenerationError> {
            let title = req
                .user
                .lines()
                .find_map(|l| l.strip_prefix("Section: "))
                .unwrap_or("final")
                .to_string();
            if title.contains("bad") {
                return Err(GenerationError::Failed {
                    retries: 0,
                    detail: "quota".into(),
                });
            }
            let delay = if title == "S0" { 30 } else { 1 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(Generation {
                text: format!("summary of {title}"),
                ..Default::default()
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _: &GenerationRequest) -> Result<Generation, GenerationError> {
            Err(GenerationError::Timeout { secs: 5 })
        }
    }

    fn sections() -> Vec<Section> {
        vec![
            Section::new(0, "S0", "alpha"),
            Section::new(1, "bad S1", "beta"),
            Section::new(2, "S2", "gamma"),
        ]
    }

    #[tokio::test]
    async fn map_preserves_order_under_concurrency() {
        let reports = map_sections(&Echo, "P", &sections(), 3, &NoopProgressCallback).await;
        let titles: Vec<&str> = reports.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["S0", "bad S1", "S2"]);
        assert_eq!(reports[0].summary, "summary of S0");
    }

    #[tokio::test]
    async fn failed_section_gets_placeholder() {
        let reports = map_sections(&Echo, "P", &sections(), 1, &NoopProgressCallback).await;
        assert!(reports[1].summary.starts_with("Error generating summary: "));
        assert!(reports[1].summary.contains("quota"));
        assert!(reports[1].error.is_some());
        assert!(reports[2].error.is_none());
    }

    #[test]
    fn combine_uses_heading_per_section() {
        let reports = vec![SectionReport {
            index: 0,
            title: "Intro".into(),
            content_chars: 5,
            topic_similarity: None,
            title_relevance: None,
            summary: "text".into(),
            error: None,
        }];
        assert_eq!(combine_summaries(&reports), "## Intro\n\ntext\n\n");
    }

    #[tokio::test]
    async fn reduce_failure_gives_placeholder() {
        let summary = reduce_summaries(&Failing, "P", &[]).await;
        assert_eq!(summary, FINAL_SUMMARY_PLACEHOLDER);
    }
}
