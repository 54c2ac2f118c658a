//! Title validation: ask the model how well each section fits the paper
//! title and keep the ones that score high enough.

use crate::pipeline::llm::{GenerationRequest, TextGenerator};
use crate::pipeline::relevance::FLOOR;
use crate::prompts::{title_validation_prompt, TITLE_VALIDATION_SYSTEM_PROMPT};
use crate::section::{top_n_by, Section};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

/// Characters of section content shown to the model.
pub const EXCERPT_CHARS: usize = 1000;

static SCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

/// First numeric token of a response, if any.
pub fn parse_score(response: &str) -> Option<f64> {
    SCORE_RE
        .find(response)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Score every section against `title` and keep those scoring ≥ `min_score`.
///
/// Sections whose request fails or whose answer has no number are kept
/// unscored. With fewer than three kept out of three or more, the three
/// best-scored sections are returned in document order; unscored ones rank
/// as 0 there.
pub async fn validate(
    generator: &dyn TextGenerator,
    title: &str,
    sections: &[Section],
    min_score: f64,
) -> Vec<Section> {
    let mut scored = Vec::with_capacity(sections.len());
    let mut kept = Vec::new();

    for section in sections {
        let excerpt: String = section.content.chars().take(EXCERPT_CHARS).collect();
        let request = GenerationRequest::new(
            TITLE_VALIDATION_SYSTEM_PROMPT,
            title_validation_prompt(title, &section.title, &excerpt),
        )
        .temperature(0.1)
        .max_tokens(10);

        let score = match generator.generate(&request).await {
            Ok(generation) => {
                let score = parse_score(&generation.text);
                if score.is_none() {
                    warn!(
                        "No score in validation answer for '{}': {:?}",
                        section.title, generation.text
                    );
                }
                score
            }
            Err(e) => {
                warn!("Title validation failed for '{}': {}", section.title, e);
                None
            }
        };

        let annotated = match score {
            Some(s) => section.clone().with_title_relevance(s),
            None => section.clone(),
        };
        debug!("Section '{}' title relevance {:?}", section.title, annotated.title_relevance);

        if annotated.title_relevance.map_or(true, |s| s >= min_score) {
            kept.push(annotated.clone());
        }
        scored.push(annotated);
    }

    if kept.len() < FLOOR && scored.len() >= FLOOR {
        warn!(
            "Only {} of {} sections scored ≥ {}; keeping the top {}",
            kept.len(),
            scored.len(),
            min_score,
            FLOOR
        );
        return top_n_by(&scored, FLOOR, |s| s.title_relevance);
    }

    info!("Title validation kept {}/{} sections", kept.len(), scored.len());
    kept
}
