//! Topic extraction and topic modeling, the two LLM calls that steer the
//! filters and the map phase.

use crate::pipeline::llm::{GenerationRequest, TextGenerator};
use crate::prompts::{
    topic_extraction_prompt, topic_modeling_prompt, TOPIC_EXTRACTION_SYSTEM_PROMPT,
    TOPIC_MODELING_SYSTEM_PROMPT,
};
use crate::section::{Section, TopicMap};
use serde::Deserialize;
use tracing::{debug, warn};

/// Characters of validated section text sent to topic modeling.
pub const TOPIC_MODEL_INPUT_CHARS: usize = 8000;

const GUIDANCE_PREFIX: &str = "Focus on these key topics: ";

/// Ask the model for weighted key terms of the paper.
///
/// A failed request falls back to `{lowercased title: 1.0}` so the relevance
/// filter still has something to compare against. A response that is not a
/// JSON object of numbers yields an empty map.
pub async fn extract_topics(
    generator: &dyn TextGenerator,
    title: &str,
    abstract_text: &str,
) -> TopicMap {
    let request = GenerationRequest::new(
        TOPIC_EXTRACTION_SYSTEM_PROMPT,
        topic_extraction_prompt(title, abstract_text),
    )
    .temperature(0.3)
    .max_tokens(500)
    .json();

    match generator.generate(&request).await {
        Ok(generation) => {
            let topics = parse_topic_map(&generation.text);
            debug!("Extracted {} topics", topics.len());
            topics
        }
        Err(e) => {
            warn!("Topic extraction failed, falling back to the title: {}", e);
            title_fallback(title)
        }
    }
}

fn title_fallback(title: &str) -> TopicMap {
    let key = title.trim().to_lowercase();
    if key.is_empty() {
        return TopicMap::new();
    }
    TopicMap::from([(key, 1.0)])
}

/// Parse `{"term": weight, ...}`: keys lowercased, weights clamped to 0–1.
pub fn parse_topic_map(raw: &str) -> TopicMap {
    let Some(json) = json_object(raw) else {
        warn!("Topic response contained no JSON object");
        return TopicMap::new();
    };
    match serde_json::from_str::<TopicMap>(json) {
        Ok(map) => map
            .into_iter()
            .filter(|(term, w)| !term.trim().is_empty() && w.is_finite())
            .map(|(term, w)| (term.trim().to_lowercase(), w.clamp(0.0, 1.0)))
            .collect(),
        Err(e) => {
            warn!("Topic response is not a term → score object: {}", e);
            TopicMap::new()
        }
    }
}

/// Render a topic map as a pseudo-document for TF-IDF: each term repeated
/// `max(1, round(weight × 10))` times.
pub fn topic_document(topics: &TopicMap) -> String {
    topics
        .iter()
        .flat_map(|(term, weight)| {
            let repeats = ((weight * 10.0).round() as usize).max(1);
            std::iter::repeat(term.as_str()).take(repeats)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Deserialize)]
struct TopicModel {
    topics: Vec<Vec<String>>,
}

/// Ask for three keyword groups over the opening of the validated sections.
///
/// Any failure yields an empty model, which means no guidance.
pub async fn model_topics(generator: &dyn TextGenerator, sections: &[Section]) -> Vec<Vec<String>> {
    let joined = sections
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let text: String = joined.chars().take(TOPIC_MODEL_INPUT_CHARS).collect();
    if text.trim().is_empty() {
        return Vec::new();
    }

    let request = GenerationRequest::new(TOPIC_MODELING_SYSTEM_PROMPT, topic_modeling_prompt(&text))
        .temperature(0.3)
        .max_tokens(500)
        .json();

    match generator.generate(&request).await {
        Ok(generation) => parse_topic_model(&generation.text),
        Err(e) => {
            warn!("Topic modeling failed, continuing without guidance: {}", e);
            Vec::new()
        }
    }
}

pub fn parse_topic_model(raw: &str) -> Vec<Vec<String>> {
    let Some(json) = json_object(raw) else {
        return Vec::new();
    };
    match serde_json::from_str::<TopicModel>(json) {
        Ok(model) => model
            .topics
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|group| !group.is_empty())
            .collect(),
        Err(e) => {
            warn!("Topic model response has the wrong shape: {}", e);
            Vec::new()
        }
    }
}

/// `Focus on these key topics: a, b, c; d, e` or empty for an empty model.
pub fn topic_guidance(model: &[Vec<String>]) -> String {
    if model.is_empty() {
        return String::new();
    }
    let groups: Vec<String> = model.iter().map(|g| g.join(", ")).collect();
    format!("{}{}", GUIDANCE_PREFIX, groups.join("; "))
}

/// Strip markdown fences and cut the outermost `{...}`.
fn json_object(raw: &str) -> Option<&str> {
    let text = raw.trim();
    let text = if text.starts_with("```") {
        let body = text.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        body.rsplit_once("```").map(|(inner, _)| inner).unwrap_or(body)
    } else {
        text
    };
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
        _ => None,
    }
}
