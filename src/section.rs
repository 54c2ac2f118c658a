//! The section record threaded through the filtering stages.
//!
//! A [`Section`] is an immutable value: each stage returns annotated copies
//! built with the `with_*` methods instead of mutating shared records. The
//! `index` assigned by the detector is the section's identity, so stages that
//! re-rank (the top-3 fallbacks) can always restore document order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weighted term → relevance mapping characterising a paper's subject.
///
/// Keys are lowercase, weights are within `0.0..=1.0`. A `BTreeMap` keeps
/// iteration deterministic.
pub type TopicMap = BTreeMap<String, f64>;

/// One logical section of a paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Position in the detector's output; stable identity across stages.
    pub index: usize,
    /// Normalised heading (numbering stripped, capitalised).
    pub title: String,
    /// Body text. Never rewritten after detection.
    pub content: String,
    /// TF-IDF cosine similarity to the topic map, 0–1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_similarity: Option<f64>,
    /// LLM-assessed relevance to the paper title, 0–10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_relevance: Option<f64>,
    /// Shared steering text for the map-phase summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_guidance: Option<String>,
}

impl Section {
    pub fn new(index: usize, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            content: content.into(),
            topic_similarity: None,
            title_relevance: None,
            topic_guidance: None,
        }
    }

    pub fn with_topic_similarity(mut self, similarity: f64) -> Self {
        self.topic_similarity = Some(similarity.clamp(0.0, 1.0));
        self
    }

    pub fn with_title_relevance(mut self, score: f64) -> Self {
        self.title_relevance = Some(score.clamp(0.0, 10.0));
        self
    }

    pub fn with_topic_guidance(mut self, guidance: impl Into<String>) -> Self {
        let guidance = guidance.into();
        self.topic_guidance = (!guidance.is_empty()).then_some(guidance);
        self
    }

    /// Character count of the content.
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Keep the `n` highest-scoring sections, then put them back in document order.
///
/// Ties keep input order (stable sort); a missing score ranks as 0.
pub(crate) fn top_n_by<F>(sections: &[Section], n: usize, score: F) -> Vec<Section>
where
    F: Fn(&Section) -> Option<f64>,
{
    let mut ranked: Vec<&Section> = sections.iter().collect();
    ranked.sort_by(|a, b| {
        let sa = score(a).unwrap_or(0.0);
        let sb = score(b).unwrap_or(0.0);
        sb.total_cmp(&sa)
    });
    let mut kept: Vec<Section> = ranked.into_iter().take(n).cloned().collect();
    kept.sort_by_key(|s| s.index);
    kept
}
