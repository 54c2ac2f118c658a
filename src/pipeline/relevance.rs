//! Topic relevance filter: drop sections that do not talk about the paper's
//! subject.

use crate::pipeline::similarity::pair_similarity;
use crate::pipeline::topic::topic_document;
use crate::section::{top_n_by, Section, TopicMap};
use tracing::{debug, info, warn};

/// Minimum number of sections any filter leaves behind when it had that many.
pub const FLOOR: usize = 3;

/// TF-IDF cosine similarity of `content` to the topic map, 0 when either
/// side is empty or has no usable vocabulary.
pub fn topic_similarity(topics: &TopicMap, content: &str) -> f64 {
    let document = topic_document(topics);
    if document.trim().is_empty() || content.trim().is_empty() {
        return 0.0;
    }
    pair_similarity(&document, &content.to_lowercase()).unwrap_or(0.0)
}

/// Keep sections with similarity ≥ `threshold`.
///
/// Every returned section carries `topic_similarity`. When fewer than
/// [`FLOOR`] pass but at least that many came in, the [`FLOOR`] most similar
/// are kept instead, in document order.
pub fn filter(sections: &[Section], topics: &TopicMap, threshold: f64) -> Vec<Section> {
    let scored: Vec<Section> = sections
        .iter()
        .map(|s| {
            let sim = topic_similarity(topics, &s.content);
            debug!("Section '{}' topic similarity {:.3}", s.title, sim);
            s.clone().with_topic_similarity(sim)
        })
        .collect();

    let kept: Vec<Section> = scored
        .iter()
        .filter(|s| s.topic_similarity.unwrap_or(0.0) >= threshold)
        .cloned()
        .collect();

    if kept.len() < FLOOR && scored.len() >= FLOOR {
        warn!(
            "Only {} of {} sections reach similarity {:.2}; keeping the top {}",
            kept.len(),
            scored.len(),
            threshold,
            FLOOR
        );
        return top_n_by(&scored, FLOOR, |s| s.topic_similarity);
    }

    info!("Relevance filter kept {}/{} sections", kept.len(), scored.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> TopicMap {
        TopicMap::from([
            ("transformer".to_string(), 1.0),
            ("attention".to_string(), 0.8),
        ])
    }

    /// A: all on-topic, B: mostly, C: a little, D: nothing.
    fn sections() -> Vec<Section> {
        vec![
            Section::new(0, "A", "transformer attention transformer attention"),
            Section::new(1, "B", "transformer attention gadget widget sprocket"),
            Section::new(2, "C", "transformer gadget widget sprocket gizmo lever pulley"),
            Section::new(3, "D", "gadget widget sprocket gizmo lever pulley"),
        ]
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(topic_similarity(&TopicMap::new(), "transformer"), 0.0);
        assert_eq!(topic_similarity(&topics(), ""), 0.0);
        assert_eq!(topic_similarity(&topics(), "the of and"), 0.0);
    }

    #[test]
    fn similarity_ranks_on_topic_sections_higher() {
        let s = sections();
        let scores: Vec<f64> = s.iter().map(|x| topic_similarity(&topics(), &x.content)).collect();
        assert!(scores[0] > scores[1]);
        assert!(scores[1] > scores[2]);
        assert!(scores[2] > scores[3]);
        assert_eq!(scores[3], 0.0);
    }

    #[test]
    fn unreachable_threshold_keeps_top_three() {
        let kept = filter(&sections(), &topics(), 1.01);
        let titles: Vec<&str> = kept.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert!(kept.iter().all(|s| s.topic_similarity.is_some()));
    }

    #[test]
    fn threshold_filters_without_floor_when_enough_pass() {
        let kept = filter(&sections(), &topics(), 0.0);
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn small_inputs_are_not_padded() {
        let two = &sections()[2..];
        let kept = filter(two, &topics(), 0.5);
        assert!(kept.is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let once = filter(&sections(), &topics(), 0.15);
        let twice = filter(&once, &topics(), 0.15);
        assert_eq!(once, twice);
    }

    #[test]
    fn content_is_untouched() {
        let input = sections();
        let kept = filter(&input, &topics(), 0.0);
        for (a, b) in input.iter().zip(&kept) {
            assert_eq!(a.content, b.content);
        }
    }
}
