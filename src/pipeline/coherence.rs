//! Coherence check: remove at most one section that has nothing in common
//! with the rest of the paper.

use crate::pipeline::similarity::{cosine, tfidf_vectors};
use crate::section::Section;
use tracing::{debug, info, warn};

/// The least coherent section is dropped when its mean similarity is below
/// this fraction of the second-least coherent one.
pub const OUTLIER_RATIO: f64 = 0.3;

/// Mean cosine similarity of each section to every other section.
///
/// `None` when the joint vocabulary is empty.
pub fn mean_similarities(sections: &[Section]) -> Option<Vec<f64>> {
    let contents: Vec<String> = sections.iter().map(|s| s.content.to_lowercase()).collect();
    let vectors = match tfidf_vectors(&contents) {
        Ok(v) => v,
        Err(e) => {
            warn!("Coherence check skipped: {}", e);
            return None;
        }
    };
    let others = (vectors.len() - 1) as f64;
    let means = vectors
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let total: f64 = vectors
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, b)| cosine(a, b))
                .sum();
            total / others
        })
        .collect();
    Some(means)
}

/// Returns the input minus its single outlier, if there is one.
///
/// Two or fewer sections are returned unchanged.
pub fn check_coherence(sections: &[Section]) -> Vec<Section> {
    if sections.len() <= 2 {
        return sections.to_vec();
    }
    let Some(means) = mean_similarities(sections) else {
        return sections.to_vec();
    };

    let mut ranked: Vec<(usize, f64)> = means.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (lowest_pos, lowest) = ranked[0];
    let (_, second) = ranked[1];
    debug!(
        "Coherence: lowest '{}' {:.3}, second lowest {:.3}",
        sections[lowest_pos].title, lowest, second
    );

    if lowest < OUTLIER_RATIO * second {
        info!(
            "Dropping incoherent section '{}' (mean similarity {:.3})",
            sections[lowest_pos].title, lowest
        );
        return sections
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != lowest_pos)
            .map(|(_, s)| s.clone())
            .collect();
    }
    sections.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn two_or_fewer_sections_are_untouched() {
        let two = vec![
            Section::new(0, "A", "cooking recipes pasta"),
            Section::new(1, "B", "transformer attention heads"),
        ];
        assert_eq!(check_coherence(&two), two);
        assert!(check_coherence(&[]).is_empty());
    }

    #[test]
    fn outlier_is_removed_and_order_kept() {
        let sections = vec![
            Section::new(0, "A", "pasta recipes tomato basil garlic"),
            Section::new(1, "B", "transformer attention heads layers training"),
            Section::new(2, "C", "transformer attention layers inference latency"),
        ];
        let kept = check_coherence(&sections);
        assert_eq!(titles(&kept), vec!["B", "C"]);
    }

    #[test]
    fn all_disjoint_sections_are_kept() {
        // Every mean is 0, and 0 < 0.3 × 0 does not hold.
        let sections = vec![
            Section::new(0, "A", "pasta tomato"),
            Section::new(1, "B", "kernel scheduler"),
            Section::new(2, "C", "glacier erosion"),
        ];
        assert_eq!(check_coherence(&sections).len(), 3);
    }

    #[test]
    fn similar_sections_are_all_kept() {
        let sections = vec![
            Section::new(0, "A", "graph neural network message passing"),
            Section::new(1, "B", "graph neural network node embeddings"),
            Section::new(2, "C", "graph network message embeddings"),
        ];
        assert_eq!(check_coherence(&sections).len(), 3);
    }

    #[test]
    fn empty_vocabulary_leaves_input_unchanged() {
        let sections = vec![
            Section::new(0, "A", "the of"),
            Section::new(1, "B", "and a"),
            Section::new(2, "C", "it is"),
        ];
        assert_eq!(check_coherence(&sections), sections);
    }

    #[test]
    fn removes_at_most_one_section() {
        let sections = vec![
            Section::new(0, "A", "pasta tomato basil"),
            Section::new(1, "B", "glacier erosion ice"),
            Section::new(2, "C", "transformer attention layers"),
            Section::new(3, "D", "transformer attention heads"),
        ];
        assert!(check_coherence(&sections).len() >= 3);
    }
}
