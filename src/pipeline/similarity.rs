//! TF-IDF vectorisation and cosine similarity over a small in-memory corpus.
//!
//! Matches the common "fit on the corpus you compare" setup:
//!
//! * tokens: lowercase runs of ≥ 2 word characters, English stop words removed
//! * tf: raw term count
//! * idf: `ln((1 + n) / (1 + df)) + 1` (smoothed, never zero)
//! * rows L2-normalised, so cosine similarity is a dot product
//!
//! Corpora here are tiny (2 documents for topic relevance, tens for
//! coherence), so vectors are sparse `BTreeMap`s keyed by term. Ordered keys
//! keep floating-point sums deterministic from run to run.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

static STOP_WORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    stop_words::get(stop_words::LANGUAGE::English)
        .into_iter()
        .map(|w| w.to_string())
        .collect()
});

/// A sparse, L2-normalised TF-IDF row.
pub type SparseVector = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorizeError {
    /// Every document was empty or consisted only of stop words.
    #[error("empty vocabulary: documents contain only stop words or no tokens")]
    EmptyVocabulary,
}

/// Lowercase, tokenise, and drop English stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .filter(|t| !STOP_WORDS.contains(t))
        .collect()
}

/// Fit TF-IDF on `documents` and return one normalised vector per document.
///
/// A document with no surviving tokens gets an empty (all-zero) vector.
pub fn tfidf_vectors<S: AsRef<str>>(documents: &[S]) -> Result<Vec<SparseVector>, VectorizeError> {
    let tokenised: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for tokens in &tokenised {
        let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        for term in unique {
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }
    if doc_freq.is_empty() {
        return Err(VectorizeError::EmptyVocabulary);
    }

    let n = documents.len() as f64;
    let vectors = tokenised
        .iter()
        .map(|tokens| {
            let mut counts: BTreeMap<String, f64> = BTreeMap::new();
            for t in tokens {
                *counts.entry(t.clone()).or_insert(0.0) += 1.0;
            }
            let mut vector: SparseVector = counts
                .into_iter()
                .map(|(term, tf)| {
                    let df = doc_freq.get(term.as_str()).copied().unwrap_or(0) as f64;
                    let idf = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
                    (term, tf * idf)
                })
                .collect();
            let norm = vector.values().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for v in vector.values_mut() {
                    *v /= norm;
                }
            }
            vector
        })
        .collect();
    Ok(vectors)
}

/// Cosine similarity between two sparse vectors, 0.0 when either is zero.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, x)| large.get(term).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Similarity of two texts under a TF-IDF model fitted on just the pair.
pub fn pair_similarity(a: &str, b: &str) -> Result<f64, VectorizeError> {
    let vectors = tfidf_vectors(&[a, b])?;
    Ok(cosine(&vectors[0], &vectors[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_drops_stop_words() {
        let tokens = tokenize("The Transformer is an Attention architecture, a B");
        assert_eq!(tokens, vec!["transformer", "attention", "architecture"]);
    }

    #[test]
    fn identical_documents_are_fully_similar() {
        let sim = pair_similarity("sparse attention kernels", "sparse attention kernels").unwrap();
        assert!((sim - 1.0).abs() < 1e-9, "got {sim}");
    }

    #[test]
    fn disjoint_documents_have_zero_similarity() {
        let sim = pair_similarity("quantum entanglement photons", "gradient descent optimiser").unwrap();
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn stop_word_only_corpus_is_an_error() {
        let err = tfidf_vectors(&["the of and", "a an the"]).unwrap_err();
        assert_eq!(err, VectorizeError::EmptyVocabulary);
    }

    #[test]
    fn empty_document_gets_zero_vector() {
        let vectors = tfidf_vectors(&["graph neural network", ""]).unwrap();
        assert!(vectors[1].is_empty());
        assert_eq!(cosine(&vectors[0], &vectors[1]), 0.0);
    }

    #[test]
    fn rows_are_unit_length() {
        let vectors = tfidf_vectors(&["cache cache eviction policy", "eviction latency"]).unwrap();
        for v in &vectors {
            let norm: f64 = v.values().map(|x| x * x).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn shared_terms_weigh_less_than_unique_terms() {
        let vectors = tfidf_vectors(&["cache eviction", "cache latency"]).unwrap();
        let row = &vectors[0];
        assert!(row["eviction"] > row["cache"]);
    }

    #[test]
    fn similarity_orders_by_overlap() {
        let close = pair_similarity("robot grasping policy", "robot grasping dataset").unwrap();
        let far = pair_similarity("robot grasping policy", "protein folding dataset").unwrap();
        assert!(close > far);
    }
}
