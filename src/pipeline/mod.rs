//! Pipeline stages for paper summarisation.
//!
//! Each submodule implements one step; the orchestration in
//! [`crate::summarize`] chains them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ normalize ──▶ sections ──▶ relevance ──▶ coherence
//! (URL/path) (pdfium)   (one string)  (regex tiers) (TF-IDF)     (outlier)
//!
//!   ──▶ validate ──▶ summarize ──▶ insights ──▶ markup ──▶ render
//!       (LLM score)  (map/reduce)  (LLM)        (layout)   (pdfium)
//! ```
//!
//! [`llm`] is the generation seam every LLM-backed stage goes through,
//! [`topic`] produces the topic map and guidance, and [`similarity`] is the
//! TF-IDF utility behind relevance and coherence.

pub mod coherence;
pub mod extract;
pub mod input;
pub mod insights;
pub mod llm;
pub mod markup;
pub mod normalize;
pub mod relevance;
pub mod render;
pub mod sections;
pub mod similarity;
pub mod summarize;
pub mod topic;
pub mod validate;
