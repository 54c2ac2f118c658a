//! Prompts for every LLM call the pipeline makes.
//!
//! Keeping them in one module means a wording change touches one place, and
//! tests can inspect the rendered prompts without a provider.
//!
//! System prompts are constants; user prompts are built by the `*_prompt`
//! functions from the paper title and the relevant text.

/// Shared system prompt for summary-style calls.
pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are an expert at summarizing research papers for software engineers and ML practitioners.";

pub const TOPIC_EXTRACTION_SYSTEM_PROMPT: &str =
    "You are an expert at identifying the key topics and concepts in research papers.";

pub const TITLE_VALIDATION_SYSTEM_PROMPT: &str =
    "You are an expert at evaluating the relevance of research paper sections.";

pub const TOPIC_MODELING_SYSTEM_PROMPT: &str =
    "You are an expert at topic modeling of technical documents.";

/// Title + abstract → JSON map of key terms with 0–1 weights.
pub fn topic_extraction_prompt(title: &str, abstract_text: &str) -> String {
    format!(
        r#"Extract the main topics and key concepts from this research paper.

Title: {title}

Abstract: {abstract_text}

Identify 10-15 key terms or short phrases that characterise the paper's subject.
Assign each a relevance score between 0 and 1, where 1 is most central.

Return a JSON object mapping each term to its score, for example:
{{"neural networks": 0.9, "image classification": 0.7}}"#
    )
}

/// Score one section's relevance to the paper title, 0–10.
pub fn title_validation_prompt(paper_title: &str, section_title: &str, excerpt: &str) -> String {
    format!(
        r#"Rate how relevant the following section is to the paper titled "{paper_title}".

Section title: {section_title}

Section content (excerpt):
{excerpt}

Consider:
1. Does the content relate to the topic stated in the paper title?
2. Is it the kind of content expected under a section with this heading?
3. Does it use terminology consistent with the paper's subject?

Answer with a single number from 0 to 10, where 10 is highly relevant and 0 is unrelated."#
    )
}

/// Three topics of 5–7 keywords each, as JSON.
pub fn topic_modeling_prompt(text: &str) -> String {
    format!(
        r#"Identify the 3 main topics discussed in the following research text.
For each topic, list 5-7 keywords that characterise it.

Return a JSON object of the form:
{{"topics": [["keyword1", "keyword2", "keyword3", "keyword4", "keyword5"], ...]}}

Text:
{text}"#
    )
}

/// Map phase: summarise one section with an engineering bias.
pub fn section_summary_prompt(
    paper_title: &str,
    section_title: &str,
    content: &str,
    topic_guidance: Option<&str>,
) -> String {
    let guidance = topic_guidance
        .filter(|g| !g.is_empty())
        .map(|g| format!("\n{g}\n"))
        .unwrap_or_default();
    format!(
        r#"Summarize the following section of the research paper "{paper_title}".

Section: {section_title}
{guidance}
Focus on:
- The core technical ideas and how they work
- Implementation details an engineer would need
- Quantitative results and their practical meaning
- Limitations or assumptions that matter in practice

Be concise and specific. Use plain text with short paragraphs or "-" bullets.

Section content:
{content}"#
    )
}

/// Reduce phase: merge the per-section summaries into one narrative.
pub fn final_summary_prompt(paper_title: &str, section_summaries: &str) -> String {
    format!(
        r###"Below are summaries of the sections of the research paper "{paper_title}".

Synthesize them into one coherent summary for software engineers. Structure it with
"## " headings for the main parts (for example Overview, Approach, Results, Limitations),
use "-" bullets for lists, and keep technical details that matter for implementation.
Do not invent results that are not in the summaries.

{section_summaries}"###
    )
}

pub fn key_takeaways_prompt(paper_title: &str, text: &str) -> String {
    format!(
        r#"Read the research paper "{paper_title}" below and write its Key Takeaways for engineers.

Write 5-7 bullet points, each starting with "- ". Each bullet should state one
concrete, practical insight: what the paper contributes, when the technique is
useful, what it costs, and what results support it.

Paper text:
{text}"#
    )
}

pub fn engineers_corner_prompt(paper_title: &str, text: &str) -> String {
    format!(
        r###"Write an "Engineer's Corner" for the research paper "{paper_title}".

Use these subsections, each introduced by a "## " heading:
## Practical Applications
## Implementation Considerations
## Tools and Frameworks
## Potential Pitfalls

Under each heading write 2-4 "- " bullets with concrete, actionable advice for an
engineer who wants to apply this work.

Paper text:
{text}"###
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_validation_lists_three_criteria() {
        let p = title_validation_prompt("Sparse Attention", "Results", "We measure...");
        assert!(p.contains("Sparse Attention"));
        assert!(p.contains("1. "));
        assert!(p.contains("2. "));
        assert!(p.contains("3. "));
        assert!(p.contains("0 to 10"));
    }

    #[test]
    fn topic_prompts_show_json_shape() {
        assert!(topic_extraction_prompt("T", "A").contains(r#"{"neural networks": 0.9"#));
        assert!(topic_modeling_prompt("text").contains(r#"{"topics": [["#));
    }

    #[test]
    fn section_prompt_includes_guidance_only_when_present() {
        let with = section_summary_prompt("P", "Methods", "body", Some("Focus on these key topics: a, b"));
        let without = section_summary_prompt("P", "Methods", "body", None);
        assert!(with.contains("Focus on these key topics: a, b"));
        assert!(!without.contains("Focus on these key topics"));
        assert!(without.ends_with("body"));
    }

    #[test]
    fn engineers_corner_names_its_subsections() {
        let p = engineers_corner_prompt("P", "text");
        for heading in [
            "## Practical Applications",
            "## Implementation Considerations",
            "## Tools and Frameworks",
            "## Potential Pitfalls",
        ] {
            assert!(p.contains(heading), "missing {heading}");
        }
    }
}
