//! Whole-paper insight sections: Key Takeaways and the Engineer's Corner.

use crate::pipeline::llm::{GenerationRequest, TextGenerator};
use crate::prompts::{engineers_corner_prompt, key_takeaways_prompt, SUMMARY_SYSTEM_PROMPT};
use tracing::warn;

/// Characters of full text sent to the insight prompts.
pub const INSIGHT_INPUT_CHARS: usize = 50_000;

pub const KEY_TAKEAWAYS_PLACEHOLDER: &str = "Error generating Key Takeaways section.";
pub const ENGINEERS_CORNER_PLACEHOLDER: &str = "Error generating Engineer's Corner section.";

fn opening(text: &str) -> String {
    text.chars().take(INSIGHT_INPUT_CHARS).collect()
}

pub async fn key_takeaways(generator: &dyn TextGenerator, title: &str, text: &str) -> String {
    let request = GenerationRequest::new(SUMMARY_SYSTEM_PROMPT, key_takeaways_prompt(title, &opening(text)))
        .temperature(0.3)
        .max_tokens(1000);
    match generator.generate(&request).await {
        Ok(generation) => generation.text.trim().to_string(),
        Err(e) => {
            warn!("Key takeaways failed: {}", e);
            KEY_TAKEAWAYS_PLACEHOLDER.to_string()
        }
    }
}

pub async fn engineers_corner(generator: &dyn TextGenerator, title: &str, text: &str) -> String {
    let request = GenerationRequest::new(
        SUMMARY_SYSTEM_PROMPT,
        engineers_corner_prompt(title, &opening(text)),
    )
    .temperature(0.4)
    .max_tokens(1500);
    match generator.generate(&request).await {
        Ok(generation) => generation.text.trim().to_string(),
        Err(e) => {
            warn!("Engineer's corner failed: {}", e);
            ENGINEERS_CORNER_PLACEHOLDER.to_string()
        }
    }
}
