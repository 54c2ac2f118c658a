//! Heuristic section detection.
//!
//! Papers come out of text extraction as one unstructured string. This stage
//! cuts it into titled sections with two tiers of regex heuristics:
//!
//! ```text
//! primary   heading lines ("3. Results", "Conclusion") after a blank line
//!    │      ≥ 2 sections with ≥ 200 chars?  ── yes ──▶ use them
//!    ▼ no
//! fallback  Abstract + Introduction blocks, then 80/20 body/conclusion split
//!    │      no Introduction?
//!    ▼
//! fallback  25 / 50 / 25 proportional split (always succeeds)
//! ```
//!
//! Every tier's output is then chunked so no section exceeds `max_chars`.
//! Detection never fails: any text produces at least three sections.

use crate::section::Section;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, info, warn};

/// Minimum characters between the end of one accepted heading and the start
/// of the next. Closer matches are inline mentions, not headings.
pub const MIN_HEADING_GAP: usize = 1000;

/// Primary-tier sections with less content than this are discarded.
pub const MIN_SECTION_CHARS: usize = 200;

/// Share of the text the fallback tiers assign to everything before the conclusion.
const BODY_END_FRACTION: f64 = 0.8;

static ORDINAL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));

static ABSTRACT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)abstract(?:\s*\n)(.*?)(?:\n\s*\n|\n(?:[A-Z]|\d))").expect("valid regex")
});

static INTRODUCTION_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:^|\n\s*\n)(?:\d\.\s*)?introduction(?:\s*\n)(.*?)(?:\n\s*\n\d|$)")
        .expect("valid regex")
});

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Abstract patterns tried in order by [`extract_abstract`].
static ABSTRACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)abstract\s*\n+(.*?)(?:\n\s*\n|\n(?:[A-Z]|\d))",
        r"(?is)abstract[:.\s]+(.*?)(?:\n\s*\n|\n(?:[A-Z]|\d))",
        r"(?is)ABSTRACT\s*(.*?)(?:\n\s*\n|\n(?:[A-Z]|\d))",
        r"(?is)abstract(?:\s*|:\s*)(.*?)\n\s*\n\s*(?:introduction|1\.)\s*\n",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Split normalised paper text into ordered sections.
///
/// `title_patterns` are regex fragments for heading names (see
/// [`crate::config::DEFAULT_SECTION_TITLE_PATTERNS`]). Sections longer than
/// `max_chars` are split into "`<title>` (Part n)" chunks.
pub fn detect<S: AsRef<str>>(text: &str, title_patterns: &[S], max_chars: usize) -> Vec<(String, String)> {
    let sections = match detect_by_headings(text, title_patterns) {
        Some(sections) => sections,
        None => {
            info!("Using fallback section detection (basic structure)");
            detect_by_structure(text)
        }
    };

    let mut processed = Vec::with_capacity(sections.len());
    for (title, content) in sections {
        if content.chars().count() > max_chars {
            let parts = chunk_text(&content, max_chars);
            debug!("Section '{}' split into {} parts", title, parts.len());
            for (n, part) in parts.into_iter().enumerate() {
                processed.push((format!("{} (Part {})", title, n + 1), part));
            }
        } else {
            processed.push((title, content));
        }
    }

    info!("Detected {} sections after processing", processed.len());
    processed
}

/// [`detect`], wrapped into indexed [`Section`] records.
pub fn detect_sections<S: AsRef<str>>(text: &str, title_patterns: &[S], max_chars: usize) -> Vec<Section> {
    detect(text, title_patterns, max_chars)
        .into_iter()
        .enumerate()
        .map(|(index, (title, content))| Section::new(index, title, content))
        .collect()
}

/// Primary tier. `None` when fewer than two substantial sections were found.
fn detect_by_headings<S: AsRef<str>>(text: &str, title_patterns: &[S]) -> Option<Vec<(String, String)>> {
    let heading = match heading_regex(title_patterns) {
        Ok(re) => re,
        Err(e) => {
            warn!("Section title patterns do not compile ({}); skipping heading tier", e);
            return None;
        }
    };

    let mut accepted: Vec<Captures<'_>> = Vec::new();
    let mut last_end: Option<usize> = None;
    for caps in heading.captures_iter(text) {
        let whole = caps.get(0)?;
        if let Some(end) = last_end {
            if whole.start() < end || text[end..whole.start()].chars().count() < MIN_HEADING_GAP {
                continue;
            }
        }
        last_end = Some(whole.end());
        accepted.push(caps);
    }

    if accepted.len() < 2 {
        debug!("Heading tier found {} headings", accepted.len());
        return None;
    }

    let mut sections = Vec::new();
    for (i, caps) in accepted.iter().enumerate() {
        let whole = caps.get(0)?;
        let raw_title = caps.get(1).map_or(whole.as_str(), |m| m.as_str());
        let title = capitalize(ORDINAL_PREFIX.replace(raw_title.trim(), "").trim());

        let end = accepted
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let content = text[whole.end()..end].trim();

        if content.chars().count() >= MIN_SECTION_CHARS {
            sections.push((title, content.to_string()));
        } else {
            debug!("Dropping heading '{}': only {} chars", title, content.len());
        }
    }

    (sections.len() >= 2).then_some(sections)
}

fn heading_regex<S: AsRef<str>>(title_patterns: &[S]) -> Result<Regex, regex::Error> {
    let alternation = title_patterns
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?i)(?:^|\n\s*\n)(\d+\.\s*(?:{alternation})|(?:{alternation}))(?:\s*\n)"
    ))
}

/// Fallback tiers: Abstract/Introduction blocks, else a proportional split.
fn detect_by_structure(text: &str) -> Vec<(String, String)> {
    let body_end = byte_at_fraction(text, BODY_END_FRACTION);
    let abstract_block = ABSTRACT_BLOCK.captures(text);
    let intro_block = INTRODUCTION_BLOCK.captures(text);

    match (abstract_block, intro_block) {
        (abstract_block, Some(intro)) => {
            let intro_end = intro.get(0).map_or(0, |m| m.end());
            let mut sections = Vec::with_capacity(4);
            if let Some(abs) = abstract_block {
                sections.push(("Abstract".to_string(), group_text(&abs)));
            }
            sections.push(("Introduction".to_string(), group_text(&intro)));
            sections.push((
                "Main Body".to_string(),
                text[intro_end.min(body_end)..body_end].trim().to_string(),
            ));
            sections.push(("Conclusion".to_string(), text[body_end..].trim().to_string()));
            sections
        }
        (_, None) => {
            let quarter = byte_at_fraction(text, 0.25);
            let three_quarters = byte_at_fraction(text, 0.75);
            vec![
                ("Introduction".to_string(), text[..quarter].trim().to_string()),
                (
                    "Methods and Results".to_string(),
                    text[quarter..three_quarters].trim().to_string(),
                ),
                (
                    "Discussion and Conclusion".to_string(),
                    text[three_quarters..].trim().to_string(),
                ),
            ]
        }
    }
}

fn group_text(caps: &Captures<'_>) -> String {
    caps.get(1).map_or("", |m| m.as_str()).trim().to_string()
}

/// Byte offset of the character at `fraction` of the text's character count.
fn byte_at_fraction(text: &str, fraction: f64) -> usize {
    let total = text.chars().count();
    let target = (total as f64 * fraction) as usize;
    text.char_indices().nth(target).map_or(text.len(), |(i, _)| i)
}

/// Uppercase the first character, lowercase the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Chunks are built from whole paragraphs (blank-line delimited). A single
/// paragraph longer than `max_chars` is broken at word boundaries, and a
/// single word longer than that at character boundaries, so the bound holds
/// for any input.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces: Vec<String> = Vec::new();
    for para in PARAGRAPH_BREAK.split(text) {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }
        if para.chars().count() > max_chars {
            pieces.extend(split_paragraph(para, max_chars));
        } else {
            pieces.push(para.to_string());
        }
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for piece in pieces {
        let piece_len = piece.chars().count();
        let added = if current.is_empty() { piece_len } else { piece_len + 2 };
        if !current.is_empty() && current_len + added > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push_str("\n\n");
            current_len += 2;
        }
        current.push_str(&piece);
        current_len += piece_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Break one oversized paragraph on whitespace into pieces ≤ `max_chars`.
fn split_paragraph(para: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in para.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for slice in chars.chunks(max_chars) {
                pieces.push(slice.iter().collect());
            }
            continue;
        }
        let added = if current.is_empty() { word_len } else { word_len + 1 };
        if current_len + added > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Best-effort abstract for topic extraction.
///
/// Tries the common "Abstract" layouts; falls back to the first paragraph
/// (truncated to 500 chars) when it is long enough, else returns "".
pub fn extract_abstract(text: &str) -> String {
    for pattern in ABSTRACT_PATTERNS.iter() {
        if let Some(body) = pattern.captures(text).and_then(|c| c.get(1)) {
            let cleaned = WHITESPACE_RUN.replace_all(body.as_str().trim(), " ");
            if cleaned.chars().count() > 50 {
                return cleaned.into_owned();
            }
        }
    }

    let first_para = text.split("\n\n").next().unwrap_or("");
    if first_para.chars().count() > 100 {
        return first_para.chars().take(500).collect();
    }
    String::new()
}
