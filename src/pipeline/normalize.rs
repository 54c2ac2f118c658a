//! Page-text normalisation: many raw page strings in, one cleaned string out.

use crate::config::TextLayout;
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\n\s*").expect("valid regex"));
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Join extracted pages into the single string the section detector reads.
///
/// Invisible characters pdfium sometimes emits (`\u{FEFF}`, zero-width
/// spaces, soft hyphens) are dropped and `\r\n` / `\r` become `\n` first.
pub fn normalize_pages<S: AsRef<str>>(pages: &[S], layout: TextLayout) -> String {
    let cleaned = pages.iter().map(|p| clean_page(p.as_ref()));
    match layout {
        TextLayout::Collapsed => cleaned
            .map(|p| LINE_BREAK.replace_all(&p, " ").trim().to_string())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        TextLayout::Paragraphs => cleaned
            .map(|p| squeeze_blank_lines(&p))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn clean_page(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| !matches!(c, '\u{FEFF}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{00AD}'))
        .collect()
}

/// Trim every line and cap blank-line runs at one.
fn squeeze_blank_lines(page: &str) -> String {
    let trimmed: Vec<&str> = page.lines().map(str::trim).collect();
    let joined = trimmed.join("\n");
    BLANK_RUN.replace_all(joined.trim(), "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapsed_joins_lines_and_pages_with_spaces() {
        let pages = ["Deep   nets\n  learn\n\nfeatures", "Page two\r\ncontinues"];
        let text = normalize_pages(&pages, TextLayout::Collapsed);
        assert_eq!(text, "Deep   nets learn features Page two continues");
        assert!(!text.contains('\n'));
    }

    #[test]
    fn collapsed_skips_empty_pages() {
        let pages = ["first", "   \n  ", "second"];
        assert_eq!(normalize_pages(&pages, TextLayout::Collapsed), "first second");
    }

    #[test]
    fn paragraphs_keep_blank_line_structure() {
        let pages = ["Abstract  \n\n\n\n  We study things.\nMore.", "Introduction\n\nText"];
        let text = normalize_pages(&pages, TextLayout::Paragraphs);
        assert_eq!(
            text,
            "Abstract\n\nWe study things.\nMore.\n\nIntroduction\n\nText"
        );
    }

    #[test]
    fn invisible_characters_are_dropped() {
        let pages = ["\u{FEFF}co\u{00AD}operative\u{200B} agents"];
        assert_eq!(
            normalize_pages(&pages, TextLayout::Collapsed),
            "cooperative agents"
        );
    }

    #[test]
    fn no_pages_yield_empty_text() {
        let pages: [&str; 0] = [];
        assert!(normalize_pages(&pages, TextLayout::Paragraphs).is_empty());
    }
}
