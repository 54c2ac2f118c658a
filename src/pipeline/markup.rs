//! Markup-lite parsing and page layout for the summary PDF.
//!
//! The generated sections use a small subset of Markdown: `#`/`##` headings,
//! `-`/`*`/`•`/`1.` bullets, lines ending in `:` as subheadings, and blank
//! lines between paragraphs. This module turns that into positioned text
//! lines on US Letter pages; [`crate::pipeline::render`] only draws them.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("valid regex"));
static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("valid regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:([-*•])|(\d+[.)]))\s+(.*)$").expect("valid regex"));

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
const LEADING: f32 = 1.35;
const BULLET_INDENT: f32 = 18.0;

pub const TITLE_COLOR: (u8, u8, u8) = (20, 40, 90);
pub const HEADING_COLOR: (u8, u8, u8) = (30, 70, 140);
pub const BODY_COLOR: (u8, u8, u8) = (25, 25, 25);

/// One parsed unit of markup-lite text.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `level` 1 for `#`, 2 for `##` and deeper, 3 for `Something:` lines.
    Heading { level: u8, text: String },
    Bullet { marker: String, text: String },
    Paragraph(String),
}

/// Make LLM output safe for the standard Helvetica encoding.
///
/// Strips HTML-ish tags and `**` emphasis, and maps smart punctuation to
/// ASCII.
pub fn sanitize(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, "");
    stripped
        .replace("**", "")
        .replace(['\u{201C}', '\u{201D}', '\u{201E}'], "\"")
        .replace(['\u{2018}', '\u{2019}', '\u{201A}'], "'")
        .replace(['\u{2013}', '\u{2014}', '\u{2212}'], "-")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
}

/// Parse markup-lite text into blocks.
pub fn parse(text: &str) -> Vec<Block> {
    let text = sanitize(text);
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut in_bullet = false;

    fn flush(paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>) {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(paragraph.join(" ")));
            paragraph.clear();
        }
    }

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            flush(&mut paragraph, &mut blocks);
            in_bullet = false;
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(line) {
            flush(&mut paragraph, &mut blocks);
            let level = if caps[1].len() == 1 { 1 } else { 2 };
            blocks.push(Block::Heading {
                level,
                text: caps[2].trim().to_string(),
            });
            in_bullet = false;
        } else if let Some(caps) = BULLET_RE.captures(line) {
            flush(&mut paragraph, &mut blocks);
            let marker = match (caps.get(1), caps.get(2)) {
                (_, Some(number)) => number.as_str().to_string(),
                _ => "-".to_string(),
            };
            blocks.push(Block::Bullet {
                marker,
                text: caps[3].trim().to_string(),
            });
            in_bullet = true;
        } else if line.ends_with(':') && line.chars().count() <= 80 && paragraph.is_empty() {
            blocks.push(Block::Heading {
                level: 3,
                text: line.trim_end_matches(':').trim().to_string(),
            });
            in_bullet = false;
        } else if let (true, Some(Block::Bullet { text, .. })) = (in_bullet, blocks.last_mut()) {
            // Continuation of a wrapped bullet.
            text.push(' ');
            text.push_str(line);
        } else {
            paragraph.push(line);
        }
    }
    flush(&mut paragraph, &mut blocks);
    blocks
}

/// Approximate Helvetica advance width of `text` in points.
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' ' | 'i' | 'j' | 'l' | 'f' | 't' | 'I' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 278,
            'm' | 'w' | 'M' | 'W' => 833,
            'r' | '(' | ')' | '-' | '"' => 333,
            c if c.is_ascii_uppercase() => 667,
            _ => 556,
        })
        .sum();
    let scale = if bold { 1.05 } else { 1.0 };
    units as f32 * size / 1000.0 * scale
}

/// Greedy word wrap to `max_width` points. Words wider than a line are
/// split by characters.
pub fn wrap(text: &str, size: f32, bold: bool, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size, bold) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, size, bold) <= max_width {
            current = word.to_string();
        } else {
            for c in word.chars() {
                current.push(c);
                if text_width(&current, size, bold) > max_width {
                    current.pop();
                    lines.push(std::mem::replace(&mut current, c.to_string()));
                }
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// A positioned run of text; `y` is the baseline from the page bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub size: f32,
    pub bold: bool,
    pub color: (u8, u8, u8),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub lines: Vec<TextLine>,
}

/// The four texts that make up the output document.
#[derive(Debug, Clone, Copy)]
pub struct SummaryDocument<'a> {
    pub title: &'a str,
    pub summary: &'a str,
    pub key_takeaways: &'a str,
    pub engineers_corner: &'a str,
}

pub const INTRO_LINE: &str =
    "This summary highlights the key engineering insights from the research paper.";

struct Layouter {
    pages: Vec<PageLayout>,
    y: f32,
}

impl Layouter {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn page_break(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn space(&mut self, points: f32) {
        if self.y < PAGE_HEIGHT - MARGIN {
            self.y -= points;
        }
    }

    fn line(&mut self, x: f32, text: String, size: f32, bold: bool, color: (u8, u8, u8)) {
        let advance = size * LEADING;
        if self.y - advance < MARGIN {
            self.page_break();
        }
        self.y -= advance;
        self.push(x, text, size, bold, color);
    }

    /// Place text at the current baseline without advancing.
    fn push(&mut self, x: f32, text: String, size: f32, bold: bool, color: (u8, u8, u8)) {
        let y = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(TextLine {
                x,
                y,
                text,
                size,
                bold,
                color,
            });
        }
    }

    fn wrapped(&mut self, text: &str, indent: f32, size: f32, bold: bool, color: (u8, u8, u8)) {
        let width = PAGE_WIDTH - 2.0 * MARGIN - indent;
        for line in wrap(text, size, bold, width) {
            self.line(MARGIN + indent, line, size, bold, color);
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Heading { level, text } => {
                let size = match level {
                    1 => 14.0,
                    2 => 12.5,
                    _ => 11.0,
                };
                self.space(8.0);
                self.wrapped(text, 0.0, size, true, HEADING_COLOR);
                self.space(2.0);
            }
            Block::Bullet { marker, text } => {
                let size = 10.5;
                let width = PAGE_WIDTH - 2.0 * MARGIN - BULLET_INDENT;
                for (i, line) in wrap(text, size, false, width).into_iter().enumerate() {
                    self.line(MARGIN + BULLET_INDENT, line, size, false, BODY_COLOR);
                    if i == 0 {
                        // Marker shares the first line's baseline.
                        self.push(MARGIN + 4.0, marker.clone(), size, false, BODY_COLOR);
                    }
                }
                self.space(2.0);
            }
            Block::Paragraph(text) => {
                self.wrapped(text, 0.0, 10.5, false, BODY_COLOR);
                self.space(6.0);
            }
        }
    }

    fn section(&mut self, heading: &str, body: &str) {
        self.wrapped(heading, 0.0, 16.0, true, TITLE_COLOR);
        self.space(6.0);
        for block in parse(body) {
            self.block(&block);
        }
    }
}

/// Lay the whole document out: title page with the key takeaways, then the
/// research summary, then the Engineer's Corner, each on a new page.
pub fn layout_summary(doc: &SummaryDocument<'_>) -> Vec<PageLayout> {
    let mut layout = Layouter::new();
    layout.wrapped(
        &format!("{} - Engineer's Summary", sanitize(doc.title)),
        0.0,
        20.0,
        true,
        TITLE_COLOR,
    );
    layout.space(4.0);
    layout.wrapped(INTRO_LINE, 0.0, 10.5, false, BODY_COLOR);
    layout.space(14.0);

    layout.section("Key Takeaways", doc.key_takeaways);
    layout.page_break();
    layout.section("Research Summary", doc.summary);
    layout.page_break();
    layout.section("Engineer's Corner", doc.engineers_corner);
    layout.pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_tags_and_smart_punctuation() {
        let s = sanitize("<b>**Fast**</b> \u{201C}cache\u{201D} \u{2014} it\u{2019}s\u{2026}");
        assert_eq!(s, "Fast \"cache\" - it's...");
    }

    #[test]
    fn sanitize_keeps_comparison_operators() {
        assert_eq!(sanitize("latency < 5 ms and > 1 ms"), "latency < 5 ms and > 1 ms");
    }

    #[test]
    fn parse_recognises_every_block_kind() {
        let text = "# Overview\nThe model\nis small.\n\n## Results\n- fast\n* cheap\n  and simple\n2. third\n\nKey findings:\nDone.";
        let blocks = parse(text);
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 1, text: "Overview".into() },
                Block::Paragraph("The model is small.".into()),
                Block::Heading { level: 2, text: "Results".into() },
                Block::Bullet { marker: "-".into(), text: "fast".into() },
                Block::Bullet { marker: "-".into(), text: "cheap and simple".into() },
                Block::Bullet { marker: "2.".into(), text: "third".into() },
                Block::Heading { level: 3, text: "Key findings".into() },
                Block::Paragraph("Done.".into()),
            ]
        );
    }

    #[test]
    fn wrap_respects_width() {
        let text = "engineers want practical summaries of dense research papers ".repeat(10);
        let lines = wrap(&text, 10.5, false, 200.0);
        assert!(lines.len() > 3);
        assert!(lines.iter().all(|l| text_width(l, 10.5, false) <= 200.0));
    }

    #[test]
    fn wrap_splits_giant_words() {
        let word = "x".repeat(300);
        let lines = wrap(&word, 10.0, false, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn layout_puts_sections_on_separate_pages() {
        let doc = SummaryDocument {
            title: "Sparse Attention",
            summary: "## Approach\nBlocks of attention.",
            key_takeaways: "- one\n- two",
            engineers_corner: "## Practical Applications\n- long documents",
        };
        let pages = layout_summary(&doc);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].lines[0].text, "Sparse Attention - Engineer's Summary");
        assert!(pages[0].lines.iter().any(|l| l.text == "Key Takeaways"));
        assert_eq!(pages[1].lines[0].text, "Research Summary");
        assert_eq!(pages[2].lines[0].text, "Engineer's Corner");
    }

    #[test]
    fn long_sections_overflow_onto_new_pages() {
        let summary = "A paragraph of summary text that goes on.\n\n".repeat(200);
        let doc = SummaryDocument {
            title: "T",
            summary: &summary,
            key_takeaways: "",
            engineers_corner: "",
        };
        let pages = layout_summary(&doc);
        assert!(pages.len() > 3);
        for page in &pages {
            for line in &page.lines {
                assert!(line.y >= MARGIN, "line below bottom margin: {}", line.y);
                assert!(line.y <= PAGE_HEIGHT - MARGIN);
            }
        }
    }
}
