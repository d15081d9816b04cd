use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

use crate::extractor::model::normalize_whitespace;

pub const WORDS_PER_MINUTE: usize = 220;
pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_DESCRIPTION_CHARS: usize = 220;
pub const LEADING_TEXT_CHARS: usize = 200;

/// A paragraph shorter than this is not promoted to a title.
const MIN_TITLE_PARAGRAPH_CHARS: usize = 10;
const FALLBACK_TITLE_CHARS: usize = 100;

static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h[1-6]\b[^>]*>(.*?)</h[1-6]\s*>").unwrap());
static PARAGRAPH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap());
/// Elements whose boundaries separate words.
const BREAKING_ELEMENTS: &[&str] = &[
    "br", "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "table", "tr", "td",
    "th", "blockquote", "pre",
];

static BLANK_LINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());

/// How the post description is derived from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionRule {
    /// First paragraph with at least `min_chars` visible characters, capped at 220.
    FirstParagraph { min_chars: usize },
    /// First 200 characters of the body's visible text.
    LeadingText,
}

impl Default for DescriptionRule {
    fn default() -> Self {
        Self::FirstParagraph { min_chars: 40 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMetadata {
    pub title: Option<String>,
    /// Markup the title was taken from, already removed from `body`.
    pub title_span: Option<String>,
    pub description: Option<String>,
    pub reading_time_minutes: u32,
    pub body: String,
}

pub fn extract_metadata(html: &str, rule: DescriptionRule) -> ExtractedMetadata {
    let (title, title_span) = find_title(html);

    let body = match &title_span {
        Some(span) => {
            let excised = html.replacen(span.as_str(), "", 1);
            BLANK_LINES_REGEX
                .replace_all(excised.trim(), "\n\n")
                .into_owned()
        }
        None => html.to_string(),
    };

    let description = describe(&body, rule);
    let reading_time_minutes = reading_time_minutes(&visible_text(&body));

    ExtractedMetadata {
        title: title.map(|t| truncate_with_ellipsis(&t, MAX_TITLE_CHARS)),
        title_span,
        description,
        reading_time_minutes,
        body,
    }
}

fn find_title(html: &str) -> (Option<String>, Option<String>) {
    for caps in HEADING_REGEX.captures_iter(html) {
        let text = collapse(&visible_text(&caps[1]));
        if !text.is_empty() {
            return (Some(text), Some(caps[0].to_string()));
        }
    }

    for caps in PARAGRAPH_REGEX.captures_iter(html) {
        let text = collapse(&visible_text(&caps[1]));
        if text.chars().count() >= MIN_TITLE_PARAGRAPH_CHARS {
            return (Some(text), Some(caps[0].to_string()));
        }
    }

    let text = normalize_whitespace(&visible_text(html));
    let leading: String = text.chars().take(FALLBACK_TITLE_CHARS).collect();
    let first_line = leading.lines().next().unwrap_or_default().trim();
    if first_line.is_empty() {
        (None, None)
    } else {
        (Some(first_line.to_string()), None)
    }
}

fn describe(body: &str, rule: DescriptionRule) -> Option<String> {
    let description = match rule {
        DescriptionRule::FirstParagraph { min_chars } => PARAGRAPH_REGEX
            .captures_iter(body)
            .map(|caps| collapse(&visible_text(&caps[1])))
            .find(|text| text.chars().count() >= min_chars)
            .map(|text| truncate_with_ellipsis(&text, MAX_DESCRIPTION_CHARS))?,
        DescriptionRule::LeadingText => {
            let text = collapse(&visible_text(body));
            truncate_with_ellipsis(&text, LEADING_TEXT_CHARS)
        }
    };
    (!description.is_empty()).then_some(description)
}

/// Text a reader would see, with entities decoded and tags dropped.
///
/// Line breaks and block boundaries become newlines so words on either side
/// stay apart.
pub fn visible_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();
    push_text(fragment.root_element(), &mut text);
    text
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let breaking = BREAKING_ELEMENTS.contains(&child.value().name());
            if breaking {
                out.push('\n');
            }
            push_text(child, out);
            if breaking {
                out.push('\n');
            }
        }
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, ending in "..." when shortened.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

pub fn reading_time_minutes(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}
