use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

use crate::render::ImageAsset;

static SPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// A converted document, ready to be persisted as a post.
#[derive(Debug, Clone)]
pub struct ContentDocument {
    pub source_path: PathBuf,
    pub slug: String,
    /// Renderer output before sanitizing.
    pub raw_markup: String,
    /// Allow-listed markup with the title removed; this is what gets stored.
    pub sanitized_markup: String,
    pub extracted_title: String,
    pub description: Option<String>,
    pub reading_time_minutes: u32,
    pub image_assets: Vec<ImageAsset>,
    pub hero_image: Option<String>,
    pub warnings: Vec<String>,
}

pub fn normalize_whitespace(text: &str) -> String {
    let text = text.trim();
    let spaced = SPACE_REGEX.replace_all(text, " ");
    NEWLINE_REGEX.replace_all(&spaced, "\n\n").to_string()
}
