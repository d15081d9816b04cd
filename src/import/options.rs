use std::path::PathBuf;

use crate::extractor::sanitize;

/// Upper bound on stored markup length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentLimit {
    #[default]
    Unlimited,
    /// Maximum number of characters.
    MaxChars(usize),
}

impl ContentLimit {
    /// Returns the truncated markup, or `None` when `html` already fits.
    ///
    /// The cut lands on a character boundary outside any tag or entity and
    /// the result is re-sanitized so open elements are closed. Closing tags
    /// count against the limit, so the cut moves back until the sanitized
    /// markup is at most `max` characters.
    pub fn apply(&self, html: &str) -> Option<String> {
        let Self::MaxChars(max) = *self else {
            return None;
        };
        html.char_indices().nth(max)?;

        let mut budget = max;
        loop {
            let truncated = sanitize(cut(html, budget));
            let len = truncated.chars().count();
            if len <= max || budget == 0 {
                return Some(truncated);
            }
            budget = budget.saturating_sub(len - max);
        }
    }
}

/// The longest prefix of at most `chars` characters that ends outside a tag or entity.
fn cut(html: &str, chars: usize) -> &str {
    let Some((mut end, _)) = html.char_indices().nth(chars) else {
        return html;
    };
    if let Some(open) = html[..end].rfind('<')
        && !html[open..end].contains('>')
    {
        end = open;
    }
    if let Some(amp) = html[..end].rfind('&')
        && !html[amp..end].contains(';')
        && !html[amp..end].contains(char::is_whitespace)
    {
        end = amp;
    }
    &html[..end]
}

/// Knobs for a batch import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Overwrite posts whose slug already exists.
    pub force: bool,
    /// Run the whole pipeline but write nothing.
    pub dry_run: bool,
    pub content_limit: ContentLimit,
    /// Created before the batch starts when set (skipped for dry runs).
    pub media_dir: Option<PathBuf>,
}
