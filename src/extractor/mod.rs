pub mod cleaner;
pub mod metadata;
pub mod model;


pub use cleaner::sanitize;
pub use metadata::{DescriptionRule, ExtractedMetadata, extract_metadata};
pub use model::ContentDocument;

/// Sanitize rendered markup and pull the post metadata out of it.
///
/// The returned `body` is sanitized and no longer contains the title.
pub fn extract(raw_markup: &str, rule: DescriptionRule) -> ExtractedMetadata {
    // 1. Reduce to the allow-listed subset
    let clean = cleaner::sanitize(raw_markup);

    // 2. Title, description and reading time, with the title excised
    metadata::extract_metadata(&clean, rule)
}
