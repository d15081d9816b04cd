use std::path::Path;
use tracing::debug;

use crate::document::{self, StructuredContent};
use crate::extractor::metadata::{MAX_TITLE_CHARS, truncate_with_ellipsis};
use crate::extractor::{self, ContentDocument, DescriptionRule};
use crate::import::ImportError;
use crate::render::{self, ImagePolicy, RenderOutput};

/// Turns the bytes of one source document into a post-ready document.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentConverter: Send + Sync {
    fn convert(
        &self,
        source: &Path,
        slug: &str,
        bytes: &[u8],
    ) -> Result<ContentDocument, ImportError>;
}

/// Decode, render, sanitize and extract metadata from a `.docx` file.
#[derive(Debug, Clone)]
pub struct DocxConverter {
    policy: ImagePolicy,
    description_rule: DescriptionRule,
    write_images: bool,
}

impl DocxConverter {
    pub fn new(policy: ImagePolicy, description_rule: DescriptionRule) -> Self {
        Self {
            policy,
            description_rule,
            write_images: true,
        }
    }

    /// Plan image files without writing them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.write_images = !dry_run;
        self
    }

    fn render(&self, content: &StructuredContent, slug: &str) -> Result<RenderOutput, ImportError> {
        let policy = self.policy.for_slug(slug);
        if self.write_images {
            Ok(render::render(content, &policy)?)
        } else {
            Ok(render::preview(content, &policy))
        }
    }
}

impl DocumentConverter for DocxConverter {
    fn convert(
        &self,
        source: &Path,
        slug: &str,
        bytes: &[u8],
    ) -> Result<ContentDocument, ImportError> {
        let content = document::decode(bytes)?;
        if !content.has_text() {
            return Err(ImportError::EmptyContent);
        }

        let rendered = self.render(&content, slug)?;
        let meta = extractor::extract(&rendered.html, self.description_rule);

        let mut warnings = rendered.warnings;
        let extracted_title = match meta.title {
            Some(title) => title,
            None => {
                let stem = source
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| slug.to_string());
                warnings.push(format!("no title found, using file name '{stem}'"));
                truncate_with_ellipsis(&stem, MAX_TITLE_CHARS)
            }
        };

        debug!(
            slug,
            images = rendered.assets.len(),
            reading_time = meta.reading_time_minutes,
            "converted document"
        );

        Ok(ContentDocument {
            source_path: source.to_path_buf(),
            slug: slug.to_string(),
            hero_image: rendered.assets.first().map(|asset| asset.url.clone()),
            image_assets: rendered.assets,
            raw_markup: rendered.html,
            sanitized_markup: meta.body,
            extracted_title,
            description: meta.description,
            reading_time_minutes: meta.reading_time_minutes,
            warnings,
        })
    }
}
