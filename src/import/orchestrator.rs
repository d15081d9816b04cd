use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::entities::PostFields;
use crate::health;
use crate::extractor::ContentDocument;
use crate::import::discovery::discover;
use crate::import::{
    DocumentConverter, DocumentOutcome, DocumentStatus, ImportError, ImportOptions, ImportReport,
};
use crate::render::ImageAsset;
use crate::repositories::{PostStore, UpdateResult};
use crate::slug::{MAX_SLUG_LENGTH, slug_or_fallback, truncate_slug};

/// Runs a batch import: one document at a time, each failure isolated to its file.
pub struct Importer {
    store: Arc<dyn PostStore>,
    converter: Box<dyn DocumentConverter>,
    options: ImportOptions,
}

impl Importer {
    pub fn new(
        store: Arc<dyn PostStore>,
        converter: Box<dyn DocumentConverter>,
        options: ImportOptions,
    ) -> Self {
        Self {
            store,
            converter,
            options,
        }
    }

    /// Import every `.docx` file in `data_dir`.
    ///
    /// Only setup problems (unreadable directory, unreachable storage,
    /// uncreatable media directory) are returned as errors.
    pub async fn run(&self, data_dir: &Path) -> Result<ImportReport, ImportError> {
        let found = discover(data_dir)?;
        info!(
            dir = %data_dir.display(),
            supported = found.supported.len(),
            unsupported = found.unsupported.len(),
            "discovered documents"
        );

        health::check_storage(self.store.as_ref()).await?;

        if !self.options.dry_run
            && let Some(media_dir) = &self.options.media_dir
        {
            fs::create_dir_all(media_dir).map_err(|err| {
                ImportError::FatalSetup(format!(
                    "cannot create media directory {}: {err}",
                    media_dir.display()
                ))
            })?;
        }

        for path in &found.unsupported {
            warn!(file = %path.display(), "legacy .doc file skipped, convert it to .docx first");
        }

        let mut report = ImportReport {
            outcomes: Vec::with_capacity(found.supported.len()),
            unsupported: found.unsupported,
        };
        for path in &found.supported {
            let outcome = self.import_file(path).await;
            info!("{outcome}");
            report.outcomes.push(outcome);
        }

        info!(summary = %report.summary(), "import finished");
        Ok(report)
    }

    /// Import a single file. Never fails; errors become a `Failed` outcome.
    #[instrument(skip_all, fields(file = %path.display()))]
    pub async fn import_file(&self, path: &Path) -> DocumentOutcome {
        let mut warnings = Vec::new();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut slug = slug_or_fallback(&file_name);
        if slug.len() > MAX_SLUG_LENGTH {
            slug = truncate_slug(&slug, MAX_SLUG_LENGTH);
            warnings.push(format!("slug truncated to {MAX_SLUG_LENGTH} characters"));
        }

        let status = match self.process(path, &slug, &mut warnings).await {
            Ok(status) => status,
            Err(err) => {
                warn!(slug = %slug, error = %err, "import failed");
                DocumentStatus::Failed {
                    error: err.to_string(),
                }
            }
        };

        DocumentOutcome {
            path: path.to_path_buf(),
            slug,
            status,
            warnings,
        }
    }

    async fn process(
        &self,
        path: &Path,
        slug: &str,
        warnings: &mut Vec<String>,
    ) -> Result<DocumentStatus, ImportError> {
        let existing = self.store.find_by_slug(slug).await?;
        if existing.is_some() && !self.options.force {
            return Ok(DocumentStatus::Skipped);
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ImportError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let mut document = self.converter.convert(path, slug, &bytes)?;
        warnings.append(&mut document.warnings);

        if let Some(truncated) = self.options.content_limit.apply(&document.sanitized_markup) {
            warnings.push(format!(
                "content truncated from {} to {} characters",
                document.sanitized_markup.chars().count(),
                truncated.chars().count()
            ));
            document.sanitized_markup = truncated;
            drop_truncated_images(&mut document, self.options.dry_run, warnings);
        }

        if self.options.dry_run {
            return Ok(if existing.is_some() {
                DocumentStatus::WouldUpdate
            } else {
                DocumentStatus::WouldCreate
            });
        }

        let status = match self.persist(slug, &document).await {
            Ok(status) => status,
            Err(err) => {
                discard_assets(&document.image_assets);
                return Err(err);
            }
        };
        if matches!(status, DocumentStatus::Skipped | DocumentStatus::Unchanged) {
            discard_assets(&document.image_assets);
        }
        Ok(status)
    }

    async fn persist(
        &self,
        slug: &str,
        document: &ContentDocument,
    ) -> Result<DocumentStatus, ImportError> {
        let fields = post_fields(document);

        // The slug may have been taken since the first lookup
        match self.store.find_by_slug(slug).await? {
            None => match self.store.create(&fields).await? {
                Some(_) => Ok(DocumentStatus::Created),
                None => Ok(DocumentStatus::Skipped),
            },
            Some(current) if self.options.force => {
                match self.store.update(current.id, &fields).await? {
                    UpdateResult::Updated(_) => Ok(DocumentStatus::Updated),
                    UpdateResult::Unchanged(_) => Ok(DocumentStatus::Unchanged),
                }
            }
            Some(_) => Ok(DocumentStatus::Skipped),
        }
    }
}

/// Forget images whose `<img>` was cut off by truncation, deleting their files.
fn drop_truncated_images(
    document: &mut ContentDocument,
    dry_run: bool,
    warnings: &mut Vec<String>,
) {
    let assets = std::mem::take(&mut document.image_assets);
    let (kept, dropped): (Vec<_>, Vec<_>) = assets
        .into_iter()
        .partition(|asset| document.sanitized_markup.contains(&asset.url));
    document.image_assets = kept;
    document.hero_image = document.image_assets.first().map(|asset| asset.url.clone());

    if dropped.is_empty() {
        return;
    }
    warnings.push(format!("{} image(s) dropped by truncation", dropped.len()));
    if !dry_run {
        discard_assets(&dropped);
    }
}

fn post_fields(document: &ContentDocument) -> PostFields {
    PostFields {
        slug: document.slug.clone(),
        title: document.extracted_title.clone(),
        content: document.sanitized_markup.clone(),
        description: document.description.clone(),
        keywords: None,
        hero_image: document.hero_image.clone(),
        reading_time_minutes: i32::try_from(document.reading_time_minutes).unwrap_or(i32::MAX),
    }
}

/// Remove image files that no stored post refers to.
fn discard_assets(assets: &[ImageAsset]) {
    for asset in assets {
        if let Err(err) = fs::remove_file(&asset.path) {
            warn!(path = %asset.path.display(), error = %err, "failed to remove unused image");
        }
    }
}
