use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::document::tests::DocxBuilder;
use crate::entities::Post;
use crate::extractor::{ContentDocument, DescriptionRule};
use crate::import::{
    ContentLimit, DocumentStatus, DocxConverter, ImportError, ImportOptions, Importer,
    MockDocumentConverter,
};
use crate::render::{ImageAsset, ImagePolicy};
use crate::repositories::{InMemoryPostStore, MockPostStore, PostStore};

const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg";

fn existing_post(slug: &str) -> Post {
    Post {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        title: "Existing".to_string(),
        content: "<p>stored</p>".to_string(),
        description: None,
        keywords: None,
        hero_image: None,
        reading_time_minutes: 1,
        content_checksum: "0".repeat(32),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn converted(path: &Path, slug: &str, body: &str) -> ContentDocument {
    ContentDocument {
        source_path: path.to_path_buf(),
        slug: slug.to_string(),
        raw_markup: format!("<h1>Title</h1>\n{body}"),
        sanitized_markup: body.to_string(),
        extracted_title: "Title".to_string(),
        description: None,
        reading_time_minutes: 1,
        image_assets: vec![],
        hero_image: None,
        warnings: vec![],
    }
}

fn write_files(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), b"not parsed by mocks").unwrap();
    }
}

fn external_policy(media: &Path) -> ImagePolicy {
    ImagePolicy::ExternalFile {
        destination_dir: media.to_path_buf(),
        public_base_url: "/media/articles".to_string(),
    }
}

fn article() -> Vec<u8> {
    DocxBuilder::new()
        .styled("Heading1", "Тур в горы")
        .paragraph("Первый день похода начинается рано утром у подножия хребта.")
        .image("rId7", "image1.jpeg", JPEG)
        .build()
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => vec![],
    }
}

#[tokio::test]
async fn test_existing_slug_is_skipped_without_parsing() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["Тур в горы.docx"]);

    let mut store = MockPostStore::new();
    store.expect_ping().times(1).returning(|| Ok(()));
    store
        .expect_find_by_slug()
        .withf(|slug| slug == "tur-v-gory")
        .times(1)
        .returning(|slug| Ok(Some(existing_post(slug))));
    store.expect_create().times(0);
    store.expect_update().times(0);

    let mut converter = MockDocumentConverter::new();
    converter.expect_convert().times(0);

    let importer = Importer::new(
        Arc::new(store),
        Box::new(converter),
        ImportOptions::default(),
    );
    let report = importer.run(dir.path()).await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].slug, "tur-v-gory");
    assert_eq!(report.outcomes[0].status, DocumentStatus::Skipped);
    assert_eq!(report.summary().skipped, 1);
}

#[tokio::test]
async fn test_failures_are_isolated_per_document() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["a.docx", "b.docx", "c.docx", "legacy.doc"]);

    let mut converter = MockDocumentConverter::new();
    converter
        .expect_convert()
        .times(3)
        .returning(|path, slug, _| match slug {
            "b" => Err(ImportError::EmptyContent),
            _ => Ok(converted(path, slug, "<p>body</p>")),
        });

    let store = Arc::new(InMemoryPostStore::new());
    let importer = Importer::new(store.clone(), Box::new(converter), ImportOptions::default());
    let report = importer.run(dir.path()).await.unwrap();

    let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status.label()).collect();
    assert_eq!(statuses, vec!["created", "failed", "created"]);
    assert_eq!(
        report.outcome("b").unwrap().status,
        DocumentStatus::Failed {
            error: "document has no extractable text".to_string()
        }
    );
    assert_eq!(report.unsupported, vec![dir.path().join("legacy.doc")]);
    assert_eq!(store.len(), 2);

    let summary = report.summary();
    assert_eq!((summary.created, summary.failed, summary.unsupported), (2, 1, 1));
}

#[tokio::test]
async fn test_unreachable_storage_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["a.docx"]);

    let mut store = MockPostStore::new();
    store
        .expect_ping()
        .returning(|| Err(anyhow::anyhow!("connection refused")));
    store.expect_find_by_slug().times(0);
    let mut converter = MockDocumentConverter::new();
    converter.expect_convert().times(0);

    let importer = Importer::new(
        Arc::new(store),
        Box::new(converter),
        ImportOptions::default(),
    );
    let err = importer.run(dir.path()).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_missing_data_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let importer = Importer::new(
        Arc::new(InMemoryPostStore::new()),
        Box::new(MockDocumentConverter::new()),
        ImportOptions::default(),
    );
    let err = importer.run(&dir.path().join("nope")).await.unwrap_err();
    assert!(matches!(err, ImportError::FatalSetup(_)));
}

#[tokio::test]
async fn test_content_limit_truncates_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["long.docx"]);

    let mut converter = MockDocumentConverter::new();
    converter
        .expect_convert()
        .returning(|path, slug, _| Ok(converted(path, slug, &format!("<p>{}</p>", "x".repeat(100)))));

    let store = Arc::new(InMemoryPostStore::new());
    let options = ImportOptions {
        content_limit: ContentLimit::MaxChars(20),
        ..ImportOptions::default()
    };
    let importer = Importer::new(store.clone(), Box::new(converter), options);
    let report = importer.run(dir.path()).await.unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, DocumentStatus::Created);
    assert!(outcome.warnings.iter().any(|w| w.contains("truncated")));
    let post = store.find_by_slug("long").await.unwrap().unwrap();
    assert_eq!(post.content, format!("<p>{}</p>", "x".repeat(13)));
    assert!(post.content.chars().count() <= 20);
}

#[tokio::test]
async fn test_truncation_drops_images_it_cuts_off() {
    let dir = tempfile::tempdir().unwrap();
    let media = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["gallery.docx"]);

    let kept = media.path().join("a.jpg");
    let cut = media.path().join("b.jpg");
    fs::write(&kept, JPEG).unwrap();
    fs::write(&cut, JPEG).unwrap();

    let assets = vec![
        ImageAsset {
            path: cut.clone(),
            url: "/m/b.jpg".to_string(),
        },
        ImageAsset {
            path: kept.clone(),
            url: "/m/a.jpg".to_string(),
        },
    ];
    let mut converter = MockDocumentConverter::new();
    converter.expect_convert().returning(move |path, slug, _| {
        let body = format!(
            r#"<p><img src="/m/a.jpg"></p><p>{}</p><p><img src="/m/b.jpg"></p>"#,
            "x".repeat(100)
        );
        let mut document = converted(path, slug, &body);
        document.hero_image = Some("/m/b.jpg".to_string());
        document.image_assets = assets.clone();
        Ok(document)
    });

    let store = Arc::new(InMemoryPostStore::new());
    let options = ImportOptions {
        content_limit: ContentLimit::MaxChars(60),
        ..ImportOptions::default()
    };
    let importer = Importer::new(store.clone(), Box::new(converter), options);
    let report = importer.run(dir.path()).await.unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, DocumentStatus::Created);
    assert!(outcome.warnings.iter().any(|w| w.contains("1 image(s) dropped")));

    let post = store.find_by_slug("gallery").await.unwrap().unwrap();
    assert!(post.content.chars().count() <= 60);
    assert!(post.content.contains("/m/a.jpg"));
    assert!(!post.content.contains("/m/b.jpg"));
    assert_eq!(post.hero_image.as_deref(), Some("/m/a.jpg"));
    assert!(kept.exists());
    assert!(!cut.exists());
}

#[tokio::test]
async fn test_docx_import_writes_images_and_excises_title() {
    let dir = tempfile::tempdir().unwrap();
    let media = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Тур в горы.docx"), article()).unwrap();

    let store = Arc::new(InMemoryPostStore::new());
    let converter = DocxConverter::new(external_policy(media.path()), DescriptionRule::default());
    let options = ImportOptions {
        media_dir: Some(media.path().to_path_buf()),
        ..ImportOptions::default()
    };
    let importer = Importer::new(store.clone(), Box::new(converter), options);
    let report = importer.run(dir.path()).await.unwrap();
    assert_eq!(report.outcomes[0].status, DocumentStatus::Created);

    let images = files_in(&media.path().join("tur-v-gory"));
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].extension().unwrap(), "jpg");
    let file_name = images[0].file_name().unwrap().to_str().unwrap();

    let post = store.find_by_slug("tur-v-gory").await.unwrap().unwrap();
    assert_eq!(post.title, "Тур в горы");
    assert!(!post.content.contains("Тур в горы"));
    assert_eq!(post.content.matches("<img").count(), 1);
    let url = format!("/media/articles/tur-v-gory/{file_name}");
    assert!(post.content.contains(&url));
    assert_eq!(post.hero_image.as_deref(), Some(url.as_str()));
    assert_eq!(
        post.description.as_deref(),
        Some("Первый день похода начинается рано утром у подножия хребта.")
    );
    assert_eq!(post.reading_time_minutes, 1);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let media = tempfile::tempdir().unwrap();
    let media_dir = media.path().join("articles");
    fs::write(dir.path().join("Тур в горы.docx"), article()).unwrap();
    fs::write(dir.path().join("existing.docx"), article()).unwrap();

    let store = Arc::new(InMemoryPostStore::new());
    store
        .create(&crate::entities::PostFields {
            slug: "existing".to_string(),
            title: "Existing".to_string(),
            content: "<p>stored</p>".to_string(),
            description: None,
            keywords: None,
            hero_image: None,
            reading_time_minutes: 1,
        })
        .await
        .unwrap();

    let converter = DocxConverter::new(external_policy(&media_dir), DescriptionRule::default())
        .dry_run(true);
    let options = ImportOptions {
        force: true,
        dry_run: true,
        media_dir: Some(media_dir.clone()),
        ..ImportOptions::default()
    };
    let importer = Importer::new(store.clone(), Box::new(converter), options);
    let report = importer.run(dir.path()).await.unwrap();

    assert_eq!(
        report.outcome("tur-v-gory").unwrap().status,
        DocumentStatus::WouldCreate
    );
    assert_eq!(
        report.outcome("existing").unwrap().status,
        DocumentStatus::WouldUpdate
    );
    assert_eq!(store.len(), 1);
    assert!(!media_dir.exists());
}

#[tokio::test]
async fn test_forced_reimport_of_identical_text_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = DocxBuilder::new()
        .styled("Heading1", "Заметка")
        .paragraph("Короткий текст без картинок.")
        .build();
    fs::write(dir.path().join("note.docx"), bytes).unwrap();

    let store = Arc::new(InMemoryPostStore::new());
    let run = |force: bool| {
        let store = store.clone();
        let dir = dir.path().to_path_buf();
        async move {
            let converter =
                DocxConverter::new(ImagePolicy::InlineDataUri, DescriptionRule::LeadingText);
            let options = ImportOptions {
                force,
                ..ImportOptions::default()
            };
            Importer::new(store, Box::new(converter), options)
                .run(&dir)
                .await
                .unwrap()
        }
    };

    assert_eq!(run(false).await.outcomes[0].status, DocumentStatus::Created);
    let first = store.find_by_slug("note").await.unwrap().unwrap();

    assert_eq!(run(false).await.outcomes[0].status, DocumentStatus::Skipped);
    assert_eq!(run(true).await.outcomes[0].status, DocumentStatus::Unchanged);
    assert_eq!(store.find_by_slug("note").await.unwrap().unwrap(), first);
}

#[tokio::test]
async fn test_image_only_document_fails_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let media = tempfile::tempdir().unwrap();
    let bytes = DocxBuilder::new().image("rId1", "only.png", b"\x89PNG").build();
    fs::write(dir.path().join("photos.docx"), bytes).unwrap();

    let converter = DocxConverter::new(external_policy(media.path()), DescriptionRule::default());
    let importer = Importer::new(
        Arc::new(InMemoryPostStore::new()),
        Box::new(converter),
        ImportOptions::default(),
    );
    let report = importer.run(dir.path()).await.unwrap();

    assert!(matches!(
        report.outcomes[0].status,
        DocumentStatus::Failed { .. }
    ));
    assert!(files_in(&media.path().join("photos")).is_empty());
}

#[tokio::test]
async fn test_legacy_bytes_with_docx_extension_fail() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    bytes.extend_from_slice(&[0; 64]);
    fs::write(dir.path().join("renamed.docx"), bytes).unwrap();

    let converter = DocxConverter::new(ImagePolicy::InlineDataUri, DescriptionRule::default());
    let importer = Importer::new(
        Arc::new(InMemoryPostStore::new()),
        Box::new(converter),
        ImportOptions::default(),
    );
    let report = importer.run(dir.path()).await.unwrap();

    let DocumentStatus::Failed { error } = &report.outcomes[0].status else {
        panic!("expected failure");
    };
    assert!(error.contains("convert the file to .docx"));
}
