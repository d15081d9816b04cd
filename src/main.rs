use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};
use quire::{
    config::{Config, LogFormat},
    extractor::DescriptionRule,
    import::{ContentLimit, DocxConverter, ImportOptions, Importer},
    render::ImagePolicy,
    repositories::PgPostRepository,
};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Images {
    /// Write image files under --media-dir and link them from --media-base-url
    External,
    /// Embed images as base64 data URIs
    Inline,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Description {
    /// First paragraph of at least 40 characters
    FirstParagraph,
    /// First 200 characters of body text
    LeadingText,
}

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Import .docx documents as blog posts")]
#[command(version)]
struct Cli {
    /// Overwrite posts whose slug already exists
    #[arg(long)]
    force: bool,

    /// Run the pipeline and report what would happen without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Directory containing the documents to import
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Public URL prefix for extracted images
    #[arg(long)]
    media_base_url: Option<String>,

    /// Directory extracted images are written to
    #[arg(long)]
    media_dir: Option<PathBuf>,

    /// Where extracted images go
    #[arg(long, value_enum, default_value = "external")]
    images: Images,

    /// How the post description is chosen
    #[arg(long, value_enum, default_value = "first-paragraph")]
    description: Description,

    /// Truncate stored content to this many characters
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    max_content_length: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config = config.with_database_url(url);
    }
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(dir) = cli.media_dir {
        config = config.with_media_dir(dir);
    }
    if let Some(url) = cli.media_base_url {
        config = config.with_media_base_url(url);
    }
    if cli.max_content_length.is_some() {
        config = config.with_max_content_length(cli.max_content_length);
    }

    init_tracing(config.log_format());

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy(config.database_url())
        .context("invalid database url")?;
    let store = Arc::new(PgPostRepository::new(pool));

    let (policy, media_dir) = match cli.images {
        Images::External => (
            ImagePolicy::ExternalFile {
                destination_dir: config.media_dir().to_path_buf(),
                public_base_url: config.media_base_url().to_string(),
            },
            Some(config.media_dir().to_path_buf()),
        ),
        Images::Inline => (ImagePolicy::InlineDataUri, None),
    };
    let rule = match cli.description {
        Description::FirstParagraph => DescriptionRule::default(),
        Description::LeadingText => DescriptionRule::LeadingText,
    };
    let converter = DocxConverter::new(policy, rule).dry_run(cli.dry_run);

    let options = ImportOptions {
        force: cli.force,
        dry_run: cli.dry_run,
        content_limit: config
            .max_content_length()
            .map_or(ContentLimit::Unlimited, ContentLimit::MaxChars),
        media_dir,
    };

    info!(
        data_dir = %config.data_dir().display(),
        force = cli.force,
        dry_run = cli.dry_run,
        "starting import"
    );
    let importer = Importer::new(store, Box::new(converter), options);
    let report = importer.run(config.data_dir()).await?;

    if cli.json {
        println!("{}", report.to_json().context("failed to serialize report")?);
    } else {
        println!("{report}");
    }
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
