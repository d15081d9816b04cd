use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

use crate::document::ImageBlob;
use crate::render::RenderError;

/// Where rendered images end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePolicy {
    /// Write each image to `destination_dir` and reference it under `public_base_url`.
    ExternalFile {
        destination_dir: PathBuf,
        public_base_url: String,
    },
    /// Embed each image as a base64 `data:` URI.
    InlineDataUri,
}

impl ImagePolicy {
    /// Scope an external-file policy to a per-post sub-directory.
    pub fn for_slug(&self, slug: &str) -> Self {
        match self {
            Self::ExternalFile {
                destination_dir,
                public_base_url,
            } => Self::ExternalFile {
                destination_dir: destination_dir.join(slug),
                public_base_url: join_url(public_base_url, slug),
            },
            Self::InlineDataUri => Self::InlineDataUri,
        }
    }
}

/// An image written to disk by the external-file policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub path: PathBuf,
    pub url: String,
}

pub fn extension_for(content_type: &str) -> String {
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let known = match normalized.as_str() {
        "image/png" => Some(".png"),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(".jpg"),
        "image/gif" => Some(".gif"),
        "image/webp" => Some(".webp"),
        "image/bmp" => Some(".bmp"),
        "image/tiff" => Some(".tiff"),
        "image/svg+xml" => Some(".svg"),
        _ => None,
    };
    if let Some(ext) = known {
        return ext.to_string();
    }
    if let Some(ext) = mime_guess::get_mime_extensions_str(&normalized).and_then(|exts| exts.first())
    {
        return format!(".{ext}");
    }
    sniff_extension(&normalized).to_string()
}

/// Last resort for unusual content types such as `image/x-png`.
fn sniff_extension(content_type: &str) -> &'static str {
    if content_type.contains("png") {
        ".png"
    } else if content_type.contains("jpeg") || content_type.contains("jpg") {
        ".jpg"
    } else if content_type.contains("gif") {
        ".gif"
    } else if content_type.contains("webp") {
        ".webp"
    } else {
        ".bin"
    }
}

pub fn data_uri(image: &ImageBlob) -> String {
    format!(
        "data:{};base64,{}",
        image.content_type,
        STANDARD.encode(&image.data)
    )
}

/// Choose a file name and public URL for an image without touching the disk.
pub fn plan_asset(image: &ImageBlob, destination_dir: &Path, public_base_url: &str) -> ImageAsset {
    let file_name = format!(
        "{}{}",
        Uuid::new_v4().simple(),
        extension_for(&image.content_type)
    );
    ImageAsset {
        path: destination_dir.join(&file_name),
        url: join_url(public_base_url, &file_name),
    }
}

/// Write an image once; an existing file at the same path is an error.
pub fn write_asset(image: &ImageBlob, asset: &ImageAsset) -> Result<(), RenderError> {
    if let Some(dir) = asset.path.parent() {
        fs::create_dir_all(dir).map_err(|source| RenderError::ImageWrite {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&asset.path)
        .map_err(|source| RenderError::ImageWrite {
            path: asset.path.clone(),
            source,
        })?;
    file.write_all(&image.data)
        .map_err(|source| RenderError::ImageWrite {
            path: asset.path.clone(),
            source,
        })
}

/// Write images in order, paired with their planned assets.
///
/// When one write fails the files already written for earlier images are
/// removed before the error is returned.
pub fn write_assets(images: &[ImageBlob], assets: &[ImageAsset]) -> Result<(), RenderError> {
    for (written, (image, asset)) in images.iter().zip(assets).enumerate() {
        if let Err(err) = write_asset(image, asset) {
            for asset in &assets[..written] {
                if let Err(remove_err) = fs::remove_file(&asset.path) {
                    warn!(path = %asset.path.display(), error = %remove_err, "failed to remove image");
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

fn join_url(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment)
}
