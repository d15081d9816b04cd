use std::path::PathBuf;
use thiserror::Error;

use crate::document::DecodeError;
use crate::render::RenderError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("unsupported format: {hint}")]
    UnsupportedFormat { hint: &'static str },

    #[error("document has no extractable text")]
    EmptyContent,

    #[error("decode failed: {0}")]
    Decode(DecodeError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage error: {0:#}")]
    Persistence(#[from] anyhow::Error),

    #[error("setup failed: {0}")]
    FatalSetup(String),
}

impl From<DecodeError> for ImportError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedFormat { hint } => Self::UnsupportedFormat { hint },
            other => Self::Decode(other),
        }
    }
}

impl ImportError {
    /// Only setup failures abort a batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalSetup(_))
    }
}
