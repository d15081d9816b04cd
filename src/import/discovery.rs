use std::fs;
use std::path::{Path, PathBuf};

use crate::import::ImportError;

/// Candidate files found in an input directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Discovered {
    /// `.docx` files, sorted by file name.
    pub supported: Vec<PathBuf>,
    /// Legacy `.doc` files, reported but never processed.
    pub unsupported: Vec<PathBuf>,
}

/// List `dir` (non-recursively) and partition files by extension.
pub fn discover(dir: &Path) -> Result<Discovered, ImportError> {
    let entries = fs::read_dir(dir).map_err(|err| {
        ImportError::FatalSetup(format!("cannot read data directory {}: {err}", dir.display()))
    })?;

    let mut found = Discovered::default();
    for entry in entries {
        let entry = entry.map_err(|err| {
            ImportError::FatalSetup(format!("cannot list data directory {}: {err}", dir.display()))
        })?;
        let path = entry.path();
        if !path.is_file() || is_hidden(&path) {
            continue;
        }
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("docx") => found.supported.push(path),
            Some("doc") => found.unsupported.push(path),
            _ => {}
        }
    }

    found.supported.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    found.unsupported.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(found)
}

/// Office lock files (`~$name.docx`) and dotfiles are never documents.
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') || name.starts_with("~$"))
}
