use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Created,
    Updated,
    /// Forced re-import produced identical content.
    Unchanged,
    /// Slug already exists and overwrite was not requested.
    Skipped,
    WouldCreate,
    WouldUpdate,
    Failed { error: String },
}

impl DocumentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Skipped => "skipped",
            Self::WouldCreate => "would create",
            Self::WouldUpdate => "would update",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub slug: String,
    #[serde(flatten)]
    pub status: DocumentStatus,
    pub warnings: Vec<String>,
}

impl fmt::Display for DocumentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        write!(f, "{:<12} {} ({})", self.status.label(), name, self.slug)?;
        if let DocumentStatus::Failed { error } = &self.status {
            write!(f, ": {error}")?;
        }
        for warning in &self.warnings {
            write!(f, "\n             warning: {warning}")?;
        }
        Ok(())
    }
}

/// Counts per status for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub would_create: usize,
    pub would_update: usize,
    pub failed: usize,
    pub unsupported: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created: {}, updated: {}, unchanged: {}, skipped: {}, failed: {}, unsupported: {}",
            self.created, self.updated, self.unchanged, self.skipped, self.failed, self.unsupported
        )?;
        if self.would_create + self.would_update > 0 {
            write!(
                f,
                ", would create: {}, would update: {}",
                self.would_create, self.would_update
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub outcomes: Vec<DocumentOutcome>,
    /// Legacy files that were listed but not processed.
    pub unsupported: Vec<PathBuf>,
}

impl ImportReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            unsupported: self.unsupported.len(),
            ..Summary::default()
        };
        for outcome in &self.outcomes {
            let counter = match outcome.status {
                DocumentStatus::Created => &mut summary.created,
                DocumentStatus::Updated => &mut summary.updated,
                DocumentStatus::Unchanged => &mut summary.unchanged,
                DocumentStatus::Skipped => &mut summary.skipped,
                DocumentStatus::WouldCreate => &mut summary.would_create,
                DocumentStatus::WouldUpdate => &mut summary.would_update,
                DocumentStatus::Failed { .. } => &mut summary.failed,
            };
            *counter += 1;
        }
        summary
    }

    pub fn outcome(&self, slug: &str) -> Option<&DocumentOutcome> {
        self.outcomes.iter().find(|o| o.slug == slug)
    }

    /// Pretty-printed JSON of the outcomes, unsupported files and summary.
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Json<'a> {
            #[serde(flatten)]
            report: &'a ImportReport,
            summary: Summary,
        }
        serde_json::to_string_pretty(&Json {
            report: self,
            summary: self.summary(),
        })
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for path in &self.unsupported {
            writeln!(
                f,
                "{:<12} {}: legacy .doc format, convert to .docx first",
                "unsupported",
                path.display()
            )?;
        }
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        write!(f, "summary: {}", self.summary())
    }
}
