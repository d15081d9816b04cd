//! Batch import of `.docx` files into blog posts.

pub mod converter;
pub mod discovery;
pub mod errors;
pub mod options;
pub mod orchestrator;
pub mod outcome;

#[cfg(test)]
mod tests;

pub use converter::{DocumentConverter, DocxConverter};
pub use discovery::{Discovered, discover};
pub use errors::ImportError;
pub use options::{ContentLimit, ImportOptions};
pub use orchestrator::Importer;
pub use outcome::{DocumentOutcome, DocumentStatus, ImportReport, Summary};

#[cfg(test)]
pub use converter::MockDocumentConverter;
