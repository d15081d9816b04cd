//! `.docx` decoding into a structured, renderer-friendly representation.

pub mod decoder;
pub mod errors;
pub mod model;
pub mod package;
pub mod styles;


pub use decoder::decode;
pub use errors::DecodeError;
pub use model::{Block, ImageBlob, Inline, RunStyle, StructuredContent};
pub use package::is_legacy_document;
