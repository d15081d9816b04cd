use thiserror::Error;

pub const LEGACY_FORMAT_HINT: &str =
    "legacy .doc files are not supported, convert the file to .docx first";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unsupported document format: {hint}")]
    UnsupportedFormat { hint: &'static str },

    #[error("not a .docx package: {0}")]
    NotAPackage(#[from] zip::result::ZipError),

    #[error("document part missing: {0}")]
    MissingPart(&'static str),

    #[error("malformed document xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::events::attributes::AttrError> for DecodeError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.into())
    }
}

impl DecodeError {
    pub fn legacy_format() -> Self {
        Self::UnsupportedFormat {
            hint: LEGACY_FORMAT_HINT,
        }
    }
}
