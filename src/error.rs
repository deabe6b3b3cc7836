use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    InputNotFound(PathBuf),
    UnsupportedFormat(String),
    NeedsConversion(String),
    EmptyContent,
    LanguagePackageMissing { from: String, to: String },
    TranslationUnavailable { from: String, to: String },
    NoPackageSelected,
    InvalidLanguagePair(String),
    IoFailure(String),
    Engine(String),
    Internal(String),
    Cancelled,
    InvalidDocx(String),
    Zip(zip::result::ZipError),
    Xml(roxmltree::Error),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputNotFound(path) => write!(f, "Input file not found: {}", path.display()),
            Error::UnsupportedFormat(ext) if ext.is_empty() => write!(f, "Unsupported file format"),
            Error::UnsupportedFormat(ext) => write!(f, "Unsupported file format: .{ext}"),
            Error::NeedsConversion(ext) => write!(
                f,
                "The .{ext} format is not fully supported. Please convert it to .docx and try again"
            ),
            Error::EmptyContent => write!(f, "No content found to translate"),
            Error::LanguagePackageMissing { from, to } => {
                write!(f, "Required language package not installed ({from} -> {to})")
            }
            Error::TranslationUnavailable { from, to } => {
                write!(f, "Translation between these languages not available ({from} -> {to})")
            }
            Error::NoPackageSelected => write!(f, "No translation package selected"),
            Error::InvalidLanguagePair(value) => {
                write!(f, "invalid language pair '{value}', expected <from>_<to>")
            }
            Error::IoFailure(msg) => write!(f, "Error during translation or saving: {msg}"),
            Error::Engine(msg) => write!(f, "translation engine failed: {msg}"),
            Error::Internal(msg) => write!(f, "internal error: {msg}"),
            Error::Cancelled => write!(f, "translation cancelled"),
            Error::InvalidDocx(reason) => write!(f, "not a valid DOCX file: {reason}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Xml(e) => write!(f, "XML error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
