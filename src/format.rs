use std::path::Path;

use crate::docx;
use crate::error::Error;
use crate::model::{Document, Extraction};

/// Input formats by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Docx,
    Pdf,
    Epub,
    Legacy, // .doc, .odt, .rtf
    Unknown,
}

pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match extension(path).as_str() {
            "txt" => DocumentFormat::Text,
            "docx" => DocumentFormat::Docx,
            "pdf" => DocumentFormat::Pdf,
            "epub" => DocumentFormat::Epub,
            "doc" | "odt" | "rtf" => DocumentFormat::Legacy,
            _ => DocumentFormat::Unknown,
        }
    }

    /// Whether a file picker should offer this file at all.
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            DocumentFormat::Text | DocumentFormat::Docx | DocumentFormat::Pdf | DocumentFormat::Epub
        )
    }

    pub fn needs_conversion(self) -> bool {
        self == DocumentFormat::Legacy
    }
}

/// `{basename}_translated_{to}{ext}`, the name offered when asking where to save.
pub fn default_output_name(input: &Path, to_code: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = extension(input);
    if ext.is_empty() {
        format!("{stem}_translated_{to_code}")
    } else {
        format!("{stem}_translated_{to_code}.{ext}")
    }
}

pub(crate) fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// A loaded input, one variant per supported format.
pub enum Source {
    Text(String),
    Docx(Document),
}

impl Source {
    /// Loads `path` according to its extension. Unreadable files come back as
    /// empty content, so they surface as `EmptyContent` during extraction.
    pub fn open(path: &Path) -> Result<Source, Error> {
        match DocumentFormat::from_path(path) {
            DocumentFormat::Text => Ok(Source::Text(std::fs::read_to_string(path).unwrap_or_else(|e| {
                log::warn!("error reading {}: {e}", path.display());
                String::new()
            }))),
            DocumentFormat::Docx => match docx::parse(path) {
                Ok(doc) => Ok(Source::Docx(doc)),
                Err(e) => {
                    log::warn!("error reading {}: {e}", path.display());
                    Ok(Source::Text(String::new()))
                }
            },
            DocumentFormat::Legacy => Err(Error::NeedsConversion(extension(path))),
            DocumentFormat::Pdf | DocumentFormat::Epub | DocumentFormat::Unknown => {
                Err(Error::UnsupportedFormat(extension(path)))
            }
        }
    }

    pub fn extract(&self) -> Result<Extraction, Error> {
        let extraction = match self {
            Source::Text(content) => Extraction {
                source_text: content.clone(),
                paragraph_map: Vec::new(),
            },
            Source::Docx(doc) => docx::extract(doc),
        };
        if extraction.source_text.is_empty() {
            return Err(Error::EmptyContent);
        }
        Ok(extraction)
    }

    /// Output bytes for `translated`. Plain text is written verbatim.
    pub fn render(&mut self, extraction: &Extraction, translated: &str) -> Result<Vec<u8>, Error> {
        match self {
            Source::Text(_) => Ok(translated.as_bytes().to_vec()),
            Source::Docx(doc) => docx::reinject(doc, &extraction.paragraph_map, translated),
        }
    }
}
