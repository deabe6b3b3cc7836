mod classify;
mod error;
mod model;

pub mod config;
pub mod docx;
pub mod format;
pub mod gateway;
pub mod session;
pub mod worker;

pub use classify::{RunClass, classify, is_translatable};
pub use error::Error;
pub use model::{Document, Extraction, Paragraph, ParagraphRef, Run, RunKind};

use std::path::Path;

use format::Source;
use gateway::TranslationGateway;

/// Translates `input` into `output` in one blocking call, without the worker's
/// save-path negotiation.
pub fn translate_file(
    input: &Path,
    output: &Path,
    gateway: &dyn TranslationGateway,
    from_code: &str,
    to_code: &str,
) -> Result<(), Error> {
    if !input.is_file() {
        return Err(Error::InputNotFound(input.to_path_buf()));
    }
    if format::is_same_file(input, output) {
        return Err(Error::IoFailure("refusing to overwrite the input file".into()));
    }
    let mut source = Source::open(input)?;
    let extraction = source.extract()?;
    let translator = gateway::translator_for(gateway, from_code, to_code)?;
    let translated = translator.translate(&extraction.source_text)?;

    let bytes = source.render(&extraction, &translated)?;
    std::fs::write(output, bytes).map_err(Error::Io)
}
