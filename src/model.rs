#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunKind {
    Text,
    Hyperlink,
    Field,
    Drawing,
    Picture,
    Math,
    Note, // footnote or endnote reference
    Shape,
}

/// A loaded DOCX main part. Runs remember where they came from in `xml` so a
/// rewrite only touches the runs whose text changed.
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
    pub(crate) xml: String,
    pub(crate) archive: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

#[derive(Clone, Debug)]
pub struct Run {
    pub text: String,
    pub kind: RunKind,
    pub(crate) span: RunSpan,
    pub(crate) rewritten: bool,
}

/// Byte offsets of a run element inside the original part.
#[derive(Clone, Debug)]
pub(crate) struct RunSpan {
    pub head_end: usize,  // end of start tag, or of w:rPr when present
    pub tail_start: usize, // start of end tag
    pub prefix: Option<String>,
}

/// Position of a translatable paragraph in `Document::paragraphs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParagraphRef {
    pub index: usize,
}

/// Result of extraction: one source line per entry of `paragraph_map`
/// (plain text carries an empty map).
#[derive(Clone, Debug, Default)]
pub struct Extraction {
    pub source_text: String,
    pub paragraph_map: Vec<ParagraphRef>,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

impl Run {
    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
        self.rewritten = true;
    }
}
