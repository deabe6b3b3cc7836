use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::classify::{self, MATH_NS, WML_NS};
use crate::error::Error;
use crate::model::{Document, Extraction, Paragraph, ParagraphRef, Run, RunSpan};

const DOCUMENT_PART: &str = "word/document.xml";

// Run-level elements of a paragraph.
const RUN_ELEMENTS: &[(&str, &str)] = &[
    (WML_NS, "r"),
    (WML_NS, "hyperlink"),
    (WML_NS, "fldSimple"),
    (MATH_NS, "oMath"),
    (MATH_NS, "oMathPara"),
];

// Wrappers whose runs belong to the enclosing paragraph.
const TRANSPARENT_CONTAINERS: &[&str] =
    &["ins", "smartTag", "customXml", "sdt", "sdtContent", "dir", "bdo"];

fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

fn is_run_element(node: roxmltree::Node) -> bool {
    let tag = node.tag_name();
    RUN_ELEMENTS
        .iter()
        .any(|(ns, name)| tag.namespace() == Some(*ns) && tag.name() == *name)
}

fn is_transparent(node: roxmltree::Node) -> bool {
    node.tag_name().namespace() == Some(WML_NS)
        && TRANSPARENT_CONTAINERS.contains(&node.tag_name().name())
}

pub fn parse(path: &Path) -> Result<Document, Error> {
    let archive = std::fs::read(path)?;
    Document::from_bytes(archive)
}

impl Document {
    pub fn from_bytes(archive: Vec<u8>) -> Result<Document, Error> {
        let mut xml = String::new();
        {
            let mut zip = ZipArchive::new(Cursor::new(archive.as_slice()))?;
            zip.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;
        }
        if let Some(stripped) = xml.strip_prefix('\u{feff}') {
            xml = stripped.to_string();
        }

        let paragraphs = {
            let tree = roxmltree::Document::parse(&xml)?;
            let body = wml(tree.root_element(), "body")
                .ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;
            read_paragraphs(body, &xml)
        };

        log::debug!("parsed {} paragraphs from {DOCUMENT_PART}", paragraphs.len());
        Ok(Document { paragraphs, xml, archive })
    }

    /// The main part with every rewritten run spliced in. Fails if a new text
    /// holds a character XML cannot represent.
    pub fn to_xml(&self) -> Result<String, Error> {
        let mut out = String::with_capacity(self.xml.len());
        let mut cursor = 0;
        for run in self.paragraphs.iter().flat_map(|p| &p.runs) {
            if !run.rewritten {
                continue;
            }
            let span = &run.span;
            out.push_str(&self.xml[cursor..span.head_end]);
            out.push_str(&run_content(span.prefix.as_deref(), &run.text)?);
            cursor = span.tail_start;
        }
        out.push_str(&self.xml[cursor..]);
        Ok(out)
    }

    /// Re-packs the archive: the main part is regenerated, every other entry is
    /// copied without recompression.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut source = ZipArchive::new(Cursor::new(self.archive.as_slice()))?;
        let xml = self.to_xml()?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..source.len() {
            let entry = source.by_index_raw(i)?;
            if entry.name() == DOCUMENT_PART {
                let name = entry.name().to_string();
                writer.start_file(name, options)?;
                writer.write_all(xml.as_bytes())?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

fn read_paragraphs(body: roxmltree::Node, xml: &str) -> Vec<Paragraph> {
    body.descendants()
        .filter(|n| is_wml(*n, "p"))
        .filter(|n| !n.ancestors().skip(1).any(|a| is_wml(a, "p")))
        .map(|p| {
            let mut runs = Vec::new();
            collect_runs(p, xml, &mut runs);
            Paragraph { runs }
        })
        .collect()
}

fn collect_runs(container: roxmltree::Node, xml: &str, runs: &mut Vec<Run>) {
    for child in container.children().filter(|n| n.is_element()) {
        if is_run_element(child) {
            runs.push(Run {
                text: rendered_text(child),
                kind: classify::structural_kind(child),
                span: locate(child, xml),
                rewritten: false,
            });
        } else if is_transparent(child) {
            collect_runs(child, xml, runs);
        }
    }
}

// Raw line breaks inside text nodes become spaces so a paragraph always
// extracts to one line.
fn push_flat(out: &mut String, text: &str) {
    out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
}

/// Text of a single `w:r`, looking only at its direct content like Word does.
fn run_text(run: roxmltree::Node, out: &mut String) {
    for child in run.children().filter(|n| n.is_element()) {
        if is_wml(child, "t") {
            push_flat(out, child.text().unwrap_or_default());
        } else if is_wml(child, "tab") {
            out.push('\t');
        } else if is_wml(child, "br") || is_wml(child, "cr") {
            out.push(' ');
        }
    }
}

fn rendered_text(node: roxmltree::Node) -> String {
    let mut text = String::new();
    if is_wml(node, "r") {
        run_text(node, &mut text);
    } else if node.tag_name().namespace() == Some(MATH_NS) {
        for t in node
            .descendants()
            .filter(|n| n.tag_name().name() == "t" && n.tag_name().namespace() == Some(MATH_NS))
        {
            push_flat(&mut text, t.text().unwrap_or_default());
        }
    } else {
        for r in node.descendants().filter(|n| is_wml(*n, "r")) {
            run_text(r, &mut text);
        }
    }
    text
}

fn start_tag_end(xml: &str, from: usize) -> usize {
    let mut quote = None;
    for (i, b) in xml.as_bytes()[from..].iter().enumerate() {
        match (quote, *b) {
            (None, b'"' | b'\'') => quote = Some(*b),
            (Some(q), c) if c == q => quote = None,
            (None, b'>') => return from + i + 1,
            _ => {}
        }
    }
    xml.len()
}

fn locate(node: roxmltree::Node, xml: &str) -> RunSpan {
    let range = node.range();
    let head = start_tag_end(xml, range.start);
    let self_closing = head >= 2 && xml.as_bytes()[head - 2] == b'/';

    let head_end = wml(node, "rPr").map(|rpr| rpr.range().end).unwrap_or(head);
    let tail_start = if self_closing {
        range.end
    } else {
        xml[range.clone()]
            .rfind("</")
            .map(|i| range.start + i)
            .unwrap_or(range.end)
    };

    let qname = xml[range.start + 1..head]
        .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .next()
        .unwrap_or_default();
    let prefix = qname.split_once(':').map(|(p, _)| p.to_string());

    RunSpan { head_end, tail_start, prefix }
}

// XML 1.0 `Char`: no C0 controls besides tab, LF and CR, and no U+FFFE/U+FFFF.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{fffe}' && c != '\u{ffff}')
}

fn escape_text(text: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c if !is_xml_char(c) => {
                return Err(Error::InvalidDocx(format!(
                    "character U+{:04X} cannot be written to XML",
                    c as u32
                )));
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

fn run_content(prefix: Option<&str>, text: &str) -> Result<String, Error> {
    let qualify = |local: &str| match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    };
    let (t, tab) = (qualify("t"), qualify("tab"));

    let mut out = String::new();
    for (i, segment) in text.split('\t').enumerate() {
        if i > 0 {
            out.push_str(&format!("<{tab}/>"));
        }
        if !segment.is_empty() {
            out.push_str(&format!(
                "<{t} xml:space=\"preserve\">{}</{t}>",
                escape_text(segment)?
            ));
        }
    }
    Ok(out)
}

/// One line per paragraph that holds at least one translatable run. The line is
/// the whole paragraph text, preserved runs included.
pub fn extract(doc: &Document) -> Extraction {
    let mut lines = Vec::new();
    let mut paragraph_map = Vec::new();

    for (index, para) in doc.paragraphs.iter().enumerate() {
        if para.runs.iter().any(classify::is_translatable) {
            paragraph_map.push(ParagraphRef { index });
            lines.push(para.text());
        }
    }

    Extraction { source_text: lines.join("\n"), paragraph_map }
}

/// Writes translated lines back into the paragraphs they were extracted from and
/// returns how many paragraphs changed. Surplus lines or paragraphs are ignored.
pub fn apply_translation(doc: &mut Document, map: &[ParagraphRef], translated: &str) -> usize {
    let lines: Vec<&str> = translated
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    if lines.len() != map.len() {
        log::warn!(
            "translation has {} lines for {} paragraphs; unmatched paragraphs stay untranslated",
            lines.len(),
            map.len()
        );
    }

    let mut changed = 0;
    for (para_ref, line) in map.iter().zip(lines) {
        let Some(para) = doc.paragraphs.get_mut(para_ref.index) else {
            continue;
        };
        if para.runs.is_empty() || line.is_empty() {
            continue;
        }

        let translatable: Vec<usize> = para
            .runs
            .iter()
            .enumerate()
            .filter(|(_, run)| classify::is_translatable(run))
            .map(|(i, _)| i)
            .collect();
        let Some(&first) = translatable.first() else {
            log::debug!("paragraph {} has no translatable runs", para_ref.index);
            continue;
        };

        for &i in &translatable {
            para.runs[i].set_text(String::new());
        }
        para.runs[first].set_text(line.to_string());
        changed += 1;
    }
    changed
}

pub fn reinject(doc: &mut Document, map: &[ParagraphRef], translated: &str) -> Result<Vec<u8>, Error> {
    let changed = apply_translation(doc, map, translated);
    log::debug!("rewrote {changed} of {} paragraphs", doc.paragraphs.len());
    doc.to_bytes()
}
