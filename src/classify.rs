//! Decides which runs carry translatable prose and which must survive untouched.
//!
//! Extraction and reinjection both go through [`classify`]; if they ever
//! disagreed, translated lines would land in the wrong runs.

use crate::model::{Run, RunKind};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const MATH_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";
pub(crate) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunClass {
    Translatable,
    Preserved,
}

struct Marker {
    ns: &'static str,
    prefix: &'static str,
    kind: RunKind,
}

const fn marker(ns: &'static str, prefix: &'static str, kind: RunKind) -> Marker {
    Marker { ns, prefix, kind }
}

// Local-name prefixes: `footnote` also catches footnoteReference, `oMath` catches oMathPara.
const MARKERS: &[Marker] = &[
    marker(WML_NS, "hyperlink", RunKind::Hyperlink),
    marker(WML_NS, "instrText", RunKind::Field),
    marker(WML_NS, "fldChar", RunKind::Field),
    marker(WML_NS, "fldSimple", RunKind::Field),
    marker(WML_NS, "drawing", RunKind::Drawing),
    marker(WML_NS, "pict", RunKind::Picture),
    marker(MATH_NS, "oMath", RunKind::Math),
    marker(WML_NS, "footnote", RunKind::Note),
    marker(WML_NS, "endnote", RunKind::Note),
    marker(MATH_NS, "sup", RunKind::Math),
    marker(MATH_NS, "sub", RunKind::Math),
    marker(MATH_NS, "frac", RunKind::Math),
    marker(MATH_NS, "msup", RunKind::Math),
    marker(DML_NS, "blip", RunKind::Shape),
    marker(DML_NS, "shape", RunKind::Shape),
    marker(DML_NS, "groupShape", RunKind::Shape),
    marker(DML_NS, "line", RunKind::Shape),
];

fn marker_kind(node: roxmltree::Node) -> Option<RunKind> {
    let tag = node.tag_name();
    let ns = tag.namespace()?;
    MARKERS
        .iter()
        .find(|m| m.ns == ns && tag.name().starts_with(m.prefix))
        .map(|m| m.kind)
}

/// Structural kind of a run element, taken from the first marker found in its
/// subtree (the element itself included).
pub(crate) fn structural_kind(run: roxmltree::Node) -> RunKind {
    run.descendants()
        .filter(|n| n.is_element())
        .find_map(marker_kind)
        .unwrap_or(RunKind::Text)
}

pub fn classify(run: &Run) -> RunClass {
    if run.kind == RunKind::Text && !run.text.trim().is_empty() {
        RunClass::Translatable
    } else {
        RunClass::Preserved
    }
}

pub fn is_translatable(run: &Run) -> bool {
    classify(run) == RunClass::Translatable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(run_xml: &str) -> RunKind {
        let xml = format!(
            r#"<w:p xmlns:w="{WML_NS}" xmlns:m="{MATH_NS}" xmlns:a="{DML_NS}">{run_xml}</w:p>"#
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let run = doc.root_element().first_element_child().unwrap();
        structural_kind(run)
    }

    #[test]
    fn plain_run_is_text() {
        assert_eq!(kind_of("<w:r><w:rPr><w:b/></w:rPr><w:t>Hi</w:t></w:r>"), RunKind::Text);
    }

    #[test]
    fn markers_map_to_kinds() {
        let cases = [
            (r#"<w:hyperlink><w:r><w:t>x</w:t></w:r></w:hyperlink>"#, RunKind::Hyperlink),
            ("<w:r><w:instrText> PAGE </w:instrText></w:r>", RunKind::Field),
            (r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>"#, RunKind::Field),
            ("<w:r><w:drawing/></w:r>", RunKind::Drawing),
            ("<w:r><w:pict/></w:r>", RunKind::Picture),
            ("<m:oMath><m:r><m:t>x</m:t></m:r></m:oMath>", RunKind::Math),
            (r#"<w:r><w:footnoteReference w:id="1"/></w:r>"#, RunKind::Note),
            (r#"<w:r><w:endnoteReference w:id="2"/></w:r>"#, RunKind::Note),
            ("<w:r><a:blip/></w:r>", RunKind::Shape),
            ("<w:r><a:shape/></w:r>", RunKind::Shape),
            ("<w:r><a:groupShape/></w:r>", RunKind::Shape),
            ("<w:r><a:line/></w:r>", RunKind::Shape),
            ("<w:r><m:sup/></w:r>", RunKind::Math),
            ("<w:r><m:sub/></w:r>", RunKind::Math),
            ("<w:r><m:frac/></w:r>", RunKind::Math),
            ("<w:r><m:msup/></w:r>", RunKind::Math),
            (r#"<w:fldSimple w:instr=" PAGE "><w:r><w:t>1</w:t></w:r></w:fldSimple>"#, RunKind::Field),
        ];
        for (xml, expected) in cases {
            assert_eq!(kind_of(xml), expected, "{xml}");
        }
    }

    #[test]
    fn whitespace_text_is_preserved() {
        let run = Run {
            text: "  \t".into(),
            kind: RunKind::Text,
            span: crate::model::RunSpan { head_end: 0, tail_start: 0, prefix: None },
            rewritten: false,
        };
        assert_eq!(classify(&run), RunClass::Preserved);
    }
}
