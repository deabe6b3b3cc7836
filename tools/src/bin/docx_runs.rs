//! Show how a DOCX is split into paragraphs and runs, and which runs would be
//! sent for translation.
//!
//! Usage:
//!   docx-runs <file.docx>             every paragraph with its runs
//!   docx-runs <file.docx> --extract   only the text handed to the engine

use docxside_translate::{Run, RunKind, docx, is_translatable};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage:");
        eprintln!("  docx-runs <file.docx>             list paragraphs and runs");
        eprintln!("  docx-runs <file.docx> --extract   print extracted source text");
        std::process::exit(1);
    }

    let doc = docx::parse(std::path::Path::new(&args[1])).unwrap_or_else(|e| {
        eprintln!("Cannot read '{}': {e}", args[1]);
        std::process::exit(1);
    });

    if args.get(2).map(String::as_str) == Some("--extract") {
        let extraction = docx::extract(&doc);
        for (line, para) in extraction.source_text.split('\n').zip(&extraction.paragraph_map) {
            println!("{:>4}  {line}", para.index);
        }
        return;
    }

    let mut translatable = 0;
    let mut preserved = 0;
    for (i, para) in doc.paragraphs.iter().enumerate() {
        println!("¶{i}");
        for run in &para.runs {
            let keep = is_translatable(run);
            if keep {
                translatable += 1;
            } else {
                preserved += 1;
            }
            println!("  {} {:<9} {:?}", if keep { "T" } else { "-" }, kind_label(run), run.text);
        }
    }
    println!();
    println!(
        "{} paragraphs, {translatable} translatable runs, {preserved} preserved",
        doc.paragraphs.len()
    );
}

fn kind_label(run: &Run) -> &'static str {
    match run.kind {
        RunKind::Text => "text",
        RunKind::Hyperlink => "hyperlink",
        RunKind::Field => "field",
        RunKind::Drawing => "drawing",
        RunKind::Picture => "picture",
        RunKind::Math => "math",
        RunKind::Note => "note",
        RunKind::Shape => "shape",
    }
}
