//! DOCX extractor: body paragraphs, then tables, as one text block.
//!
//! Output layout:
//!
//! ```text
//! First paragraph
//! Second paragraph
//!
//! [TABLE START]
//! Name | Qty
//! Apples | 3
//! [TABLE END]
//! ```
//!
//! Empty paragraphs are dropped, and so are empty cells within a row. A
//! table that holds no text at all is omitted.

use crate::error::ExtractionError;
use crate::output::ContentBlock;
use crate::pipeline::cleanup::clean_text;
use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};
use tracing::debug;

pub const TABLE_START: &str = "[TABLE START]";
pub const TABLE_END: &str = "[TABLE END]";

/// Extract a DOCX document into a single text block.
pub fn extract_docx(bytes: &[u8]) -> Result<Vec<ContentBlock>, ExtractionError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut paragraphs: Vec<String> = Vec::new();
    let mut tables: Vec<String> = Vec::new();

    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => {
                let text = paragraph_text(p);
                if !text.trim().is_empty() {
                    paragraphs.push(text);
                }
            }
            DocumentChild::Table(t) => {
                if let Some(rendered) = table_text(t) {
                    tables.push(rendered);
                }
            }
            _ => {}
        }
    }

    debug!(
        "DOCX: {} paragraphs, {} tables",
        paragraphs.len(),
        tables.len()
    );

    let mut sections = Vec::with_capacity(1 + tables.len());
    if !paragraphs.is_empty() {
        sections.push(paragraphs.join("\n"));
    }
    sections.extend(tables);

    let text = clean_text(&sections.join("\n\n"));
    if text.is_empty() {
        return Err(ExtractionError::NoExtractableText);
    }

    Ok(vec![ContentBlock::text(None, text)])
}

/// Concatenate the runs of a paragraph, hyperlinks included.
fn paragraph_text(p: &Paragraph) -> String {
    let mut text = String::new();
    for child in &p.children {
        match child {
            ParagraphChild::Run(r) => push_run(&mut text, &r.children),
            ParagraphChild::Hyperlink(h) => {
                for inner in &h.children {
                    if let ParagraphChild::Run(r) = inner {
                        push_run(&mut text, &r.children);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run(out: &mut String, children: &[RunChild]) {
    for run_child in children {
        match run_child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

/// Render a table between markers, one line per row. `None` when the table
/// has no text.
fn table_text(t: &Table) -> Option<String> {
    let mut lines = Vec::new();

    for row in &t.rows {
        let TableChild::TableRow(r) = row;
        let cells: Vec<String> = r
            .cells
            .iter()
            .map(|cell| {
                let TableRowChild::TableCell(c) = cell;
                let parts: Vec<String> = c
                    .children
                    .iter()
                    .filter_map(|content| match content {
                        TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                        _ => None,
                    })
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                parts.join(" ")
            })
            .filter(|s| !s.is_empty())
            .collect();

        if !cells.is_empty() {
            lines.push(cells.join(" | "));
        }
    }

    if lines.is_empty() {
        return None;
    }

    Some(format!("{TABLE_START}\n{}\n{TABLE_END}", lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Run, TableCell, TableRow};
    use std::io::Cursor;

    fn para(text: &str) -> Paragraph {
        Paragraph::new().add_run(Run::new().add_text(text))
    }

    fn cell(text: &str) -> TableCell {
        TableCell::new().add_paragraph(para(text))
    }

    fn pack(docx: Docx) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn paragraphs_then_table() {
        let bytes = pack(
            Docx::new()
                .add_paragraph(para("Hello"))
                .add_table(Table::new(vec![
                    TableRow::new(vec![cell("A1"), cell("B1")]),
                    TableRow::new(vec![cell("A2"), cell("B2")]),
                ]))
                .add_paragraph(para("After the table")),
        );

        let blocks = extract_docx(&bytes).unwrap();
        assert_eq!(blocks.len(), 1);
        let text = &blocks[0].as_text().unwrap().text;
        assert_eq!(blocks[0].source_page(), None);
        assert_eq!(
            text,
            "Hello\nAfter the table\n\n[TABLE START]\nA1 | B1\nA2 | B2\n[TABLE END]"
        );
    }

    #[test]
    fn empty_paragraphs_and_cells_are_dropped() {
        let bytes = pack(
            Docx::new()
                .add_paragraph(para("   "))
                .add_paragraph(para("Only line"))
                .add_table(Table::new(vec![
                    TableRow::new(vec![cell(""), cell("x"), cell("y")]),
                    TableRow::new(vec![cell(""), cell("")]),
                ])),
        );

        let text = extract_docx(&bytes).unwrap()[0].as_text().unwrap().text.clone();
        assert_eq!(text, "Only line\n\n[TABLE START]\nx | y\n[TABLE END]");
    }

    #[test]
    fn table_only_document() {
        let bytes = pack(Docx::new().add_table(Table::new(vec![TableRow::new(vec![
            cell("k"),
            cell("v"),
        ])])));
        let text = extract_docx(&bytes).unwrap()[0].as_text().unwrap().text.clone();
        assert_eq!(text, "[TABLE START]\nk | v\n[TABLE END]");
    }

    #[test]
    fn empty_document_has_no_text() {
        let bytes = pack(Docx::new().add_paragraph(Paragraph::new()));
        assert_eq!(
            extract_docx(&bytes).unwrap_err(),
            ExtractionError::NoExtractableText
        );
    }

    #[test]
    fn garbage_is_a_docx_error() {
        let err = extract_docx(b"PK\x03\x04 not really a zip").unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }
}
