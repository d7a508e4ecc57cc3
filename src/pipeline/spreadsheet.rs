//! XLSX extractor: the first sheet as a plain-text table.
//!
//! The rendering mirrors a dataframe printout, which is what downstream
//! readers of these blocks were tuned on:
//!
//! ```text
//!      name  qty  price
//! 0  apples    3    0.5
//! 1   pears  NaN   1.25
//! ```
//!
//! * The first row is the header; an empty header cell becomes `Unnamed: <col>`.
//! * A 0-based index column, left-aligned, numbers the data rows.
//! * Every other column is right-aligned to its widest cell, two spaces apart.
//! * Empty cells print as `NaN`; integral numbers print without a fraction.

use crate::error::ExtractionError;
use crate::output::ContentBlock;
use calamine::{Data, Range, Reader, Xlsx};
use std::io::Cursor;
use tracing::debug;

const COLUMN_GAP: &str = "  ";

/// Extract the first worksheet of an XLSX workbook into one text block.
pub fn extract_xlsx(bytes: &[u8]) -> Result<Vec<ContentBlock>, ExtractionError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let Some(first) = sheet_names.first() else {
        return Err(ExtractionError::EmptyWorkbook);
    };

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| ExtractionError::Spreadsheet(format!("sheet '{first}': {e}")))?;

    let (rows, cols) = range.get_size();
    debug!(
        "XLSX: {} sheets, first '{}' is {}x{}",
        sheet_names.len(),
        first,
        rows,
        cols
    );

    let text = if rows == 0 || cols == 0 {
        format!("Empty sheet: {first}")
    } else {
        render_table(&range)
    };

    Ok(vec![ContentBlock::text(None, text)])
}

fn render_table(range: &Range<Data>) -> String {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return String::new();
    };

    let header: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Data::Empty => format!("Unnamed: {i}"),
            other => format_cell(other),
        })
        .collect();

    let body: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(format_cell).collect())
        .collect();

    if body.is_empty() {
        return format!(
            "Empty DataFrame\nColumns: [{}]\nIndex: []",
            header.join(", ")
        );
    }

    let index_width = (body.len() - 1).to_string().len();
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(col, name)| {
            body.iter()
                .map(|r| r[col].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(body.len() + 1);

    let mut line = " ".repeat(index_width);
    for (name, width) in header.iter().zip(&widths) {
        line.push_str(COLUMN_GAP);
        line.push_str(&format!("{name:>width$}"));
    }
    lines.push(line);

    for (i, row) in body.iter().enumerate() {
        let mut line = format!("{i:<index_width$}");
        for (cell, width) in row.iter().zip(&widths) {
            line.push_str(COLUMN_GAP);
            line.push_str(&format!("{cell:>width$}"));
        }
        lines.push(line);
    }

    lines.join("\n")
}

fn format_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => "NaN".to_string(),
        Data::String(s) => s.replace(['\r', '\n'], " "),
        Data::Float(f) => format_float(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR: {e:?}"),
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Cells are `Some(text)` for inline strings, `Some("=1.5")`-style for
    /// numbers, `None` for gaps.
    fn xlsx(sheet_name: &str, rows: &[&[Option<&str>]]) -> Vec<u8> {
        let mut sheet = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (r, row) in rows.iter().enumerate() {
            sheet.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, cell) in row.iter().enumerate() {
                let col = (b'A' + c as u8) as char;
                let cell_ref = format!("{col}{}", r + 1);
                match cell {
                    None => {}
                    Some(v) if v.starts_with('=') => sheet.push_str(&format!(
                        r#"<c r="{cell_ref}"><v>{}</v></c>"#,
                        &v[1..]
                    )),
                    Some(v) => sheet.push_str(&format!(
                        r#"<c r="{cell_ref}" t="inlineStr"><is><t>{v}</t></is></c>"#
                    )),
                }
            }
            sheet.push_str("</row>");
        }
        sheet.push_str("</sheetData></worksheet>");
        workbook_zip(&[(sheet_name, sheet)])
    }

    fn workbook_zip(sheets: &[(&str, String)]) -> Vec<u8> {
        let mut sheet_entries = String::new();
        let mut rels = String::new();
        for (i, (name, _)) in sheets.iter().enumerate() {
            sheet_entries.push_str(&format!(
                r#"<sheet name="{name}" sheetId="{id}" r:id="rId{id}"/>"#,
                id = i + 1
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#,
                id = i + 1
            ));
        }

        let mut buf = Cursor::new(Vec::new());
        {
            let mut zw = zip::ZipWriter::new(&mut buf);
            let opts = SimpleFileOptions::default();
            let mut put = |name: &str, body: &str| {
                zw.start_file(name, opts).unwrap();
                zw.write_all(body.as_bytes()).unwrap();
            };
            put(
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#,
            );
            put(
                "xl/workbook.xml",
                &format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets></workbook>"#
                ),
            );
            put(
                "xl/_rels/workbook.xml.rels",
                &format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
                ),
            );
            for (i, (_, body)) in sheets.iter().enumerate() {
                put(&format!("xl/worksheets/sheet{}.xml", i + 1), body);
            }
            zw.finish().unwrap();
        }
        buf.into_inner()
    }

    fn only_text(blocks: Vec<ContentBlock>) -> String {
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].source_page(), None);
        blocks[0].as_text().unwrap().text.clone()
    }

    #[test]
    fn renders_like_a_dataframe() {
        let bytes = xlsx(
            "Stock",
            &[
                &[Some("name"), Some("qty"), Some("price")],
                &[Some("apples"), Some("=3"), Some("=0.5")],
                &[Some("pears"), None, Some("=1.25")],
            ],
        );
        let text = only_text(extract_xlsx(&bytes).unwrap());
        assert_eq!(
            text,
            "     name  qty  price\n0  apples    3    0.5\n1   pears  NaN   1.25"
        );
    }

    #[test]
    fn index_column_widens_past_ten_rows() {
        let mut rows: Vec<Vec<Option<&str>>> = vec![vec![Some("n")]];
        for _ in 0..11 {
            rows.push(vec![Some("=7")]);
        }
        let refs: Vec<&[Option<&str>]> = rows.iter().map(|r| r.as_slice()).collect();
        let text = only_text(extract_xlsx(&xlsx("S", &refs)).unwrap());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "    n");
        assert_eq!(lines[1], "0   7");
        assert_eq!(lines[11], "10  7");
    }

    #[test]
    fn blank_header_cell_is_unnamed() {
        let bytes = xlsx("S", &[&[Some("a"), None], &[Some("x"), Some("y")]]);
        let text = only_text(extract_xlsx(&bytes).unwrap());
        assert_eq!(text.lines().next().unwrap(), "   a  Unnamed: 1");
    }

    #[test]
    fn header_only_sheet() {
        let bytes = xlsx("S", &[&[Some("a"), Some("b")]]);
        let text = only_text(extract_xlsx(&bytes).unwrap());
        assert_eq!(text, "Empty DataFrame\nColumns: [a, b]\nIndex: []");
    }

    #[test]
    fn empty_first_sheet() {
        let bytes = xlsx("Blank", &[]);
        let text = only_text(extract_xlsx(&bytes).unwrap());
        assert_eq!(text, "Empty sheet: Blank");
    }

    #[test]
    fn only_first_sheet_is_rendered() {
        let first = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>first</t></is></c></row><row r="2"><c r="A2"><v>1</v></c></row></sheetData></worksheet>"#;
        let second = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>second</t></is></c></row></sheetData></worksheet>"#;
        let bytes = workbook_zip(&[("One", first.to_string()), ("Two", second.to_string())]);
        let text = only_text(extract_xlsx(&bytes).unwrap());
        assert!(text.contains("first"));
        assert!(!text.contains("second"));
    }

    #[test]
    fn workbook_without_sheets() {
        let bytes = workbook_zip(&[]);
        assert_eq!(extract_xlsx(&bytes).unwrap_err(), ExtractionError::EmptyWorkbook);
    }

    #[test]
    fn not_a_workbook() {
        let err = extract_xlsx(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ExtractionError::Spreadsheet(_)));
    }

    #[test]
    fn float_formatting() {
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(-12.0), "-12");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(f64::NAN), "NaN");
    }
}
