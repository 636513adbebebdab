//! Structured-document text: DOCX paragraphs and XLSX tables.
//!
//! Neither path involves OCR, so the result does not depend on the chosen
//! engine. Both are deterministic: the same bytes always yield the same
//! text.

use crate::error::ExtractionError;
use calamine::{Data, Reader, Xlsx};
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use std::io::Cursor;
use tracing::debug;

// ── DOCX ─────────────────────────────────────────────────────────────────

/// Text of every top-level body paragraph, in document order.
///
/// Empty paragraphs are kept (as empty strings) so blank lines survive.
/// Tables and other non-paragraph body elements are skipped.
pub fn docx_paragraphs(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractionError::DocumentParse {
        kind: "DOCX".into(),
        detail: e.to_string(),
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
            _ => None,
        })
        .collect();

    debug!("DOCX: {} paragraphs", paragraphs.len());
    Ok(paragraphs)
}

/// Text of one paragraph: runs concatenated, tabs and breaks preserved.
fn paragraph_text(p: &docx_rs::Paragraph) -> String {
    let mut text = String::new();

    for child in &p.children {
        match child {
            ParagraphChild::Run(r) => push_run_text(&mut text, r),
            ParagraphChild::Hyperlink(h) => {
                for child in &h.children {
                    if let ParagraphChild::Run(r) = child {
                        push_run_text(&mut text, r);
                    }
                }
            }
            _ => {}
        }
    }

    text
}

fn push_run_text(text: &mut String, run: &docx_rs::Run) {
    for run_child in &run.children {
        match run_child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

// ── XLSX ─────────────────────────────────────────────────────────────────

/// Render the first worksheet as a fixed-width text table.
///
/// The first row is treated as the header. Every column is right-aligned to
/// its widest cell and columns are separated by one space. An empty or
/// missing first sheet yields no lines.
pub fn xlsx_table(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let parse_failed = |detail: String| ExtractionError::DocumentParse {
        kind: "XLSX".into(),
        detail,
    };

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(|e| parse_failed(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| parse_failed(e.to_string()))?,
        None => return Ok(Vec::new()),
    };

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    debug!("XLSX: {} rows × {} columns", range.height(), range.width());
    Ok(render_table(&rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Right-align every column to its widest cell; one space between columns.
pub(crate) fn render_table(rows: &[Vec<String>]) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return Vec::new();
    }

    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            let cells: Vec<String> = (0..columns)
                .map(|i| {
                    let cell = row.get(i).map(String::as_str).unwrap_or("");
                    format!("{:>width$}", cell, width = widths[i])
                })
                .collect();
            cells.join(" ").trim_end().to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};

    fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut doc = Docx::new();
        for p in paragraphs {
            doc = doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*p)));
        }
        let mut buf = Cursor::new(Vec::new());
        doc.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn docx_paragraphs_in_order() {
        let bytes = build_docx(&["Line A", "Line B"]);
        assert_eq!(docx_paragraphs(&bytes).unwrap(), vec!["Line A", "Line B"]);
    }

    #[test]
    fn docx_keeps_empty_paragraphs() {
        let mut doc = Docx::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("Title")));
        doc = doc.add_paragraph(Paragraph::new());
        doc = doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text("Body")));
        let mut buf = Cursor::new(Vec::new());
        doc.build().pack(&mut buf).unwrap();

        assert_eq!(docx_paragraphs(buf.get_ref()).unwrap(), vec!["Title", "", "Body"]);
    }

    #[test]
    fn docx_concatenates_runs_and_tabs() {
        let para = Paragraph::new()
            .add_run(Run::new().add_text("Name:"))
            .add_run(Run::new().add_tab().add_text("Ada"));
        let mut buf = Cursor::new(Vec::new());
        Docx::new().add_paragraph(para).build().pack(&mut buf).unwrap();

        assert_eq!(docx_paragraphs(buf.get_ref()).unwrap(), vec!["Name:\tAda"]);
    }

    #[test]
    fn docx_rejects_garbage() {
        let err = docx_paragraphs(b"not a zip").unwrap_err();
        assert!(matches!(err, ExtractionError::DocumentParse { ref kind, .. } if kind == "DOCX"));
    }

    #[test]
    fn xlsx_rejects_garbage() {
        let err = xlsx_table(b"not a zip").unwrap_err();
        assert!(matches!(err, ExtractionError::DocumentParse { ref kind, .. } if kind == "XLSX"));
    }

    #[test]
    fn table_columns_right_aligned() {
        let rows = vec![
            vec!["name".to_string(), "qty".to_string()],
            vec!["apple".to_string(), "3".to_string()],
            vec!["fig".to_string(), "12".to_string()],
        ];
        assert_eq!(render_table(&rows), vec![" name qty", "apple   3", "  fig  12"]);
    }

    #[test]
    fn table_pads_short_rows() {
        let rows = vec![
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            vec!["1".to_string()],
        ];
        assert_eq!(render_table(&rows), vec!["a b c", "1"]);
    }

    #[test]
    fn empty_table_has_no_lines() {
        assert!(render_table(&[]).is_empty());
        assert!(render_table(&[vec![]]).is_empty());
    }
}
