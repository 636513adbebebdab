//! The exporter: plain text → encoded bytes in the chosen container.
//!
//! | Format | Content type | Layout |
//! |--------|--------------|--------|
//! | `txt`  | `text/plain` | UTF-8, unchanged |
//! | `docx` | WordprocessingML | one paragraph, one run, `\n` → line break |
//! | `pdf`  | `application/pdf` | A4, Helvetica 12 pt, one text line per line |
//!
//! Export never fails for `txt`. For `docx` and `pdf` a container fault is
//! returned as [`Doc2TextError::ExportEncoding`] and no partial bytes are
//! produced.

use crate::error::Doc2TextError;
use docx_rs::{BreakType, Docx, Paragraph, Run};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufWriter, Cursor};
use tracing::{debug, warn};

/// Output container for the exported text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    #[default]
    #[serde(rename = "txt")]
    Text,
    #[serde(rename = "docx")]
    Docx,
    #[serde(rename = "pdf")]
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Text, ExportFormat::Docx, ExportFormat::Pdf];

    /// Parse a format tag. `None` when the tag is not recognised.
    pub fn parse_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" | "plain-text" => Some(Self::Text),
            "docx" | "document" => Some(Self::Docx),
            "pdf" | "pdf-document" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Parse a format tag, falling back to plain text for anything
    /// unrecognised.
    pub fn from_tag(tag: &str) -> Self {
        Self::parse_tag(tag).unwrap_or_else(|| {
            warn!("Unknown export format '{}', falling back to plain text", tag);
            Self::Text
        })
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Pdf => "application/pdf",
        }
    }

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encoded export plus the metadata a caller needs to serve or save it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutput {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub format: ExportFormat,
}

impl ExportOutput {
    /// Suggested file name: `<stem>.<ext>`.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.format.extension())
    }
}

/// Encode `text` in `format`.
pub fn export(text: &str, format: ExportFormat) -> Result<ExportOutput, Doc2TextError> {
    let bytes = match format {
        ExportFormat::Text => text.as_bytes().to_vec(),
        ExportFormat::Docx => docx_bytes(text)?,
        ExportFormat::Pdf => pdf_bytes(text)?,
    };

    debug!("Exported {} chars as {} ({} bytes)", text.chars().count(), format, bytes.len());

    Ok(ExportOutput {
        bytes,
        content_type: format.content_type().to_string(),
        format,
    })
}

// ── DOCX ─────────────────────────────────────────────────────────────────

fn docx_bytes(text: &str) -> Result<Vec<u8>, Doc2TextError> {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        for (j, piece) in line.split('\t').enumerate() {
            if j > 0 {
                run = run.add_tab();
            }
            if !piece.is_empty() {
                run = run.add_text(xml_safe(piece));
            }
        }
    }

    let mut buf = Cursor::new(Vec::new());
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(run))
        .build()
        .pack(&mut buf)
        .map_err(|e| Doc2TextError::ExportEncoding {
            format: ExportFormat::Docx,
            detail: e.to_string(),
        })?;
    Ok(buf.into_inner())
}

/// Drop control characters XML 1.0 cannot carry.
fn xml_safe(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

// ── PDF ──────────────────────────────────────────────────────────────────

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_LEFT_MM: f32 = 10.0;
const MARGIN_TOP_MM: f32 = 10.0;
const MARGIN_BOTTOM_MM: f32 = 15.0;
const LINE_HEIGHT_MM: f32 = 10.0;
const FONT_SIZE_PT: f32 = 12.0;
/// Baseline offset inside a line's 10 mm cell.
const BASELINE_OFFSET_MM: f32 = 6.5;

/// Full lines that fit between the top and bottom margins (27).
pub const LINES_PER_PAGE: usize =
    ((PAGE_HEIGHT_MM - MARGIN_TOP_MM - MARGIN_BOTTOM_MM) / LINE_HEIGHT_MM) as usize;

/// Split text into pages of at most [`LINES_PER_PAGE`] printable lines.
///
/// Always yields at least one page, so empty text exports as one blank
/// page.
pub fn paginate(text: &str) -> Vec<Vec<String>> {
    let lines: Vec<String> = text.split('\n').map(printable_ascii).collect();
    let mut pages: Vec<Vec<String>> = lines.chunks(LINES_PER_PAGE).map(<[String]>::to_vec).collect();
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}

/// Map a line onto what the built-in font can draw: tabs become four
/// spaces, anything outside printable ASCII becomes `?`.
fn printable_ascii(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.trim_end_matches('\r').chars() {
        match c {
            '\t' => out.push_str("    "),
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn pdf_bytes(text: &str) -> Result<Vec<u8>, Doc2TextError> {
    let encoding_failed = |detail: String| Doc2TextError::ExportEncoding {
        format: ExportFormat::Pdf,
        detail,
    };

    let pages = paginate(text);
    let (doc, first_page, first_layer) =
        PdfDocument::new("doc2text export", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| encoding_failed(format!("font: {e}")))?;

    for (idx, lines) in pages.iter().enumerate() {
        let (page, layer) = if idx == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page).get_layer(layer);

        for (row, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let top = MARGIN_TOP_MM + row as f32 * LINE_HEIGHT_MM;
            let baseline = PAGE_HEIGHT_MM - (top + BASELINE_OFFSET_MM);
            layer.use_text(line.as_str(), FONT_SIZE_PT, Mm(MARGIN_LEFT_MM), Mm(baseline), &font);
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).map_err(|e| encoding_failed(format!("save: {e}")))?;
    buf.into_inner().map_err(|e| encoding_failed(format!("buffer: {e}")))
}
