//! Result types returned by the conversion entry points.

use crate::config::OcrMethod;
use crate::error::ExtractionError;
use crate::export::{ExportFormat, ExportOutput};
use crate::pipeline::input::FileCategory;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The outcome of running one OCR method on the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    pub method: OcrMethod,
    /// Engine name (`ocrs`, `tesseract`, ...).
    pub engine: String,
    /// Extracted text; empty when the engine failed or was skipped.
    pub text: String,
    pub error: Option<ExtractionError>,
    /// True when the method was not run (`compare_engines = false`).
    pub skipped: bool,
    pub duration_ms: u64,
}

impl EngineResult {
    pub fn succeeded(
        method: OcrMethod,
        engine: impl Into<String>,
        text: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            method,
            engine: engine.into(),
            text,
            error: None,
            skipped: false,
            duration_ms,
        }
    }

    pub fn failed(
        method: OcrMethod,
        engine: impl Into<String>,
        error: ExtractionError,
        duration_ms: u64,
    ) -> Self {
        Self {
            method,
            engine: engine.into(),
            text: String::new(),
            error: Some(error),
            skipped: false,
            duration_ms,
        }
    }

    pub fn skipped(method: OcrMethod, engine: impl Into<String>) -> Self {
        Self {
            method,
            engine: engine.into(),
            text: String::new(),
            error: None,
            skipped: true,
            duration_ms: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.skipped && self.error.is_none()
    }
}

/// Complete result of converting one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub file_name: String,
    pub category: FileCategory,
    /// One entry per OCR method, primary first.
    pub results: Vec<EngineResult>,
    /// The method whose text was exported.
    pub selected_method: OcrMethod,
    /// Text that was exported.
    pub text: String,
    /// Encoded export. Bytes are omitted from JSON.
    pub export: ExportOutput,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Result for `method`, if present.
    pub fn result(&self, method: OcrMethod) -> Option<&EngineResult> {
        self.results.iter().find(|r| r.method == method)
    }

    pub fn primary(&self) -> Option<&EngineResult> {
        self.result(OcrMethod::Primary)
    }

    pub fn secondary(&self) -> Option<&EngineResult> {
        self.result(OcrMethod::Secondary)
    }

    /// File name for the export when the caller gives none.
    /// See [`export_file_name`].
    pub fn default_export_name(&self) -> String {
        export_file_name(&self.file_name, self.export.format)
    }
}

/// Export file name derived from the input name: `<stem>.<ext>`.
///
/// When that would equal the input name (`report.docx` exported as docx),
/// the name becomes `<stem>.out.<ext>` so the input is never overwritten.
/// Inputs without a usable stem fall back to `result`.
pub fn export_file_name(input_name: &str, format: ExportFormat) -> String {
    let path = Path::new(input_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("result");
    let name = format!("{}.{}", stem, format.extension());

    let same_as_input = path
        .file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|input| input.eq_ignore_ascii_case(&name));
    if same_as_input {
        format!("{}.out.{}", stem, format.extension())
    } else {
        name
    }
}

/// Timing and outcome counters for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub input_bytes: usize,
    pub engines_run: usize,
    pub engines_failed: usize,
    pub output_bytes: usize,
    pub extraction_duration_ms: u64,
    pub export_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// What [`crate::inspect`] reports about an input without running OCR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub name: String,
    pub category: FileCategory,
    pub size_bytes: usize,
    pub uses_ocr: bool,
    /// PDF page count. `None` for other categories or when pdfium is not
    /// available.
    pub page_count: Option<usize>,
}
