//! Error types for the edgequake-doc2text library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2TextError`] is **fatal**: the request cannot proceed at all
//!   (unsupported file type, unreadable input, the selected engine failed,
//!   the export container could not be built). Returned as
//!   `Err(Doc2TextError)` from the top-level `convert*` and `export`
//!   functions.
//!
//! * [`ExtractionError`] is **per engine**: one OCR engine or document
//!   parser failed on this file. Stored inside
//!   [`crate::output::EngineResult`] so the sibling engine's independent
//!   attempt is never lost to the other's failure.

use crate::config::OcrMethod;
use crate::export::ExportFormat;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doc2text library.
///
/// Engine-level failures use [`ExtractionError`] and only become fatal
/// (wrapped in [`Doc2TextError::Extraction`]) when the failing engine is
/// the one whose text was selected for export.
#[derive(Debug, Error)]
pub enum Doc2TextError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The file name does not map to a supported category.
    #[error("Unsupported file type: '{name}'\nSupported extensions: png, jpg, jpeg, pdf, docx, xlsx.")]
    UnsupportedFormat { name: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The engine selected for export failed on this file.
    #[error("Extraction with the {method} engine failed: {source}")]
    Extraction {
        method: OcrMethod,
        #[source]
        source: ExtractionError,
    },

    // ── Export errors ─────────────────────────────────────────────────────
    /// The export container could not be built.
    #[error("Failed to encode {format} output: {detail}")]
    ExportEncoding { format: ExportFormat, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure of one extraction strategy on one file.
///
/// Serialisable so it can be reported next to the sibling engine's text in
/// JSON output.
#[derive(Debug, Clone, Error, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ExtractionError {
    /// The file category has no extraction strategy.
    #[error("no extraction strategy for '{name}'")]
    UnsupportedFormat { name: String },

    /// The engine's binary or models are not installed.
    #[error("{engine} is not available: {hint}")]
    EngineUnavailable { engine: String, hint: String },

    /// The engine ran but returned an error.
    #[error("{engine} failed: {detail}")]
    EngineFailed { engine: String, detail: String },

    /// The image bytes could not be decoded.
    #[error("image could not be decoded: {detail}")]
    ImageDecode { detail: String },

    /// PDF header/trailer/xref is corrupt, or the PDF is encrypted.
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "failed to bind to pdfium library: {0}\n\
Install libpdfium system-wide or set PDFIUM_LIB_PATH to the directory that contains it."
    )]
    PdfiumBindingFailed(String),

    /// DOCX or XLSX structure could not be parsed.
    #[error("{kind} could not be parsed: {detail}")]
    DocumentParse { kind: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = Doc2TextError::UnsupportedFormat {
            name: "data.csv".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("data.csv"), "got: {msg}");
        assert!(msg.contains("xlsx"));
    }

    #[test]
    fn extraction_display_names_method_and_cause() {
        let e = Doc2TextError::Extraction {
            method: OcrMethod::Secondary,
            source: ExtractionError::EngineUnavailable {
                engine: "tesseract".into(),
                hint: "install tesseract-ocr".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("secondary"), "got: {msg}");
        assert!(msg.contains("install tesseract-ocr"), "got: {msg}");
    }

    #[test]
    fn export_encoding_display() {
        let e = Doc2TextError::ExportEncoding {
            format: ExportFormat::Pdf,
            detail: "font error".into(),
        };
        assert!(e.to_string().contains("pdf"));
        assert!(e.to_string().contains("font error"));
    }

    #[test]
    fn rasterisation_display() {
        let e = ExtractionError::RasterisationFailed {
            page: 3,
            detail: "bitmap".into(),
        };
        assert!(e.to_string().contains("page 3"));
    }

    #[test]
    fn extraction_error_serialises() {
        let e = ExtractionError::ImageDecode {
            detail: "bad header".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: ExtractionError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
