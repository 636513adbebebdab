//! # edgequake-doc2text
//!
//! Extract text from images, PDFs, Word and Excel files, then export it as
//! plain text, DOCX or PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file (png/jpg/jpeg/pdf/docx/xlsx)
//!  │
//!  ├─ 1. Input    classify by extension, reject anything else
//!  ├─ 2. Extract  once per OCR method (primary = ocrs, secondary = tesseract)
//!  │      image → engine
//!  │      pdf   → pdfium raster per page → engine
//!  │      docx  → paragraphs          (method ignored)
//!  │      xlsx  → first sheet as table (method ignored)
//!  └─ 3. Export   selected method's text → txt / docx / pdf bytes
//! ```
//!
//! Both engines run on every file so their results can be compared; a
//! failing engine is reported next to the other's text and only aborts the
//! conversion when it is the selected one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2text::{convert_input, ExportFormat, OcrMethod, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .ocr_method(OcrMethod::Secondary)
//!         .save_format(ExportFormat::Docx)
//!         .build()?;
//!     let output = convert_input("scan.png", &config).await?;
//!     for r in &output.results {
//!         println!("{} ({}): {}", r.method, r.engine, r.text);
//!     }
//!     std::fs::write(output.export.file_name("result"), &output.export.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2text` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## Runtime requirements
//!
//! | Needed for | What |
//! |------------|------|
//! | PDF input | libpdfium (system library or `PDFIUM_LIB_PATH`) |
//! | secondary engine | `tesseract` on `PATH` |
//! | primary engine | ocrs models, downloaded to the cache dir on first use |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod export;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrMethod, PipelineConfig, PipelineConfigBuilder};
pub use convert::{
    convert, convert_bytes, convert_input, convert_sync, convert_to_file, convert_with_engines, inspect,
};
pub use engine::{EngineSet, OcrEngine, OcrsEngine, TesseractEngine};
pub use error::{Doc2TextError, ExtractionError};
pub use export::{export, ExportFormat, ExportOutput};
pub use extract::{extract, extract_blocking, ExtractOptions};
pub use output::{ConversionOutput, ConversionStats, DocumentInfo, EngineResult};
pub use pipeline::input::{FileCategory, UploadedFile};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
