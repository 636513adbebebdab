//! Pipeline stages shared by the extraction strategies.
//!
//! ```text
//! input ──▶ render ──▶ engine ──▶ postprocess        (image, pdf)
//!   │      (pdfium)   (ocrs / tesseract)
//!   └────▶ document                                  (docx, xlsx)
//! ```
//!
//! 1. [`input`]: path, URL or bytes → [`input::UploadedFile`] with its
//!    category; unsupported extensions stop here
//! 2. [`render`]: rasterise PDF pages; blocking, callers use `spawn_blocking`
//! 3. [`encode`]: image decode for uploads, PNG encode for the Tesseract
//!    subprocess
//! 4. [`postprocess`]: deterministic cleanup of raw engine output
//! 5. [`document`]: DOCX paragraphs and XLSX tables, no OCR involved

pub mod document;
pub mod encode;
pub mod input;
pub mod postprocess;
pub mod render;
