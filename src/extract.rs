//! The extractor: uploaded file + OCR method → plain text.
//!
//! Dispatch is a lookup from [`FileCategory`] to a strategy function rather
//! than nested conditionals. Each strategy is a plain blocking function and
//! can be tested on its own:
//!
//! | Category | Strategy | Uses OCR method |
//! |----------|----------|-----------------|
//! | image | decode → engine → join lines | yes |
//! | pdf | rasterise pages → engine per page → page texts in order | yes |
//! | docx | top-level paragraphs → join | no |
//! | xlsx | first sheet as fixed-width table → join | no |
//!
//! No engine failure is retried here. Callers that run both engines call
//! [`extract`] once per method, so one engine failing never touches the
//! other's result.

use crate::config::OcrMethod;
use crate::engine::{EngineSet, OcrEngine};
use crate::error::{Doc2TextError, ExtractionError};
use crate::pipeline::encode::decode_image;
use crate::pipeline::input::{FileCategory, UploadedFile};
use crate::pipeline::{document, render};
use crate::progress::ProgressCallback;
use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, info};

/// Everything a strategy needs besides the file itself.
pub struct ExtractContext<'a> {
    pub method: OcrMethod,
    pub engine: &'a dyn OcrEngine,
    pub max_rendered_pixels: u32,
    pub progress: Option<&'a ProgressCallback>,
}

/// A category's extraction procedure.
pub type Strategy = fn(&UploadedFile, &ExtractContext<'_>) -> Result<String, ExtractionError>;

/// Look up the strategy for a category. `None` for unsupported files.
pub fn strategy_for(category: FileCategory) -> Option<Strategy> {
    match category {
        FileCategory::Image => Some(ocr_image),
        FileCategory::Pdf => Some(ocr_pdf),
        FileCategory::Docx => Some(docx_text),
        FileCategory::Xlsx => Some(xlsx_text),
        FileCategory::Unsupported => None,
    }
}

/// Options for a standalone [`extract`] call.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub max_rendered_pixels: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 2000,
        }
    }
}

/// Extract the text of `file` with the engine selected by `method`.
///
/// Blocking: OCR and pdfium are CPU-bound. Use [`extract`] from async code.
pub fn extract_blocking(
    file: &UploadedFile,
    method: OcrMethod,
    engines: &EngineSet,
    options: ExtractOptions,
    progress: Option<&ProgressCallback>,
) -> Result<String, ExtractionError> {
    let strategy = strategy_for(file.category()).ok_or_else(|| ExtractionError::UnsupportedFormat {
        name: file.name().to_string(),
    })?;

    let engine = engines.get(method);
    let ctx = ExtractContext {
        method,
        engine: &**engine,
        max_rendered_pixels: options.max_rendered_pixels,
        progress,
    };

    let start = Instant::now();
    if file.category().uses_ocr() {
        info!("Extracting '{}' ({}) with {}", file.name(), file.category(), engine.name());
    } else {
        info!("Extracting '{}' ({})", file.name(), file.category());
    }

    let text = strategy(file, &ctx)?;

    debug!(
        "Extracted {} chars from '{}' in {}ms",
        text.chars().count(),
        file.name(),
        start.elapsed().as_millis()
    );
    Ok(text)
}

/// Async wrapper around [`extract_blocking`]; the work runs in
/// `spawn_blocking`.
///
/// # Errors
/// `UnsupportedFormat` for unsupported categories; `Extraction` when the
/// engine or document parser fails.
pub async fn extract(
    file: &UploadedFile,
    method: OcrMethod,
    engines: &EngineSet,
    options: ExtractOptions,
    progress: Option<&ProgressCallback>,
) -> Result<String, Doc2TextError> {
    if file.category() == FileCategory::Unsupported {
        return Err(Doc2TextError::UnsupportedFormat {
            name: file.name().to_string(),
        });
    }

    let file = file.clone();
    let engines = engines.clone();
    let progress = progress.cloned();

    tokio::task::spawn_blocking(move || extract_blocking(&file, method, &engines, options, progress.as_ref()))
        .await
        .map_err(|e| Doc2TextError::Internal(format!("Extraction task panicked: {}", e)))?
        .map_err(|source| Doc2TextError::Extraction { method, source })
}

// ── Strategies ───────────────────────────────────────────────────────────

/// Raster image: run the engine directly, one line per fragment.
fn ocr_image(file: &UploadedFile, ctx: &ExtractContext<'_>) -> Result<String, ExtractionError> {
    if let Some(cb) = ctx.progress {
        cb.on_extraction_start(ctx.method, 1);
    }

    let image = decode_image(file.bytes())?;
    let text = ctx.engine.recognize(&image)?.join("\n");

    if let Some(cb) = ctx.progress {
        cb.on_extraction_complete(ctx.method, text.chars().count());
    }
    Ok(text)
}

/// PDF: rasterise every page, recognise each, keep page order.
fn ocr_pdf(file: &UploadedFile, ctx: &ExtractContext<'_>) -> Result<String, ExtractionError> {
    let pages = render::render_pages(file.bytes(), ctx.max_rendered_pixels)?;
    ocr_pages(&pages, ctx)
}

/// Recognise rendered pages in order. Stops at the first page that fails.
fn ocr_pages(pages: &[DynamicImage], ctx: &ExtractContext<'_>) -> Result<String, ExtractionError> {
    let total = pages.len();

    if let Some(cb) = ctx.progress {
        cb.on_extraction_start(ctx.method, total);
    }

    let mut page_texts = Vec::with_capacity(total);
    for (idx, image) in pages.iter().enumerate() {
        let page_num = idx + 1;
        if let Some(cb) = ctx.progress {
            cb.on_page_start(ctx.method, page_num, total);
        }

        match ctx.engine.recognize(image) {
            Ok(fragments) => {
                let page_text = fragments.join("\n");
                debug!("Page {}/{}: {} lines", page_num, total, fragments.len());
                if let Some(cb) = ctx.progress {
                    cb.on_page_complete(ctx.method, page_num, total, page_text.chars().count());
                }
                page_texts.push(page_text);
            }
            Err(e) => {
                if let Some(cb) = ctx.progress {
                    cb.on_page_error(ctx.method, page_num, total, &e.to_string());
                }
                return Err(e);
            }
        }
    }

    let text = assemble_pages(&page_texts);
    if let Some(cb) = ctx.progress {
        cb.on_extraction_complete(ctx.method, text.chars().count());
    }
    Ok(text)
}

/// DOCX: paragraphs joined with newlines. The OCR method is ignored.
fn docx_text(file: &UploadedFile, ctx: &ExtractContext<'_>) -> Result<String, ExtractionError> {
    structured_text(ctx, || document::docx_paragraphs(file.bytes()))
}

/// XLSX: table lines joined with newlines. The OCR method is ignored.
fn xlsx_text(file: &UploadedFile, ctx: &ExtractContext<'_>) -> Result<String, ExtractionError> {
    structured_text(ctx, || document::xlsx_table(file.bytes()))
}

fn structured_text(
    ctx: &ExtractContext<'_>,
    read: impl FnOnce() -> Result<Vec<String>, ExtractionError>,
) -> Result<String, ExtractionError> {
    if let Some(cb) = ctx.progress {
        cb.on_extraction_start(ctx.method, 1);
    }
    let text = read()?.join("\n");
    if let Some(cb) = ctx.progress {
        cb.on_extraction_complete(ctx.method, text.chars().count());
    }
    Ok(text)
}

/// Concatenate page texts in order, each followed by a newline.
///
/// An N-page document therefore yields N newline-terminated segments, even
/// when some pages are blank.
pub fn assemble_pages(pages: &[String]) -> String {
    let mut text = String::with_capacity(pages.iter().map(|p| p.len() + 1).sum());
    for page in pages {
        text.push_str(page);
        text.push('\n');
    }
    text
}
