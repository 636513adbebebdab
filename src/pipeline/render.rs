//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! Both OCR engines read pixels, not PDF structure, so even text-native
//! PDFs are rendered and re-recognised. Embedded PDF text is never used.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster at 150 DPI would produce a
//! 12,000 × 17,000 px image. `max_rendered_pixels` caps the longest edge
//! regardless of physical size, keeping memory bounded.
//!
//! All functions here are blocking; callers run them inside
//! `spawn_blocking`.

use crate::error::ExtractionError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Bind to the pdfium library.
///
/// `PDFIUM_LIB_PATH` (a directory or the library file itself) takes
/// precedence; otherwise the system library is used.
pub fn bind_pdfium() -> Result<Pdfium, ExtractionError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => {
            let path = PathBuf::from(path);
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            Pdfium::bind_to_library(&lib)
        }
        _ => Pdfium::bind_to_system_library(),
    };

    bindings
        .map(Pdfium::new)
        .map_err(|e| ExtractionError::PdfiumBindingFailed(format!("{:?}", e)))
}

/// Rasterise every page of an in-memory PDF, in page order.
///
/// # Returns
/// One image per page; an empty document yields an empty vector.
pub fn render_pages(pdf_bytes: &[u8], max_pixels: u32) -> Result<Vec<DynamicImage>, ExtractionError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(|e| ExtractionError::CorruptPdf {
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut images = Vec::with_capacity(pages.len() as usize);

    for (idx, page) in pages.iter().enumerate() {
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| ExtractionError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        images.push(image);
    }

    Ok(images)
}

/// Count the pages of an in-memory PDF without rendering them.
pub fn page_count(pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(|e| ExtractionError::CorruptPdf {
            detail: format!("{:?}", e),
        })?;
    Ok(document.pages().len() as usize)
}
