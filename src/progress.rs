//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events while each engine works through a document.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2text::{ExtractionProgressCallback, OcrMethod, PipelineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, _method: OcrMethod, page_num: usize, total: usize, chars: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} chars)", page_num, total, chars);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { pages: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::config::OcrMethod;
use std::sync::Arc;

/// Called by the extractor as it processes each unit of a document.
///
/// A "unit" is a PDF page; images, DOCX and XLSX files count as a single
/// unit. All methods have default no-op implementations so callers only
/// override what they care about.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once per engine before any unit is processed.
    fn on_extraction_start(&self, method: OcrMethod, total_units: usize) {
        let _ = (method, total_units);
    }

    /// Called just before a page is handed to the engine.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total`   : total pages in the document
    fn on_page_start(&self, method: OcrMethod, page_num: usize, total: usize) {
        let _ = (method, page_num, total);
    }

    /// Called when a page was recognised.
    ///
    /// `chars` is the character count of the page text.
    fn on_page_complete(&self, method: OcrMethod, page_num: usize, total: usize, chars: usize) {
        let _ = (method, page_num, total, chars);
    }

    /// Called when a page failed. Extraction stops after this event.
    fn on_page_error(&self, method: OcrMethod, page_num: usize, total: usize, error: &str) {
        let _ = (method, page_num, total, error);
    }

    /// Called once per engine after the last unit.
    ///
    /// `chars` is the character count of the whole extracted text.
    fn on_extraction_complete(&self, method: OcrMethod, chars: usize) {
        let _ = (method, chars);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
