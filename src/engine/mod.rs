//! OCR engine abstraction.
//!
//! Two recognition backends share one contract, [`OcrEngine`]: a decoded
//! raster image goes in, a list of recognised text fragments (one per
//! detected line or region, in reading order) comes out.
//!
//! - [`OcrsEngine`]: the primary engine: neural text detection and
//!   recognition via the pure-Rust `ocrs` crate (CPU, in-process).
//! - [`TesseractEngine`]: the secondary engine: the Tesseract CLI as a
//!   subprocess.
//!
//! [`EngineSet`] holds one engine per [`OcrMethod`] so the extractor can
//! look the engine up by method. Tests swap in fakes through
//! [`EngineSet::new`].

mod ocrs_backend;
mod tesseract;

pub use self::ocrs_backend::OcrsEngine;
pub use self::tesseract::TesseractEngine;

use crate::config::{OcrMethod, PipelineConfig};
use crate::error::ExtractionError;
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;

/// A recognition backend: raster image → text fragments.
///
/// Implementations are `Send + Sync` so one instance can be shared across
/// blocking tasks. An image with no recognisable text yields an empty list,
/// never an error.
pub trait OcrEngine: Send + Sync {
    /// Short engine name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Check if this engine can run (binary installed, models present or
    /// downloadable).
    fn is_available(&self) -> bool;

    /// What is needed to make this engine available.
    fn availability_hint(&self) -> String;

    /// Recognise the text in one image.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, ExtractionError>;
}

/// One engine per OCR method.
#[derive(Clone)]
pub struct EngineSet {
    primary: Arc<dyn OcrEngine>,
    secondary: Arc<dyn OcrEngine>,
}

impl EngineSet {
    /// Pair two engines explicitly.
    pub fn new(primary: Arc<dyn OcrEngine>, secondary: Arc<dyn OcrEngine>) -> Self {
        Self { primary, secondary }
    }

    /// Build the default engines (ocrs + Tesseract) from a pipeline config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let ocrs = match &config.model_dir {
            Some(dir) => OcrsEngine::with_model_dir(dir.clone()),
            None => OcrsEngine::new(),
        };
        let tesseract = TesseractEngine::new(config.tesseract_path.clone(), config.language.clone());
        Self::new(Arc::new(ocrs), Arc::new(tesseract))
    }

    /// The engine behind `method`.
    pub fn get(&self, method: OcrMethod) -> &Arc<dyn OcrEngine> {
        match method {
            OcrMethod::Primary => &self.primary,
            OcrMethod::Secondary => &self.secondary,
        }
    }
}

impl Default for EngineSet {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl fmt::Debug for EngineSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSet")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.name())
            .finish()
    }
}
