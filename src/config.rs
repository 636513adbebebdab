//! Configuration types for document-to-text conversion.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built
//! via its [`PipelineConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads and log them next to a run.

use crate::error::Doc2TextError;
use crate::export::ExportFormat;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for one pipeline invocation.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2text::{ExportFormat, OcrMethod, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .ocr_method(OcrMethod::Secondary)
///     .save_format(ExportFormat::Docx)
///     .language("deu")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Engine whose text is exported. Default: [`OcrMethod::Primary`].
    pub ocr_method: OcrMethod,

    /// Export container. Default: [`ExportFormat::Text`].
    pub save_format: ExportFormat,

    /// Run both engines so their results can be compared. Default: true.
    ///
    /// When false only the engine named by `ocr_method` runs and the other
    /// [`crate::output::EngineResult`] is reported as skipped.
    pub compare_engines: bool,

    /// Maximum rendered image dimension (width or height) in pixels when
    /// rasterising PDF pages. Default: 2000.
    ///
    /// Caps memory on oversized pages; both OCR engines read body text
    /// reliably well below this size.
    pub max_rendered_pixels: u32,

    /// Tesseract language code(s), e.g. "eng" or "eng+deu". Default: "eng".
    pub language: String,

    /// Tesseract binary to execute. Default: "tesseract" (resolved via PATH).
    pub tesseract_path: PathBuf,

    /// Directory holding the ocrs `.rten` models.
    /// If None, models are located or downloaded by `ocrs-models`.
    pub model_dir: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ocr_method: OcrMethod::default(),
            save_format: ExportFormat::default(),
            compare_engines: true,
            max_rendered_pixels: 2000,
            language: "eng".to_string(),
            tesseract_path: PathBuf::from("tesseract"),
            model_dir: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("ocr_method", &self.ocr_method)
            .field("save_format", &self.save_format)
            .field("compare_engines", &self.compare_engines)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("language", &self.language)
            .field("tesseract_path", &self.tesseract_path)
            .field("model_dir", &self.model_dir)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Methods that will actually run under this configuration, in order.
    pub fn methods_to_run(&self) -> Vec<OcrMethod> {
        if self.compare_engines {
            OcrMethod::ALL.to_vec()
        } else {
            vec![self.ocr_method]
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn ocr_method(mut self, method: OcrMethod) -> Self {
        self.config.ocr_method = method;
        self
    }

    pub fn save_format(mut self, format: ExportFormat) -> Self {
        self.config.save_format = format;
        self
    }

    pub fn compare_engines(mut self, v: bool) -> Self {
        self.config.compare_engines = v;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px;
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_path = path.into();
        self
    }

    pub fn model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.model_dir = Some(dir.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Doc2TextError> {
        let c = &self.config;
        if c.max_rendered_pixels < 100 {
            return Err(Doc2TextError::InvalidConfig(format!(
                "max_rendered_pixels must be ≥ 100, got {}",
                c.max_rendered_pixels
            )));
        }
        if c.language.trim().is_empty() {
            return Err(Doc2TextError::InvalidConfig(
                "Tesseract language must not be empty".into(),
            ));
        }
        if c.tesseract_path.as_os_str().is_empty() {
            return Err(Doc2TextError::InvalidConfig(
                "Tesseract path must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which of the two recognition engines to use.
///
/// Both engines share one contract (image → text fragments) and are always
/// run side by side unless `compare_engines` is off, so the choice here only
/// decides which text is exported.
///
/// | Method | Engine | Runs |
/// |--------|--------|------|
/// | `Primary` | ocrs (neural detection + recognition, pure Rust) | in-process |
/// | `Secondary` | Tesseract | `tesseract` CLI subprocess |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrMethod {
    /// ocrs engine. (default)
    #[default]
    Primary,
    /// Tesseract engine.
    Secondary,
}

impl OcrMethod {
    /// Both methods, in execution order.
    pub const ALL: [OcrMethod; 2] = [OcrMethod::Primary, OcrMethod::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            OcrMethod::Primary => "primary",
            OcrMethod::Secondary => "secondary",
        }
    }

    /// Name of the engine behind this method.
    pub fn engine_name(&self) -> &'static str {
        match self {
            OcrMethod::Primary => "ocrs",
            OcrMethod::Secondary => "tesseract",
        }
    }

    /// Parse a method tag. Accepts the method name or the engine name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "primary" | "ocrs" | "easyocr" => Some(OcrMethod::Primary),
            "secondary" | "tesseract" => Some(OcrMethod::Secondary),
            _ => None,
        }
    }
}

impl fmt::Display for OcrMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = PipelineConfig::default();
        assert_eq!(c.ocr_method, OcrMethod::Primary);
        assert_eq!(c.save_format, ExportFormat::Text);
        assert!(c.compare_engines);
        assert_eq!(c.max_rendered_pixels, 2000);
        assert_eq!(c.language, "eng");
        assert_eq!(c.tesseract_path, PathBuf::from("tesseract"));
    }

    #[test]
    fn builder_rejects_tiny_raster_cap() {
        let err = PipelineConfig::builder()
            .max_rendered_pixels(10)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_rendered_pixels"));
    }

    #[test]
    fn builder_rejects_empty_language() {
        assert!(PipelineConfig::builder().language("  ").build().is_err());
    }

    #[test]
    fn methods_to_run_respects_compare_flag() {
        let both = PipelineConfig::default();
        assert_eq!(both.methods_to_run(), vec![OcrMethod::Primary, OcrMethod::Secondary]);

        let single = PipelineConfig::builder()
            .ocr_method(OcrMethod::Secondary)
            .compare_engines(false)
            .build()
            .unwrap();
        assert_eq!(single.methods_to_run(), vec![OcrMethod::Secondary]);
    }

    #[test]
    fn method_tags() {
        assert_eq!(OcrMethod::from_tag("easyocr"), Some(OcrMethod::Primary));
        assert_eq!(OcrMethod::from_tag("OCRS"), Some(OcrMethod::Primary));
        assert_eq!(OcrMethod::from_tag("tesseract"), Some(OcrMethod::Secondary));
        assert_eq!(OcrMethod::from_tag(" secondary "), Some(OcrMethod::Secondary));
        assert_eq!(OcrMethod::from_tag("paddle"), None);
    }

    #[test]
    fn debug_hides_callback() {
        let s = format!("{:?}", PipelineConfig::default());
        assert!(s.contains("ocr_method"));
        assert!(s.contains("progress_callback"));
    }
}
