//! Secondary engine: Tesseract via its command-line interface.
//!
//! Each image is written to a temporary PNG and recognised with
//! `tesseract <png> stdout -l <lang>`. Stdout is cleaned and split into one
//! fragment per output line.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use image::DynamicImage;
use tracing::debug;

use super::OcrEngine;
use crate::error::ExtractionError;
use crate::pipeline::encode::encode_png;
use crate::pipeline::postprocess::split_fragments;

const ENGINE_NAME: &str = "tesseract";

/// Tesseract OCR engine.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Run Tesseract on an image file, returning raw stdout.
    fn run_tesseract(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        match output {
            Ok(output) if output.status.success() => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::EngineFailed {
                    engine: ENGINE_NAME.into(),
                    detail: format!("exit {}: {}", output.status, stderr.trim()),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExtractionError::EngineUnavailable {
                engine: ENGINE_NAME.into(),
                hint: self.availability_hint(),
            }),
            Err(e) => Err(ExtractionError::EngineFailed {
                engine: ENGINE_NAME.into(),
                detail: e.to_string(),
            }),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn availability_hint(&self) -> String {
        format!(
            "'{}' not found. Install with: apt install tesseract-ocr (macOS: brew install tesseract)",
            self.binary.display()
        )
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, ExtractionError> {
        let start = Instant::now();

        let png = encode_png(image).map_err(|e| ExtractionError::ImageDecode {
            detail: format!("PNG encoding for tesseract failed: {e}"),
        })?;

        let io_failed = |e: std::io::Error| ExtractionError::EngineFailed {
            engine: ENGINE_NAME.into(),
            detail: format!("temp file: {e}"),
        };
        let tmp = tempfile::Builder::new()
            .prefix("doc2text-")
            .suffix(".png")
            .tempfile()
            .map_err(io_failed)?;
        std::fs::write(tmp.path(), &png).map_err(io_failed)?;

        let stdout = self.run_tesseract(tmp.path())?;
        let fragments = split_fragments(&stdout);

        debug!(
            "tesseract: {} fragments in {}ms",
            fragments.len(),
            start.elapsed().as_millis()
        );

        Ok(fragments)
    }
}
