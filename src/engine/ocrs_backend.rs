//! Primary engine: the pure-Rust `ocrs` recogniser.
//!
//! Models (`text-detection.rten`, `text-recognition.rten`) are located or
//! downloaded by the `ocrs-models` crate on first use and loaded once per
//! model directory per process. Recognition runs three passes: word detection, grouping of
//! words into lines, and line recognition; each recognised line becomes
//! one fragment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

use image::DynamicImage;
use ocrs_models::ModelPaths;
use tracing::{debug, info};

use super::OcrEngine;
use crate::error::ExtractionError;
use crate::pipeline::postprocess::clean_fragments;

const ENGINE_NAME: &str = "ocrs";

type EngineCache = Mutex<HashMap<PathBuf, Arc<::ocrs::OcrEngine>>>;

/// Loaded engines keyed by model directory, shared by every `OcrsEngine`
/// of the process. `ocrs::OcrEngine` is `Send + Sync` and its methods take
/// `&self`.
static OCR_ENGINES: OnceLock<EngineCache> = OnceLock::new();

/// ocrs OCR engine.
#[derive(Debug, Clone, Default)]
pub struct OcrsEngine {
    /// Directory with both `.rten` files. None → `ocrs-models` resolution.
    model_dir: Option<PathBuf>,
}

impl OcrsEngine {
    /// Create an engine whose models are located (or downloaded) by
    /// `ocrs-models`.
    pub fn new() -> Self {
        Self { model_dir: None }
    }

    /// Create an engine that loads its models from `dir`.
    pub fn with_model_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: Some(dir.into()),
        }
    }

    fn model_paths(&self) -> Result<ModelPaths, ExtractionError> {
        match &self.model_dir {
            Some(dir) => {
                let paths = ModelPaths::in_dir(dir);
                if paths.exist() {
                    Ok(paths)
                } else {
                    Err(ExtractionError::EngineUnavailable {
                        engine: ENGINE_NAME.into(),
                        hint: format!("model files missing in {}", dir.display()),
                    })
                }
            }
            None => ocrs_models::ensure_models(None).map_err(|e| ExtractionError::EngineUnavailable {
                engine: ENGINE_NAME.into(),
                hint: e.to_string(),
            }),
        }
    }

    /// Get or initialise the engine for this instance's model directory.
    ///
    /// The directory is resolved on every call, so an instance whose models
    /// are missing fails even when another directory is already loaded.
    fn get_or_init_engine(&self) -> Result<Arc<::ocrs::OcrEngine>, ExtractionError> {
        let paths = self.model_paths()?;
        cached_or_load(&paths, load_engine)
    }
}

/// Directory holding both models; the cache key.
fn cache_key(paths: &ModelPaths) -> PathBuf {
    paths
        .detection
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.detection.clone())
}

/// Return the cached engine for `paths`, loading it with `load` on a miss.
/// The lock is held while loading so a directory is never loaded twice.
fn cached_or_load(
    paths: &ModelPaths,
    load: impl FnOnce(&ModelPaths) -> Result<::ocrs::OcrEngine, ExtractionError>,
) -> Result<Arc<::ocrs::OcrEngine>, ExtractionError> {
    let key = cache_key(paths);
    let mut cache = OCR_ENGINES
        .get_or_init(EngineCache::default)
        .lock()
        .map_err(|e| engine_failed("engine cache", e))?;

    if let Some(engine) = cache.get(&key) {
        return Ok(Arc::clone(engine));
    }

    let engine = Arc::new(load(paths)?);
    cache.insert(key, Arc::clone(&engine));
    Ok(engine)
}

fn load_engine(paths: &ModelPaths) -> Result<::ocrs::OcrEngine, ExtractionError> {
    let start = Instant::now();

    let detection_model =
        rten::Model::load_file(&paths.detection).map_err(|e| engine_failed("load detection model", e))?;
    let recognition_model =
        rten::Model::load_file(&paths.recognition).map_err(|e| engine_failed("load recognition model", e))?;

    let engine = ::ocrs::OcrEngine::new(::ocrs::OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(|e| engine_failed("create engine", e))?;

    info!(
        "ocrs models loaded from {} in {}ms",
        cache_key(paths).display(),
        start.elapsed().as_millis()
    );
    Ok(engine)
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn is_available(&self) -> bool {
        match &self.model_dir {
            Some(dir) => ModelPaths::in_dir(dir).exist(),
            // Models are downloaded on first use.
            None => true,
        }
    }

    fn availability_hint(&self) -> String {
        match &self.model_dir {
            Some(dir) if !ModelPaths::in_dir(dir).exist() => format!(
                "ocrs models not found in {}. Download {} and {} into it.",
                dir.display(),
                ocrs_models::model_url(ocrs_models::DETECTION_MODEL),
                ocrs_models::model_url(ocrs_models::RECOGNITION_MODEL)
            ),
            Some(_) => "ocrs is available".to_string(),
            None if ocrs_models::are_models_cached() => "ocrs is available".to_string(),
            None => "ocrs models (~12 MB) will be downloaded on first use".to_string(),
        }
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, ExtractionError> {
        let engine = self.get_or_init_engine()?;
        let start = Instant::now();

        let rgb = image.to_rgb8();
        let source = ::ocrs::ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions()).map_err(|e| {
            ExtractionError::ImageDecode {
                detail: format!("ocrs rejected image: {e}"),
            }
        })?;

        let input = engine.prepare_input(source).map_err(|e| engine_failed("prepare input", e))?;
        let word_rects = engine.detect_words(&input).map_err(|e| engine_failed("detect words", e))?;
        let line_rects = engine.find_text_lines(&input, &word_rects);
        let lines = engine
            .recognize_text(&input, &line_rects)
            .map_err(|e| engine_failed("recognize text", e))?;

        let fragments = clean_fragments(lines.into_iter().flatten().map(|line| line.to_string()));

        debug!(
            "ocrs: {} words, {} lines, {} fragments in {}ms",
            word_rects.len(),
            line_rects.len(),
            fragments.len(),
            start.elapsed().as_millis()
        );

        Ok(fragments)
    }
}

fn engine_failed(stage: &str, e: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::EngineFailed {
        engine: ENGINE_NAME.into(),
        detail: format!("{stage}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A directory with placeholder files under both model names.
    fn placeholder_model_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ocrs_models::DETECTION_MODEL), b"").unwrap();
        std::fs::write(dir.path().join(ocrs_models::RECOGNITION_MODEL), b"").unwrap();
        dir
    }

    fn modelless_engine(_paths: &ModelPaths) -> Result<::ocrs::OcrEngine, ExtractionError> {
        ::ocrs::OcrEngine::new(::ocrs::OcrEngineParams::default()).map_err(|e| engine_failed("create engine", e))
    }

    #[test]
    fn explicit_missing_model_dir_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let engine = OcrsEngine::with_model_dir(dir.path());
        assert!(!engine.is_available());
        assert!(engine.availability_hint().contains("not found"));

        let err = engine.model_paths().unwrap_err();
        assert!(matches!(err, ExtractionError::EngineUnavailable { .. }));
    }

    #[test]
    fn default_engine_downloads_on_demand() {
        assert!(OcrsEngine::new().is_available());
        assert_eq!(OcrsEngine::new().name(), "ocrs");
    }

    #[test]
    fn engines_are_cached_per_model_dir() {
        let dir_a = placeholder_model_dir();
        let dir_b = placeholder_model_dir();
        let paths_a = ModelPaths::in_dir(dir_a.path());
        let paths_b = ModelPaths::in_dir(dir_b.path());
        assert_eq!(cache_key(&paths_a), dir_a.path());

        let loads = AtomicUsize::new(0);
        let counting = |paths: &ModelPaths| {
            loads.fetch_add(1, Ordering::SeqCst);
            modelless_engine(paths)
        };

        let first_a = cached_or_load(&paths_a, counting).unwrap();
        let again_a = cached_or_load(&paths_a, counting).unwrap();
        let first_b = cached_or_load(&paths_b, counting).unwrap();

        assert!(Arc::ptr_eq(&first_a, &again_a));
        assert!(!Arc::ptr_eq(&first_a, &first_b));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_model_dir_fails_after_another_dir_is_loaded() {
        let loaded = placeholder_model_dir();
        cached_or_load(&ModelPaths::in_dir(loaded.path()), modelless_engine).unwrap();

        let empty = tempfile::tempdir().unwrap();
        let engine = OcrsEngine::with_model_dir(empty.path());
        let image = DynamicImage::new_rgb8(8, 8);
        let err = engine.recognize(&image).unwrap_err();
        assert!(matches!(err, ExtractionError::EngineUnavailable { .. }));
    }

    #[test]
    fn instance_uses_engine_of_its_own_dir() {
        let dir = placeholder_model_dir();
        let seeded = cached_or_load(&ModelPaths::in_dir(dir.path()), modelless_engine).unwrap();

        let engine = OcrsEngine::with_model_dir(dir.path());
        let resolved = engine.get_or_init_engine().unwrap();
        assert!(Arc::ptr_eq(&seeded, &resolved));
    }
}
