//! # ocrs-models
//!
//! Auto-download and cache the two [ocrs](https://github.com/robertknight/ocrs)
//! model files, so that users of the `ocrs` engine no longer need to fetch
//! `text-detection.rten` and `text-recognition.rten` by hand.
//!
//! ## How it works
//!
//! On first call to [`ensure_models`]:
//!
//! 1. Checks `OCRS_MODEL_DIR` (if set) for both model files.
//! 2. Otherwise checks `~/.cache/doc2text/ocrs-models/`.
//! 3. Downloads whatever is missing from the public ocrs model bucket,
//!    writing each file to `<name>.part` first and renaming it into place.
//!
//! Subsequent calls skip the network entirely.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ocrs_models::ensure_models;
//!
//! let models = ensure_models(Some(&|downloaded, total| {
//!     if let Some(t) = total {
//!         eprint!("\rDownloading models: {}/{} bytes", downloaded, t);
//!     }
//! })).expect("download failed");
//! println!("detection model: {}", models.detection.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `OCRS_MODEL_DIR`: directory holding both `.rten` files; skips download
//!   when both are present.
//! - `OCRS_MODELS_CACHE_DIR`: override the default cache directory.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Base URL of the public ocrs model bucket.
const BASE_URL: &str = "https://ocrs-models.s3-accelerate.amazonaws.com";

/// File name of the text detection model.
pub const DETECTION_MODEL: &str = "text-detection.rten";

/// File name of the text recognition model.
pub const RECOGNITION_MODEL: &str = "text-recognition.rten";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by ocrs-models operations.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Could not create or write into the local cache directory.
    #[error("Model cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Model download failed: {0}")]
    Download(String),
}

/// On-disk locations of both ocrs models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

impl ModelPaths {
    /// Paths of both models inside `dir`, whether or not they exist.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            detection: dir.join(DETECTION_MODEL),
            recognition: dir.join(RECOGNITION_MODEL),
        }
    }

    /// `true` when both files exist.
    pub fn exist(&self) -> bool {
        self.detection.exists() && self.recognition.exists()
    }
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Returns the cache directory for the ocrs models.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/doc2text/ocrs-models/`
/// - **Linux**: `~/.cache/doc2text/ocrs-models/`
/// - **Windows**: `%LOCALAPPDATA%\doc2text\ocrs-models\`
///
/// Override by setting `OCRS_MODELS_CACHE_DIR`.
pub fn models_cache_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var("OCRS_MODELS_CACHE_DIR") {
        return PathBuf::from(override_dir).join("ocrs-models");
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("doc2text").join("ocrs-models")
}

static RESOLVED_DIR: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns `true` if both models are already on disk, either in
/// `OCRS_MODEL_DIR` or in the cache directory.
pub fn are_models_cached() -> bool {
    cached_models().is_some()
}

/// Returns the model paths if both files are already on disk.
pub fn cached_models() -> Option<ModelPaths> {
    if let Ok(dir) = std::env::var("OCRS_MODEL_DIR") {
        let paths = ModelPaths::in_dir(Path::new(&dir));
        if paths.exist() {
            return Some(paths);
        }
    }
    let paths = ModelPaths::in_dir(&models_cache_dir());
    paths.exist().then_some(paths)
}

/// Ensures both ocrs models are present locally, downloading any that are
/// missing.
///
/// `on_progress` receives `(bytes_downloaded, total_size_option)` per file
/// during the download. Pass `None` to suppress progress callbacks.
///
/// Safe to call from multiple threads; the resolved directory is cached for
/// the lifetime of the process.
pub fn ensure_models(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<ModelPaths, ModelError> {
    if let Some(dir) = RESOLVED_DIR.get() {
        return Ok(ModelPaths::in_dir(dir));
    }

    let dir = resolve_or_download(on_progress)?;
    let _ = RESOLVED_DIR.set(dir.clone());

    Ok(ModelPaths::in_dir(&dir))
}

/// Ensures both models are present in an explicit directory.
///
/// Does not consult the environment or the process-wide cache.
pub fn ensure_models_in(
    dir: &Path,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<ModelPaths, ModelError> {
    std::fs::create_dir_all(dir).map_err(ModelError::CacheDir)?;
    for name in [DETECTION_MODEL, RECOGNITION_MODEL] {
        let dest = dir.join(name);
        if !dest.exists() {
            download_to(&model_url(name), &dest, on_progress)?;
        }
    }
    Ok(ModelPaths::in_dir(dir))
}

/// Public download URL of a model file.
pub fn model_url(name: &str) -> String {
    format!("{BASE_URL}/{name}")
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn resolve_or_download(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, ModelError> {
    // 1. Environment variable override.
    if let Ok(env_dir) = std::env::var("OCRS_MODEL_DIR") {
        let dir = PathBuf::from(env_dir);
        if ModelPaths::in_dir(&dir).exist() {
            return Ok(dir);
        }
        // Fall through: env var set but models missing → download into cache.
        eprintln!(
            "ocrs-models: OCRS_MODEL_DIR '{}' is missing model files; downloading …",
            dir.display()
        );
    }

    // 2. Cache directory, downloading whatever is missing.
    let dir = models_cache_dir();
    ensure_models_in(&dir, on_progress)?;
    Ok(dir)
}

/// Streams `url` into `dest`, calling `on_progress` every 64 KiB.
fn download_to(
    url: &str,
    dest: &Path,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<(), ModelError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("ocrs-models/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ModelError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| ModelError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(ModelError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let part = dest.with_extension("rten.part");
    let mut file = std::fs::File::create(&part).map_err(ModelError::CacheDir)?;

    let mut chunk = vec![0u8; 64 * 1024]; // 64 KiB
    let mut downloaded: u64 = 0;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                file.write_all(&chunk[..n]).map_err(ModelError::CacheDir)?;
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = std::fs::remove_file(&part);
                return Err(ModelError::Download(format!("Read error: {e}")));
            }
        }
    }

    file.flush().map_err(ModelError::CacheDir)?;
    drop(file);
    std::fs::rename(&part, dest).map_err(ModelError::CacheDir)?;

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
