//! Conversion entry points: extract with every configured method, then
//! export the selected method's text.
//!
//! Stages run strictly in order: primary engine, secondary engine, export.
//! A failing engine is recorded in its [`EngineResult`] and never affects the
//! other; the conversion only fails when the *selected* engine fails.

use crate::config::{OcrMethod, PipelineConfig};
use crate::engine::EngineSet;
use crate::error::{Doc2TextError, ExtractionError};
use crate::export::export;
use crate::extract::{extract_blocking, ExtractOptions};
use crate::output::{ConversionOutput, ConversionStats, DocumentInfo, EngineResult};
use crate::pipeline::input::{self, FileCategory, UploadedFile};
use crate::pipeline::render;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert an uploaded file with the default engines for `config`.
///
/// # Returns
/// `Ok(ConversionOutput)` when the selected engine succeeded, even if the
/// other engine failed (check `output.results`).
///
/// # Errors
/// - `UnsupportedFormat` for files outside png/jpg/jpeg/pdf/docx/xlsx
/// - `Extraction` when the selected engine failed
/// - `ExportEncoding` when the export container could not be built
pub async fn convert(file: &UploadedFile, config: &PipelineConfig) -> Result<ConversionOutput, Doc2TextError> {
    let engines = EngineSet::from_config(config);
    convert_with_engines(file, config, &engines).await
}

/// Like [`convert`], with caller-supplied engines.
pub async fn convert_with_engines(
    file: &UploadedFile,
    config: &PipelineConfig,
    engines: &EngineSet,
) -> Result<ConversionOutput, Doc2TextError> {
    let total_start = Instant::now();

    if file.category() == FileCategory::Unsupported {
        return Err(Doc2TextError::UnsupportedFormat {
            name: file.name().to_string(),
        });
    }

    info!(
        "Starting conversion: '{}' ({}, {} bytes)",
        file.name(),
        file.category(),
        file.len()
    );

    // ── Step 1: Extract with every configured method ─────────────────────
    let extraction_start = Instant::now();
    let to_run = config.methods_to_run();
    let mut results = Vec::with_capacity(OcrMethod::ALL.len());

    for method in OcrMethod::ALL {
        let engine_name = engines.get(method).name();
        if !to_run.contains(&method) {
            debug!("Skipping {} engine", method);
            results.push(EngineResult::skipped(method, engine_name));
            continue;
        }

        let start = Instant::now();
        let outcome = run_method(file, method, engines, config).await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(text) => EngineResult::succeeded(method, engine_name, text, duration_ms),
            Err(e) => {
                warn!("{} engine ({}) failed on '{}': {}", method, engine_name, file.name(), e);
                EngineResult::failed(method, engine_name, e, duration_ms)
            }
        };
        results.push(result);
    }
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;

    // ── Step 2: Pick the selected method's text ──────────────────────────
    let selected = config.ocr_method;
    let text = match results.iter().find(|r| r.method == selected) {
        Some(EngineResult { error: Some(e), .. }) => {
            return Err(Doc2TextError::Extraction {
                method: selected,
                source: e.clone(),
            })
        }
        Some(r) if !r.skipped => r.text.clone(),
        _ => {
            return Err(Doc2TextError::Internal(format!(
                "selected method '{}' did not run",
                selected
            )))
        }
    };

    // ── Step 3: Export ───────────────────────────────────────────────────
    let export_start = Instant::now();
    let exported = export(&text, config.save_format)?;
    let export_duration_ms = export_start.elapsed().as_millis() as u64;

    let stats = ConversionStats {
        input_bytes: file.len(),
        engines_run: results.iter().filter(|r| !r.skipped).count(),
        engines_failed: results.iter().filter(|r| r.error.is_some()).count(),
        output_bytes: exported.bytes.len(),
        extraction_duration_ms,
        export_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: '{}' → {} ({} bytes), {}ms total",
        file.name(),
        exported.format,
        stats.output_bytes,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        file_name: file.name().to_string(),
        category: file.category(),
        results,
        selected_method: selected,
        text,
        export: exported,
        stats,
    })
}

/// Run one method on a blocking thread.
///
/// The outer `Result` is fatal (the task itself died); the inner one is the
/// engine's own outcome.
async fn run_method(
    file: &UploadedFile,
    method: OcrMethod,
    engines: &EngineSet,
    config: &PipelineConfig,
) -> Result<Result<String, ExtractionError>, Doc2TextError> {
    let file = file.clone();
    let engines = engines.clone();
    let progress = config.progress_callback.clone();
    let options = ExtractOptions {
        max_rendered_pixels: config.max_rendered_pixels,
    };

    tokio::task::spawn_blocking(move || extract_blocking(&file, method, &engines, options, progress.as_ref()))
        .await
        .map_err(|e| Doc2TextError::Internal(format!("{} extraction task panicked: {}", method, e)))
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(file: &UploadedFile, config: &PipelineConfig) -> Result<ConversionOutput, Doc2TextError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Doc2TextError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(file, config))
}

/// Convert in-memory bytes declared under `name`.
///
/// The name's extension decides the category, exactly as for an upload.
pub async fn convert_bytes(
    name: &str,
    bytes: impl Into<std::sync::Arc<[u8]>>,
    config: &PipelineConfig,
) -> Result<ConversionOutput, Doc2TextError> {
    let file = UploadedFile::accept(name, bytes)?;
    convert(&file, config).await
}

/// Convert a local file or HTTP/HTTPS URL.
pub async fn convert_input(input: impl AsRef<str>, config: &PipelineConfig) -> Result<ConversionOutput, Doc2TextError> {
    let file = input::resolve_input(input.as_ref(), config.download_timeout_secs).await?;
    convert(&file, config).await
}

/// Convert a file or URL and write the export to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ConversionOutput, Doc2TextError> {
    let output = convert_input(input, config).await?;
    write_atomic(output_path.as_ref(), &output.export.bytes).await?;
    Ok(output)
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Doc2TextError> {
    let write_failed = |e: std::io::Error| Doc2TextError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_failed)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Describe an input without running OCR.
///
/// For PDFs the page count is read through pdfium when it is available.
/// URL inputs are downloaded with `config.download_timeout_secs`.
pub async fn inspect(input: impl AsRef<str>, config: &PipelineConfig) -> Result<DocumentInfo, Doc2TextError> {
    let file = input::resolve_input(input.as_ref(), config.download_timeout_secs).await?;
    Ok(describe(&file).await)
}

/// Describe an already-accepted file.
pub async fn describe(file: &UploadedFile) -> DocumentInfo {
    let page_count = if file.category() == FileCategory::Pdf {
        let bytes = file.clone();
        match tokio::task::spawn_blocking(move || render::page_count(bytes.bytes())).await {
            Ok(Ok(n)) => Some(n),
            Ok(Err(e)) => {
                warn!("Could not count pages of '{}': {}", file.name(), e);
                None
            }
            Err(e) => {
                warn!("Page count task failed: {}", e);
                None
            }
        }
    } else {
        None
    };

    DocumentInfo {
        name: file.name().to_string(),
        category: file.category(),
        size_bytes: file.len(),
        uses_ocr: file.category().uses_ocr(),
        page_count,
    }
}
