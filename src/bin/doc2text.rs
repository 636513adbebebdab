//! CLI binary for edgequake-doc2text.
//!
//! A thin shim over the library crate: it reads one file or URL, runs both
//! OCR engines, prints their results side by side and writes the export of
//! the selected engine.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2text::convert::{describe, write_atomic};
use edgequake_doc2text::pipeline::input::resolve_input;
use edgequake_doc2text::{
    convert, ConversionOutput, ExportFormat, ExtractionProgressCallback, OcrMethod, PipelineConfig,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar, reset for each engine run.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn failed_pages(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    /// Clear the bar and report how many pages failed across all runs.
    fn finish(&self) {
        self.bar.finish_and_clear();
        let failed = self.failed_pages();
        if failed > 0 {
            eprintln!("{}  {}", red("✗"), red(&format!("{failed} page(s) failed")));
        }
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, method: OcrMethod, total_units: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len}  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total_units as u64);
        self.bar.set_position(0);
        self.bar.set_prefix(format!("{} ({})", method, method.engine_name()));
        self.bar.reset_elapsed();
    }

    fn on_page_start(&self, _method: OcrMethod, page_num: usize, _total: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, _method: OcrMethod, page_num: usize, total: usize, chars: usize) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{chars:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, _method: OcrMethod, page_num: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, method: OcrMethod, chars: usize) {
        self.bar.set_position(self.bar.length().unwrap_or(0));
        self.bar.println(format!(
            "{} {} ({}) extracted {}",
            cyan("◆"),
            method,
            method.engine_name(),
            dim(&format!("{chars} chars"))
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract text from a scan (both engines run, primary is exported)
  doc2text scan.png

  # Export the Tesseract result as a Word document
  doc2text invoice.pdf --ocr-method secondary --save-format docx -o invoice.docx

  # Spreadsheet to PDF
  doc2text report.xlsx --save-format pdf -o report.pdf

  # Only run the selected engine
  doc2text --single-engine scan.jpg

  # Describe the input without running OCR
  doc2text --inspect-only contract.pdf

  # JSON output with both engine results
  doc2text --json scan.jpeg > result.json

SUPPORTED INPUTS:
  png, jpg, jpeg   OCR on the image
  pdf              every page rasterised (pdfium) then OCR
  docx             paragraph text (no OCR)
  xlsx             first sheet as a text table (no OCR)

ENGINES:
  primary    ocrs       pure Rust; models (~12 MB) downloaded on first use
  secondary  tesseract  requires the `tesseract` binary

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Directory or file of libpdfium
  OCRS_MODEL_DIR          Directory with text-detection.rten / text-recognition.rten
  OCRS_MODELS_CACHE_DIR   Override the ocrs model cache directory
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Extract text from images, PDFs, DOCX and XLSX files and export it.
#[derive(Parser, Debug)]
#[command(
    name = "doc2text",
    version,
    about = "Extract text from images, PDFs, DOCX and XLSX files with two OCR engines",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path or HTTP/HTTPS URL.
    input: String,

    /// Write the export to this file. Without it, txt goes to stdout and
    /// docx/pdf go to `result.<ext>`.
    #[arg(short, long, env = "DOC2TEXT_OUTPUT")]
    output: Option<PathBuf>,

    /// Engine whose text is exported: primary (ocrs) or secondary (tesseract).
    #[arg(long, env = "DOC2TEXT_OCR_METHOD", default_value = "primary", value_parser = parse_method)]
    ocr_method: OcrMethod,

    /// Export format: txt, docx or pdf. Unknown values fall back to txt.
    #[arg(long, env = "DOC2TEXT_SAVE_FORMAT", default_value = "txt")]
    save_format: String,

    /// Run only the selected engine.
    #[arg(long, env = "DOC2TEXT_SINGLE_ENGINE")]
    single_engine: bool,

    /// Tesseract language code.
    #[arg(long, env = "DOC2TEXT_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract binary.
    #[arg(long, env = "DOC2TEXT_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Directory with the ocrs model files.
    #[arg(long, env = "DOC2TEXT_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Longest edge of rendered PDF pages, in pixels.
    #[arg(long, env = "DOC2TEXT_MAX_PIXELS", default_value_t = 2000,
          value_parser = clap::value_parser!(u32).range(100..))]
    max_pixels: u32,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOC2TEXT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the full result as JSON on stdout.
    #[arg(long, env = "DOC2TEXT_JSON")]
    json: bool,

    /// Describe the input only, no OCR.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOC2TEXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2TEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2TEXT_QUIET")]
    quiet: bool,
}

fn parse_method(s: &str) -> Result<OcrMethod, String> {
    OcrMethod::from_tag(s).ok_or_else(|| format!("unknown OCR method '{s}' (expected primary or secondary)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Resolve input (rejects unsupported extensions up front) ─────────
    let file = resolve_input(&cli.input, cli.download_timeout)
        .await
        .with_context(|| format!("Cannot read '{}'", cli.input))?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = describe(&file).await;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize file info")?
            );
        } else {
            println!("File:      {}", info.name);
            println!("Category:  {}", info.category);
            println!("Size:      {} bytes", info.size_bytes);
            println!("Uses OCR:  {}", info.uses_ocr);
            if let Some(pages) = info.page_count {
                println!("Pages:     {}", pages);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(&cli, progress.clone().map(|cb| cb as ProgressCallback))?;

    // ── Ensure ocrs models are available ─────────────────────────────────
    let primary_runs = config.methods_to_run().contains(&OcrMethod::Primary);
    if file.category().uses_ocr() && primary_runs && config.model_dir.is_none() {
        ensure_ocrs_models(cli.quiet).await?;
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert(&file, &config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let output = result.context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        print_engine_results(&output);
    }

    // ── Write export ─────────────────────────────────────────────────────
    let target = match (&cli.output, output.export.format) {
        (Some(path), _) => Some(path.clone()),
        (None, ExportFormat::Text) if !cli.json => None,
        (None, _) => Some(PathBuf::from(output.default_export_name())),
    };

    match target {
        Some(path) => {
            write_atomic(&path, &output.export.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} ({}) → {}  {}",
                    green("✔"),
                    output.selected_method,
                    output.export.format,
                    bold(&path.display().to_string()),
                    dim(&format!("{}ms", output.stats.total_duration_ms)),
                );
            }
        }
        None => {
            let stdout = io::stdout();
            let terminal = stdout.is_terminal();
            write_text_export(&mut stdout.lock(), &output.export.bytes, terminal)
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Write a txt export to stdout. Redirected output gets the export bytes
/// unchanged; a terminal also gets a final newline when the text lacks one.
fn write_text_export(out: &mut impl Write, bytes: &[u8], terminal: bool) -> io::Result<()> {
    out.write_all(bytes)?;
    if terminal && !bytes.is_empty() && !bytes.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .ocr_method(cli.ocr_method)
        .save_format(ExportFormat::from_tag(&cli.save_format))
        .compare_engines(!cli.single_engine)
        .max_rendered_pixels(cli.max_pixels)
        .language(cli.lang.clone())
        .tesseract_path(cli.tesseract.clone())
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref dir) = cli.model_dir {
        builder = builder.model_dir(dir.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Download the ocrs models on first use, with a byte progress bar.
async fn ensure_ocrs_models(quiet: bool) -> Result<()> {
    if ocrs_models::are_models_cached() {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| ocrs_models::ensure_models(None))
            .context("Failed to download ocrs models")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("OCR models");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        ocrs_models::ensure_models(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download ocrs models")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Both engines' results, selected one marked.
fn print_engine_results(output: &ConversionOutput) {
    eprintln!(
        "{} {}  {}",
        cyan("◆"),
        bold(&output.file_name),
        dim(&format!("({})", output.category))
    );

    for r in &output.results {
        let marker = if r.method == output.selected_method { "*" } else { " " };
        let header = format!("{marker} {} ({})", r.method, r.engine);

        if r.skipped {
            eprintln!("{}  {}", bold(&header), dim("skipped"));
        } else if let Some(ref e) = r.error {
            eprintln!("{}  {}", bold(&header), red(&e.to_string()));
        } else {
            eprintln!("{}  {}", bold(&header), dim(&format!("{}ms", r.duration_ms)));
            for line in r.text.lines() {
                eprintln!("    {line}");
            }
        }
    }
}
