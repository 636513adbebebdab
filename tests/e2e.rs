//! End-to-end integration tests for edgequake-doc2text.
//!
//! Office-document tests build their fixtures in memory and always run.
//! Tests that need libpdfium, the `tesseract` binary or the ocrs models are
//! gated behind the `E2E_ENABLED` environment variable so they do not run
//! in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=. cargo test --test e2e -- --nocapture

use docx_rs::{Docx, Paragraph, Run};
use edgequake_doc2text::pipeline::render::render_pages;
use edgequake_doc2text::{
    convert_bytes, convert_input, convert_to_file, export, inspect, Doc2TextError, ExportFormat, FileCategory,
    OcrEngine, OcrMethod, PipelineConfig, TesseractEngine,
};
use std::io::{Cursor, Write};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

fn docx_fixture(paragraphs: &[&str]) -> Vec<u8> {
    let mut doc = Docx::new();
    for p in paragraphs {
        doc = doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*p)));
    }
    let mut buf = Cursor::new(Vec::new());
    doc.build().pack(&mut buf).unwrap();
    buf.into_inner()
}

/// A one-sheet workbook:
///
/// | name  | qty |
/// | apple | 3   |
/// | fig   | 12  |
fn xlsx_fixture() -> Vec<u8> {
    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
</Types>"#;
    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;
    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;
    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#;
    const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
<si><t>name</t></si><si><t>qty</t></si><si><t>apple</t></si><si><t>fig</t></si>
</sst>"#;
    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<dimension ref="A1:B3"/>
<sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>3</v></c></row>
<row r="3"><c r="A3" t="s"><v>3</v></c><c r="B3"><v>12</v></c></row>
</sheetData>
</worksheet>"#;

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/sharedStrings.xml", SHARED_STRINGS),
        ("xl/worksheets/sheet1.xml", SHEET),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

// ── Office documents (no OCR, always run) ───────────────────────────────────

#[tokio::test]
async fn test_docx_paragraphs_extracted_for_both_methods() {
    let bytes = docx_fixture(&["Line A", "Line B"]);
    let out = convert_bytes("letter.docx", bytes, &PipelineConfig::default())
        .await
        .expect("docx conversion should succeed");

    assert_eq!(out.category, FileCategory::Docx);
    assert_eq!(out.text, "Line A\nLine B");
    assert_eq!(out.primary().unwrap().text, out.secondary().unwrap().text);
    assert_eq!(out.export.bytes, b"Line A\nLine B");
}

#[tokio::test]
async fn test_xlsx_first_sheet_as_table() {
    let out = convert_bytes("stock.xlsx", xlsx_fixture(), &PipelineConfig::default())
        .await
        .expect("xlsx conversion should succeed");

    assert_eq!(out.category, FileCategory::Xlsx);
    assert_eq!(out.text, " name qty\napple   3\n  fig  12");
}

#[tokio::test]
async fn test_uppercase_extension_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "LETTER.DOCX", &docx_fixture(&["Upper"]));

    let out = convert_input(path.to_str().unwrap(), &PipelineConfig::default())
        .await
        .unwrap();
    assert_eq!(out.text, "Upper");
}

#[tokio::test]
async fn test_csv_rejected_before_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "data.csv", b"a,b\n1,2\n");

    let err = convert_input(path.to_str().unwrap(), &PipelineConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Doc2TextError::UnsupportedFormat { ref name } if name == "data.csv"));
}

#[tokio::test]
async fn test_missing_file_reported() {
    let err = convert_input("/nonexistent/scan.png", &PipelineConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Doc2TextError::FileNotFound { .. }));
}

#[tokio::test]
async fn test_convert_to_file_writes_docx_export() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(&dir, "notes.docx", &docx_fixture(&["first", "second"]));
    let out_path = dir.path().join("out").join("notes.docx");

    let config = PipelineConfig::builder()
        .save_format(ExportFormat::Docx)
        .build()
        .unwrap();
    let out = convert_to_file(input.to_str().unwrap(), &out_path, &config)
        .await
        .unwrap();

    let written = std::fs::read(&out_path).unwrap();
    assert_eq!(written, out.export.bytes);
    assert!(written.starts_with(b"PK"));
    assert_eq!(
        edgequake_doc2text::pipeline::document::docx_paragraphs(&written).unwrap(),
        vec!["first\nsecond".to_string()]
    );
}

#[tokio::test]
async fn test_xlsx_to_pdf_export() {
    let config = PipelineConfig::builder().save_format(ExportFormat::Pdf).build().unwrap();
    let out = convert_bytes("stock.xlsx", xlsx_fixture(), &config).await.unwrap();
    assert_eq!(out.export.content_type, "application/pdf");
    assert!(out.export.bytes.starts_with(b"%PDF"));
}

#[test]
fn test_inspect_docx_without_runtime_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "memo.docx", &docx_fixture(&["x"]));

    let info = tokio_test::block_on(inspect(path.to_str().unwrap(), &PipelineConfig::default())).unwrap();
    assert_eq!(info.category, FileCategory::Docx);
    assert!(!info.uses_ocr);
    assert_eq!(info.page_count, None);
}

#[test]
fn test_result_json_serialisable() {
    let out = tokio_test::block_on(convert_bytes(
        "letter.docx",
        docx_fixture(&["JSON"]),
        &PipelineConfig::default(),
    ))
    .unwrap();

    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["category"], "docx");
    assert_eq!(json["selected_method"], "primary");
    assert_eq!(json["export"]["format"], "txt");
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
}

// ── OCR round trips (need pdfium, tesseract, ocrs models) ───────────────────

/// Render "HELLO WORLD" to a PDF, rasterise it and save the page as JPEG.
fn hello_world_jpeg() -> Vec<u8> {
    let pdf = export("HELLO WORLD", ExportFormat::Pdf).unwrap().bytes;
    let pages = render_pages(&pdf, 2000).expect("pdfium should render the page");
    assert_eq!(pages.len(), 1);

    let mut jpeg = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(pages[0].to_rgb8())
        .write_to(&mut jpeg, image::ImageFormat::Jpeg)
        .unwrap();
    jpeg.into_inner()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_hello_world_image_both_engines() {
    e2e_skip_unless_enabled!();
    if !TesseractEngine::default().is_available() {
        println!("SKIP: tesseract not installed");
        return;
    }

    let out = convert_bytes("sample.jpg", hello_world_jpeg(), &PipelineConfig::default())
        .await
        .expect("conversion should succeed");

    for method in OcrMethod::ALL {
        let r = out.result(method).unwrap();
        assert!(r.error.is_none(), "{method} failed: {:?}", r.error);
        let normalised = r.text.to_uppercase();
        assert!(
            normalised.contains("HELLO") && normalised.contains("WORLD"),
            "{method} ({}) read {:?}",
            r.engine,
            r.text
        );
        println!("{method} ({}): {:?} in {}ms", r.engine, r.text, r.duration_ms);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_multi_page_pdf_yields_one_segment_per_page() {
    e2e_skip_unless_enabled!();
    if !TesseractEngine::default().is_available() {
        println!("SKIP: tesseract not installed");
        return;
    }

    // 3 pages: PAGE 1 .. PAGE 3 on the first line of each.
    let lines: Vec<String> = (0..3)
        .flat_map(|p| {
            let mut page = vec![format!("PAGE {}", p + 1)];
            page.extend(std::iter::repeat(String::new()).take(26));
            page
        })
        .collect();
    let pdf = export(&lines.join("\n"), ExportFormat::Pdf).unwrap().bytes;

    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "three.pdf", &pdf);

    let info = inspect(path.to_str().unwrap(), &PipelineConfig::default()).await.unwrap();
    assert_eq!(info.page_count, Some(3));

    for method in OcrMethod::ALL {
        let config = PipelineConfig::builder()
            .ocr_method(method)
            .compare_engines(false)
            .build()
            .unwrap();
        let out = convert_input(path.to_str().unwrap(), &config).await.unwrap();

        let segments: Vec<&str> = out.text.split_terminator('\n').collect();
        assert_eq!(segments.len(), 3, "{method} got {:?}", out.text);
        for (i, seg) in segments.iter().enumerate() {
            assert!(seg.contains(&(i + 1).to_string()), "{method} page {} read {:?}", i + 1, seg);
        }
    }
}
