//! Input resolution: turn a user-supplied path, URL or byte buffer into an
//! [`UploadedFile`].
//!
//! The category that drives extraction is derived from the declared file
//! name's extension only. Unsupported names are rejected here, at the
//! boundary, with [`Doc2TextError::UnsupportedFormat`] so the extractor
//! never sees them.

use crate::error::Doc2TextError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Coarse file-type classification that selects the extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// `png`, `jpg`, `jpeg`
    Image,
    Pdf,
    Docx,
    Xlsx,
    Unsupported,
}

impl FileCategory {
    /// Classify a file name by its (case-insensitive) extension.
    pub fn from_name(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return FileCategory::Unsupported,
        };
        match ext.as_str() {
            "png" | "jpg" | "jpeg" => FileCategory::Image,
            "pdf" => FileCategory::Pdf,
            "docx" => FileCategory::Docx,
            "xlsx" => FileCategory::Xlsx,
            _ => FileCategory::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Pdf => "pdf",
            FileCategory::Docx => "docx",
            FileCategory::Xlsx => "xlsx",
            FileCategory::Unsupported => "unsupported",
        }
    }

    /// Whether extraction goes through an OCR engine (and thus depends on
    /// the chosen [`crate::config::OcrMethod`]).
    pub fn uses_ocr(&self) -> bool {
        matches!(self, FileCategory::Image | FileCategory::Pdf)
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An uploaded document: declared name, raw bytes and derived category.
///
/// Immutable once constructed. Cloning is cheap (the bytes are shared),
/// which lets the same upload be moved into a blocking task per engine.
#[derive(Clone)]
pub struct UploadedFile {
    name: String,
    bytes: Arc<[u8]>,
    category: FileCategory,
}

impl UploadedFile {
    /// Wrap bytes without checking the category.
    ///
    /// Extraction of an [`FileCategory::Unsupported`] file fails with
    /// [`crate::error::ExtractionError::UnsupportedFormat`]. Prefer
    /// [`UploadedFile::accept`] at an input boundary.
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let category = FileCategory::from_name(&name);
        Self {
            name,
            bytes: bytes.into(),
            category,
        }
    }

    /// Wrap bytes, rejecting names whose extension is not supported.
    pub fn accept(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Result<Self, Doc2TextError> {
        let file = Self::new(name, bytes);
        if file.category == FileCategory::Unsupported {
            return Err(Doc2TextError::UnsupportedFormat { name: file.name });
        }
        Ok(file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn category(&self) -> FileCategory {
        self.category
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a local path or HTTP/HTTPS URL into an accepted [`UploadedFile`].
///
/// The extension check happens before any bytes are read or downloaded.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<UploadedFile, Doc2TextError> {
    if input.trim().is_empty() {
        return Err(Doc2TextError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input)).await
    }
}

/// Read a local file, validating its extension first.
async fn resolve_local(path: &Path) -> Result<UploadedFile, Doc2TextError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Doc2TextError::InvalidInput {
            input: path.display().to_string(),
        })?;

    if FileCategory::from_name(&name) == FileCategory::Unsupported {
        return Err(Doc2TextError::UnsupportedFormat { name });
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Doc2TextError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Doc2TextError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    debug!("Resolved local file: {} ({} bytes)", path.display(), bytes.len());
    UploadedFile::accept(name, bytes)
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedFile, Doc2TextError> {
    let name = filename_from_url(url).ok_or_else(|| Doc2TextError::InvalidInput {
        input: url.to_string(),
    })?;
    if FileCategory::from_name(&name) == FileCategory::Unsupported {
        return Err(Doc2TextError::UnsupportedFormat { name });
    }

    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Doc2TextError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Doc2TextError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Doc2TextError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Doc2TextError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Doc2TextError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), name);
    UploadedFile::accept(name, bytes.to_vec())
}

/// Last non-empty path segment of a URL, if it has an extension.
fn filename_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if !last.is_empty() && last.contains('.') {
        Some(last.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/scan.png"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn categories_from_extension() {
        assert_eq!(FileCategory::from_name("scan.png"), FileCategory::Image);
        assert_eq!(FileCategory::from_name("photo.JPG"), FileCategory::Image);
        assert_eq!(FileCategory::from_name("photo.jpeg"), FileCategory::Image);
        assert_eq!(FileCategory::from_name("report.pdf"), FileCategory::Pdf);
        assert_eq!(FileCategory::from_name("letter.docx"), FileCategory::Docx);
        assert_eq!(FileCategory::from_name("sheet.XLSX"), FileCategory::Xlsx);
        assert_eq!(FileCategory::from_name("data.csv"), FileCategory::Unsupported);
        assert_eq!(FileCategory::from_name("README"), FileCategory::Unsupported);
        assert_eq!(FileCategory::from_name("archive.tar.gz"), FileCategory::Unsupported);
    }

    #[test]
    fn only_image_and_pdf_use_ocr() {
        assert!(FileCategory::Image.uses_ocr());
        assert!(FileCategory::Pdf.uses_ocr());
        assert!(!FileCategory::Docx.uses_ocr());
        assert!(!FileCategory::Xlsx.uses_ocr());
    }

    #[test]
    fn accept_rejects_csv() {
        let err = UploadedFile::accept("data.csv", b"a,b\n1,2".to_vec()).unwrap_err();
        assert!(matches!(err, Doc2TextError::UnsupportedFormat { ref name } if name == "data.csv"));
    }

    #[test]
    fn accept_keeps_bytes_and_category() {
        let file = UploadedFile::accept("sample.jpg", vec![1u8, 2, 3]).unwrap();
        assert_eq!(file.name(), "sample.jpg");
        assert_eq!(file.category(), FileCategory::Image);
        assert_eq!(file.bytes(), &[1, 2, 3]);
        assert_eq!(file.len(), 3);
    }

    #[test]
    fn filename_from_url_requires_extension() {
        assert_eq!(
            filename_from_url("https://example.com/files/scan.png?x=1"),
            Some("scan.png".to_string())
        );
        assert_eq!(filename_from_url("https://example.com/files/"), None);
        assert_eq!(filename_from_url("https://example.com/download"), None);
    }

    #[tokio::test]
    async fn resolve_local_rejects_unsupported_before_reading() {
        // The file does not exist: the extension check must fire first.
        let err = resolve_input("/definitely/missing/data.csv", 5).await.unwrap_err();
        assert!(matches!(err, Doc2TextError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn resolve_local_missing_file() {
        let err = resolve_input("/definitely/missing/scan.png", 5).await.unwrap_err();
        assert!(matches!(err, Doc2TextError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn resolve_local_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letter.docx");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let file = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(file.name(), "letter.docx");
        assert_eq!(file.category(), FileCategory::Docx);
        assert_eq!(file.bytes(), b"PK\x03\x04");
    }
}
