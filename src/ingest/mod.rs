//! Document ingestion: uploaded bytes in, extracted text records out.
//!
//! Uploads are written to a private temp file, handed to the loader selected
//! by file extension, and the temp file is removed whether or not extraction
//! succeeds.

mod docx;
mod pdf;

pub use docx::{docx_xml_to_text, DocxLoader};
pub use pdf::{split_pages, PdftotextLoader};

use crate::config::Settings;
use crate::error::{PustakaError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A file handed to Pustaka for question answering.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Original filename, including extension.
    pub filename: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read a document from disk.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PustakaError::InvalidInput(format!("Not a file: {}", path.display())))?
            .to_string();
        Ok(Self { filename, bytes })
    }

    /// Lowercase extension of the original filename (empty when absent).
    pub fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }

    /// Identity of this upload, used to skip re-indexing an unchanged file.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.filename.hash(&mut hasher);
        self.bytes.hash(&mut hasher);
        hasher.finish()
    }
}

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Resolve a format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
        }
    }
}

/// One unit of extracted text: a PDF page, or a whole Word document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Filename the text came from.
    pub source: String,
    /// Page number (PDF, 1-based) or record order.
    pub index: usize,
    /// Extracted text.
    pub text: String,
}

impl ExtractedRecord {
    pub fn new(source: impl Into<String>, index: usize, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            index,
            text: text.into(),
        }
    }
}

/// Trait for format-specific text extraction.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Extract records from a file on disk. `source` is the original filename.
    async fn load(&self, path: &Path, source: &str) -> Result<Vec<ExtractedRecord>>;
}

/// Writes uploads to a temp file and dispatches to the right loader.
pub struct Ingestor {
    temp_dir: PathBuf,
    pdf: Arc<dyn DocumentLoader>,
    docx: Arc<dyn DocumentLoader>,
}

impl Ingestor {
    /// Create an ingestor using `pdftotext` and the built-in Word reader.
    pub fn new(settings: &Settings) -> Self {
        Self::with_loaders(
            settings.temp_dir(),
            Arc::new(PdftotextLoader::new(settings.pdftotext_path())),
            Arc::new(DocxLoader::new()),
        )
    }

    /// Create an ingestor with custom loaders.
    pub fn with_loaders(
        temp_dir: PathBuf,
        pdf: Arc<dyn DocumentLoader>,
        docx: Arc<dyn DocumentLoader>,
    ) -> Self {
        Self { temp_dir, pdf, docx }
    }

    fn loader_for(&self, kind: DocumentKind) -> &Arc<dyn DocumentLoader> {
        match kind {
            DocumentKind::Pdf => &self.pdf,
            DocumentKind::Docx => &self.docx,
        }
    }

    /// Extract text records from an upload.
    ///
    /// Fails with `UnsupportedDocument` for extensions other than pdf and docx.
    #[instrument(skip(self, upload), fields(filename = %upload.filename, bytes = upload.bytes.len()))]
    pub async fn ingest(&self, upload: &UploadedDocument) -> Result<Vec<ExtractedRecord>> {
        let extension = upload.extension();
        let kind = DocumentKind::from_extension(&extension)
            .ok_or_else(|| PustakaError::UnsupportedDocument(extension.clone()))?;

        std::fs::create_dir_all(&self.temp_dir)?;
        let mut temp_file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", kind.extension()))
            .tempfile_in(&self.temp_dir)
            .map_err(|e| PustakaError::Ingest(format!("Failed to create temp file: {}", e)))?;

        temp_file.write_all(&upload.bytes)?;
        temp_file.flush()?;
        debug!("Wrote upload to {}", temp_file.path().display());

        let result = self
            .loader_for(kind)
            .load(temp_file.path(), &upload.filename)
            .await;

        // Removed on both paths; dropping the handle would also delete it.
        if let Err(e) = temp_file.close() {
            warn!("Failed to remove temp file: {}", e);
        }

        let records: Vec<ExtractedRecord> = result?
            .into_iter()
            .filter(|r| !r.text.trim().is_empty())
            .collect();

        if records.is_empty() {
            return Err(PustakaError::Extraction(format!(
                "No text found in {}",
                upload.filename
            )));
        }

        info!("Extracted {} records from {}", records.len(), upload.filename);
        Ok(records)
    }
}

/// Join the leading records and cap the result, appending an ellipsis marker.
pub fn preview(records: &[ExtractedRecord], max_records: usize, max_chars: usize) -> String {
    let joined = records
        .iter()
        .take(max_records)
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let truncated: String = joined.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Loader that records the path it saw and returns a canned result.
    struct FakeLoader {
        seen: Mutex<Option<PathBuf>>,
        fail: bool,
    }

    impl FakeLoader {
        fn new(fail: bool) -> Self {
            Self {
                seen: Mutex::new(None),
                fail,
            }
        }
    }

    #[async_trait]
    impl DocumentLoader for FakeLoader {
        async fn load(&self, path: &Path, source: &str) -> Result<Vec<ExtractedRecord>> {
            assert!(path.exists());
            *self.seen.lock().unwrap() = Some(path.to_path_buf());
            if self.fail {
                return Err(PustakaError::Extraction("corrupt file".to_string()));
            }
            let text = std::fs::read_to_string(path)?;
            Ok(vec![ExtractedRecord::new(source, 1, text)])
        }
    }

    fn ingestor(dir: &Path, loader: Arc<FakeLoader>) -> Ingestor {
        Ingestor::with_loaders(dir.to_path_buf(), loader.clone(), loader)
    }

    #[test]
    fn test_document_kind_from_extension() {
        assert_eq!(DocumentKind::from_extension("PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_extension("docx"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_extension("txt"), None);
        assert_eq!(UploadedDocument::new("Report.Final.DOCX", vec![]).extension(), "docx");
        assert_eq!(UploadedDocument::new("README", vec![]).extension(), "");
    }

    #[tokio::test]
    async fn test_ingest_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Arc::new(FakeLoader::new(false));
        let ingestor = ingestor(dir.path(), loader.clone());

        let upload = UploadedDocument::new("notes.pdf", b"The capital of France is Paris.".to_vec());
        let records = ingestor.ingest(&upload).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "notes.pdf");
        assert_eq!(records[0].text, "The capital of France is Paris.");

        let seen = loader.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.extension().unwrap(), "pdf");
        assert!(!seen.exists());
    }

    #[tokio::test]
    async fn test_ingest_removes_temp_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Arc::new(FakeLoader::new(true));
        let ingestor = ingestor(dir.path(), loader.clone());

        let upload = UploadedDocument::new("broken.docx", b"garbage".to_vec());
        let result = ingestor.ingest(&upload).await;

        assert!(matches!(result, Err(PustakaError::Extraction(_))));
        let seen = loader.seen.lock().unwrap().clone().unwrap();
        assert!(!seen.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_ingest_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Arc::new(FakeLoader::new(false));
        let ingestor = ingestor(dir.path(), loader.clone());

        let upload = UploadedDocument::new("notes.txt", b"plain text".to_vec());
        let result = ingestor.ingest(&upload).await;

        assert!(matches!(result, Err(PustakaError::UnsupportedDocument(ext)) if ext == "txt"));
        assert!(loader.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ingest_blank_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ingestor(dir.path(), Arc::new(FakeLoader::new(false)));

        let upload = UploadedDocument::new("empty.pdf", b"   \n".to_vec());
        assert!(matches!(ingestor.ingest(&upload).await, Err(PustakaError::Extraction(_))));
    }

    #[test]
    fn test_preview_takes_two_records_and_caps_length() {
        let records = vec![
            ExtractedRecord::new("a.docx", 1, "First paragraph."),
            ExtractedRecord::new("a.docx", 2, "Second paragraph."),
            ExtractedRecord::new("a.docx", 3, "Third paragraph."),
        ];
        assert_eq!(
            preview(&records, 2, 1000),
            "First paragraph.\n\nSecond paragraph...."
        );

        let long = vec![ExtractedRecord::new("b.pdf", 1, "ಕ".repeat(1500))];
        let shown = preview(&long, 2, 1000);
        assert_eq!(shown.chars().count(), 1003);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = UploadedDocument::new("a.pdf", b"one".to_vec());
        let b = UploadedDocument::new("a.pdf", b"one".to_vec());
        let c = UploadedDocument::new("a.pdf", b"two".to_vec());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
