//! PDF extraction through Poppler's `pdftotext`.

use super::{DocumentLoader, ExtractedRecord};
use crate::error::{PustakaError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Page separator emitted by `pdftotext`.
const FORM_FEED: char = '\u{000C}';

/// Extracts one record per non-blank page.
pub struct PdftotextLoader {
    binary: PathBuf,
}

impl PdftotextLoader {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl DocumentLoader for PdftotextLoader {
    #[instrument(skip(self), fields(binary = %self.binary.display()))]
    async fn load(&self, path: &Path, source: &str) -> Result<Vec<ExtractedRecord>> {
        let output = tokio::process::Command::new(&self.binary)
            .args(["-enc", "UTF-8"])
            .arg(path)
            .arg("-")
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PustakaError::ToolNotFound(format!(
                        "{} (set POPPLER_PATH to the Poppler bin directory)",
                        self.binary.display()
                    ))
                } else {
                    PustakaError::Extraction(format!("Failed to run pdftotext: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PustakaError::ToolFailed(format!(
                "pdftotext exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let pages = split_pages(&text, source);
        debug!("pdftotext produced {} non-blank pages", pages.len());
        Ok(pages)
    }
}

/// Split `pdftotext` output into per-page records, skipping blank pages.
pub fn split_pages(output: &str, source: &str) -> Vec<ExtractedRecord> {
    output
        .split(FORM_FEED)
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| ExtractedRecord::new(source, i + 1, page.trim()))
        .collect()
}
