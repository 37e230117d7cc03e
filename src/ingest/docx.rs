//! Word (.docx) extraction.
//!
//! A .docx file is a zip archive; the body text lives in `word/document.xml`.

use super::{DocumentLoader, ExtractedRecord};
use crate::error::{PustakaError, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;
use tracing::instrument;

const DOCUMENT_XML: &str = "word/document.xml";

/// Extracts the document body as a single record.
#[derive(Default)]
pub struct DocxLoader;

impl DocxLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for DocxLoader {
    #[instrument(skip(self))]
    async fn load(&self, path: &Path, source: &str) -> Result<Vec<ExtractedRecord>> {
        let path = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || extract_docx_text(&path))
            .await
            .map_err(|e| PustakaError::Extraction(format!("Word extraction task failed: {}", e)))??;

        Ok(vec![ExtractedRecord::new(source, 1, text)])
    }
}

fn extract_docx_text(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut xml = String::new();
    match archive.by_name(DOCUMENT_XML) {
        Ok(mut entry) => {
            entry.read_to_string(&mut xml)?;
        }
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(PustakaError::Extraction(format!(
                "{} is missing; not a Word document",
                DOCUMENT_XML
            )));
        }
        Err(e) => return Err(e.into()),
    }

    docx_xml_to_text(&xml)
}

/// Convert WordprocessingML to plain text. Paragraphs are separated by a
/// blank line, line breaks by a newline.
pub fn docx_xml_to_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out.trim_end().to_string())
}
