//! Error types for Pustaka.

use thiserror::Error;

/// Library-level error type for Pustaka operations.
#[derive(Error, Debug)]
pub enum PustakaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document ingestion failed: {0}")]
    Ingest(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Unsupported document type: .{0} (expected .pdf or .docx)")]
    UnsupportedDocument(String),

    #[error("Chunking failed: {0}")]
    Chunking(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Search index error: {0}")]
    Index(String),

    #[error("Language model error: {0}")]
    Model(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Speech synthesis failed: {0}")]
    Speech(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Pustaka operations.
pub type Result<T> = std::result::Result<T, PustakaError>;
