//! Pustaka - Ask Questions About Documents
//!
//! A local-first tool for asking questions about PDF and Word documents,
//! in English or Kannada, by typing or speaking, with answers read aloud.
//!
//! The name "Pustaka" is the Kannada word for "book."
//!
//! # Overview
//!
//! Pustaka allows you to:
//! - Load a `.pdf` or `.docx` document and preview its text
//! - Ask questions and get answers grounded in the document
//! - Ask in Kannada; questions and answers are translated around an English pipeline
//! - Transcribe a spoken question and hear the answer, with stop at any time
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `ingest` - Text extraction from uploaded documents
//! - `chunking` - Splitting text into overlapping chunks
//! - `embedding` - Embedding generation
//! - `vector_store` - Per-document similarity search
//! - `llm` - Chat model access
//! - `rag` - Retrieval, prompting and translation
//! - `voice` - Speech-to-text and interruptible text-to-speech
//! - `session` - One user's loaded document, language and playback
//!
//! # Example
//!
//! ```rust,no_run
//! use pustaka::config::Settings;
//! use pustaka::ingest::UploadedDocument;
//! use pustaka::session::Session;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut session = Session::from_settings(&settings)?;
//!
//!     let upload = UploadedDocument::from_path(Path::new("guide.pdf")).await?;
//!     session.load_document(upload).await?;
//!
//!     if let Some(answer) = session.ask("What is this document about?").await? {
//!         println!("{}", answer.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod language;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod session;
pub mod vector_store;
pub mod voice;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{PustakaError, Result};
