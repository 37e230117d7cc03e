//! Fakes for the crate's model and synthesizer traits.

use crate::embedding::Embedder;
use crate::error::{PustakaError, Result};
use crate::ingest::{split_pages, DocumentLoader, ExtractedRecord};
use crate::language::InteractionLanguage;
use crate::llm::{ChatMessage, ChatModel, ModelReply};
use crate::voice::{SpeechEngine, SpeechToText, Utterance, UtteranceStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Stands in for `pdftotext`: reads the file as UTF-8 text with form feeds between pages.
pub struct TextPdfLoader;

#[async_trait]
impl DocumentLoader for TextPdfLoader {
    async fn load(&self, path: &Path, source: &str) -> Result<Vec<ExtractedRecord>> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(split_pages(&content, source))
    }
}

/// A minimal .docx archive with one `w:p` per paragraph.
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Bag-of-words embedder: one dimension per vocabulary word.
pub struct KeywordEmbedder {
    pub vocabulary: Vec<&'static str>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
        }
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(self
            .vocabulary
            .iter()
            .map(|w| lower.matches(w).count() as f32)
            .collect())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn model(&self) -> &str {
        "keyword-test"
    }
}

/// Chat model that replays queued replies and records every conversation it receives.
#[derive(Default)]
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<Result<ModelReply>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(ModelReply::Text(text.to_string())))
    }

    pub fn raw(self, text: &str) -> Self {
        self.push(Ok(ModelReply::Raw(text.to_string())))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(PustakaError::Model(message.to_string())))
    }

    fn push(self, reply: Result<ModelReply>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Every conversation sent so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    /// The last message of each conversation sent so far.
    pub fn last_messages(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ModelReply> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PustakaError::Model("no scripted reply left".to_string())))
    }

    fn model(&self) -> &str {
        "scripted-test"
    }
}

/// Transcriber that always hears the same words.
pub struct FixedTranscript(pub String);

#[async_trait]
impl SpeechToText for FixedTranscript {
    async fn transcribe_bytes(
        &self,
        _filename: &str,
        _bytes: Vec<u8>,
        _language: InteractionLanguage,
    ) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// How a [`FakeEngine`] utterance behaves.
#[derive(Debug, Clone, Copy)]
pub enum FakeBehavior {
    /// Finishes after this many polls.
    FinishAfter(usize),
    /// Never finishes on its own.
    Endless,
    /// Fails to start.
    FailToStart,
    /// Starts, then exits unsuccessfully on the first poll.
    Crash,
}

/// Synthesizer that speaks nothing and records what it was asked to say.
#[derive(Clone)]
pub struct FakeEngine {
    behavior: FakeBehavior,
    pub spoken: Arc<Mutex<Vec<String>>>,
    pub starts: Arc<AtomicUsize>,
    pub cancelled: Arc<AtomicUsize>,
}

impl FakeEngine {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            spoken: Arc::new(Mutex::new(Vec::new())),
            starts: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct FakeUtterance {
    behavior: FakeBehavior,
    polls: usize,
    cancelled: Arc<AtomicUsize>,
}

impl Utterance for FakeUtterance {
    fn poll(&mut self) -> Result<UtteranceStatus> {
        self.polls += 1;
        match self.behavior {
            FakeBehavior::FinishAfter(n) if self.polls >= n => Ok(UtteranceStatus::Finished),
            FakeBehavior::Crash => Err(PustakaError::Speech("synthesizer crashed".to_string())),
            _ => Ok(UtteranceStatus::Running),
        }
    }

    fn cancel(&mut self) -> Result<()> {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl SpeechEngine for FakeEngine {
    fn start(&self, text: &str, _language: InteractionLanguage) -> Result<Box<dyn Utterance>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let FakeBehavior::FailToStart = self.behavior {
            return Err(PustakaError::ToolNotFound("fake-tts".to_string()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(Box::new(FakeUtterance {
            behavior: self.behavior,
            polls: 0,
            cancelled: self.cancelled.clone(),
        }))
    }
}
