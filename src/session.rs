//! One user's working state: the loaded document, the chosen language, the
//! last answer and the speaker reading it aloud.

use crate::chunking::{Chunker, ChunkingConfig, RecursiveCharacterChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, LocalEmbedder};
use crate::error::{PustakaError, Result};
use crate::ingest::{preview, Ingestor, UploadedDocument};
use crate::language::InteractionLanguage;
use crate::llm::{ChatModel, LocalChatModel};
use crate::rag::{Answer, RagEngine};
use crate::vector_store::{IndexedDocument, SearchIndex};
use crate::voice::{
    EspeakEngine, PlaybackConfig, PlaybackOutcome, PlaybackState, Speaker, SpeechEngine,
    SpeechToText, WhisperSpeechToText,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Result of handing a file to the session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// The document was indexed and is ready for questions.
    Indexed {
        filename: String,
        preview: String,
        records: usize,
        chunks: usize,
        /// The same file was already loaded; its index was kept.
        reused: bool,
    },
    /// The extension is not .pdf or .docx. Nothing was indexed.
    Unsupported { extension: String },
}

/// The services a session talks to.
pub struct SessionComponents {
    pub ingestor: Ingestor,
    pub chunker: Arc<dyn Chunker>,
    pub embedder: Arc<dyn Embedder>,
    pub model: Arc<dyn ChatModel>,
    pub stt: Arc<dyn SpeechToText>,
    pub speech: Arc<dyn SpeechEngine>,
}

impl SessionComponents {
    /// The local services named in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            ingestor: Ingestor::new(settings),
            chunker: Arc::new(RecursiveCharacterChunker::new(ChunkingConfig::try_from(
                &settings.chunking,
            )?)),
            embedder: Arc::new(LocalEmbedder::from_settings(settings)?),
            model: Arc::new(LocalChatModel::from_settings(settings)?),
            stt: Arc::new(WhisperSpeechToText::from_settings(settings)?),
            speech: Arc::new(EspeakEngine::from_settings(settings)),
        })
    }
}

struct LoadedDocument {
    index: SearchIndex,
    preview: String,
}

/// Explicit session state.
pub struct Session {
    language: InteractionLanguage,
    ingestor: Ingestor,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    engine: RagEngine,
    stt: Arc<dyn SpeechToText>,
    speaker: Speaker,
    preview_records: usize,
    preview_chars: usize,
    document: Option<LoadedDocument>,
    last_answer: Option<Answer>,
}

impl Session {
    /// Create a session backed by the local services named in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let components = SessionComponents::from_settings(settings)?;
        Self::with_components(settings, components)
    }

    pub fn with_components(settings: &Settings, components: SessionComponents) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self {
            language: settings.rag.default_language,
            engine: RagEngine::new(
                components.embedder.clone(),
                components.model,
                prompts,
                settings.rag.top_k,
            ),
            ingestor: components.ingestor,
            chunker: components.chunker,
            embedder: components.embedder,
            stt: components.stt,
            speaker: Speaker::new(components.speech, PlaybackConfig::from(&settings.voice)),
            preview_records: settings.ingest.preview_records,
            preview_chars: settings.ingest.preview_chars,
            document: None,
            last_answer: None,
        })
    }

    pub fn language(&self) -> InteractionLanguage {
        self.language
    }

    pub fn set_language(&mut self, language: InteractionLanguage) {
        if language != self.language {
            info!("Interaction language set to {}", language);
        }
        self.language = language;
    }

    /// Retrieve this many chunks per question from now on.
    pub fn set_top_k(&mut self, top_k: usize) {
        self.engine.set_top_k(top_k);
    }

    /// The currently loaded document, if any.
    pub fn document(&self) -> Option<&IndexedDocument> {
        self.document.as_ref().map(|d| d.index.document())
    }

    /// Preview of the currently loaded document.
    pub fn preview(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.preview.as_str())
    }

    pub fn last_answer(&self) -> Option<&Answer> {
        self.last_answer.as_ref()
    }

    /// Extract, chunk and index an upload, replacing the current document.
    ///
    /// Re-uploading the same file keeps the existing index. An unsupported
    /// extension clears the current document.
    #[instrument(skip(self, upload), fields(filename = %upload.filename))]
    pub async fn load_document(&mut self, upload: UploadedDocument) -> Result<IngestOutcome> {
        let fingerprint = upload.fingerprint();

        if let Some(loaded) = &self.document {
            let current = loaded.index.document();
            if current.fingerprint == fingerprint && current.filename == upload.filename {
                debug!("Same file uploaded again; reusing index");
                return Ok(IngestOutcome::Indexed {
                    filename: current.filename.clone(),
                    preview: loaded.preview.clone(),
                    records: current.record_count,
                    chunks: current.chunk_count,
                    reused: true,
                });
            }
        }

        let records = match self.ingestor.ingest(&upload).await {
            Ok(records) => records,
            Err(PustakaError::UnsupportedDocument(extension)) => {
                warn!("Ignoring {}: unsupported extension", upload.filename);
                self.clear_document();
                return Ok(IngestOutcome::Unsupported { extension });
            }
            Err(e) => return Err(e),
        };

        let chunks = self.chunker.chunk(&records);
        let index = SearchIndex::build(
            &upload.filename,
            fingerprint,
            records.len(),
            chunks,
            self.embedder.as_ref(),
        )
        .await?;

        let preview = preview(&records, self.preview_records, self.preview_chars);
        let outcome = IngestOutcome::Indexed {
            filename: upload.filename.clone(),
            preview: preview.clone(),
            records: index.document().record_count,
            chunks: index.document().chunk_count,
            reused: false,
        };

        self.clear_document();
        self.document = Some(LoadedDocument { index, preview });
        Ok(outcome)
    }

    fn clear_document(&mut self) {
        self.speaker.stop();
        self.document = None;
        self.last_answer = None;
    }

    /// Answer a question about the loaded document in the current language.
    ///
    /// Returns `None` when the question is blank or no document is loaded.
    pub async fn ask(&mut self, question: &str) -> Result<Option<Answer>> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }
        let Some(loaded) = &self.document else {
            debug!("No document loaded; not answering");
            return Ok(None);
        };

        let answer = self
            .engine
            .answer(&loaded.index, question, self.language)
            .await?;
        self.last_answer = Some(answer.clone());
        Ok(Some(answer))
    }

    /// Transcribe a recorded question. Returns `None` when nothing was said.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<Option<String>> {
        let text = self.stt.transcribe_file(audio_path, self.language).await?;
        Ok(non_empty(text))
    }

    /// Transcribe a recorded question received as bytes.
    pub async fn transcribe_bytes(&self, filename: &str, bytes: Vec<u8>) -> Result<Option<String>> {
        let text = self
            .stt
            .transcribe_bytes(filename, bytes, self.language)
            .await?;
        Ok(non_empty(text))
    }

    /// Speak the last answer. Returns false when there is nothing to speak.
    pub fn hear(&mut self) -> Result<bool> {
        let Some(answer) = &self.last_answer else {
            return Ok(false);
        };
        let (text, language) = (answer.text.clone(), answer.language);
        self.speaker.hear(&text, language)?;
        Ok(true)
    }

    pub fn stop_hearing(&self) {
        self.speaker.stop();
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.speaker.state()
    }

    /// Block until the current playback ends.
    pub fn wait_for_playback(&mut self) -> Option<PlaybackOutcome> {
        self.speaker.wait()
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
