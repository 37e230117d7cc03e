//! Speech-to-text through an OpenAI-compatible transcription endpoint.

use crate::config::Settings;
use crate::error::{PustakaError, Result};
use crate::language::InteractionLanguage;
use crate::openai::create_client_with_timeout;
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Trait for transcription services.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an in-memory recording spoken in `language`.
    async fn transcribe_bytes(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        language: InteractionLanguage,
    ) -> Result<String>;

    /// Transcribe an audio file spoken in `language`.
    async fn transcribe_file(&self, audio_path: &Path, language: InteractionLanguage) -> Result<String> {
        let bytes = tokio::fs::read(audio_path).await?;
        let filename = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();
        self.transcribe_bytes(&filename, bytes, language).await
    }
}

/// Whisper-compatible transcriber, e.g. a local faster-whisper server.
pub struct WhisperSpeechToText {
    client: Client<OpenAIConfig>,
    model: String,
}

impl WhisperSpeechToText {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::with_config(
            &settings.voice.stt_base_url,
            &settings.voice.stt_model,
            Duration::from_secs(settings.llm.timeout_secs),
        )
    }

    pub fn with_config(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(base_url, timeout)?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl SpeechToText for WhisperSpeechToText {
    #[instrument(skip(self, bytes), fields(filename = %filename, bytes = bytes.len(), language = language.code()))]
    async fn transcribe_bytes(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        language: InteractionLanguage,
    ) -> Result<String> {
        if bytes.is_empty() {
            return Err(PustakaError::InvalidInput("audio recording is empty".to_string()));
        }

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(filename.to_string(), bytes))
            .model(&self.model)
            .language(language.code())
            .build()
            .map_err(|e| PustakaError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| PustakaError::Transcription(format!("Whisper API error: {}", e)))?;

        let text = response.text.trim().to_string();
        debug!("Transcribed {} characters", text.chars().count());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_recording_is_rejected() {
        let stt = WhisperSpeechToText::from_settings(&Settings::default()).unwrap();
        let result = stt
            .transcribe_bytes("question.wav", Vec::new(), InteractionLanguage::Kannada)
            .await;
        assert!(matches!(result, Err(PustakaError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let stt = WhisperSpeechToText::from_settings(&Settings::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = stt
            .transcribe_file(&dir.path().join("missing.wav"), InteractionLanguage::English)
            .await;
        assert!(matches!(result, Err(PustakaError::Io(_))));
    }

    #[test]
    fn test_transcribe_file_reads_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("question.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let stt = crate::test_support::FixedTranscript("hello".to_string());
        let text = tokio_test::block_on(stt.transcribe_file(&path, InteractionLanguage::English));
        assert_eq!(text.unwrap(), "hello");
    }
}
