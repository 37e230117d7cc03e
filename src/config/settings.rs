//! Configuration settings for Pustaka.

use crate::error::{PustakaError, Result};
use crate::language::InteractionLanguage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable naming the directory of the Poppler helper binaries.
pub const POPPLER_PATH_ENV: &str = "POPPLER_PATH";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub ingest: IngestSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub rag: RagSettings,
    pub voice: VoiceSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralSettings {
    /// Private directory for uploaded documents while they are extracted.
    pub temp_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/pustaka".to_string(),
        }
    }
}

/// Document ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestSettings {
    /// Directory containing `pdftotext`. Overridden by `POPPLER_PATH`.
    pub poppler_path: Option<String>,
    /// Maximum characters shown in the document preview.
    pub preview_chars: usize,
    /// Number of leading records included in the preview.
    pub preview_records: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            poppler_path: None,
            preview_chars: 1000,
            preview_records: 2,
        }
    }
}

/// Text chunking settings. Sizes are in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingSettings {
    /// OpenAI-compatible endpoint. Falls back to `llm.base_url` when unset.
    pub base_url: Option<String>,
    /// Multilingual embedding model.
    pub model: String,
    /// Texts per embedding request.
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "paraphrase-multilingual".to_string(),
            batch_size: 64,
        }
    }
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSettings {
    /// OpenAI-compatible endpoint of the local model runtime.
    pub base_url: String,
    /// Chat model name.
    pub model: String,
    /// Sampling temperature. Zero keeps answers deterministic.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3.1".to_string(),
            temperature: 0.0,
            timeout_secs: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Retrieval-grounded answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RagSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Interaction language used when none is chosen.
    pub default_language: InteractionLanguage,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            default_language: InteractionLanguage::English,
        }
    }
}

/// Voice input and spoken answer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoiceSettings {
    /// OpenAI-compatible speech-to-text endpoint.
    pub stt_base_url: String,
    /// Speech-to-text model.
    pub stt_model: String,
    /// Offline speech synthesizer executable (espeak-ng compatible flags).
    pub tts_command: String,
    /// Optional synthesizer voice; defaults to the interaction language code.
    pub tts_voice: Option<String>,
    /// Speaking rate in words per minute.
    pub rate: u32,
    /// Volume between 0.0 and 1.0.
    pub volume: f32,
    /// How often the playback loop checks the stop signal.
    pub poll_interval_ms: u64,
    /// Attempts per utterance before playback is abandoned.
    pub max_attempts: u32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stt_base_url: "http://localhost:8000/v1".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_command: "espeak-ng".to_string(),
            tts_voice: None,
            rate: 150,
            volume: 0.9,
            poll_interval_ms: 50,
            max_attempts: 2,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of the file.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = Self::load_file(&config_path)?;
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Load exactly what the file says, without environment overrides.
    ///
    /// Use this before saving so overrides never leak into the file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let settings = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Apply overrides from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(POPPLER_PATH_ENV) {
            if !path.is_empty() {
                self.ingest.poppler_path = Some(path);
            }
        }
    }

    /// Reject settings that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(PustakaError::Config("chunking.chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(PustakaError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(PustakaError::Config("rag.top_k must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.voice.volume) {
            return Err(PustakaError::Config("voice.volume must be between 0.0 and 1.0".to_string()));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PustakaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Set a value by dotted key (e.g. `llm.model`), keeping the field's type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = key
            .split_once('.')
            .ok_or_else(|| PustakaError::Config(format!("Expected section.key, got '{}'", key)))?;

        let mut root = toml::Value::try_from(&*self)
            .map_err(|e| PustakaError::Config(e.to_string()))?;

        let table = root
            .get_mut(section)
            .and_then(|v| v.as_table_mut())
            .ok_or_else(|| PustakaError::Config(format!("Unknown section: {}", section)))?;

        let new_value = match table.get(field) {
            Some(toml::Value::Integer(_)) => value
                .parse::<i64>()
                .map(toml::Value::Integer)
                .map_err(|_| PustakaError::Config(format!("{} expects an integer", key)))?,
            Some(toml::Value::Float(_)) => value
                .parse::<f64>()
                .map(toml::Value::Float)
                .map_err(|_| PustakaError::Config(format!("{} expects a number", key)))?,
            Some(toml::Value::Boolean(_)) => value
                .parse::<bool>()
                .map(toml::Value::Boolean)
                .map_err(|_| PustakaError::Config(format!("{} expects true or false", key)))?,
            // Strings and unset options.
            _ => toml::Value::String(value.to_string()),
        };
        table.insert(field.to_string(), new_value);

        let updated: Settings = root
            .try_into()
            .map_err(|e: toml::de::Error| PustakaError::Config(format!("{}: {}", key, e)))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pustaka")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Path of the `pdftotext` helper, honouring `POPPLER_PATH`.
    pub fn pdftotext_path(&self) -> PathBuf {
        match &self.ingest.poppler_path {
            Some(dir) => Self::expand_path(dir).join("pdftotext"),
            None => PathBuf::from("pdftotext"),
        }
    }

    /// Endpoint used for embeddings.
    pub fn embedding_base_url(&self) -> &str {
        self.embedding.base_url.as_deref().unwrap_or(&self.llm.base_url)
    }
}
