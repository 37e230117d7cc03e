//! Configuration module for Pustaka.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, TranslationPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, IngestSettings, LlmSettings,
    PromptSettings, RagSettings, Settings, VoiceSettings, POPPLER_PATH_ENV,
};
