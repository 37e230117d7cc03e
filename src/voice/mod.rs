//! Voice input and spoken answers.
//!
//! Speech-to-text goes to an OpenAI-compatible transcription endpoint.
//! Playback runs an offline synthesizer on a dedicated thread that checks a
//! [`StopSignal`] between polls.

mod espeak;
mod playback;
mod stt;

pub use espeak::EspeakEngine;
pub use playback::{
    split_utterances, PlaybackConfig, PlaybackOutcome, PlaybackState, Speaker, StopSignal,
};
pub use stt::{SpeechToText, WhisperSpeechToText};

use crate::error::Result;
use crate::language::InteractionLanguage;

/// Progress of one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceStatus {
    Running,
    Finished,
}

/// A piece of text being spoken.
pub trait Utterance: Send {
    /// Check progress without blocking. Errors when synthesis failed.
    fn poll(&mut self) -> Result<UtteranceStatus>;

    /// Stop speaking now.
    fn cancel(&mut self) -> Result<()>;
}

/// Trait for speech synthesizers.
pub trait SpeechEngine: Send + Sync {
    /// Start speaking `text` in `language` and return a handle to the running utterance.
    fn start(&self, text: &str, language: InteractionLanguage) -> Result<Box<dyn Utterance>>;
}
