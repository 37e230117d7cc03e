//! Offline speech synthesis with espeak-ng.

use super::{SpeechEngine, Utterance, UtteranceStatus};
use crate::config::Settings;
use crate::error::{PustakaError, Result};
use crate::language::InteractionLanguage;
use std::io::ErrorKind;
use std::process::{Child, Command, Stdio};
use tracing::debug;

/// Speaks through an espeak-ng compatible executable.
pub struct EspeakEngine {
    command: String,
    /// Fixed voice; otherwise the language code picks one.
    voice: Option<String>,
    rate: u32,
    amplitude: u32,
}

impl EspeakEngine {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.voice.tts_command,
            settings.voice.tts_voice.as_deref(),
            settings.voice.rate,
            settings.voice.volume,
        )
    }

    /// `volume` is in 0.0..=1.0 and maps onto espeak's 0..=200 amplitude scale at 100 per 1.0.
    pub fn new(command: &str, voice: Option<&str>, rate: u32, volume: f32) -> Self {
        Self {
            command: command.to_string(),
            voice: voice.map(str::to_string),
            rate,
            amplitude: (volume.clamp(0.0, 2.0) * 100.0).round() as u32,
        }
    }

    pub fn args(&self, text: &str, language: InteractionLanguage) -> Vec<String> {
        let voice = self
            .voice
            .clone()
            .unwrap_or_else(|| language.code().to_string());
        vec![
            "-v".to_string(),
            voice,
            "-s".to_string(),
            self.rate.to_string(),
            "-a".to_string(),
            self.amplitude.to_string(),
            "--".to_string(),
            text.to_string(),
        ]
    }
}

impl SpeechEngine for EspeakEngine {
    fn start(&self, text: &str, language: InteractionLanguage) -> Result<Box<dyn Utterance>> {
        debug!(language = language.code(), "Speaking {} characters", text.chars().count());
        let child = Command::new(&self.command)
            .args(self.args(text, language))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => PustakaError::ToolNotFound(self.command.clone()),
                _ => PustakaError::Speech(format!("Failed to start {}: {}", self.command, e)),
            })?;
        Ok(Box::new(ChildUtterance {
            child,
            command: self.command.clone(),
        }))
    }
}

struct ChildUtterance {
    child: Child,
    command: String,
}

impl Utterance for ChildUtterance {
    fn poll(&mut self) -> Result<UtteranceStatus> {
        match self.child.try_wait()? {
            None => Ok(UtteranceStatus::Running),
            Some(status) if status.success() => Ok(UtteranceStatus::Finished),
            Some(status) => Err(PustakaError::ToolFailed(format!(
                "{} exited with {}",
                self.command, status
            ))),
        }
    }

    fn cancel(&mut self) -> Result<()> {
        if self.child.try_wait()?.is_none() {
            self.child.kill()?;
        }
        self.child.wait()?;
        Ok(())
    }
}

impl Drop for ChildUtterance {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
