//! Spoken playback of answers.
//!
//! ```text
//! Idle --hear--> Speaking --stop--> StopRequested --loop exits--> Idle
//!                   \------------- finished / aborted ------------/
//! ```

use super::{SpeechEngine, UtteranceStatus};
use crate::config::VoiceSettings;
use crate::error::Result;
use crate::language::InteractionLanguage;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cancellation flag shared between a [`Speaker`] and its playback thread.
///
/// Each playback gets a fresh signal, so stopping one never affects the next.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    raised: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

/// Where a [`Speaker`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Speaking,
    StopRequested,
}

/// How a playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Stopped,
    /// An utterance failed `max_attempts` times.
    Aborted,
}

/// Poll interval and retry bound for the playback loop.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            max_attempts: 2,
        }
    }
}

impl From<&VoiceSettings> for PlaybackConfig {
    fn from(voice: &VoiceSettings) -> Self {
        Self {
            poll_interval: Duration::from_millis(voice.poll_interval_ms.max(1)),
            max_attempts: voice.max_attempts.max(1),
        }
    }
}

/// Speaks text on a background thread, one playback at a time.
pub struct Speaker {
    engine: Arc<dyn SpeechEngine>,
    config: PlaybackConfig,
    signal: StopSignal,
    handle: Option<JoinHandle<PlaybackOutcome>>,
}

impl Speaker {
    pub fn new(engine: Arc<dyn SpeechEngine>, config: PlaybackConfig) -> Self {
        Self {
            engine,
            config,
            signal: StopSignal::new(),
            handle: None,
        }
    }

    /// Start speaking `text`, replacing any playback in progress.
    pub fn hear(&mut self, text: &str, language: InteractionLanguage) -> Result<()> {
        self.stop();
        self.wait();

        let utterances = split_utterances(text);
        if utterances.is_empty() {
            debug!("Nothing to speak");
            return Ok(());
        }

        self.signal = StopSignal::new();
        let signal = self.signal.clone();
        let engine = self.engine.clone();
        let config = self.config;

        let handle = thread::Builder::new()
            .name("pustaka-playback".to_string())
            .spawn(move || run_playback(engine.as_ref(), &utterances, language, &signal, config))?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Ask the current playback to stop. Takes effect within one poll interval.
    pub fn stop(&self) {
        if self.handle.is_some() {
            self.signal.raise();
        }
    }

    pub fn state(&self) -> PlaybackState {
        match &self.handle {
            Some(handle) if !handle.is_finished() => {
                if self.signal.is_raised() {
                    PlaybackState::StopRequested
                } else {
                    PlaybackState::Speaking
                }
            }
            _ => PlaybackState::Idle,
        }
    }

    /// Block until the current playback ends.
    pub fn wait(&mut self) -> Option<PlaybackOutcome> {
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                warn!("Playback thread panicked");
                Some(PlaybackOutcome::Aborted)
            }
        }
    }
}

impl Drop for Speaker {
    fn drop(&mut self) {
        self.stop();
        self.wait();
    }
}

fn run_playback(
    engine: &dyn SpeechEngine,
    utterances: &[String],
    language: InteractionLanguage,
    signal: &StopSignal,
    config: PlaybackConfig,
) -> PlaybackOutcome {
    for text in utterances {
        let mut attempt = 0;
        loop {
            if signal.is_raised() {
                info!("Playback stopped");
                return PlaybackOutcome::Stopped;
            }
            attempt += 1;
            match speak(engine, text, language, signal, config.poll_interval) {
                Ok(true) => break,
                Ok(false) => {
                    info!("Playback stopped");
                    return PlaybackOutcome::Stopped;
                }
                Err(e) => {
                    warn!(attempt, max_attempts = config.max_attempts, error = %e, "Speech synthesis failed");
                    if attempt >= config.max_attempts {
                        warn!("Giving up on playback after {} attempts", attempt);
                        return PlaybackOutcome::Aborted;
                    }
                }
            }
        }
    }
    PlaybackOutcome::Completed
}

/// Speak one utterance. Returns false when stopped before it finished.
fn speak(
    engine: &dyn SpeechEngine,
    text: &str,
    language: InteractionLanguage,
    signal: &StopSignal,
    poll_interval: Duration,
) -> Result<bool> {
    let mut utterance = engine.start(text, language)?;
    loop {
        if signal.is_raised() {
            if let Err(e) = utterance.cancel() {
                warn!(error = %e, "Failed to cancel utterance");
            }
            return Ok(false);
        }
        match utterance.poll()? {
            UtteranceStatus::Finished => return Ok(true),
            UtteranceStatus::Running => thread::sleep(poll_interval),
        }
    }
}

/// Split text into sentence-sized pieces for the synthesizer.
pub fn split_utterances(text: &str) -> Vec<String> {
    let Ok(sentence) = Regex::new(r"(?m)[^.!?।\n]+(?:[.!?।]+|$)") else {
        return vec![text.trim().to_string()];
    };
    sentence
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeBehavior, FakeEngine};
    use std::time::Instant;

    fn fast() -> PlaybackConfig {
        PlaybackConfig {
            poll_interval: Duration::from_millis(5),
            max_attempts: 2,
        }
    }

    #[test]
    fn test_split_utterances() {
        assert_eq!(
            split_utterances("Paris is the capital. Is it big? Yes!\nVery"),
            vec!["Paris is the capital.", "Is it big?", "Yes!", "Very"]
        );
        assert_eq!(split_utterances("ಪ್ಯಾರಿಸ್ ರಾಜಧಾನಿ। ಹೌದು"), vec!["ಪ್ಯಾರಿಸ್ ರಾಜಧಾನಿ।", "ಹೌದು"]);
        assert!(split_utterances("  \n ").is_empty());
    }

    #[test]
    fn test_speaks_every_sentence_then_idles() {
        let engine = FakeEngine::new(FakeBehavior::FinishAfter(2));
        let mut speaker = Speaker::new(Arc::new(engine.clone()), fast());

        speaker.hear("One. Two.", InteractionLanguage::English).unwrap();
        assert_eq!(speaker.wait(), Some(PlaybackOutcome::Completed));
        assert_eq!(speaker.state(), PlaybackState::Idle);
        assert_eq!(*engine.spoken.lock().unwrap(), vec!["One.", "Two."]);
    }

    #[test]
    fn test_stop_terminates_within_a_poll() {
        let engine = FakeEngine::new(FakeBehavior::Endless);
        let mut speaker = Speaker::new(
            Arc::new(engine.clone()),
            PlaybackConfig {
                poll_interval: Duration::from_millis(50),
                max_attempts: 2,
            },
        );

        speaker.hear("This never ends.", InteractionLanguage::English).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(speaker.state(), PlaybackState::Speaking);

        let stopped_at = Instant::now();
        speaker.stop();
        assert_eq!(speaker.wait(), Some(PlaybackOutcome::Stopped));
        assert!(stopped_at.elapsed() < Duration::from_millis(500));
        assert_eq!(engine.cancel_count(), 1);
        assert_eq!(speaker.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_stop_requested_state() {
        let engine = FakeEngine::new(FakeBehavior::Endless);
        let mut speaker = Speaker::new(
            Arc::new(engine),
            PlaybackConfig {
                poll_interval: Duration::from_millis(200),
                max_attempts: 1,
            },
        );
        speaker.hear("Long answer.", InteractionLanguage::English).unwrap();
        thread::sleep(Duration::from_millis(20));
        speaker.stop();
        assert_eq!(speaker.state(), PlaybackState::StopRequested);
        assert_eq!(speaker.wait(), Some(PlaybackOutcome::Stopped));
    }

    #[test]
    fn test_hear_after_stop_starts_fresh() {
        let engine = FakeEngine::new(FakeBehavior::Endless);
        let mut speaker = Speaker::new(Arc::new(engine.clone()), fast());

        speaker.hear("First.", InteractionLanguage::English).unwrap();
        thread::sleep(Duration::from_millis(20));
        speaker.stop();
        speaker.wait();

        speaker.hear("Second.", InteractionLanguage::English).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(speaker.state(), PlaybackState::Speaking);
        speaker.stop();
        assert_eq!(speaker.wait(), Some(PlaybackOutcome::Stopped));
        assert_eq!(engine.start_count(), 2);
    }

    #[test]
    fn test_failures_are_retried_then_aborted() {
        let engine = FakeEngine::new(FakeBehavior::Crash);
        let mut speaker = Speaker::new(Arc::new(engine.clone()), fast());

        speaker.hear("One. Two.", InteractionLanguage::English).unwrap();
        assert_eq!(speaker.wait(), Some(PlaybackOutcome::Aborted));
        assert_eq!(engine.start_count(), 2);
    }

    #[test]
    fn test_missing_synthesizer_aborts_without_panicking() {
        let engine = FakeEngine::new(FakeBehavior::FailToStart);
        let mut speaker = Speaker::new(Arc::new(engine.clone()), fast());

        speaker.hear("Hello.", InteractionLanguage::English).unwrap();
        assert_eq!(speaker.wait(), Some(PlaybackOutcome::Aborted));
        assert_eq!(engine.start_count(), 2);
    }

    #[test]
    fn test_blank_text_does_not_start_playback() {
        let engine = FakeEngine::new(FakeBehavior::Endless);
        let mut speaker = Speaker::new(Arc::new(engine.clone()), fast());
        speaker.hear("   ", InteractionLanguage::English).unwrap();
        assert_eq!(speaker.state(), PlaybackState::Idle);
        assert_eq!(speaker.wait(), None);
        assert_eq!(engine.start_count(), 0);
    }
}
