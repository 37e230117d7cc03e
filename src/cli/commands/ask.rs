//! Ask command implementation.

use super::common::{load_file, speak_and_wait};
use crate::cli::Output;
use crate::config::Settings;
use crate::language::InteractionLanguage;
use crate::session::Session;
use anyhow::Result;
use std::path::Path;

/// Options for a single question.
#[derive(Debug, Default)]
pub struct AskOptions {
    pub question: Option<String>,
    pub language: Option<InteractionLanguage>,
    pub voice: Option<String>,
    pub speak: bool,
    pub top_k: Option<usize>,
}

/// Run the ask command.
pub async fn run_ask(file: &str, options: AskOptions, settings: Settings) -> Result<()> {
    let mut session = Session::from_settings(&settings)?;
    session.set_language(options.language.unwrap_or(settings.rag.default_language));
    if let Some(k) = options.top_k {
        session.set_top_k(k);
    }

    load_file(&mut session, &Settings::expand_path(file), &settings).await?;
    if session.document().is_none() {
        return Ok(());
    }

    let question = match (&options.voice, &options.question) {
        (Some(audio), _) => {
            let spinner = Output::spinner("Transcribing question...");
            let heard = session.transcribe(Path::new(audio)).await;
            spinner.finish_and_clear();
            match heard? {
                Some(text) => {
                    Output::kv("Heard", &text);
                    text
                }
                None => {
                    Output::warning("No speech found in the recording.");
                    return Ok(());
                }
            }
        }
        (None, Some(question)) => question.clone(),
        (None, None) => anyhow::bail!("Give a question or --voice <audio file>"),
    };

    let spinner = Output::spinner("Thinking...");
    let result = session.ask(&question).await;
    spinner.finish_and_clear();

    match result {
        Ok(Some(answer)) => Output::answer(&answer),
        Ok(None) => {
            Output::warning("Nothing to answer.");
            return Ok(());
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    if options.speak {
        speak_and_wait(&mut session, &settings).await?;
    }

    Ok(())
}
