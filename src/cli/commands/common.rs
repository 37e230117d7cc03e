//! Steps shared by the interactive commands.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::ingest::{DocumentKind, UploadedDocument};
use crate::session::{IngestOutcome, Session};
use crate::voice::{PlaybackOutcome, PlaybackState};
use anyhow::Result;
use std::path::Path;
use std::time::Duration;

/// Load a file into the session and report what happened.
pub(crate) async fn load_file(session: &mut Session, path: &Path, settings: &Settings) -> Result<()> {
    let upload = UploadedDocument::from_path(path).await?;

    if let Some(kind) = DocumentKind::from_extension(&upload.extension()) {
        if let Err(e) = preflight::check(Operation::Load(kind), settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'pustaka doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let spinner = Output::spinner(&format!("Reading {}...", upload.filename));
    let outcome = session.load_document(upload).await;
    spinner.finish_and_clear();

    match outcome? {
        IngestOutcome::Indexed {
            filename,
            preview,
            records,
            chunks,
            reused,
        } => {
            if reused {
                Output::info(&format!("{} is already loaded.", filename));
            } else {
                Output::success(&format!(
                    "Loaded {} ({} records, {} chunks)",
                    filename, records, chunks
                ));
            }
            Output::preview(&preview);
        }
        IngestOutcome::Unsupported { extension } => {
            Output::warning(&format!(
                "Unsupported file type .{}; only .pdf and .docx can be loaded. No document is loaded now.",
                extension
            ));
        }
    }
    Ok(())
}

/// Speak the last answer and wait for playback to end. Ctrl-C stops it.
pub(crate) async fn speak_and_wait(session: &mut Session, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Speak, settings) {
        Output::warning(&format!("Cannot read the answer aloud: {}", e));
        return Ok(());
    }
    if !tokio::task::block_in_place(|| session.hear())? {
        return Ok(());
    }

    Output::info("Speaking... (Ctrl-C to stop)");
    while session.playback_state() != PlaybackState::Idle {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => session.stop_hearing(),
            _ = tokio::time::sleep(Duration::from_millis(100)) => {}
        }
    }

    if let Some(PlaybackOutcome::Aborted) = session.wait_for_playback() {
        Output::warning("Playback failed; see the log for details.");
    }
    Ok(())
}
