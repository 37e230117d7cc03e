//! Interactive session: load documents, switch language, ask, listen.

use super::common::load_file;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::language::InteractionLanguage;
use crate::session::Session;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

const HELP: &str = "Commands:
  :load <file>     load a .pdf or .docx document
  :lang <en|kn>    switch the interaction language
  :voice <audio>   transcribe a recorded question
  :hear            read the last answer aloud
  :stop            stop reading
  :preview         show the loaded document's preview
  :help            show this help
  exit             quit
Anything else is asked as a question.";

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Empty,
    Exit,
    Help,
    Load(&'a str),
    Language(&'a str),
    Voice(&'a str),
    Hear,
    Stop,
    Preview,
    Question(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ChatInput::Exit;
    }
    let Some(command) = line.strip_prefix(':') else {
        return ChatInput::Question(line);
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((command, ""));
    match name {
        "load" => ChatInput::Load(arg),
        "lang" => ChatInput::Language(arg),
        "voice" => ChatInput::Voice(arg),
        "hear" => ChatInput::Hear,
        "stop" => ChatInput::Stop,
        "preview" => ChatInput::Preview,
        _ => ChatInput::Help,
    }
}

/// Run the interactive chat command.
pub async fn run_chat(
    file: Option<String>,
    language: Option<InteractionLanguage>,
    settings: Settings,
) -> Result<()> {
    let mut session = Session::from_settings(&settings)?;
    session.set_language(language.unwrap_or(settings.rag.default_language));

    println!("\n{}", style("Pustaka").bold().cyan());
    println!(
        "{}\n",
        style("Ask about a document. Type :help for commands, 'exit' to quit.").dim()
    );
    Output::kv("Language", &session.language().to_string());

    if let Some(file) = file {
        if let Err(e) = load_file(&mut session, &Settings::expand_path(&file), &settings).await {
            Output::error(&format!("{}", e));
        }
    }

    loop {
        let Some(line) = read_line(&format!("{}", style("You:").green().bold()))? else {
            break;
        };

        let result = match parse_input(&line) {
            ChatInput::Empty => Ok(()),
            ChatInput::Exit => break,
            ChatInput::Help => {
                println!("{}", HELP);
                Ok(())
            }
            ChatInput::Load(path) => load_file(&mut session, &Settings::expand_path(path), &settings).await,
            ChatInput::Language(code) => match code.parse::<InteractionLanguage>() {
                Ok(language) => {
                    session.set_language(language);
                    Output::info(&format!("Language: {}", language));
                    Ok(())
                }
                Err(e) => {
                    Output::warning(&e);
                    Ok(())
                }
            },
            ChatInput::Voice(path) => match transcribe(&session, path).await {
                Ok(Some(question)) => ask(&mut session, &question).await,
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            },
            ChatInput::Hear => hear(&mut session, &settings),
            ChatInput::Stop => {
                session.stop_hearing();
                Ok(())
            }
            ChatInput::Preview => {
                match session.preview() {
                    Some(preview) => Output::preview(preview),
                    None => Output::info("No document loaded."),
                }
                Ok(())
            }
            ChatInput::Question(question) => ask(&mut session, question).await,
        };

        if let Err(e) = result {
            Output::error(&format!("{}", e));
        }
    }

    session.stop_hearing();
    Output::info("Goodbye!");
    Ok(())
}

async fn ask(session: &mut Session, question: &str) -> Result<()> {
    if session.document().is_none() {
        Output::info("Load a document first with :load <file>.");
        return Ok(());
    }

    let spinner = Output::spinner("Thinking...");
    let result = session.ask(question).await;
    spinner.finish_and_clear();

    if let Some(answer) = result? {
        Output::answer(&answer);
    }
    Ok(())
}

/// Transcribe a recording and let the user confirm or correct it.
async fn transcribe(session: &Session, path: &str) -> Result<Option<String>> {
    let spinner = Output::spinner("Transcribing...");
    let heard = session.transcribe(&Settings::expand_path(path)).await;
    spinner.finish_and_clear();

    let Some(heard) = heard? else {
        Output::warning("No speech found in the recording.");
        return Ok(None);
    };

    Output::kv("Heard", &heard);
    let edited = read_line(&format!(
        "{}",
        style("Press Enter to ask, or type a correction:").dim()
    ))?
    .unwrap_or_default();
    let edited = edited.trim();
    Ok(Some(if edited.is_empty() { heard } else { edited.to_string() }))
}

fn hear(session: &mut Session, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Speak, settings) {
        Output::warning(&format!("Cannot read the answer aloud: {}", e));
        return Ok(());
    }
    // Replacing a running playback joins its thread.
    if !tokio::task::block_in_place(|| session.hear())? {
        Output::info("No answer to read yet.");
    }
    Ok(())
}

/// Print a prompt and read one line. `None` at end of input.
fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{} ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input))
}
