//! Init command - interactive first-run setup.

use super::doctor::{install_hint_espeak, install_hint_poppler};
use crate::cli::preflight::check_tool;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};
use std::path::Path;

/// Simple check result for init command.
struct CheckIssue {
    name: String,
    hint: String,
}

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Pustaka Setup");
    println!();
    println!("Welcome to Pustaka! Let's make sure everything is configured correctly.\n");

    println!("{}", style("Step 1: Checking prerequisites").bold().cyan());
    println!();

    let tool_issues = check_prerequisites(settings);

    if !tool_issues.is_empty() {
        Output::warning("Some tools are missing. Please install them:");
        println!();
        for issue in &tool_issues {
            println!("  {} {} - not found", style("✗").red(), style(&issue.name).bold());
            println!("    {} {}", style("→").dim(), style(&issue.hint).dim());
        }
        println!();

        if !prompt_continue("Continue anyway?")? {
            println!();
            Output::info("Setup cancelled. Install the missing tools and run 'pustaka init' again.");
            return Ok(());
        }
    } else {
        Output::success("All required tools are installed!");
    }

    println!();

    println!("{}", style("Step 2: Local models").bold().cyan());
    println!();
    println!("  Pustaka answers with a model served by Ollama at {}.", style(&settings.llm.base_url).underlined());
    println!("  Pull the models it uses with:");
    println!("  {}", style(format!("ollama pull {}", settings.llm.model)).green());
    println!("  {}", style(format!("ollama pull {}", settings.embedding.model)).green());
    println!();

    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    let temp_dir = settings.temp_dir();
    if !temp_dir.exists() {
        std::fs::create_dir_all(&temp_dir)?;
        Output::success(&format!("Created temp directory: {}", temp_dir.display()));
    } else {
        Output::info(&format!("Temp directory exists: {}", temp_dir.display()));
    }

    println!();

    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        // Defaults only; environment overrides stay in the environment.
        Settings::default().save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("pustaka config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("pustaka doctor").cyan());
    println!("  {} Ask about a document", style("pustaka ask <file.pdf> \"<question>\"").cyan());
    println!("  {} Ask in Kannada", style("pustaka chat <file.docx> -l kn").cyan());
    println!();
    println!("For more help: {}", style("pustaka --help").cyan());

    Ok(())
}

/// Check prerequisites and return any issues.
fn check_prerequisites(settings: &Settings) -> Vec<CheckIssue> {
    let mut issues = Vec::new();

    if check_tool(&settings.pdftotext_path(), "-v").is_err() {
        issues.push(CheckIssue {
            name: "pdftotext".to_string(),
            hint: install_hint_poppler().to_string(),
        });
    }

    if check_tool(Path::new(&settings.voice.tts_command), "--version").is_err() {
        issues.push(CheckIssue {
            name: settings.voice.tts_command.clone(),
            hint: install_hint_espeak().to_string(),
        });
    }

    issues
}

/// Prompt user for yes/no confirmation.
pub(crate) fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
