//! CLI output formatting utilities.

use crate::rag::Answer;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a document preview, dimmed and indented.
    pub fn preview(text: &str) {
        for line in text.lines() {
            println!("  {}", style(line).dim());
        }
    }

    /// Print an answer with the chunks it came from.
    pub fn answer(answer: &Answer) {
        println!("\n{}\n", answer.text);
        if answer.raw {
            Output::warning("The model returned no message text; showing its raw response.");
        }
        if !answer.sources.is_empty() {
            println!("{}", style("Sources").dim());
            for source in &answer.sources {
                println!(
                    "  {} {} p.{} (score: {:.2})  {}",
                    style("*").cyan(),
                    style(&source.source).bold(),
                    source.record_index,
                    source.score,
                    style(content_preview(&source.content, 80)).dim()
                );
            }
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten to one line and truncate with an ellipsis, on character boundaries.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 80), "short text");
        assert_eq!(content_preview("ಕನ್ನಡ ಪಠ್ಯ", 3), "ಕನ್...");
    }
}
