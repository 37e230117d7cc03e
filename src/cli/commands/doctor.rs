//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{Settings, POPPLER_PATH_ENV};
use console::style;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Pustaka Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let tool_checks = vec![
        check_tool("pdftotext", &settings.pdftotext_path(), "-v", install_hint_poppler(), true),
        check_tool(
            "speech synthesizer",
            Path::new(&settings.voice.tts_command),
            "--version",
            install_hint_espeak(),
            false,
        ),
    ];
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);

    println!();

    println!("{}", style("Model Services").bold());
    let service_checks = vec![
        check_service(
            "Chat model",
            &settings.llm.base_url,
            &settings.llm.model,
            "Start Ollama with: ollama serve",
            true,
        )
        .await,
        check_service(
            "Embedding model",
            settings.embedding_base_url(),
            &settings.embedding.model,
            &format!("Pull it with: ollama pull {}", settings.embedding.model),
            true,
        )
        .await,
        check_service(
            "Speech-to-text",
            &settings.voice.stt_base_url,
            &settings.voice.stt_model,
            "Voice questions need a Whisper-compatible server",
            false,
        )
        .await,
    ];
    for check in &service_checks {
        check.print();
    }
    checks.extend(service_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);
    if let Ok(dir) = std::env::var(POPPLER_PATH_ENV) {
        let poppler = if Path::new(&dir).is_dir() {
            CheckResult::ok(POPPLER_PATH_ENV, &dir)
        } else {
            CheckResult::warning(POPPLER_PATH_ENV, &format!("{} is not a directory", dir), install_hint_poppler())
        };
        poppler.print();
        checks.push(poppler);
    }

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Pustaka.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Pustaka is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available. Missing optional tools are warnings.
fn check_tool(name: &str, program: &Path, version_arg: &str, hint: &str, required: bool) -> CheckResult {
    let missing = |message: &str| {
        if required {
            CheckResult::error(name, message, hint)
        } else {
            CheckResult::warning(name, message, hint)
        }
    };

    match Command::new(program).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            // pdftotext prints its version on stderr
            let text = if output.stdout.is_empty() {
                String::from_utf8_lossy(&output.stderr).to_string()
            } else {
                String::from_utf8_lossy(&output.stdout).to_string()
            };
            let version = text.lines().next().unwrap_or("installed").trim().to_string();
            CheckResult::ok(name, &truncate(&version, 50))
        }
        Ok(_) => missing("installed but not working"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            missing(&format!("{} not found", program.display()))
        }
        Err(e) => missing(&format!("error: {}", e)),
    }
}

/// Probe an OpenAI-compatible endpoint by listing its models.
async fn check_service(
    name: &str,
    base_url: &str,
    model: &str,
    hint: &str,
    required: bool,
) -> CheckResult {
    let unreachable = |message: String| {
        if required {
            CheckResult::error(name, &message, hint)
        } else {
            CheckResult::warning(name, &message, hint)
        }
    };

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(e) => return unreachable(format!("error: {}", e)),
    };

    let url = format!("{}/models", base_url.trim_end_matches('/'));
    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            let listed = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .map(|body| models_list_contains(&body, model));
            match listed {
                Some(false) => CheckResult::warning(
                    name,
                    &format!("{} reachable, {} not listed", base_url, model),
                    hint,
                ),
                _ => CheckResult::ok(name, &format!("{} ({})", model, base_url)),
            }
        }
        Ok(response) => unreachable(format!("{} returned {}", url, response.status())),
        Err(_) => unreachable(format!("{} unreachable", base_url)),
    }
}

/// Whether an OpenAI-style `/models` listing mentions `model`, ignoring the `:tag` suffix.
fn models_list_contains(body: &serde_json::Value, model: &str) -> bool {
    body.get("data")
        .and_then(|d| d.as_array())
        .map(|models| {
            models.iter().filter_map(|m| m.get("id")?.as_str()).any(|id| {
                id == model || id.split(':').next() == Some(model)
            })
        })
        .unwrap_or(false)
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: pustaka init (or pustaka config edit)",
        )
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Platform-specific install hint for poppler.
pub(crate) fn install_hint_poppler() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install poppler"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install poppler-utils (or set POPPLER_PATH)"
    } else {
        "Install poppler and point POPPLER_PATH at its bin directory"
    }
}

/// Platform-specific install hint for espeak-ng.
pub(crate) fn install_hint_espeak() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install espeak-ng"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install espeak-ng"
    } else {
        "Install from: https://github.com/espeak-ng/espeak-ng/releases"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_optional_tool_missing_is_a_warning() {
        let result = check_tool("synth", Path::new("pustaka-no-such-synth"), "--version", "hint", false);
        assert_eq!(result.status, CheckStatus::Warning);
        let result = check_tool("pdf", Path::new("pustaka-no-such-pdf"), "-v", "hint", true);
        assert_eq!(result.status, CheckStatus::Error);
    }

    #[test]
    fn test_models_list_contains() {
        let body = serde_json::json!({
            "object": "list",
            "data": [
                { "id": "llama3.1:latest", "object": "model" },
                { "id": "paraphrase-multilingual", "object": "model" }
            ]
        });
        assert!(models_list_contains(&body, "llama3.1"));
        assert!(models_list_contains(&body, "paraphrase-multilingual"));
        assert!(!models_list_contains(&body, "mistral"));
        assert!(!models_list_contains(&serde_json::json!({}), "llama3.1"));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let result = check_service("Chat", "http://127.0.0.1:9/v1", "llama3.1", "start it", true).await;
        assert_eq!(result.status, CheckStatus::Error);
    }
}
