//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the config command against the file at `config_path`.
///
/// `settings` is the effective configuration and is only shown. Changes are
/// made to the file contents so environment overrides are never saved.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let mut file_settings = Settings::load_file(config_path)?;
            file_settings.set_value(key, value)?;
            file_settings.save_to(config_path)?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::kv("Config file", &config_path.display().to_string());
        }

        ConfigAction::Edit => {
            if !config_path.exists() {
                Settings::default().save_to(config_path)?;
                Output::info(&format!("Created default config at {}", config_path.display()));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor).arg(config_path).status();

            match status {
                Ok(s) if s.success() => match Settings::load_file(config_path) {
                    Ok(_) => Output::success("Config saved."),
                    Err(e) => Output::warning(&format!("Config saved but does not load: {}", e)),
                },
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {}", config_path.display()));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::POPPLER_PATH_ENV;

    #[test]
    fn test_set_writes_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let action = ConfigAction::Set {
            key: "rag.top_k".to_string(),
            value: "6".to_string(),
        };
        run_config(&action, Settings::default(), &path).unwrap();

        let saved = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(saved.rag.top_k, 6);
    }

    #[test]
    fn test_set_keeps_existing_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm]\nmodel = \"qwen2.5\"\n").unwrap();

        let action = ConfigAction::Set {
            key: "rag.top_k".to_string(),
            value: "2".to_string(),
        };
        run_config(&action, Settings::default(), &path).unwrap();

        let saved = Settings::load_file(&path).unwrap();
        assert_eq!(saved.llm.model, "qwen2.5");
        assert_eq!(saved.rag.top_k, 2);
    }

    #[test]
    fn test_set_does_not_save_environment_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::env::set_var(POPPLER_PATH_ENV, "/opt/poppler-from-env");
        let effective = Settings::load_from(Some(&path)).unwrap();
        let action = ConfigAction::Set {
            key: "llm.model".to_string(),
            value: "qwen2.5".to_string(),
        };
        let result = run_config(&action, effective, &path);
        std::env::remove_var(POPPLER_PATH_ENV);
        result.unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("poppler_path"));
        assert!(!saved.contains("poppler-from-env"));
        assert_eq!(Settings::load_file(&path).unwrap().llm.model, "qwen2.5");
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let action = ConfigAction::Set {
            key: "rag.nonexistent".to_string(),
            value: "1".to_string(),
        };
        assert!(run_config(&action, Settings::default(), &path).is_err());
        assert!(!path.exists());
    }
}
