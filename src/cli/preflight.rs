//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools are available before starting operations
//! that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{PustakaError, Result};
use crate::ingest::DocumentKind;
use std::path::Path;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Loading a document of this kind.
    Load(DocumentKind),
    /// Reading answers aloud.
    Speak,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Load(DocumentKind::Pdf) => {
            check_tool(&settings.pdftotext_path(), "-v")?;
        }
        Operation::Load(DocumentKind::Docx) => {
            // Word files are read in-process
        }
        Operation::Speak => {
            check_tool(Path::new(&settings.voice.tts_command), "--version")?;
        }
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(program: &Path, version_arg: &str) -> Result<()> {
    let name = program.display().to_string();
    match Command::new(program).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(PustakaError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PustakaError::ToolNotFound(name)),
        Err(e) => Err(PustakaError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docx_has_no_requirements() {
        assert!(check(Operation::Load(DocumentKind::Docx), &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_tool() {
        let result = check_tool(Path::new("pustaka-no-such-tool"), "--version");
        assert!(matches!(result, Err(PustakaError::ToolNotFound(_))));
    }
}
