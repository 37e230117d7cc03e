//! Interaction languages.
//!
//! Documents are indexed in English. Kannada questions are translated before
//! retrieval and answers are translated back.

use serde::{Deserialize, Serialize};

/// The language the user speaks to Pustaka in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InteractionLanguage {
    #[default]
    English,
    Kannada,
}

impl InteractionLanguage {
    /// Language of the indexed documents.
    pub const DOCUMENTS: InteractionLanguage = InteractionLanguage::English;

    /// ISO 639-1 code, as used by speech-to-text services.
    pub fn code(&self) -> &'static str {
        match self {
            InteractionLanguage::English => "en",
            InteractionLanguage::Kannada => "kn",
        }
    }

    /// Human-readable name, as used in translation prompts.
    pub fn name(&self) -> &'static str {
        match self {
            InteractionLanguage::English => "English",
            InteractionLanguage::Kannada => "Kannada",
        }
    }

    /// Whether questions and answers need translating around retrieval.
    pub fn needs_translation(&self) -> bool {
        *self != Self::DOCUMENTS
    }
}

impl std::str::FromStr for InteractionLanguage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(InteractionLanguage::English),
            "kn" | "kannada" | "ಕನ್ನಡ" => Ok(InteractionLanguage::Kannada),
            _ => Err(format!("Unknown interaction language: {} (expected en or kn)", s)),
        }
    }
}

impl std::fmt::Display for InteractionLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language() {
        assert_eq!("kn".parse::<InteractionLanguage>().unwrap(), InteractionLanguage::Kannada);
        assert_eq!("English".parse::<InteractionLanguage>().unwrap(), InteractionLanguage::English);
        assert!("fr".parse::<InteractionLanguage>().is_err());
    }

    #[test]
    fn test_translation_needed_only_for_kannada() {
        assert!(!InteractionLanguage::English.needs_translation());
        assert!(InteractionLanguage::Kannada.needs_translation());
        assert_eq!(InteractionLanguage::Kannada.code(), "kn");
    }
}
