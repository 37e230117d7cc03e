//! CLI module for Pustaka.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::language::InteractionLanguage;
use clap::{Parser, Subcommand};

/// Pustaka - ask questions about your documents, in English or Kannada
///
/// A local-first tool that answers questions from a PDF or Word document using
/// a locally hosted language model. "Pustaka" is Kannada for "book".
#[derive(Parser, Debug)]
#[command(name = "pustaka")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PUSTAKA_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Pustaka and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Ask one question about a document
    Ask {
        /// PDF or Word document to answer from
        file: String,

        /// The question to ask (omit when using --voice)
        question: Option<String>,

        /// Interaction language (en or kn)
        #[arg(short, long)]
        language: Option<InteractionLanguage>,

        /// Transcribe the question from an audio file
        #[arg(long)]
        voice: Option<String>,

        /// Read the answer aloud
        #[arg(long)]
        speak: bool,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Start an interactive session
    Chat {
        /// Document to load at start
        file: Option<String>,

        /// Interaction language (en or kn)
        #[arg(short, long)]
        language: Option<InteractionLanguage>,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "llm.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
