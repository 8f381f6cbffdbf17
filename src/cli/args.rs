//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for `lumina`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::Language;

/// Lumina - capture snippets and turn them into ready-to-post drafts
#[derive(Parser, Debug, Clone)]
#[command(name = "lumina")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Storage file (default: ~/.lumina/storage.json)
    #[arg(long, global = true, env = "LUMINA_STORE")]
    pub store: Option<PathBuf>,

    /// Output as JSON (for scripting/parsing)
    #[arg(long, global = true)]
    pub json: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Capture a snippet as a new spark
    Capture {
        /// The selected text
        text: String,

        /// Page the text came from
        #[arg(long)]
        url: String,

        /// Page title (default: "Untitled Page")
        #[arg(long, default_value = "")]
        title: String,

        /// Generate drafts right after capturing
        #[arg(long)]
        generate: bool,
    },

    /// List sparks, most recent first
    List,

    /// Show a spark and its drafts
    Show {
        /// Spark id (a unique prefix is enough)
        id: String,
    },

    /// Generate drafts for a spark, replacing any existing ones
    Generate {
        /// Spark id (a unique prefix is enough)
        id: String,

        /// Override the output language from settings (en, ar)
        #[arg(short = 'l', long)]
        language: Option<Language>,
    },

    /// Replace a draft's text
    Edit {
        /// Spark id (a unique prefix is enough)
        id: String,

        /// Draft id or kind (tldr, perspective, question, story)
        draft: String,

        /// New draft text
        content: String,
    },

    /// Delete a spark and its drafts
    Delete {
        /// Spark id (a unique prefix is enough)
        id: String,
    },

    /// Queue a draft for the post composer
    Post {
        /// Spark id (a unique prefix is enough)
        id: String,

        /// Draft id or kind (tldr, perspective, question, story)
        draft: String,
    },

    /// Add a sample spark
    Demo,

    /// Read or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SettingsCommand {
    /// Print a setting by dotted key, or all settings
    Get {
        /// e.g. persona.role, ai.mode
        key: Option<String>,
    },

    /// Set a setting by dotted key. Values are parsed as JSON, else taken as text
    Set { key: String, value: String },

    /// Restore defaults
    Reset,

    /// Print the storage file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["lumina", "list"]);
        assert_eq!(args.command, Command::List);
        assert!(!args.json);
        assert!(!args.verbose);
    }

    #[test]
    fn test_capture_args() {
        let args = Args::parse_from([
            "lumina",
            "capture",
            "Hello world",
            "--url",
            "https://example.com/post",
            "--title",
            "Example",
            "--generate",
        ]);
        assert_eq!(
            args.command,
            Command::Capture {
                text: "Hello world".to_string(),
                url: "https://example.com/post".to_string(),
                title: "Example".to_string(),
                generate: true,
            }
        );
    }

    #[test]
    fn test_generate_language() {
        let args = Args::parse_from(["lumina", "generate", "abc", "-l", "ar"]);
        assert_eq!(
            args.command,
            Command::Generate {
                id: "abc".to_string(),
                language: Some(Language::Ar),
            }
        );
        assert!(Args::try_parse_from(["lumina", "generate", "abc", "-l", "fr"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["lumina", "show", "abc", "--json", "-v"]);
        assert!(args.json);
        assert!(args.verbose);
    }

    #[test]
    fn test_settings_set() {
        let args = Args::parse_from(["lumina", "settings", "set", "persona.role", "Designer"]);
        assert_eq!(
            args.command,
            Command::Settings {
                action: SettingsCommand::Set {
                    key: "persona.role".to_string(),
                    value: "Designer".to_string(),
                }
            }
        );
    }
}
