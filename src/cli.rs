//! Command-line interface definition for Arduino Mentor
//!
//! This module defines the CLI structure using clap's derive API. The
//! interactive `shell` hosts every view; the remaining commands run a single
//! view once and exit.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Arduino Mentor - AI mentoring assistant for Arduino builds
///
/// Ask questions, review sketches, check wiring and plan projects with a
/// hosted language model that adapts to your skill level.
#[derive(Parser, Debug, Clone)]
#[command(name = "arduino-mentor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Override the provider from config (gemini, ollama)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Override the model for the selected provider
    #[arg(short, long)]
    pub model: Option<String>,

    /// Display name used to sign in
    #[arg(long, env = "MENTOR_USER_NAME")]
    pub name: Option<String>,

    /// Email used to sign in when no name is given
    #[arg(long)]
    pub email: Option<String>,

    /// Skill level: beginner, intermediate, advanced, expert
    #[arg(short, long)]
    pub skill: Option<String>,

    /// Keep preferences in memory only
    #[arg(long)]
    pub no_persist: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Arduino Mentor
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive mentor shell
    Shell,

    /// Send a single message to the mentor
    Chat {
        /// Message text
        message: String,

        /// Attach a knowledge base file to the prompt
        #[arg(long)]
        dataset_file: Option<PathBuf>,

        /// Stream plain text instead of the structured reply
        #[arg(long)]
        stream: bool,
    },

    /// Browse and generate projects
    Projects {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Search components and check compatibility
    Components {
        #[command(subcommand)]
        command: ComponentCommand,
    },

    /// Review an Arduino sketch
    Code {
        /// Sketch file; the built-in blink sketch when omitted
        file: Option<PathBuf>,
    },

    /// Check a wiring description for safety and logic issues
    Circuit {
        /// Wiring description
        description: String,
    },

    /// Inspect a photo of a breadboard build
    Vision {
        /// Image file to analyze
        image: PathBuf,

        /// Project id giving context for the inspection
        #[arg(long)]
        project: Option<String>,
    },

    /// Explain an engineering concept at your skill level
    Explain {
        /// Concept to research
        concept: String,
    },

    /// Produce a technical reference guide for a project
    Guide {
        /// Project id
        project: String,
    },

    /// Manage stored preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
}

/// Project library subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ProjectCommand {
    /// List projects
    List {
        /// Difficulty filter (all, beginner, intermediate, advanced, expert)
        #[arg(short, long)]
        difficulty: Option<String>,
    },

    /// Generate a custom project from an idea
    Generate {
        /// Project idea
        idea: String,
    },
}

/// Component database subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ComponentCommand {
    /// List components; filters are remembered between runs
    List {
        /// Search term matched against name, description and uses
        #[arg(long)]
        search: Option<String>,

        /// Component type (or "All")
        #[arg(long = "type")]
        kind: Option<String>,

        /// Difficulty filter
        #[arg(long)]
        difficulty: Option<String>,
    },

    /// Ask for component recommendations
    Recommend {
        /// Search term; the remembered search when omitted
        term: Option<String>,
    },

    /// Check interoperability of selected components
    Compat {
        /// Component ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Project context
        #[arg(long)]
        context: Option<String>,
    },
}

/// Preference subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PrefsCommand {
    /// Show stored preferences
    Show,

    /// Set a preference
    Set { key: String, value: String },

    /// Restore defaults
    Reset,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            provider: None,
            model: None,
            name: None,
            email: None,
            skill: None,
            no_persist: false,
            command: Commands::Shell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Shell));
    }

    #[test]
    fn test_cli_parse_shell_command() {
        let cli = Cli::try_parse_from(["arduino-mentor", "shell"]).unwrap();
        assert!(matches!(cli.command, Commands::Shell));
    }

    #[test]
    fn test_cli_parse_chat_with_dataset() {
        let cli = Cli::try_parse_from([
            "arduino-mentor",
            "--skill",
            "beginner",
            "chat",
            "Blink an LED",
            "--dataset-file",
            "notes.txt",
        ])
        .unwrap();
        assert_eq!(cli.skill, Some("beginner".to_string()));
        if let Commands::Chat {
            message,
            dataset_file,
            stream,
        } = cli.command
        {
            assert_eq!(message, "Blink an LED");
            assert_eq!(dataset_file, Some(PathBuf::from("notes.txt")));
            assert!(!stream);
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_components_list_type_flag() {
        let cli = Cli::try_parse_from([
            "arduino-mentor",
            "components",
            "list",
            "--type",
            "Sensor",
        ])
        .unwrap();
        match cli.command {
            Commands::Components {
                command: ComponentCommand::List { kind, search, .. },
            } => {
                assert_eq!(kind, Some("Sensor".to_string()));
                assert_eq!(search, None);
            }
            other => panic!("Expected components list, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_compat_requires_ids() {
        let result = Cli::try_parse_from(["arduino-mentor", "components", "compat"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_vision_with_project() {
        let cli = Cli::try_parse_from([
            "arduino-mentor",
            "vision",
            "board.jpg",
            "--project",
            "p1",
        ])
        .unwrap();
        if let Commands::Vision { image, project } = cli.command {
            assert_eq!(image, PathBuf::from("board.jpg"));
            assert_eq!(project, Some("p1".to_string()));
        } else {
            panic!("Expected Vision command");
        }
    }

    #[test]
    fn test_cli_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "arduino-mentor",
            "--provider",
            "ollama",
            "--model",
            "llava",
            "explain",
            "PWM",
        ])
        .unwrap();
        assert_eq!(cli.provider, Some("ollama".to_string()));
        assert_eq!(cli.model, Some("llava".to_string()));
    }
}
