//! Arduino Mentor - terminal mentoring assistant library
//!
//! This library provides the core of the Arduino Mentor CLI: a multi-view
//! mentoring session backed by a hosted language model, with project and
//! component catalogs, code and circuit review, photo inspection and a
//! per-session knowledge base.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `state`: Session state and the actions that change it
//! - `screens`: One controller per view, each driving model requests
//! - `exchange`: Chat messages, structured replies and streamed fragments
//! - `providers`: Model API abstraction and implementations (Gemini, Ollama)
//! - `prompts`: System instruction and task prompt templates
//! - `catalog`: Built-in projects and components with their filters
//! - `preferences`: Persisted component database filters
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and interactive shell
//!
//! # Example
//!
//! ```no_run
//! use arduino_mentor::{commands::Session, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let session = Session::start(config, Some("Ada"), None)?;
//!     arduino_mentor::commands::chat_turn(&session, "How do I debounce a button?").await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod markdown;
pub mod metrics;
pub mod preferences;
pub mod prompts;
pub mod providers;
pub mod render;
pub mod screens;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use domain::{Component, Dataset, Project, SkillLevel, UserProfile};
pub use error::{MentorError, Result};
pub use exchange::{ChatMessage, ModelReply};
pub use state::{Action, AppState, View};

#[cfg(test)]
pub mod test_utils;
