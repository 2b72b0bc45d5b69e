//! Configuration management for Arduino Mentor
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! The model API key is the one secret; it is only ever read from the
//! environment.

use crate::domain::SkillLevel;
use crate::error::{Result, MentorError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Environment variables consulted for the Gemini API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model provider configuration
    pub provider: ProviderConfig,
    /// Mentor behavior configuration
    #[serde(default)]
    pub mentor: MentorConfig,
    /// Preference store configuration
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

/// Provider configuration
///
/// Specifies which model API to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Timeout applied to every model request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: "gemini".to_string(),
            request_timeout_seconds: default_request_timeout(),
            gemini: GeminiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// API key wrapper that never prints its value
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model to use for Gemini
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Optional API base URL (useful for tests and local mocks)
    #[serde(default)]
    pub api_base: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// API key, populated from the environment only
    #[serde(skip)]
    pub api_key: Option<ApiKey>,
}

fn default_gemini_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_base: None,
            temperature: default_temperature(),
            api_key: None,
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            temperature: default_temperature(),
        }
    }
}

/// Which reply contract the chat view expects from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// One JSON document `{ text, metadata }` per turn
    #[default]
    Structured,
    /// Plain text delivered as a sequence of fragments
    Streaming,
}

impl ResponseMode {
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "structured" | "json" => Ok(Self::Structured),
            "streaming" | "stream" => Ok(Self::Streaming),
            other => Err(format!("Unknown response mode: {}", other)),
        }
    }
}

/// Mentor behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorConfig {
    /// Skill level used when none is given at sign-in
    #[serde(default)]
    pub default_skill_level: SkillLevel,

    /// Reply contract for chat turns
    #[serde(default)]
    pub response_mode: ResponseMode,

    /// Send the orchestrator system instruction with chat turns
    #[serde(default = "default_true")]
    pub use_system_instruction: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            default_skill_level: SkillLevel::default(),
            response_mode: ResponseMode::default(),
            use_system_instruction: true,
        }
    }
}

/// Preference store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Directory for the preference database; platform data dir when unset
    #[serde(default)]
    pub path: Option<String>,

    /// Persist preferences between runs
    #[serde(default = "default_true")]
    pub persist: bool,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: None,
            persist: true,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MentorError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MentorError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("MENTOR_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(timeout) = std::env::var("MENTOR_REQUEST_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(value) => self.provider.request_timeout_seconds = value,
                Err(_) => tracing::warn!(
                    "Ignoring invalid MENTOR_REQUEST_TIMEOUT_SECONDS: {}",
                    timeout
                ),
            }
        }

        if let Ok(model) = std::env::var("MENTOR_GEMINI_MODEL") {
            self.provider.gemini.model = model;
        }

        if let Ok(api_base) = std::env::var("MENTOR_GEMINI_API_BASE") {
            self.provider.gemini.api_base = Some(api_base);
        }

        if let Ok(host) = std::env::var("MENTOR_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        if let Ok(model) = std::env::var("MENTOR_OLLAMA_MODEL") {
            self.provider.ollama.model = model;
        }

        if let Ok(temperature) = std::env::var("MENTOR_TEMPERATURE") {
            match temperature.parse::<f32>() {
                Ok(value) => {
                    self.provider.gemini.temperature = value;
                    self.provider.ollama.temperature = value;
                }
                Err(_) => tracing::warn!("Ignoring invalid MENTOR_TEMPERATURE: {}", temperature),
            }
        }

        if let Ok(mode) = std::env::var("MENTOR_RESPONSE_MODE") {
            match ResponseMode::parse_str(&mode) {
                Ok(value) => self.mentor.response_mode = value,
                Err(e) => tracing::warn!("Ignoring MENTOR_RESPONSE_MODE: {}", e),
            }
        }

        if let Ok(path) = std::env::var("MENTOR_PREFERENCES_PATH") {
            self.preferences.path = Some(path);
        }

        if self.provider.gemini.api_key.is_none() {
            self.provider.gemini.api_key = API_KEY_ENV_VARS
                .iter()
                .find_map(|name| std::env::var(name).ok())
                .filter(|key| !key.trim().is_empty())
                .map(ApiKey::new);
            if self.provider.gemini.api_key.is_none() {
                tracing::warn!("GEMINI_API_KEY is not set in environment variables");
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(provider) = &cli.provider {
            self.provider.provider_type = provider.clone();
        }

        if let Some(model) = &cli.model {
            match self.provider.provider_type.as_str() {
                "ollama" => self.provider.ollama.model = model.clone(),
                _ => self.provider.gemini.model = model.clone(),
            }
        }

        if let Some(skill) = &cli.skill {
            match SkillLevel::parse_str(skill) {
                Ok(level) => self.mentor.default_skill_level = level,
                Err(e) => tracing::warn!("Ignoring --skill: {}", e),
            }
        }

        if cli.no_persist {
            self.preferences.persist = false;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(MentorError::Config("Provider type cannot be empty".to_string()).into());
        }

        let valid_providers = ["gemini", "ollama"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(MentorError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.provider.request_timeout_seconds == 0 {
            return Err(MentorError::Config(
                "request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.provider.gemini.model.trim().is_empty()
            || self.provider.ollama.model.trim().is_empty()
        {
            return Err(MentorError::Config("Model names cannot be empty".to_string()).into());
        }

        for temperature in [
            self.provider.gemini.temperature,
            self.provider.ollama.temperature,
        ] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(MentorError::Config(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ))
                .into());
            }
        }

        if let Some(api_base) = &self.provider.gemini.api_base {
            url::Url::parse(api_base).map_err(|e| {
                MentorError::Config(format!("Invalid gemini.api_base {}: {}", api_base, e))
            })?;
        }

        url::Url::parse(&self.provider.ollama.host).map_err(|e| {
            MentorError::Config(format!(
                "Invalid ollama.host {}: {}",
                self.provider.ollama.host, e
            ))
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            mentor: MentorConfig::default(),
            preferences: PreferencesConfig::default(),
        }
    }
}
