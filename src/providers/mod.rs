//! Provider module for Arduino Mentor
//!
//! This module contains the model API abstraction and implementations
//! for Gemini and Ollama.

pub mod base;
pub mod framing;
pub mod gemini;
pub mod ollama;

pub use base::{
    InlineImage, ModelRequest, Provider, ResponseFormat, TextStream, Turn, TurnRole,
};
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;

use crate::config::ProviderConfig;
use crate::error::{MentorError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Create a provider instance based on configuration
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
///
/// # Examples
///
/// ```
/// use arduino_mentor::config::ProviderConfig;
/// use arduino_mentor::providers::create_provider;
///
/// let provider = create_provider(&ProviderConfig::default()).unwrap();
/// assert_eq!(provider.name(), "gemini");
/// ```
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    let timeout = Duration::from_secs(config.request_timeout_seconds);
    match config.provider_type.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config.gemini.clone(), timeout)?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.ollama.clone(), timeout)?)),
        other => Err(MentorError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}
