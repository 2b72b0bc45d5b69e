//! Base provider trait and request types
//!
//! The model API is an opaque boundary: a request carries a few text turns,
//! optional system instruction, sampling settings and an optional inline
//! image; the reply is either one string or a sequence of text fragments.

use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Author of a conversation turn sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One text turn of the conversation sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Requested reply encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Ask the model to answer with a JSON document
    Json,
}

/// Image attached to the last user turn
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

/// A single request to the model boundary
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelRequest {
    /// Conversation turns, oldest first; the last one is the current prompt
    pub turns: Vec<Turn>,
    pub system_instruction: Option<String>,
    /// Overrides the provider's configured temperature
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
    pub image: Option<InlineImage>,
}

impl ModelRequest {
    /// Build a single-turn request from a prompt string
    ///
    /// # Examples
    ///
    /// ```
    /// use arduino_mentor::providers::{ModelRequest, ResponseFormat};
    ///
    /// let request = ModelRequest::prompt("Explain PWM").json();
    /// assert_eq!(request.turns.len(), 1);
    /// assert_eq!(request.response_format, ResponseFormat::Json);
    /// ```
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(text)],
            ..Default::default()
        }
    }

    /// Prepend earlier turns before the current prompt
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        let mut turns = history;
        turns.append(&mut self.turns);
        self.turns = turns;
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.response_format = ResponseFormat::Json;
        self
    }

    pub fn with_image(mut self, mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.image = Some(InlineImage {
            mime_type: mime_type.into(),
            data: data.into(),
        });
        self
    }

    /// The current prompt text (last user turn)
    pub fn prompt_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::User)
            .map(|t| t.text.as_str())
    }
}

/// Incremental text fragments of a streamed reply
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Provider trait for model APIs
///
/// Implementations translate a [`ModelRequest`] to their wire format. No
/// implementation retries; every call is a single attempt.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name used in logs and status output
    fn name(&self) -> &str;

    /// Model the provider sends requests to
    fn model(&self) -> String;

    /// Send a request and return the complete reply text
    async fn generate(&self, request: &ModelRequest) -> Result<String>;

    /// Send a request and return the reply as a sequence of fragments
    ///
    /// The default implementation delivers the complete reply as a single
    /// fragment.
    async fn generate_stream(&self, request: &ModelRequest) -> Result<TextStream> {
        let text = self.generate(request).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(text) })))
    }
}
