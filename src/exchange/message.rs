//! Chat transcript messages

use crate::domain::UserProfile;
use crate::exchange::reply::{ModelReply, ResponseMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Apology shown when the model API cannot be reached
pub const TRANSPORT_APOLOGY: &str = "I'm having trouble connecting to my brain right now. Please check your internet connection or API key.";

/// Author of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message in the chat transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

impl ChatMessage {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
            is_error: false,
            metadata: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// Greeting that opens every chat session
    pub fn welcome(profile: &UserProfile) -> Self {
        Self::model(format!(
            "Hello {}! I see you're at an {} level. How can I help you advance your Arduino skills today?",
            profile.name, profile.skill_level
        ))
    }

    /// Model message for a parsed reply
    ///
    /// Unparseable replies keep the raw text and are flagged as errors.
    pub fn from_reply(reply: ModelReply) -> Self {
        match reply {
            ModelReply::Structured { text, metadata } => {
                let mut message = Self::model(text);
                if !metadata.is_empty() {
                    message.metadata = Some(metadata);
                }
                message
            }
            ModelReply::Unparseable { raw, .. } => {
                let mut message = Self::model(raw);
                message.is_error = true;
                message
            }
        }
    }

    /// Synthetic model message used when the request itself failed
    pub fn transport_failure() -> Self {
        let mut message = Self::model(TRANSPORT_APOLOGY);
        message.is_error = true;
        message
    }

    /// Confidence reported by the model, if any
    pub fn confidence(&self) -> Option<f64> {
        self.metadata.as_ref().and_then(|m| m.confidence)
    }
}
