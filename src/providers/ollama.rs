//! Ollama provider implementation for Arduino Mentor
//!
//! Connects to a local or remote Ollama server through `/api/chat`. Streamed
//! replies arrive as newline-delimited JSON objects, one per fragment.

use crate::config::OllamaConfig;
use crate::error::{MentorError, Result};
use crate::providers::framing::{frame_stream, DelimitedDecoder};
use crate::providers::{ModelRequest, Provider, ResponseFormat, TextStream, TurnRole};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```
/// use arduino_mentor::config::OllamaConfig;
/// use arduino_mentor::providers::{OllamaProvider, Provider};
/// use std::time::Duration;
///
/// let provider = OllamaProvider::new(OllamaConfig::default(), Duration::from_secs(30)).unwrap();
/// assert_eq!(provider.host(), "http://localhost:11434");
/// assert_eq!(provider.model(), "llama3.2:latest");
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: OllamaOptions,
}

/// Message structure for Ollama API
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response structure from Ollama API (also one streamed line)
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OllamaConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("arduino-mentor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MentorError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }

    fn build_request(&self, request: &ModelRequest, stream: bool) -> OllamaRequest {
        let mut messages = Vec::with_capacity(request.turns.len() + 1);
        if let Some(instruction) = &request.system_instruction {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: instruction.clone(),
                images: Vec::new(),
            });
        }

        let last = request.turns.len().saturating_sub(1);
        for (idx, turn) in request.turns.iter().enumerate() {
            let images = match (&request.image, idx == last && turn.role == TurnRole::User) {
                (Some(image), true) => vec![image.data.clone()],
                _ => Vec::new(),
            };
            messages.push(OllamaMessage {
                role: match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Model => "assistant",
                }
                .to_string(),
                content: turn.text.clone(),
                images,
            });
        }

        OllamaRequest {
            model: self.config.model.clone(),
            messages,
            stream,
            format: match request.response_format {
                ResponseFormat::Json => Some("json".to_string()),
                ResponseFormat::Text => None,
            },
            options: OllamaOptions {
                temperature: request.temperature.unwrap_or(self.config.temperature),
            },
        }
    }

    async fn send(&self, request: &ModelRequest, stream: bool) -> Result<reqwest::Response> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));
        let body = self.build_request(request, stream);

        tracing::debug!(
            "Sending Ollama request: model={}, messages={}, stream={}",
            body.model,
            body.messages.len(),
            stream
        );

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            tracing::error!("Failed to reach Ollama: {}", e);
            MentorError::Transport(format!("Failed to connect to Ollama server: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(MentorError::Transport(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        Ok(response)
    }
}

fn parse_line(line: &str) -> Result<OllamaResponse> {
    let parsed: OllamaResponse = serde_json::from_str(line).map_err(|e| {
        tracing::error!("Failed to parse Ollama response: {}", e);
        MentorError::Transport(format!("Failed to parse Ollama response: {}", e))
    })?;
    if let Some(error) = &parsed.error {
        return Err(MentorError::Transport(format!("Ollama error: {}", error)).into());
    }
    Ok(parsed)
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }

    async fn generate(&self, request: &ModelRequest) -> Result<String> {
        let response = self.send(request, false).await?;
        let body = response.text().await.map_err(|e| {
            MentorError::Transport(format!("Failed to read Ollama response: {}", e))
        })?;
        let parsed = parse_line(&body)?;
        if !parsed.done {
            tracing::warn!("Ollama reported an unfinished reply");
        }
        Ok(parsed.message.map(|m| m.content).unwrap_or_default())
    }

    async fn generate_stream(&self, request: &ModelRequest) -> Result<TextStream> {
        let response = self.send(request, true).await?;
        let lines = frame_stream(response.bytes_stream(), DelimitedDecoder::lines());

        let fragments = lines.filter_map(|line| async move {
            let parsed = match line.and_then(|l| parse_line(&l)) {
                Ok(parsed) => parsed,
                Err(e) => return Some(Err(e)),
            };
            parsed
                .message
                .map(|m| m.content)
                .filter(|content| !content.is_empty())
                .map(Ok)
        });

        Ok(Box::pin(fragments))
    }
}
