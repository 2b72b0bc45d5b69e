//! Gemini provider implementation for Arduino Mentor
//!
//! Talks to the Generative Language REST API. Non-streamed requests use
//! `:generateContent`; streamed requests use `:streamGenerateContent` with
//! server-sent events, where every event carries a partial response.

use crate::config::GeminiConfig;
use crate::error::{MentorError, Result};
use crate::providers::framing::{frame_stream, sse_event_data, DelimitedDecoder};
use crate::providers::{ModelRequest, Provider, ResponseFormat, TextStream, TurnRole};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default endpoint of the Generative Language API
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini API provider
///
/// The API key is checked when a request is made, not at construction, so a
/// session can start without credentials and report the problem per request.
///
/// # Examples
///
/// ```
/// use arduino_mentor::config::GeminiConfig;
/// use arduino_mentor::providers::{GeminiProvider, Provider};
/// use std::time::Duration;
///
/// let provider = GeminiProvider::new(GeminiConfig::default(), Duration::from_secs(30)).unwrap();
/// assert_eq!(provider.name(), "gemini");
/// ```
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate's parts
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: GeminiConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("arduino-mentor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MentorError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Gemini provider: model={}, api_base={}",
            config.model,
            config.api_base.as_deref().unwrap_or(DEFAULT_GEMINI_API_BASE)
        );

        Ok(Self { client, config })
    }

    fn api_base(&self) -> &str {
        self.config
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_API_BASE)
            .trim_end_matches('/')
    }

    fn endpoint(&self, streaming: bool) -> String {
        if streaming {
            format!(
                "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
                self.api_base(),
                self.config.model
            )
        } else {
            format!(
                "{}/v1beta/models/{}:generateContent",
                self.api_base(),
                self.config.model
            )
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_ref()
            .map(|key| key.expose())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| MentorError::MissingCredentials("gemini".to_string()).into())
    }

    fn build_request(&self, request: &ModelRequest) -> GeminiRequest {
        let last = request.turns.len().saturating_sub(1);
        let contents = request
            .turns
            .iter()
            .enumerate()
            .map(|(idx, turn)| {
                let mut parts = Vec::new();
                // The image belongs to the current prompt and precedes its text.
                if idx == last && turn.role == TurnRole::User {
                    if let Some(image) = &request.image {
                        parts.push(GeminiPart {
                            text: None,
                            inline_data: Some(GeminiInlineData {
                                mime_type: image.mime_type.clone(),
                                data: image.data.clone(),
                            }),
                        });
                    }
                }
                parts.push(GeminiPart {
                    text: Some(turn.text.clone()),
                    inline_data: None,
                });
                GeminiContent {
                    role: Some(
                        match turn.role {
                            TurnRole::User => "user",
                            TurnRole::Model => "model",
                        }
                        .to_string(),
                    ),
                    parts,
                }
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction: request.system_instruction.as_ref().map(|text| {
                GeminiSystemInstruction {
                    parts: vec![GeminiPart {
                        text: Some(text.clone()),
                        inline_data: None,
                    }],
                }
            }),
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature.unwrap_or(self.config.temperature),
                response_mime_type: match request.response_format {
                    ResponseFormat::Json => Some("application/json".to_string()),
                    ResponseFormat::Text => None,
                },
            },
        }
    }

    async fn send(&self, request: &ModelRequest, streaming: bool) -> Result<reqwest::Response> {
        let key = self.api_key()?;
        let url = self.endpoint(streaming);
        let body = self.build_request(request);

        tracing::debug!(
            "Sending Gemini request: model={}, turns={}, streaming={}",
            self.config.model,
            body.contents.len(),
            streaming
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach Gemini: {}", e);
                MentorError::Transport(format!("Failed to reach Gemini: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned error {}: {}", status, error_text);
            return Err(MentorError::Transport(format!(
                "Gemini returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }

    async fn generate(&self, request: &ModelRequest) -> Result<String> {
        let response = self.send(request, false).await?;
        let envelope: GeminiResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            MentorError::Transport(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = envelope.text();
        tracing::debug!("Gemini reply received: {} chars", text.len());
        Ok(text)
    }

    async fn generate_stream(&self, request: &ModelRequest) -> Result<TextStream> {
        let response = self.send(request, true).await?;
        let frames = frame_stream(response.bytes_stream(), DelimitedDecoder::sse());

        let fragments = frames.filter_map(|frame| async move {
            let block = match frame {
                Ok(block) => block,
                Err(e) => return Some(Err(e)),
            };
            let data = sse_event_data(&block)?;
            match serde_json::from_str::<GeminiResponse>(&data) {
                Ok(chunk) => {
                    let text = chunk.text();
                    if text.is_empty() {
                        None
                    } else {
                        Some(Ok(text))
                    }
                }
                Err(e) => {
                    tracing::error!("Malformed Gemini stream event: {}", e);
                    Some(Err(MentorError::Transport(format!(
                        "Malformed Gemini stream event: {}",
                        e
                    ))
                    .into()))
                }
            }
        });

        Ok(Box::pin(fragments))
    }
}
