//! Mentor chat
//!
//! One user message and one model message per accepted turn. In structured
//! mode the whole reply is parsed as the JSON reply contract; in streaming
//! mode a placeholder model message grows as fragments arrive.

use crate::config::ResponseMode;
use crate::domain::{Dataset, UserProfile};
use crate::error::Result;
use crate::exchange::{
    parse_reply, ChatMessage, FragmentStream, ModelReply, Role, StreamStatus, NO_RESPONSE_TEXT,
};
use crate::metrics::RequestMetrics;
use crate::prompts::{assemble_prompt, build_system_instruction};
use crate::providers::{ModelRequest, Provider, Turn};
use crate::screens::{failure_kind, lock, RequestGate, Submission};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

struct ChatState {
    messages: Vec<ChatMessage>,
    mode: ResponseMode,
}

/// Chat transcript plus the request gate for it
pub struct ChatScreen {
    provider: Arc<dyn Provider>,
    state: Mutex<ChatState>,
    use_system_instruction: bool,
    gate: RequestGate,
}

impl ChatScreen {
    /// Open a chat that starts with the welcome message
    pub fn new(
        provider: Arc<dyn Provider>,
        profile: &UserProfile,
        mode: ResponseMode,
        use_system_instruction: bool,
    ) -> Self {
        Self {
            provider,
            state: Mutex::new(ChatState {
                messages: vec![ChatMessage::welcome(profile)],
                mode,
            }),
            use_system_instruction,
            gate: RequestGate::new(),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state
            .lock()
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    pub fn mode(&self) -> ResponseMode {
        self.state
            .lock()
            .map(|s| s.mode)
            .unwrap_or_default()
    }

    pub fn set_mode(&self, mode: ResponseMode) -> Result<()> {
        lock(&self.state)?.mode = mode;
        tracing::info!("Chat response mode set to {:?}", mode);
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Earlier turns worth replaying: no greeting, no failures
    fn history(messages: &[ChatMessage]) -> Vec<Turn> {
        messages
            .iter()
            .skip(1)
            .filter(|m| !m.is_error && !m.text.is_empty())
            .map(|m| match m.role {
                Role::User => Turn::user(m.text.clone()),
                Role::Model => Turn::model(m.text.clone()),
            })
            .collect()
    }

    fn build_request(
        &self,
        text: &str,
        profile: &UserProfile,
        dataset: Option<&Dataset>,
        history: Vec<Turn>,
        mode: ResponseMode,
    ) -> ModelRequest {
        let mut request =
            ModelRequest::prompt(assemble_prompt(text, profile, dataset)).with_history(history);
        if self.use_system_instruction {
            request = request.with_system_instruction(build_system_instruction(mode));
        }
        if mode == ResponseMode::Structured {
            request = request.json();
        }
        request
    }

    /// Submit one user turn
    ///
    /// `on_fragment` sees the growing reply in streaming mode and is not
    /// called in structured mode. Cancelling `cancel` abandons a stream.
    pub async fn submit<F>(
        &self,
        text: &str,
        profile: &UserProfile,
        dataset: Option<&Dataset>,
        cancel: CancellationToken,
        on_fragment: F,
    ) -> Result<Submission<ChatMessage>>
    where
        F: FnMut(&str),
    {
        if text.trim().is_empty() {
            return Ok(Submission::EmptyInput);
        }
        let Some(_guard) = self.gate.try_acquire() else {
            tracing::debug!("Chat busy, ignoring submission");
            return Ok(Submission::Ignored);
        };

        let (history, mode) = {
            let mut state = lock(&self.state)?;
            let history = Self::history(&state.messages);
            state.messages.push(ChatMessage::user(text));
            (history, state.mode)
        };
        let request = self.build_request(text, profile, dataset, history, mode);

        let reply = match mode {
            ResponseMode::Structured => self.exchange(&request).await,
            ResponseMode::Streaming => self.stream(&request, cancel, on_fragment).await?,
        };
        Ok(Submission::Completed(reply))
    }

    async fn exchange(&self, request: &ModelRequest) -> ChatMessage {
        let metrics = RequestMetrics::new("chat");
        let message = match self.provider.generate(request).await {
            Ok(raw) => {
                metrics.record_success();
                let reply = parse_reply(&raw);
                if let ModelReply::Unparseable { reason, .. } = &reply {
                    metrics.record_parse_fallback();
                    tracing::warn!("Failed to parse mentor reply ({}): {}", reason, raw);
                }
                ChatMessage::from_reply(reply)
            }
            Err(e) => {
                metrics.record_failure(failure_kind(&e));
                tracing::error!("Chat request failed: {}", e);
                ChatMessage::transport_failure()
            }
        };

        if let Ok(mut state) = lock(&self.state) {
            state.messages.push(message.clone());
        }
        message
    }

    async fn stream<F>(
        &self,
        request: &ModelRequest,
        cancel: CancellationToken,
        mut on_fragment: F,
    ) -> Result<ChatMessage>
    where
        F: FnMut(&str),
    {
        let metrics = RequestMetrics::new("chat_stream");
        let placeholder = ChatMessage::model("");
        let placeholder_id = placeholder.id.clone();
        lock(&self.state)?.messages.push(placeholder);

        let status = match self.provider.generate_stream(request).await {
            Ok(fragments) => {
                let outcome = FragmentStream::new(fragments, cancel)
                    .accumulate(|text| {
                        if let Ok(mut state) = self.state.lock() {
                            if let Some(m) =
                                state.messages.iter_mut().find(|m| m.id == placeholder_id)
                            {
                                m.text = text.to_string();
                            }
                        }
                        on_fragment(text);
                    })
                    .await;
                outcome.status
            }
            Err(e) => StreamStatus::Failed(e.to_string()),
        };

        let mut state = lock(&self.state)?;
        match status {
            StreamStatus::Completed | StreamStatus::Cancelled => {
                if status == StreamStatus::Completed {
                    metrics.record_success();
                } else {
                    metrics.record_failure("cancelled");
                    tracing::info!("Chat stream cancelled");
                }
                let index = match state.messages.iter().position(|m| m.id == placeholder_id) {
                    Some(index) => index,
                    None => {
                        state.messages.push(ChatMessage::model(""));
                        state.messages.len() - 1
                    }
                };
                let message = &mut state.messages[index];
                if message.text.is_empty() {
                    message.text = NO_RESPONSE_TEXT.to_string();
                }
                Ok(message.clone())
            }
            StreamStatus::Failed(reason) => {
                metrics.record_failure("transport");
                tracing::error!("Chat stream failed: {}", reason);
                // The apology takes the place of a placeholder that never received text.
                state
                    .messages
                    .retain(|m| m.id != placeholder_id || !m.text.is_empty());
                let failure = ChatMessage::transport_failure();
                state.messages.push(failure.clone());
                Ok(failure)
            }
        }
    }
}
