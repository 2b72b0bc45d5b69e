//! Test utilities for Arduino Mentor
//!
//! Provides a scripted provider that replays canned replies, counts calls,
//! records the last request and can hold a request open until released.

use crate::config::Config;
use crate::error::{MentorError, Result};
use crate::providers::{ModelRequest, Provider, TextStream};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(String),
    Fragments(Vec<String>),
    /// Fragments followed by a transport error
    BrokenStream(Vec<String>),
    TransportError(String),
    MissingKey,
}

/// Provider that replays scripted outcomes in order
///
/// When the script runs out the last outcome repeats.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ModelRequest>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Scripted::Reply(text.to_string())])
    }

    pub fn failing() -> Self {
        Self::new(vec![Scripted::TransportError("connection refused".to_string())])
    }

    /// Hold every request until the returned handle is notified
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let notify = Arc::new(Notify::new());
        self.gate = Some(notify.clone());
        (self, notify)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ModelRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    async fn next(&self, request: &ModelRequest) -> Scripted {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        let outcome = script
            .pop_front()
            .or_else(|| last.clone())
            .unwrap_or(Scripted::Reply(String::new()));
        *last = Some(outcome.clone());
        outcome
    }
}

fn transport(msg: &str) -> anyhow::Error {
    MentorError::Transport(msg.to_string()).into()
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> String {
        "scripted-1".to_string()
    }

    async fn generate(&self, request: &ModelRequest) -> Result<String> {
        match self.next(request).await {
            Scripted::Reply(text) => Ok(text),
            Scripted::Fragments(parts) => Ok(parts.concat()),
            Scripted::BrokenStream(_) | Scripted::TransportError(_) => {
                Err(transport("connection refused"))
            }
            Scripted::MissingKey => {
                Err(MentorError::MissingCredentials("scripted".to_string()).into())
            }
        }
    }

    async fn generate_stream(&self, request: &ModelRequest) -> Result<TextStream> {
        let items: Vec<Result<String>> = match self.next(request).await {
            Scripted::Reply(text) => vec![Ok(text)],
            Scripted::Fragments(parts) => parts.into_iter().map(Ok).collect(),
            Scripted::BrokenStream(parts) => parts
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(transport("stream reset"))))
                .collect(),
            Scripted::TransportError(msg) => return Err(transport(&msg)),
            Scripted::MissingKey => {
                return Err(MentorError::MissingCredentials("scripted".to_string()).into())
            }
        };
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Configuration pointing at an in-memory preference store
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.preferences.persist = false;
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_scripted_provider_repeats_last() {
        let provider = ScriptedProvider::replying("hi");
        let request = ModelRequest::prompt("x");
        assert_eq!(provider.generate(&request).await.unwrap(), "hi");
        assert_eq!(provider.generate(&request).await.unwrap(), "hi");
        assert_eq!(provider.calls(), 2);
        assert_eq!(provider.last_request().unwrap(), request);
    }

    #[tokio::test]
    async fn test_broken_stream_ends_with_error() {
        let provider =
            ScriptedProvider::new(vec![Scripted::BrokenStream(vec!["a".to_string()])]);
        let items: Vec<_> = provider
            .generate_stream(&ModelRequest::prompt("x"))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(MentorError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    fn test_test_config_validates() {
        let config = test_config();
        assert!(!config.preferences.persist);
        assert!(config.validate().is_ok());
    }
}
