//! Interactive screens
//!
//! Each screen collects input, assembles a prompt, makes at most one model
//! request at a time and turns the reply (or failure) into something to
//! show. Screens take `&self`; their state sits behind a mutex and their
//! in-flight flag is a [`RequestGate`].

pub mod chat;
pub mod circuit;
pub mod components;
pub mod dashboard;
pub mod knowledge;
pub mod projects;
pub mod reference;
pub mod vision;
pub mod workbench;

pub use chat::ChatScreen;
pub use circuit::CircuitAnalyzer;
pub use components::{ComponentDatabase, Recommendation};
pub use dashboard::{Dashboard, QuickTool, SuggestedBuild};
pub use knowledge::KnowledgeBase;
pub use projects::ProjectLibrary;
pub use reference::ReferenceHub;
pub use vision::{Frame, FrameSource, StillImageSource, VisionMentor, VisionSession};
pub use workbench::{CodeAnalysis, CodeIssue, CodeReview, CodeWorkbench};

use crate::error::{MentorError, Result};
use crate::metrics::RequestMetrics;
use crate::providers::{ModelRequest, Provider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Result of submitting input to a screen
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<T> {
    /// The request ran; `T` is what the screen shows, including failures
    Completed(T),
    /// Another request from this screen is still outstanding
    Ignored,
    /// Input was empty; nothing was sent
    EmptyInput,
}

impl<T> Submission<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Per-screen busy flag
#[derive(Debug, Default)]
pub struct RequestGate {
    busy: AtomicBool,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or `None` if a request is already outstanding
    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the gate when dropped, whatever path the request took
#[derive(Debug)]
pub struct BusyGuard<'a> {
    gate: &'a RequestGate,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

/// Lock screen state, mapping poisoning to a crate error
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| MentorError::Validation("Screen state lock poisoned".to_string()).into())
}

/// Short error class used as a metrics label
pub(crate) fn failure_kind(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<MentorError>() {
        Some(MentorError::MissingCredentials(_)) => "credentials",
        Some(e) if e.is_transport() => "transport",
        Some(MentorError::Camera(_)) => "camera",
        Some(MentorError::ResponseParse(_)) => "parse",
        _ => "other",
    }
}

/// Send one request, recording metrics and logging the outcome
pub(crate) async fn request_text(
    provider: &dyn Provider,
    request: &ModelRequest,
    operation: &'static str,
) -> Result<String> {
    let metrics = RequestMetrics::new(operation);
    tracing::debug!(
        "{} request to {} ({})",
        operation,
        provider.name(),
        provider.model()
    );
    match provider.generate(request).await {
        Ok(text) => {
            metrics.record_success();
            tracing::debug!(
                "{} reply: {} chars in {:?}",
                operation,
                text.len(),
                metrics.elapsed()
            );
            Ok(text)
        }
        Err(e) => {
            metrics.record_failure(failure_kind(&e));
            tracing::error!("{} request failed: {}", operation, e);
            Err(e)
        }
    }
}

/// Use `fallback` when the reply is blank
pub(crate) fn or_fallback(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_is_exclusive_and_released_on_drop() {
        let gate = RequestGate::new();
        let guard = gate.try_acquire().unwrap();
        assert!(gate.is_busy());
        assert!(gate.try_acquire().is_none());
        drop(guard);
        assert!(!gate.is_busy());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_failure_kind_classification() {
        let err: anyhow::Error = MentorError::Transport("down".to_string()).into();
        assert_eq!(failure_kind(&err), "transport");
        let err: anyhow::Error = MentorError::MissingCredentials("gemini".to_string()).into();
        assert_eq!(failure_kind(&err), "credentials");
        assert_eq!(failure_kind(&anyhow::anyhow!("boom")), "other");
    }

    #[test]
    fn test_or_fallback() {
        assert_eq!(or_fallback("  ".to_string(), "none"), "none");
        assert_eq!(or_fallback("ok".to_string(), "none"), "ok");
    }

    #[test]
    fn test_submission_completed() {
        assert_eq!(Submission::Completed(3).completed(), Some(3));
        assert_eq!(Submission::<i32>::Ignored.completed(), None);
    }
}
