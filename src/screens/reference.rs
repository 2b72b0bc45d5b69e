//! Reference hub
//!
//! On-demand concept explanations pitched at the user's skill level, plus
//! full reference guides for library projects.

use crate::domain::{Project, SkillLevel};
use crate::error::Result;
use crate::prompts::task_prompts;
use crate::providers::{ModelRequest, Provider};
use crate::screens::{lock, or_fallback, request_text, RequestGate, Submission};
use std::sync::{Arc, Mutex};

pub const LOOKUP_FAILURE: &str =
    "Could not retrieve information at this time. Please check your connection.";
pub const NO_EXPLANATION: &str = "No explanation available.";
pub const NO_GUIDE: &str = "No guide available.";

/// Quick lookups offered before the user has searched anything
pub const SEED_TOPICS: [&str; 5] = [
    "I2C Communication",
    "Pull-up Resistor",
    "Debouncing",
    "PWM",
    "H-Bridge",
];

/// Maximum number of recent searches kept
pub const MAX_RECENT: usize = 8;

struct HubState {
    recent: Vec<String>,
    topic: Option<String>,
    explanation: Option<String>,
}

pub struct ReferenceHub {
    provider: Arc<dyn Provider>,
    state: Mutex<HubState>,
    gate: RequestGate,
}

impl ReferenceHub {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            state: Mutex::new(HubState {
                recent: SEED_TOPICS.iter().map(|s| s.to_string()).collect(),
                topic: None,
                explanation: None,
            }),
            gate: RequestGate::new(),
        }
    }

    /// Recent searches, newest first
    pub fn recent(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.recent.clone())
            .unwrap_or_default()
    }

    /// The topic and explanation currently shown
    pub fn current(&self) -> Option<(String, String)> {
        let state = self.state.lock().ok()?;
        Some((state.topic.clone()?, state.explanation.clone()?))
    }

    pub fn clear(&self) -> Result<()> {
        let mut state = lock(&self.state)?;
        state.topic = None;
        state.explanation = None;
        Ok(())
    }

    /// Explain a concept; successful lookups join the recent list
    pub async fn explain(&self, concept: &str, level: SkillLevel) -> Result<Submission<String>> {
        let concept = concept.trim();
        if concept.is_empty() {
            return Ok(Submission::EmptyInput);
        }
        let Some(_guard) = self.gate.try_acquire() else {
            return Ok(Submission::Ignored);
        };

        let request = ModelRequest::prompt(task_prompts::concept_explanation(concept, level));
        let explanation =
            match request_text(self.provider.as_ref(), &request, "explain_concept").await {
                Ok(text) => {
                    let text = or_fallback(text, NO_EXPLANATION);
                    remember(&mut lock(&self.state)?.recent, concept);
                    text
                }
                Err(_) => LOOKUP_FAILURE.to_string(),
            };

        let mut state = lock(&self.state)?;
        state.topic = Some(concept.to_string());
        state.explanation = Some(explanation.clone());
        Ok(Submission::Completed(explanation))
    }

    /// Write a technical reference guide for a project
    pub async fn guide(&self, project: &Project, level: SkillLevel) -> Result<Submission<String>> {
        let Some(_guard) = self.gate.try_acquire() else {
            return Ok(Submission::Ignored);
        };

        let request = ModelRequest::prompt(task_prompts::project_reference(
            &project.title,
            &project.components,
            level,
        ));
        let guide = match request_text(self.provider.as_ref(), &request, "project_guide").await {
            Ok(text) => or_fallback(text, NO_GUIDE),
            Err(_) => LOOKUP_FAILURE.to_string(),
        };
        Ok(Submission::Completed(guide))
    }
}

/// Prepend a search term unless it is already listed, keeping at most
/// [`MAX_RECENT`] entries
fn remember(recent: &mut Vec<String>, term: &str) {
    if recent.iter().any(|t| t == term) {
        return;
    }
    recent.insert(0, term.to_string());
    recent.truncate(MAX_RECENT);
}
