//! Component database
//!
//! Filters survive between runs through the preference store. Two model
//! requests hang off this screen: a procurement recommendation for the
//! current search term and a compatibility audit of selected parts.

use crate::catalog::{self, ComponentFilter, DifficultyFilter};
use crate::domain::{Component, SkillLevel};
use crate::error::{MentorError, Result};
use crate::exchange::reply::strip_code_fence;
use crate::preferences::{PreferenceStore, KEY_DB_DIFFICULTY, KEY_DB_SEARCH, KEY_DB_TYPE};
use crate::prompts::task_prompts;
use crate::providers::{ModelRequest, Provider};
use crate::screens::{lock, or_fallback, request_text, RequestGate, Submission};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

pub const COMPATIBILITY_FAILURE: &str = "Error analyzing compatibility. Please try again.";
pub const NO_ANALYSIS: &str = "No analysis available.";

/// Chat seed for the "ask mentor" button
pub const ASK_FOR_HELP: &str = "I need help choosing a component for...";

/// One part suggested by the procurement persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Recommendation {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub approximate_price: String,
    pub reason_for_recommendation: String,
}

struct DatabaseState {
    filter: ComponentFilter,
    selected: BTreeSet<String>,
    context: String,
    recommendations: Vec<Recommendation>,
    report: Option<String>,
}

pub struct ComponentDatabase {
    provider: Arc<dyn Provider>,
    prefs: Arc<dyn PreferenceStore>,
    components: Vec<Component>,
    state: Mutex<DatabaseState>,
    recommend_gate: RequestGate,
    compat_gate: RequestGate,
}

impl ComponentDatabase {
    /// Open the database with filters restored from `prefs`
    pub fn new(provider: Arc<dyn Provider>, prefs: Arc<dyn PreferenceStore>) -> Self {
        let difficulty = prefs.get_or(KEY_DB_DIFFICULTY, "All");
        let filter = ComponentFilter {
            search: prefs.get_or(KEY_DB_SEARCH, ""),
            kind: prefs.get_or(KEY_DB_TYPE, "All"),
            difficulty: DifficultyFilter::parse_str(&difficulty).unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored difficulty filter: {}", e);
                DifficultyFilter::All
            }),
        };
        tracing::debug!("Restored component filter {:?}", filter);

        Self {
            provider,
            prefs,
            components: catalog::components(),
            state: Mutex::new(DatabaseState {
                filter,
                selected: BTreeSet::new(),
                context: String::new(),
                recommendations: Vec::new(),
                report: None,
            }),
            recommend_gate: RequestGate::new(),
            compat_gate: RequestGate::new(),
        }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn filter(&self) -> ComponentFilter {
        self.state
            .lock()
            .map(|s| s.filter.clone())
            .unwrap_or_default()
    }

    /// Components passing the current filter, in catalog order
    pub fn visible(&self) -> Vec<Component> {
        let filter = self.filter();
        catalog::filter_components(&self.components, &filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// "All" plus the distinct component types
    pub fn types(&self) -> Vec<String> {
        catalog::component_types(&self.components)
    }

    pub fn set_search(&self, term: &str) -> Result<()> {
        lock(&self.state)?.filter.search = term.to_string();
        self.prefs.set(KEY_DB_SEARCH, term)
    }

    pub fn set_kind(&self, kind: &str) -> Result<()> {
        let types = self.types();
        let kind = types
            .iter()
            .find(|t| t.eq_ignore_ascii_case(kind.trim()))
            .ok_or_else(|| MentorError::Validation(format!("Unknown component type: {}", kind)))?;
        lock(&self.state)?.filter.kind = kind.clone();
        self.prefs.set(KEY_DB_TYPE, kind)
    }

    pub fn set_difficulty(&self, difficulty: DifficultyFilter) -> Result<()> {
        lock(&self.state)?.filter.difficulty = difficulty;
        self.prefs.set(KEY_DB_DIFFICULTY, &difficulty.to_string())
    }

    /// Select a component for the compatibility audit, or deselect it
    pub fn toggle_selection(&self, id: &str) -> Result<bool> {
        if !self.components.iter().any(|c| c.id == id) {
            return Err(MentorError::NotFound(format!("component {}", id)).into());
        }
        let mut state = lock(&self.state)?;
        if state.selected.remove(id) {
            Ok(false)
        } else {
            state.selected.insert(id.to_string());
            Ok(true)
        }
    }

    pub fn selected(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.selected.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn set_context(&self, context: &str) -> Result<()> {
        lock(&self.state)?.context = context.to_string();
        Ok(())
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.state
            .lock()
            .map(|s| s.recommendations.clone())
            .unwrap_or_default()
    }

    pub fn report(&self) -> Option<String> {
        self.state.lock().ok()?.report.clone()
    }

    /// Ask for three parts suited to the current search term
    ///
    /// An unusable reply yields an empty list; the failure is only logged.
    pub async fn recommend(&self, level: SkillLevel) -> Result<Submission<Vec<Recommendation>>> {
        let term = self.filter().search;
        if term.trim().is_empty() {
            return Ok(Submission::EmptyInput);
        }
        let Some(_guard) = self.recommend_gate.try_acquire() else {
            return Ok(Submission::Ignored);
        };

        let request =
            ModelRequest::prompt(task_prompts::component_recommendation(&term, level)).json();
        let recommendations =
            match request_text(self.provider.as_ref(), &request, "recommend_components").await {
                Ok(raw) => parse_recommendations(&raw).unwrap_or_else(|e| {
                    tracing::error!("Failed to get recommendations: {}", e);
                    Vec::new()
                }),
                Err(e) => {
                    tracing::error!("Failed to get recommendations: {}", e);
                    Vec::new()
                }
            };

        lock(&self.state)?.recommendations = recommendations.clone();
        Ok(Submission::Completed(recommendations))
    }

    /// Audit the selected components for voltage, pin and power conflicts
    pub async fn check_compatibility(&self) -> Result<Submission<String>> {
        let (names, context) = {
            let state = lock(&self.state)?;
            let names: Vec<String> = self
                .components
                .iter()
                .filter(|c| state.selected.contains(&c.id))
                .map(|c| c.name.clone())
                .collect();
            (names, state.context.clone())
        };
        if names.is_empty() {
            return Ok(Submission::EmptyInput);
        }
        let Some(_guard) = self.compat_gate.try_acquire() else {
            return Ok(Submission::Ignored);
        };

        let request = ModelRequest::prompt(task_prompts::compatibility_audit(&names, &context));
        let report = match request_text(self.provider.as_ref(), &request, "compatibility").await {
            Ok(text) => or_fallback(text, NO_ANALYSIS),
            Err(_) => COMPATIBILITY_FAILURE.to_string(),
        };

        lock(&self.state)?.report = Some(report.clone());
        Ok(Submission::Completed(report))
    }
}

/// Chat seed asking how to use a component
pub fn usage_question(name: &str) -> String {
    format!("Tell me how to use the {} with Arduino.", name)
}

/// Chat seed asking for a pinout and example sketch
pub fn pinout_question(name: &str) -> String {
    format!(
        "Can you give me the pinout and a code example for the {}?",
        name
    )
}

/// Parse the procurement reply, a JSON array of recommendation objects
pub fn parse_recommendations(raw: &str) -> Result<Vec<Recommendation>> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).map_err(|e| {
        MentorError::ResponseParse(format!("Recommendations are not a JSON array: {}", e)).into()
    })
}
