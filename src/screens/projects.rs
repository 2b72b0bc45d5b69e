//! Project library
//!
//! The static catalog plus projects the planner persona generates from a
//! free-text idea. Generated projects go to the front and open expanded.

use crate::catalog::{filter_projects, initial_projects, DifficultyFilter};
use crate::domain::{Project, SkillLevel};
use crate::error::{MentorError, Result};
use crate::exchange::reply::strip_code_fence;
use crate::prompts::task_prompts;
use crate::providers::{ModelRequest, Provider};
use crate::screens::{lock, request_text, RequestGate, Submission};
use serde_json::Value;
use std::sync::{Arc, Mutex};

struct LibraryState {
    projects: Vec<Project>,
    filter: DifficultyFilter,
    expanded: Option<String>,
}

pub struct ProjectLibrary {
    provider: Arc<dyn Provider>,
    state: Mutex<LibraryState>,
    gate: RequestGate,
}

impl ProjectLibrary {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            state: Mutex::new(LibraryState {
                projects: initial_projects(),
                filter: DifficultyFilter::All,
                expanded: None,
            }),
            gate: RequestGate::new(),
        }
    }

    pub fn projects(&self) -> Vec<Project> {
        self.state
            .lock()
            .map(|s| s.projects.clone())
            .unwrap_or_default()
    }

    /// Projects passing the current difficulty filter
    pub fn visible(&self) -> Vec<Project> {
        self.state
            .lock()
            .map(|s| {
                filter_projects(&s.projects, s.filter)
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn filter(&self) -> DifficultyFilter {
        self.state.lock().map(|s| s.filter).unwrap_or_default()
    }

    pub fn set_filter(&self, filter: DifficultyFilter) -> Result<()> {
        lock(&self.state)?.filter = filter;
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<Project> {
        self.state
            .lock()
            .ok()?
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn expanded(&self) -> Option<String> {
        self.state.lock().ok()?.expanded.clone()
    }

    /// Expand a project, or collapse it if it is already expanded
    pub fn toggle_expand(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state)?;
        if state.expanded.as_deref() == Some(id) {
            state.expanded = None;
        } else {
            state.expanded = Some(id.to_string());
        }
        Ok(())
    }

    /// Ask the planner persona for a project built around `idea`
    ///
    /// A reply that cannot be turned into a project completes with the
    /// reason as `Err`; the library is left unchanged.
    pub async fn generate(
        &self,
        idea: &str,
        level: SkillLevel,
    ) -> Result<Submission<std::result::Result<Project, String>>> {
        if idea.trim().is_empty() {
            return Ok(Submission::EmptyInput);
        }
        let Some(_guard) = self.gate.try_acquire() else {
            return Ok(Submission::Ignored);
        };

        let request = ModelRequest::prompt(task_prompts::custom_project(idea, level)).json();
        let outcome = match request_text(self.provider.as_ref(), &request, "generate_project").await
        {
            Ok(raw) => parse_generated_project(&raw, level, chrono::Utc::now().timestamp_millis()),
            Err(e) => Err(e),
        };

        let project = match outcome {
            Ok(project) => project,
            Err(e) => {
                tracing::error!("Failed to generate project: {}", e);
                return Ok(Submission::Completed(Err(e.to_string())));
            }
        };

        let mut state = lock(&self.state)?;
        state.projects.insert(0, project.clone());
        state.expanded = Some(project.id.clone());
        tracing::info!("Generated project {} ({})", project.title, project.id);
        Ok(Submission::Completed(Ok(project)))
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Turn a planner reply into a project
///
/// Missing id becomes `custom-<millis>`, list fields default to empty and
/// an unknown difficulty falls back to `level`. A missing title is an error.
pub fn parse_generated_project(raw: &str, level: SkillLevel, millis: i64) -> Result<Project> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| MentorError::ResponseParse(format!("Generated project is not JSON: {}", e)))?;
    let object = value.as_object().ok_or_else(|| {
        MentorError::ResponseParse("Generated project is not a JSON object".to_string())
    })?;

    let title = string_field(object, "title").ok_or_else(|| {
        MentorError::ResponseParse("Generated project has no title".to_string())
    })?;
    let difficulty = object
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(|d| SkillLevel::parse_str(d).ok())
        .unwrap_or(level);

    Ok(Project {
        id: string_field(object, "id").unwrap_or_else(|| format!("custom-{}", millis)),
        title,
        description: string_field(object, "description").unwrap_or_default(),
        difficulty,
        time_estimate: string_field(object, "timeEstimate").unwrap_or_default(),
        components: string_list(object.get("components")),
        tags: string_list(object.get("tags")),
        completed: false,
        knowledge_base_id: None,
    })
}
