//! Application state and view routing
//!
//! All session-wide state lives in [`AppState`] and changes only through
//! [`AppState::dispatch`]. Screens read from it and return [`Action`]s.

use crate::domain::{Dataset, DatasetSource, Project, SkillLevel, UserProfile};
use crate::error::{MentorError, Result};
use crate::prompts::task_prompts;
use chrono::Utc;
use std::fmt;
use uuid::Uuid;

/// Placeholder values for a freshly created dataset
pub const NEW_DATASET_NAME: &str = "New Knowledge Base";
pub const NEW_DATASET_DESCRIPTION: &str = "Description of this dataset...";
pub const NEW_DATASET_CONTENT: &str =
    "// Add technical specifications, datasheet text, or project notes here.";

/// Top-level views of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Dashboard,
    Chat,
    Projects,
    ReferenceHub,
    Components,
    CodeWorkbench,
    CircuitAnalyzer,
    Vision,
    KnowledgeBase,
    Settings,
}

impl View {
    /// Views reachable from the navigation menu
    pub const NAVIGABLE: [View; 10] = [
        View::Dashboard,
        View::Chat,
        View::Projects,
        View::ReferenceHub,
        View::Components,
        View::CodeWorkbench,
        View::CircuitAnalyzer,
        View::Vision,
        View::KnowledgeBase,
        View::Settings,
    ];

    /// Parse a view name, accepting a few short aliases
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "dashboard" | "home" => Ok(Self::Dashboard),
            "chat" | "mentor" => Ok(Self::Chat),
            "projects" | "library" => Ok(Self::Projects),
            "reference" | "referencehub" | "learn" => Ok(Self::ReferenceHub),
            "components" | "db" | "parts" => Ok(Self::Components),
            "code" | "workbench" | "codeworkbench" => Ok(Self::CodeWorkbench),
            "circuit" | "circuitanalyzer" => Ok(Self::CircuitAnalyzer),
            "vision" | "camera" => Ok(Self::Vision),
            "kb" | "knowledge" | "knowledgebase" => Ok(Self::KnowledgeBase),
            "settings" => Ok(Self::Settings),
            other => Err(format!("Unknown view: {}", other)),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Login => "Sign In",
            Self::Dashboard => "Project Workspace",
            Self::Chat => "Mentor Chat",
            Self::Projects => "Project Library",
            Self::ReferenceHub => "Reference Hub",
            Self::Components => "Component Database",
            Self::CodeWorkbench => "Code Workbench",
            Self::CircuitAnalyzer => "Circuit Analyzer",
            Self::Vision => "Vision Assistant",
            Self::KnowledgeBase => "Knowledge Base",
            Self::Settings => "Settings",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// State transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Login { name: String, email: String },
    Logout,
    Navigate(View),
    /// Seed the chat with the project start message and open it
    StartProject(Project),
    /// Seed the chat with a free-form question and open it
    AskMentor(String),
    SetSkillLevel(SkillLevel),
    CreateDataset,
    SelectDataset(String),
    SaveDataset {
        id: String,
        name: String,
        description: String,
        content: String,
    },
    DeleteDataset(String),
    ImportDataset(Dataset),
    /// Attach a dataset to chat turns, or detach with `None`
    AttachDataset(Option<String>),
}

/// Display name for a demo login
///
/// ```
/// use arduino_mentor::state::display_name;
///
/// assert_eq!(display_name("", "ada@example.com"), "ada");
/// assert_eq!(display_name("  ", ""), "Maker");
/// ```
pub fn display_name(name: &str, email: &str) -> String {
    let name = name.trim();
    if !name.is_empty() {
        return name.to_string();
    }
    let local = email.trim().split('@').next().unwrap_or_default();
    if !local.is_empty() {
        return local.to_string();
    }
    "Maker".to_string()
}

/// Session-wide state
#[derive(Debug, Clone)]
pub struct AppState {
    pub authenticated: bool,
    pub current_view: View,
    pub profile: UserProfile,
    pub datasets: Vec<Dataset>,
    /// Message the chat view submits when it next opens
    pub chat_seed: Option<String>,
    /// Dataset open in the knowledge base view
    pub kb_selection: Option<String>,
    /// Dataset attached to chat turns
    pub attached_dataset: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            authenticated: false,
            current_view: View::Login,
            profile: UserProfile::default(),
            datasets: Vec::new(),
            chat_seed: None,
            kb_selection: None,
            attached_dataset: None,
        }
    }
}

impl AppState {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            ..Default::default()
        }
    }

    pub fn dataset(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == id)
    }

    /// The dataset currently attached to chat, if it still exists
    pub fn attached(&self) -> Option<&Dataset> {
        self.attached_dataset
            .as_deref()
            .and_then(|id| self.dataset(id))
    }

    /// Hand the pending chat seed to the chat view, clearing it
    pub fn take_chat_seed(&mut self) -> Option<String> {
        self.chat_seed.take()
    }

    /// Apply one action
    ///
    /// # Errors
    ///
    /// Everything except `Login` fails before sign-in. Dataset actions fail
    /// with `NotFound` for unknown ids.
    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        if !self.authenticated && !matches!(action, Action::Login { .. }) {
            return Err(MentorError::Validation("Sign in first".to_string()).into());
        }

        tracing::debug!("Dispatching {}", action_name(&action));

        match action {
            Action::Login { name, email } => {
                self.profile.name = display_name(&name, &email);
                self.authenticated = true;
                self.current_view = View::Dashboard;
                tracing::info!("Signed in as {}", self.profile.name);
            }
            Action::Logout => {
                self.authenticated = false;
                self.current_view = View::Login;
                self.chat_seed = None;
            }
            Action::Navigate(view) => {
                if view == View::Login {
                    return Err(MentorError::Validation(
                        "Use logout to return to the sign-in view".to_string(),
                    )
                    .into());
                }
                self.current_view = view;
            }
            Action::StartProject(project) => {
                self.chat_seed = Some(task_prompts::project_start(&project.title));
                if let Some(kb) = project.knowledge_base_id {
                    if self.dataset(&kb).is_some() {
                        self.attached_dataset = Some(kb);
                    }
                }
                self.current_view = View::Chat;
            }
            Action::AskMentor(message) => {
                self.chat_seed = Some(message);
                self.current_view = View::Chat;
            }
            Action::SetSkillLevel(level) => {
                self.profile.skill_level = level;
            }
            Action::CreateDataset => {
                let dataset = Dataset::new(
                    format!("ds-{}", Uuid::new_v4().simple()),
                    NEW_DATASET_NAME,
                    NEW_DATASET_DESCRIPTION,
                    NEW_DATASET_CONTENT,
                    DatasetSource::Manual,
                );
                self.kb_selection = Some(dataset.id.clone());
                self.datasets.push(dataset);
            }
            Action::SelectDataset(id) => {
                self.require_dataset(&id)?;
                self.kb_selection = Some(id);
            }
            Action::SaveDataset {
                id,
                name,
                description,
                content,
            } => {
                let dataset = self
                    .datasets
                    .iter_mut()
                    .find(|d| d.id == id)
                    .ok_or_else(|| MentorError::NotFound(format!("dataset {}", id)))?;
                dataset.name = name;
                dataset.description = description;
                dataset.content = content;
                dataset.updated_at = Utc::now();
            }
            Action::DeleteDataset(id) => {
                self.require_dataset(&id)?;
                self.datasets.retain(|d| d.id != id);
                if self.kb_selection.as_deref() == Some(id.as_str()) {
                    self.kb_selection = self.datasets.first().map(|d| d.id.clone());
                }
                if self.attached_dataset.as_deref() == Some(id.as_str()) {
                    self.attached_dataset = None;
                }
            }
            Action::ImportDataset(dataset) => {
                tracing::info!(
                    "Imported dataset {} ({} chars, source {})",
                    dataset.name,
                    dataset.content.len(),
                    dataset.source
                );
                self.kb_selection = Some(dataset.id.clone());
                self.datasets.push(dataset);
            }
            Action::AttachDataset(id) => {
                if let Some(id) = &id {
                    self.require_dataset(id)?;
                }
                self.attached_dataset = id;
            }
        }
        Ok(())
    }

    fn require_dataset(&self, id: &str) -> Result<()> {
        if self.dataset(id).is_none() {
            return Err(MentorError::NotFound(format!("dataset {}", id)).into());
        }
        Ok(())
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::Login { .. } => "login",
        Action::Logout => "logout",
        Action::Navigate(_) => "navigate",
        Action::StartProject(_) => "start_project",
        Action::AskMentor(_) => "ask_mentor",
        Action::SetSkillLevel(_) => "set_skill_level",
        Action::CreateDataset => "create_dataset",
        Action::SelectDataset(_) => "select_dataset",
        Action::SaveDataset { .. } => "save_dataset",
        Action::DeleteDataset(_) => "delete_dataset",
        Action::ImportDataset(_) => "import_dataset",
        Action::AttachDataset(_) => "attach_dataset",
    }
}
