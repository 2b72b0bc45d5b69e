/*!
Command handlers for the CLI

A [`Session`] owns the signed-in application state and one instance of each
screen. The one-shot subcommands and the interactive shell both drive the
screens through the handlers in this module, so a view behaves the same
whichever way it is reached.

- `shell`            — Interactive mentor shell
- `special_commands` — Parser for the shell's `/` commands
*/

use crate::catalog::DifficultyFilter;
use crate::cli::{Commands, ComponentCommand, PrefsCommand, ProjectCommand};
use crate::config::{Config, ResponseMode};
use crate::domain::{Dataset, Project};
use crate::error::{MentorError, Result};
use crate::exchange::{ChatMessage, Role};
use crate::markdown;
use crate::preferences::{self, PreferenceStore, DEFAULTS};
use crate::providers::{create_provider, Provider};
use crate::render;
use crate::screens::components::{self as component_screen, Recommendation};
use crate::screens::vision::CAMERA_FAILURE;
use crate::screens::{
    ChatScreen, CircuitAnalyzer, CodeWorkbench, ComponentDatabase, Dashboard, KnowledgeBase,
    ProjectLibrary, ReferenceHub, StillImageSource, Submission, VisionMentor, VisionSession,
};
use crate::state::{Action, AppState, View};
use colored::Colorize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// Interactive shell
pub mod shell;

// Special commands parser for the shell
pub mod special_commands;

/// Signed-in state plus every screen
pub struct Session {
    pub config: Config,
    pub state: AppState,
    pub chat: ChatScreen,
    pub projects: ProjectLibrary,
    pub components: ComponentDatabase,
    pub workbench: CodeWorkbench,
    pub circuit: CircuitAnalyzer,
    pub reference: ReferenceHub,
    pub vision: VisionMentor,
    pub knowledge: KnowledgeBase,
    pub prefs: Arc<dyn PreferenceStore>,
    provider: Arc<dyn Provider>,
}

impl Session {
    /// Build the configured provider and preference store and sign in
    pub fn start(config: Config, name: Option<&str>, email: Option<&str>) -> Result<Self> {
        let provider = create_provider(&config.provider)?;
        let prefs = preferences::open_store(&config.preferences)?;
        Self::with_parts(config, provider, prefs, name, email)
    }

    /// Sign in with an explicit provider and preference store
    pub fn with_parts(
        config: Config,
        provider: Arc<dyn Provider>,
        prefs: Arc<dyn PreferenceStore>,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Self> {
        let mut state = AppState::default();
        state.profile.skill_level = config.mentor.default_skill_level;
        let name = name
            .map(str::to_string)
            .or_else(|| email.is_none().then(|| state.profile.name.clone()))
            .unwrap_or_default();
        state.dispatch(Action::Login {
            name,
            email: email.unwrap_or_default().to_string(),
        })?;

        let timeout = Duration::from_secs(config.provider.request_timeout_seconds);
        let chat = ChatScreen::new(
            provider.clone(),
            &state.profile,
            config.mentor.response_mode,
            config.mentor.use_system_instruction,
        );

        tracing::info!(
            "Session started for {} using {} ({})",
            state.profile.name,
            provider.name(),
            provider.model()
        );

        Ok(Self {
            chat,
            projects: ProjectLibrary::new(provider.clone()),
            components: ComponentDatabase::new(provider.clone(), prefs.clone()),
            workbench: CodeWorkbench::new(provider.clone()),
            circuit: CircuitAnalyzer::new(provider.clone()),
            reference: ReferenceHub::new(provider.clone()),
            vision: VisionMentor::new(provider.clone()),
            knowledge: KnowledgeBase::new(timeout)?,
            prefs,
            provider,
            state,
            config,
        })
    }

    /// Sign in again after a logout; the chat restarts with a new welcome
    pub fn login(&mut self, name: &str, email: &str) -> Result<()> {
        self.state.dispatch(Action::Login {
            name: name.to_string(),
            email: email.to_string(),
        })?;
        self.chat = ChatScreen::new(
            self.provider.clone(),
            &self.state.profile,
            self.chat.mode(),
            self.config.mentor.use_system_instruction,
        );
        Ok(())
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Find a project in the library
    pub fn project(&self, id: &str) -> Result<Project> {
        self.projects
            .find(id)
            .ok_or_else(|| MentorError::NotFound(format!("project {}", id)).into())
    }

    /// Apply an action, submitting any chat seed it leaves behind
    pub async fn dispatch(&mut self, action: Action) -> Result<()> {
        self.state.dispatch(action)?;
        if let Some(seed) = self.state.take_chat_seed() {
            println!("{}\n", render::message(&ChatMessage::user(seed.as_str())));
            chat_turn(self, &seed).await?;
        }
        Ok(())
    }
}

/// Run a one-shot subcommand
pub async fn run_command(session: &mut Session, command: Commands) -> Result<()> {
    match command {
        Commands::Shell => shell::run_shell(session).await,
        Commands::Chat {
            message,
            dataset_file,
            stream,
        } => {
            if let Some(path) = dataset_file {
                import_dataset(session, &path.to_string_lossy()).await?;
            }
            if stream {
                session.chat.set_mode(ResponseMode::Streaming)?;
            }
            let reply = chat_turn(session, &message).await?;
            match reply {
                Some(reply) if reply.is_error => Err(MentorError::Transport(
                    "The mentor could not answer this message".to_string(),
                )
                .into()),
                _ => Ok(()),
            }
        }
        Commands::Projects { command } => match command {
            ProjectCommand::List { difficulty } => {
                if let Some(difficulty) = difficulty {
                    session.projects.set_filter(parse_difficulty(&difficulty)?)?;
                }
                show_projects(session);
                Ok(())
            }
            ProjectCommand::Generate { idea } => generate_project(session, &idea).await,
        },
        Commands::Components { command } => match command {
            ComponentCommand::List {
                search,
                kind,
                difficulty,
            } => {
                if let Some(search) = search {
                    session.components.set_search(&search)?;
                }
                if let Some(kind) = kind {
                    session.components.set_kind(&kind)?;
                }
                if let Some(difficulty) = difficulty {
                    session
                        .components
                        .set_difficulty(parse_difficulty(&difficulty)?)?;
                }
                show_components(session);
                Ok(())
            }
            ComponentCommand::Recommend { term } => {
                if let Some(term) = term {
                    session.components.set_search(&term)?;
                }
                recommend_components(session).await
            }
            ComponentCommand::Compat { ids, context } => {
                check_compatibility(session, &ids, context.as_deref()).await
            }
        },
        Commands::Code { file } => analyze_code(session, file.as_deref()).await,
        Commands::Circuit { description } => analyze_circuit(session, Some(description.as_str())).await,
        Commands::Vision { image, project } => {
            inspect_image(session, &image, project.as_deref()).await
        }
        Commands::Explain { concept } => explain(session, &concept).await,
        Commands::Guide { project } => guide(session, &project).await,
        Commands::Prefs { command } => match command {
            PrefsCommand::Show => {
                show_preferences(session.prefs.as_ref());
                Ok(())
            }
            PrefsCommand::Set { key, value } => set_preference(session.prefs.as_ref(), &key, &value),
            PrefsCommand::Reset => {
                session.prefs.clear()?;
                println!("Preferences restored to defaults.");
                Ok(())
            }
        },
    }
}

fn parse_difficulty(value: &str) -> Result<DifficultyFilter> {
    DifficultyFilter::parse_str(value).map_err(|e| MentorError::Validation(e).into())
}

/// Print why a submission did not run; returns the completed value
fn completed<T>(submission: Submission<T>) -> Option<T> {
    match submission {
        Submission::Completed(value) => Some(value),
        Submission::Ignored => {
            println!("{}", "Still working on the previous request...".yellow());
            None
        }
        Submission::EmptyInput => {
            println!("{}", "Nothing to send.".dimmed());
            None
        }
    }
}

/// Send one chat turn, streaming fragments to stdout when streaming is on
///
/// Ctrl-C cancels a stream in progress.
pub async fn chat_turn(session: &Session, text: &str) -> Result<Option<ChatMessage>> {
    let streaming = session.chat.mode() == ResponseMode::Streaming;
    let dataset = session.state.attached().cloned();
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let mut printed = 0;
    let submission = session
        .chat
        .submit(
            text,
            &session.state.profile,
            dataset.as_ref(),
            cancel.clone(),
            |growing| {
                if streaming {
                    print!("{}", &growing[printed..]);
                    printed = growing.len();
                    let _ = std::io::stdout().flush();
                }
            },
        )
        .await;
    watcher.abort();

    let Some(reply) = completed(submission?) else {
        return Ok(None);
    };
    if streaming {
        if printed > 0 {
            println!();
        }
        if cancel.is_cancelled() {
            println!("{}", "(cancelled)".dimmed());
        }
        if reprint_after_stream(&reply, printed) {
            println!("{}", render::message(&reply));
        }
    } else {
        println!("{}", render::message(&reply));
    }
    println!();
    Ok(Some(reply))
}

/// Streamed fragments are printed raw, so a reply whose code blocks `/save`
/// needs numbered is shown again through the renderer
fn reprint_after_stream(reply: &ChatMessage, printed: usize) -> bool {
    reply.is_error || printed == 0 || !markdown::code_blocks(&reply.text).is_empty()
}

pub fn show_transcript(session: &Session) {
    for message in session.chat.messages() {
        println!("{}\n", render::message(&message));
    }
}

pub fn show_dashboard(session: &Session) {
    println!("{}\n", render::dashboard(&Dashboard::new(&session.state.profile)));
}

pub fn show_projects(session: &Session) {
    let projects = session.projects.visible();
    let expanded = session.projects.expanded();
    println!(
        "\nProject library (difficulty: {}):\n",
        session.projects.filter()
    );
    render::projects_table(&projects, expanded.as_deref()).printstd();
    println!();
}

pub async fn generate_project(session: &Session, idea: &str) -> Result<()> {
    println!("Designing a project for \"{}\"...", idea);
    let level = session.state.profile.skill_level;
    match completed(session.projects.generate(idea, level).await?) {
        Some(Ok(project)) => {
            println!("Added {} ({}).", project.title.bold(), project.id);
            show_projects(session);
            Ok(())
        }
        Some(Err(reason)) => Err(MentorError::ResponseParse(format!(
            "Failed to generate project: {}",
            reason
        ))
        .into()),
        None => Ok(()),
    }
}

pub fn show_components(session: &Session) {
    let filter = session.components.filter();
    println!(
        "\nComponents (search: {:?}, type: {}, difficulty: {}):\n",
        filter.search, filter.kind, filter.difficulty
    );
    let visible = session.components.visible();
    if visible.is_empty() {
        println!("No components match these filters.\n");
        return;
    }
    render::components_table(&visible, &session.components.selected()).printstd();
    println!("Types: {}\n", session.components.types().join(", "));
}

fn show_recommendations(recommendations: &[Recommendation]) {
    if recommendations.is_empty() {
        println!("No recommendations this time.\n");
        return;
    }
    render::recommendations_table(recommendations).printstd();
    println!();
}

pub async fn recommend_components(session: &Session) -> Result<()> {
    let level = session.state.profile.skill_level;
    if let Some(recommendations) = completed(session.components.recommend(level).await?) {
        show_recommendations(&recommendations);
    }
    Ok(())
}

/// Select exactly `ids` and run the compatibility audit
pub async fn check_compatibility(
    session: &Session,
    ids: &[String],
    context: Option<&str>,
) -> Result<()> {
    for id in session.components.selected() {
        session.components.toggle_selection(&id)?;
    }
    for id in ids {
        session.components.toggle_selection(id)?;
    }
    if let Some(context) = context {
        session.components.set_context(context)?;
    }
    if let Some(report) = completed(session.components.check_compatibility().await?) {
        println!("{}\n", render::report("Compatibility audit", &report));
    }
    Ok(())
}

/// Chat seed asking how to use a component
pub fn component_question(session: &Session, id: &str) -> Result<String> {
    let component = session
        .components
        .components()
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| MentorError::NotFound(format!("component {}", id)))?;
    Ok(component_screen::usage_question(&component.name))
}

pub async fn analyze_code(session: &Session, file: Option<&Path>) -> Result<()> {
    if let Some(path) = file {
        session.workbench.load_file(path)?;
    }
    if let Some(analysis) = completed(session.workbench.analyze().await?) {
        println!("{}\n", render::code_analysis(&analysis));
    }
    Ok(())
}

pub async fn analyze_circuit(session: &Session, description: Option<&str>) -> Result<()> {
    if let Some(description) = description {
        session.circuit.set_description(description)?;
    }
    if let Some(report) = completed(session.circuit.analyze().await?) {
        println!("{}\n", render::report("Circuit analysis", &report));
    }
    Ok(())
}

pub async fn inspect_image(session: &Session, image: &Path, project: Option<&str>) -> Result<()> {
    let project = project.map(|id| session.project(id)).transpose()?;
    let mut camera = match VisionSession::open(StillImageSource::new(image)) {
        Ok(camera) => camera,
        Err(e) => {
            println!("{}", CAMERA_FAILURE.red());
            return Err(e);
        }
    };
    if let Some(analysis) = completed(session.vision.inspect(&mut camera, project.as_ref()).await?) {
        println!("{}\n", render::report("Vision inspection", &analysis));
    }
    Ok(())
}

pub async fn explain(session: &Session, concept: &str) -> Result<()> {
    let level = session.state.profile.skill_level;
    if let Some(text) = completed(session.reference.explain(concept, level).await?) {
        println!("{}\n", render::report(concept, &text));
    }
    Ok(())
}

pub fn show_reference(session: &Session) {
    println!("Quick lookups: {}\n", session.reference.recent().join(" | "));
    if let Some((topic, text)) = session.reference.current() {
        println!("{}\n", render::report(&topic, &text));
    }
}

pub async fn guide(session: &Session, project_id: &str) -> Result<()> {
    let project = session.project(project_id)?;
    let level = session.state.profile.skill_level;
    if let Some(text) = completed(session.reference.guide(&project, level).await?) {
        println!("{}\n", render::report(&project.title, &text));
    }
    Ok(())
}

/// Import a dataset from a file path or an http(s) URL and attach it
pub async fn import_dataset(session: &mut Session, source: &str) -> Result<Dataset> {
    let dataset = if source.starts_with("http://") || source.starts_with("https://") {
        session.knowledge.import_url(source).await?
    } else {
        session.knowledge.import_file(Path::new(source))?
    };
    let id = dataset.id.clone();
    session.state.dispatch(Action::ImportDataset(dataset.clone()))?;
    session.state.dispatch(Action::AttachDataset(Some(id)))?;
    println!("Imported {} ({}) and attached it to chat.", dataset.name, dataset.id);
    Ok(dataset)
}

pub fn show_datasets(session: &Session) {
    if session.state.datasets.is_empty() {
        println!("No datasets yet. Use /kb new or /kb import <file|url>.\n");
        return;
    }
    render::datasets_table(
        &session.state.datasets,
        session.state.attached_dataset.as_deref(),
    )
    .printstd();
    println!();
}

/// Write code block `index` (1-based) of the latest mentor reply to `path`
pub fn save_code_block(session: &Session, index: usize, path: &Path) -> Result<()> {
    let reply = session
        .chat
        .messages()
        .into_iter()
        .rev()
        .find(|m| m.role == Role::Model && !m.is_error)
        .ok_or_else(|| MentorError::NotFound("mentor reply".to_string()))?;
    let block = markdown::code_blocks(&reply.text)
        .into_iter()
        .nth(index.saturating_sub(1))
        .ok_or_else(|| MentorError::NotFound(format!("code block {}", index)))?;
    std::fs::write(path, &block.code)?;
    println!("Saved {} bytes to {}", block.code.len(), path.display());
    Ok(())
}

pub fn show_preferences(prefs: &dyn PreferenceStore) {
    let mut table = prettytable::Table::new();
    table.add_row(prettytable::row!["Key", "Value", "Default"]);
    for (key, default) in DEFAULTS {
        table.add_row(prettytable::row![key, prefs.get_or(key, default), default]);
    }
    table.printstd();
}

pub fn set_preference(prefs: &dyn PreferenceStore, key: &str, value: &str) -> Result<()> {
    if preferences::default_for(key).is_none() {
        let known: Vec<&str> = DEFAULTS.iter().map(|(k, _)| *k).collect();
        return Err(MentorError::Validation(format!(
            "Unknown preference {}. Known keys: {}",
            key,
            known.join(", ")
        ))
        .into());
    }
    prefs.set(key, value)?;
    println!("{} = {}", key, value);
    Ok(())
}

pub fn show_status(session: &Session) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                   Arduino Mentor Status                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("User:            {}", session.state.profile.name);
    println!("Skill Level:     {}", session.state.profile.skill_level);
    println!(
        "Provider:        {} ({})",
        session.provider.name(),
        session.provider.model()
    );
    println!("View:            {}", session.state.current_view);
    println!("Response Mode:   {:?}", session.chat.mode());
    println!(
        "Attached KB:     {}",
        session
            .state
            .attached()
            .map(|d| d.name.as_str())
            .unwrap_or("none")
    );
    println!("Chat Messages:   {}", session.chat.messages().len());
    println!();
}

/// Print the view that was just opened
pub fn show_view(session: &Session, view: View) {
    println!("{}\n", view.title().bold().underline());
    match view {
        View::Login => {}
        View::Dashboard => show_dashboard(session),
        View::Chat => show_transcript(session),
        View::Projects => show_projects(session),
        View::ReferenceHub => show_reference(session),
        View::Components => show_components(session),
        View::CodeWorkbench => println!("{}\n\nRun /code [file] to review it.\n", session.workbench.code()),
        View::CircuitAnalyzer => {
            println!("{}\n\nRun /circuit [text] to check it.\n", session.circuit.description())
        }
        View::Vision => {
            println!("Run /vision <image> [project-id] to inspect a photo of your build.\n")
        }
        View::KnowledgeBase => show_datasets(session),
        View::Settings => {
            show_status(session);
            show_preferences(session.prefs.as_ref());
        }
    }
}
