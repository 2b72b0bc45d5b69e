//! Interactive mentor shell
//!
//! A readline loop over the [`Session`]. Lines starting with `/` are
//! special commands; everything else is a chat turn with the mentor.

use super::special_commands::{
    parse_special_command, print_help, DatasetField, KbCommand, SpecialCommand,
};
use super::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Run the shell until the user exits
///
/// Errors from individual commands are printed and the loop continues.
pub async fn run_shell(session: &mut Session) -> Result<()> {
    tracing::info!("Starting interactive mentor shell");

    let mut rl = DefaultEditor::new()?;

    print_welcome_banner(session);
    show_view(session, session.state.current_view);

    loop {
        let prompt = format_prompt(session);
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let command = match parse_special_command(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}\n", e);
                        continue;
                    }
                };

                match command {
                    SpecialCommand::Exit => break,
                    SpecialCommand::Logout => {
                        session.dispatch(Action::Logout).await?;
                        println!("Signed out.\n");
                        if !sign_in(&mut rl, session)? {
                            break;
                        }
                        show_view(session, session.state.current_view);
                    }
                    command => {
                        if let Err(e) = execute(session, command, trimmed).await {
                            eprintln!("Error: {}\n", e);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Prompt for a name and email; false when the user gives up
fn sign_in(rl: &mut DefaultEditor, session: &mut Session) -> Result<bool> {
    println!("{}\n", View::Login.title().bold());
    let mut ask = |label: &str| match rl.readline(label) {
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e),
    };
    let Some(name) = ask("Name: ")? else {
        return Ok(false);
    };
    let email = if name.is_empty() {
        match ask("Email: ")? {
            Some(email) => email,
            None => return Ok(false),
        }
    } else {
        String::new()
    };
    session.login(&name, &email)?;
    Ok(true)
}

fn format_prompt(session: &Session) -> String {
    format!(
        "[{}|{}] >>> ",
        session.state.current_view.title().cyan(),
        session.state.profile.skill_level.to_string().yellow()
    )
}

fn print_welcome_banner(session: &Session) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║             Arduino Mentor Shell - Welcome!                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!(
        "Signed in as {} ({})",
        session.state.profile.name.bold(),
        session.state.profile.skill_level
    );
    println!(
        "Model: {} ({})\n",
        session.provider().name(),
        session.provider().model()
    );
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

async fn navigate(session: &mut Session, view: View) -> Result<()> {
    if session.state.current_view != view {
        session.dispatch(Action::Navigate(view)).await?;
    }
    Ok(())
}

/// Resolve `/start` targets: a dashboard suggestion number or a project id
fn start_action(session: &Session, target: &str) -> Result<Action> {
    if let Ok(n) = target.parse::<usize>() {
        return Dashboard::new(&session.state.profile)
            .start(n)
            .ok_or_else(|| MentorError::NotFound(format!("suggested build {}", n)).into());
    }
    Ok(Action::StartProject(session.project(target)?))
}

async fn execute(session: &mut Session, command: SpecialCommand, raw: &str) -> Result<()> {
    match command {
        SpecialCommand::Help => print_help(),
        SpecialCommand::ShowStatus => show_status(session),
        SpecialCommand::SwitchView(view) => {
            navigate(session, view).await?;
            show_view(session, view);
        }
        SpecialCommand::Projects(filter) => {
            if let Some(filter) = filter {
                session.projects.set_filter(filter)?;
            }
            navigate(session, View::Projects).await?;
            show_projects(session);
        }
        SpecialCommand::Expand(id) => {
            session.projects.toggle_expand(&id)?;
            show_projects(session);
        }
        SpecialCommand::StartProject(target) => {
            let action = start_action(session, &target)?;
            session.dispatch(action).await?;
        }
        SpecialCommand::GenerateProject(idea) => generate_project(session, &idea).await?,
        SpecialCommand::Components(term) => {
            if let Some(term) = term {
                session.components.set_search(&term)?;
            }
            navigate(session, View::Components).await?;
            show_components(session);
        }
        SpecialCommand::SetComponentType(kind) => {
            session.components.set_kind(&kind)?;
            show_components(session);
        }
        SpecialCommand::SetComponentDifficulty(difficulty) => {
            session.components.set_difficulty(difficulty)?;
            show_components(session);
        }
        SpecialCommand::Select(id) => {
            let selected = session.components.toggle_selection(&id)?;
            println!(
                "{} {}. Selection: {}\n",
                if selected { "Selected" } else { "Deselected" },
                id,
                session.components.selected().join(", ")
            );
        }
        SpecialCommand::Recommend => recommend_components(session).await?,
        SpecialCommand::Compatibility { ids, context } => {
            let ids = if ids.is_empty() {
                session.components.selected()
            } else {
                ids
            };
            check_compatibility(session, &ids, context.as_deref()).await?;
        }
        SpecialCommand::AskAbout(id) => {
            let question = component_question(session, &id)?;
            session.dispatch(Action::AskMentor(question)).await?;
        }
        SpecialCommand::AnalyzeCode(path) => {
            navigate(session, View::CodeWorkbench).await?;
            analyze_code(session, path.as_deref()).await?;
        }
        SpecialCommand::AnalyzeCircuit(description) => {
            navigate(session, View::CircuitAnalyzer).await?;
            analyze_circuit(session, description.as_deref()).await?;
        }
        SpecialCommand::Vision { image, project } => {
            navigate(session, View::Vision).await?;
            inspect_image(session, &image, project.as_deref()).await?;
        }
        SpecialCommand::Explain(concept) => {
            navigate(session, View::ReferenceHub).await?;
            explain(session, &concept).await?;
        }
        SpecialCommand::Guide(project) => {
            navigate(session, View::ReferenceHub).await?;
            guide(session, &project).await?;
        }
        SpecialCommand::SetSkill(level) => {
            session.dispatch(Action::SetSkillLevel(level)).await?;
            println!("Skill level set to {}.\n", level);
        }
        SpecialCommand::Kb(command) => knowledge_base(session, command).await?,
        SpecialCommand::Attach(id) => {
            session.dispatch(Action::AttachDataset(id)).await?;
            match session.state.attached() {
                Some(dataset) => println!("Attached {} to chat.\n", dataset.name),
                None => println!("Chat has no dataset attached.\n"),
            }
        }
        SpecialCommand::Stream(on) => {
            let mode = if on {
                ResponseMode::Streaming
            } else {
                ResponseMode::Structured
            };
            session.chat.set_mode(mode)?;
            println!("Response mode: {:?}\n", mode);
        }
        SpecialCommand::Save { index, path } => save_code_block(session, index, &path)?,
        SpecialCommand::None => {
            navigate(session, View::Chat).await?;
            chat_turn(session, raw).await?;
        }
        SpecialCommand::Logout | SpecialCommand::Exit => {}
    }
    Ok(())
}

async fn knowledge_base(session: &mut Session, command: KbCommand) -> Result<()> {
    navigate(session, View::KnowledgeBase).await?;
    match command {
        KbCommand::List => show_datasets(session),
        KbCommand::New => {
            session.dispatch(Action::CreateDataset).await?;
            if let Some(dataset) = session
                .state
                .kb_selection
                .as_deref()
                .and_then(|id| session.state.dataset(id))
            {
                println!("{}\n", render::dataset(dataset));
            }
        }
        KbCommand::Show(id) => {
            let id = id
                .or_else(|| session.state.kb_selection.clone())
                .ok_or_else(|| MentorError::NotFound("open dataset".to_string()))?;
            session.dispatch(Action::SelectDataset(id.clone())).await?;
            if let Some(dataset) = session.state.dataset(&id) {
                println!("{}\n", render::dataset(dataset));
            }
        }
        KbCommand::Edit { id, field, value } => {
            let mut dataset = session
                .state
                .dataset(&id)
                .cloned()
                .ok_or_else(|| MentorError::NotFound(format!("dataset {}", id)))?;
            match field {
                DatasetField::Name => dataset.name = value,
                DatasetField::Description => dataset.description = value,
                DatasetField::Content => {
                    dataset.content = std::fs::read_to_string(&value).map_err(|e| {
                        MentorError::Validation(format!("Cannot read {}: {}", value, e))
                    })?
                }
            }
            session
                .dispatch(Action::SaveDataset {
                    id: dataset.id,
                    name: dataset.name,
                    description: dataset.description,
                    content: dataset.content,
                })
                .await?;
            println!("Saved {}.\n", id);
        }
        KbCommand::Delete(id) => {
            session.dispatch(Action::DeleteDataset(id.clone())).await?;
            println!("Deleted {}.\n", id);
        }
        KbCommand::Import(source) => {
            import_dataset(session, &source).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryPreferenceStore;
    use crate::state::NEW_DATASET_NAME;
    use crate::test_utils::{create_test_file, temp_dir, test_config, ScriptedProvider};

    fn session(provider: ScriptedProvider) -> (Session, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let session = Session::with_parts(
            test_config(),
            provider.clone(),
            Arc::new(MemoryPreferenceStore::new()),
            Some("Ada"),
            None,
        )
        .unwrap();
        (session, provider)
    }

    async fn run(session: &mut Session, line: &str) -> Result<()> {
        let command = parse_special_command(line)?;
        execute(session, command, line).await
    }

    #[tokio::test]
    async fn test_plain_text_is_a_chat_turn() {
        let (mut session, provider) = session(ScriptedProvider::replying(r#"{"text":"Use a resistor"}"#));
        run(&mut session, "Why does my LED burn out?").await.unwrap();
        assert_eq!(session.state.current_view, View::Chat);
        assert_eq!(provider.calls(), 1);
        assert_eq!(session.chat.messages().last().unwrap().text, "Use a resistor");
    }

    #[tokio::test]
    async fn test_switch_view() {
        let (mut session, _) = session(ScriptedProvider::replying("{}"));
        run(&mut session, "/view components").await.unwrap();
        assert_eq!(session.state.current_view, View::Components);
    }

    #[tokio::test]
    async fn test_start_dashboard_suggestion() {
        let (mut session, provider) = session(ScriptedProvider::replying(r#"{"text":"ok"}"#));
        run(&mut session, "/start 1").await.unwrap();
        let prompt = provider.last_request().unwrap().prompt_text().unwrap().to_string();
        assert!(prompt.contains("Distance Sensor Alarm"));
        assert!(run(&mut session, "/start 9").await.is_err());
    }

    #[tokio::test]
    async fn test_kb_lifecycle() {
        let (mut session, _) = session(ScriptedProvider::replying("{}"));
        run(&mut session, "/kb new").await.unwrap();
        let id = session.state.kb_selection.clone().unwrap();
        assert_eq!(session.state.dataset(&id).unwrap().name, NEW_DATASET_NAME);

        run(&mut session, &format!("/kb edit {} name Servo notes", id))
            .await
            .unwrap();
        let dir = temp_dir();
        let path = create_test_file(&dir, "notes.txt", "Orange is signal");
        run(
            &mut session,
            &format!("/kb edit {} content {}", id, path.display()),
        )
        .await
        .unwrap();
        let dataset = session.state.dataset(&id).unwrap();
        assert_eq!(dataset.name, "Servo notes");
        assert_eq!(dataset.content, "Orange is signal");

        run(&mut session, &format!("/attach {}", id)).await.unwrap();
        assert_eq!(session.state.attached_dataset.as_deref(), Some(id.as_str()));
        run(&mut session, &format!("/kb delete {}", id)).await.unwrap();
        assert!(session.state.datasets.is_empty());
        assert!(session.state.attached_dataset.is_none());
    }

    #[tokio::test]
    async fn test_stream_toggle() {
        let (mut session, _) = session(ScriptedProvider::replying("{}"));
        run(&mut session, "/stream on").await.unwrap();
        assert_eq!(session.chat.mode(), ResponseMode::Streaming);
        run(&mut session, "/stream off").await.unwrap();
        assert_eq!(session.chat.mode(), ResponseMode::Structured);
    }

    #[tokio::test]
    async fn test_compat_uses_selection_when_no_ids() {
        let (mut session, provider) = session(ScriptedProvider::replying("Looks safe"));
        run(&mut session, "/select m2").await.unwrap();
        run(&mut session, "/select s7").await.unwrap();
        assert_eq!(session.components.selected(), vec!["m2", "s7"]);
        run(&mut session, "/compat -- greenhouse").await.unwrap();
        let prompt = provider.last_request().unwrap().prompt_text().unwrap().to_string();
        assert!(prompt.contains("ESP32 DevKit, BME280"));
        assert!(prompt.contains("Context: greenhouse."));
    }

    #[tokio::test]
    async fn test_set_skill() {
        let (mut session, _) = session(ScriptedProvider::replying("{}"));
        run(&mut session, "/skill expert").await.unwrap();
        assert_eq!(session.state.profile.skill_level, crate::domain::SkillLevel::Expert);
    }

    #[test]
    fn test_login_restarts_chat() {
        let (mut session, _) = session(ScriptedProvider::replying("{}"));
        session.state.dispatch(Action::Logout).unwrap();
        session.login("", "grace@example.com").unwrap();
        let messages = session.chat.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.contains("Hello grace!"));
    }
}
