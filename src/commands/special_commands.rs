//! Special commands parser for the interactive shell
//!
//! Special commands switch views, drive the tool screens and manage the
//! knowledge base. Anything that is not a special command is a chat turn.
//!
//! Commands are prefixed with `/`. Command names are case-insensitive;
//! arguments keep their case.

use crate::catalog::DifficultyFilter;
use crate::domain::SkillLevel;
use crate::state::View;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Knowledge base subcommands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KbCommand {
    List,
    New,
    /// Show a dataset; the open one when no id is given
    Show(Option<String>),
    /// Replace one field of a dataset
    Edit {
        id: String,
        field: DatasetField,
        value: String,
    },
    Delete(String),
    /// Import from a file path or an http(s) URL
    Import(String),
}

/// Editable dataset fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetField {
    Name,
    Description,
    /// Content is read from the file named by the value
    Content,
}

/// Special commands that can be executed in the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    Help,
    ShowStatus,
    /// Switch to a view and show it
    SwitchView(View),
    /// List projects, optionally changing the difficulty filter
    Projects(Option<DifficultyFilter>),
    /// Expand or collapse a project in the listing
    Expand(String),
    /// Start a project: a library id, or a dashboard suggestion number
    StartProject(String),
    GenerateProject(String),
    /// List components, optionally changing the search term
    Components(Option<String>),
    SetComponentType(String),
    SetComponentDifficulty(DifficultyFilter),
    /// Toggle a component in the compatibility selection
    Select(String),
    Recommend,
    /// Audit the given ids, or the current selection when empty
    Compatibility {
        ids: Vec<String>,
        context: Option<String>,
    },
    /// Ask the mentor about a component
    AskAbout(String),
    /// Review a sketch file, or the current sketch
    AnalyzeCode(Option<PathBuf>),
    /// Check a wiring description, or the current one
    AnalyzeCircuit(Option<String>),
    Vision {
        image: PathBuf,
        project: Option<String>,
    },
    Explain(String),
    Guide(String),
    Kb(KbCommand),
    /// Attach a dataset to chat turns, `None` to detach
    Attach(Option<String>),
    /// Switch chat between streamed plain text and structured replies
    Stream(bool),
    SetSkill(SkillLevel),
    /// Save a numbered code block from the last mentor reply
    Save { index: usize, path: PathBuf },
    Logout,
    Exit,
    /// Not a special command
    None,
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn unsupported(command: &str, arg: &str) -> CommandError {
    CommandError::UnsupportedArgument {
        command: command.to_string(),
        arg: arg.to_string(),
    }
}

fn required<'a>(rest: &'a str, command: &str, usage: &str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(missing(command, usage))
    } else {
        Ok(rest)
    }
}

fn optional(rest: &str) -> Option<String> {
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn difficulty(command: &str, arg: &str) -> Result<DifficultyFilter, CommandError> {
    DifficultyFilter::parse_str(arg).map_err(|_| unsupported(command, arg))
}

fn parse_kb(rest: &str) -> Result<KbCommand, CommandError> {
    let (sub, args) = split_word(rest);
    match sub.to_lowercase().as_str() {
        "" | "list" | "ls" => Ok(KbCommand::List),
        "new" | "create" => Ok(KbCommand::New),
        "show" => Ok(KbCommand::Show(optional(args))),
        "delete" | "rm" => Ok(KbCommand::Delete(
            required(args, "/kb delete", "/kb delete <dataset-id>")?.to_string(),
        )),
        "import" => Ok(KbCommand::Import(
            required(args, "/kb import", "/kb import <file|url>")?.to_string(),
        )),
        "edit" => {
            let usage = "/kb edit <dataset-id> <name|description|content> <value>";
            let (id, args) = split_word(args);
            let (field, value) = split_word(args);
            if id.is_empty() || field.is_empty() || value.is_empty() {
                return Err(missing("/kb edit", usage));
            }
            let field = match field.to_lowercase().as_str() {
                "name" => DatasetField::Name,
                "description" | "desc" => DatasetField::Description,
                "content" => DatasetField::Content,
                other => return Err(unsupported("/kb edit", other)),
            };
            Ok(KbCommand::Edit {
                id: id.to_string(),
                field,
                value: value.to_string(),
            })
        }
        other => Err(unsupported("/kb", other)),
    }
}

fn parse_compat(rest: &str) -> Result<SpecialCommand, CommandError> {
    let (ids, context) = match rest.split_once("--") {
        Some((ids, context)) => (ids, optional(context.trim())),
        None => (rest, None),
    };
    let ids = ids.split_whitespace().map(str::to_string).collect();
    Ok(SpecialCommand::Compatibility { ids, context })
}

/// Split off the first whitespace-delimited word
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not
/// a valid command, `UnsupportedArgument` for a bad argument and
/// `MissingArgument` when a required argument is absent.
///
/// # Examples
///
/// ```
/// use arduino_mentor::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/explain PWM").unwrap(), SpecialCommand::Explain("PWM".into()));
/// assert_eq!(parse_special_command("how do I debounce?").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (command, rest) = split_word(trimmed);
    let command = command.to_lowercase();

    match command.as_str() {
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        "/logout" => Ok(SpecialCommand::Logout),

        "/view" => {
            let name = required(rest, "/view", "/view <name>")?;
            View::parse_str(name)
                .map(SpecialCommand::SwitchView)
                .map_err(|_| unsupported("/view", name))
        }
        "/dashboard" | "/home" => Ok(SpecialCommand::SwitchView(View::Dashboard)),
        "/chat" => Ok(SpecialCommand::SwitchView(View::Chat)),

        "/projects" => match rest {
            "" => Ok(SpecialCommand::Projects(None)),
            arg => Ok(SpecialCommand::Projects(Some(difficulty("/projects", arg)?))),
        },
        "/expand" => Ok(SpecialCommand::Expand(
            required(rest, "/expand", "/expand <project-id>")?.to_string(),
        )),
        "/start" => Ok(SpecialCommand::StartProject(
            required(rest, "/start", "/start <project-id|suggestion-number>")?.to_string(),
        )),
        "/generate" => Ok(SpecialCommand::GenerateProject(
            required(rest, "/generate", "/generate <idea>")?.to_string(),
        )),

        "/components" => Ok(SpecialCommand::Components(optional(rest))),
        "/search" => Ok(SpecialCommand::Components(Some(rest.to_string()))),
        "/type" => Ok(SpecialCommand::SetComponentType(
            required(rest, "/type", "/type <component-type|all>")?.to_string(),
        )),
        "/difficulty" => {
            let arg = required(rest, "/difficulty", "/difficulty <all|beginner|...>")?;
            Ok(SpecialCommand::SetComponentDifficulty(difficulty(
                "/difficulty",
                arg,
            )?))
        }
        "/select" => Ok(SpecialCommand::Select(
            required(rest, "/select", "/select <component-id>")?.to_string(),
        )),
        "/recommend" => Ok(SpecialCommand::Recommend),
        "/compat" => parse_compat(rest),
        "/ask" => Ok(SpecialCommand::AskAbout(
            required(rest, "/ask", "/ask <component-id>")?.to_string(),
        )),

        "/code" => Ok(SpecialCommand::AnalyzeCode(optional(rest).map(PathBuf::from))),
        "/circuit" => Ok(SpecialCommand::AnalyzeCircuit(optional(rest))),
        "/vision" => {
            let (image, project) = split_word(required(rest, "/vision", "/vision <image> [project-id]")?);
            Ok(SpecialCommand::Vision {
                image: PathBuf::from(image),
                project: optional(project),
            })
        }
        "/explain" => Ok(SpecialCommand::Explain(
            required(rest, "/explain", "/explain <concept>")?.to_string(),
        )),
        "/guide" => Ok(SpecialCommand::Guide(
            required(rest, "/guide", "/guide <project-id>")?.to_string(),
        )),

        "/kb" => parse_kb(rest).map(SpecialCommand::Kb),
        "/attach" => {
            let arg = required(rest, "/attach", "/attach <dataset-id|none>")?;
            if arg.eq_ignore_ascii_case("none") {
                Ok(SpecialCommand::Attach(None))
            } else {
                Ok(SpecialCommand::Attach(Some(arg.to_string())))
            }
        }
        "/stream" => match rest.to_lowercase().as_str() {
            "" | "on" => Ok(SpecialCommand::Stream(true)),
            "off" => Ok(SpecialCommand::Stream(false)),
            other => Err(unsupported("/stream", other)),
        },
        "/skill" => {
            let arg = required(rest, "/skill", "/skill <beginner|intermediate|advanced|expert>")?;
            SkillLevel::parse_str(arg)
                .map(SpecialCommand::SetSkill)
                .map_err(|_| unsupported("/skill", arg))
        }
        "/save" => {
            let usage = "/save <block-number> <path>";
            let (index, path) = split_word(rest);
            if index.is_empty() || path.is_empty() {
                return Err(missing("/save", usage));
            }
            let index = index
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| unsupported("/save", index))?;
            Ok(SpecialCommand::Save {
                index,
                path: PathBuf::from(path),
            })
        }

        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

pub fn print_help() {
    println!(
        r#"
Special Commands for the Mentor Shell
=====================================

NAVIGATION:
  /view <name>        - Switch view (dashboard, chat, projects, reference,
                        components, code, circuit, vision, kb, settings)
  /dashboard          - Show the dashboard
  /chat               - Back to the mentor chat
  /status             - Show user, provider and session status
  /logout             - Sign out
  /exit, /quit        - Leave the shell

PROJECTS:
  /projects [level]   - List projects, optionally filtered by difficulty
  /expand <id>        - Show or hide a project's details
  /start <id|n>       - Start a project (or dashboard suggestion n) in chat
  /generate <idea>    - Design a custom project from an idea
  /guide <id>         - Technical reference guide for a project

COMPONENTS:
  /components [term]  - List components, optionally setting the search term
  /type <type>        - Filter by component type (or all)
  /difficulty <level> - Filter by difficulty (or all)
  /select <id>        - Toggle a component for the compatibility check
  /recommend          - Recommend parts for the current search term
  /compat [ids] [-- context]
                      - Check the interoperability of components
                        (the /select selection when no ids are given)
  /ask <id>           - Ask the mentor how to use a component

TOOLS:
  /code [file]        - Review a sketch (current sketch when no file)
  /circuit [text]     - Check a wiring description
  /vision <image> [project-id]
                      - Inspect a photo of your build
  /explain <concept>  - Explain a concept at your skill level
  /skill <level>      - Change your skill level

KNOWLEDGE BASE:
  /kb list            - List datasets
  /kb new             - Create a dataset
  /kb show [id]       - Show a dataset
  /kb edit <id> <name|description|content> <value>
                      - Edit a dataset (content is read from a file)
  /kb delete <id>     - Delete a dataset
  /kb import <file|url>
                      - Import a dataset
  /attach <id|none>   - Attach a dataset to chat turns

CHAT:
  /stream on|off      - Stream plain-text replies instead of structured ones
  /save <n> <path>    - Save code block n of the last reply to a file
  Ctrl-C              - Cancel a streaming reply

Anything else is sent to the mentor.
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("What resistor for an LED?").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(parse_special_command("quit").unwrap(), SpecialCommand::Exit);
    }

    #[test]
    fn test_view_aliases() {
        assert_eq!(
            parse_special_command("/view KB").unwrap(),
            SpecialCommand::SwitchView(View::KnowledgeBase)
        );
        assert_eq!(
            parse_special_command("/DASHBOARD").unwrap(),
            SpecialCommand::SwitchView(View::Dashboard)
        );
        assert!(matches!(
            parse_special_command("/view login"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
    }

    #[test]
    fn test_arguments_keep_case() {
        assert_eq!(
            parse_special_command("/generate Plant Watering Robot").unwrap(),
            SpecialCommand::GenerateProject("Plant Watering Robot".to_string())
        );
        assert_eq!(
            parse_special_command("/code sketches/Blink.ino").unwrap(),
            SpecialCommand::AnalyzeCode(Some(PathBuf::from("sketches/Blink.ino")))
        );
    }

    #[test]
    fn test_projects_filter() {
        assert_eq!(
            parse_special_command("/projects advanced").unwrap(),
            SpecialCommand::Projects(Some(DifficultyFilter::Level(SkillLevel::Advanced)))
        );
        assert!(parse_special_command("/projects legendary").is_err());
    }

    #[test]
    fn test_compat_with_context() {
        assert_eq!(
            parse_special_command("/compat m1 s7 -- outdoor weather box").unwrap(),
            SpecialCommand::Compatibility {
                ids: vec!["m1".to_string(), "s7".to_string()],
                context: Some("outdoor weather box".to_string()),
            }
        );
        assert_eq!(
            parse_special_command("/compat -- ctx").unwrap(),
            SpecialCommand::Compatibility {
                ids: Vec::new(),
                context: Some("ctx".to_string()),
            }
        );
    }

    #[test]
    fn test_vision_with_project() {
        assert_eq!(
            parse_special_command("/vision bench.jpg p4").unwrap(),
            SpecialCommand::Vision {
                image: PathBuf::from("bench.jpg"),
                project: Some("p4".to_string()),
            }
        );
    }

    #[test]
    fn test_kb_subcommands() {
        assert_eq!(
            parse_special_command("/kb").unwrap(),
            SpecialCommand::Kb(KbCommand::List)
        );
        assert_eq!(
            parse_special_command("/kb import https://example.com/pinout.txt").unwrap(),
            SpecialCommand::Kb(KbCommand::Import(
                "https://example.com/pinout.txt".to_string()
            ))
        );
        assert_eq!(
            parse_special_command("/kb edit ds-1 name Servo Notes").unwrap(),
            SpecialCommand::Kb(KbCommand::Edit {
                id: "ds-1".to_string(),
                field: DatasetField::Name,
                value: "Servo Notes".to_string(),
            })
        );
        assert!(parse_special_command("/kb edit ds-1 colour red").is_err());
        assert!(parse_special_command("/kb frobnicate").is_err());
    }

    #[test]
    fn test_attach_and_stream() {
        assert_eq!(
            parse_special_command("/attach none").unwrap(),
            SpecialCommand::Attach(None)
        );
        assert_eq!(
            parse_special_command("/stream off").unwrap(),
            SpecialCommand::Stream(false)
        );
        assert!(parse_special_command("/stream maybe").is_err());
    }

    #[test]
    fn test_save_requires_positive_index() {
        assert_eq!(
            parse_special_command("/save 2 out.ino").unwrap(),
            SpecialCommand::Save {
                index: 2,
                path: PathBuf::from("out.ino"),
            }
        );
        assert!(parse_special_command("/save 0 out.ino").is_err());
        assert!(matches!(
            parse_special_command("/save 1"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_missing_argument_message() {
        let err = parse_special_command("/explain").unwrap_err();
        assert!(err.to_string().contains("Usage: /explain <concept>"));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_special_command("/teleport now").unwrap_err(),
            CommandError::UnknownCommand("/teleport".to_string())
        );
    }
}
