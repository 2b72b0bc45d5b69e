//! Terminal rendering for messages, reports and catalog listings
//!
//! Every function returns the rendered text or table instead of printing,
//! so the shell and the one-shot commands share the same output.

use crate::domain::{Component, Dataset, Project};
use crate::exchange::{format_confidence, AgentStatus, ChatMessage, ResponseMetadata, Role};
use crate::markdown;
use crate::screens::components::Recommendation;
use crate::screens::{CodeAnalysis, Dashboard};
use colored::Colorize;
use prettytable::{row, Table};

/// A transcript message with its speaker tag and, for structured replies,
/// the fleet plan and results underneath
pub fn message(message: &ChatMessage) -> String {
    let tag = match message.role {
        Role::User => "you".bold().blue().to_string(),
        Role::Model if message.is_error => "mentor".bold().red().to_string(),
        Role::Model => "mentor".bold().green().to_string(),
    };
    let body = if message.is_error {
        message.text.red().to_string()
    } else {
        markdown::render_terminal(&message.text)
    };

    let mut out = format!("{} {}", tag, body);
    if let Some(metadata) = &message.metadata {
        let details = metadata_details(metadata);
        if !details.is_empty() {
            out.push_str("\n\n");
            out.push_str(&details);
        }
    }
    out
}

/// Plan, agent results, next actions and confidence of a structured reply
pub fn metadata_details(metadata: &ResponseMetadata) -> String {
    let mut sections = Vec::new();

    if let Some(intent) = &metadata.intent {
        sections.push(format!("{} {}", "Intent:".dimmed(), intent));
    }

    if !metadata.plan.is_empty() {
        let mut plan = "Plan".bold().to_string();
        for (i, step) in metadata.plan.iter().enumerate() {
            plan.push_str(&format!("\n  {}. [{}] {}", i + 1, step.agent.cyan(), step.task));
        }
        sections.push(plan);
    }

    if !metadata.results.is_empty() {
        let mut results = "Agent results".bold().to_string();
        for (agent, result) in &metadata.results {
            let status = match result.status {
                AgentStatus::Ok => "ok".green(),
                AgentStatus::Fail => "fail".red(),
            };
            results.push_str(&format!("\n  {} ({}): {}", agent.cyan(), status, result.output));
            for artifact in &result.artifacts {
                results.push_str(&format!(
                    "\n    {} {:?}: {}",
                    "artifact".dimmed(),
                    artifact.kind,
                    artifact.name
                ));
            }
        }
        sections.push(results);
    }

    if !metadata.next_actions.is_empty() {
        let mut next = "Next actions".bold().to_string();
        for action in &metadata.next_actions {
            next.push_str(&format!("\n  - {}", action));
        }
        sections.push(next);
    }

    let mut footer = Vec::new();
    if let Some(confidence) = metadata.confidence {
        footer.push(format!("Confidence: {}", format_confidence(confidence)));
    }
    if metadata.requires_confirmation {
        footer.push("Awaiting your confirmation".yellow().to_string());
    }
    if !footer.is_empty() {
        sections.push(footer.join("  ").dimmed().to_string());
    }

    sections.join("\n\n")
}

/// A model-written report (circuit, compatibility, explanation, guide)
pub fn report(title: &str, text: &str) -> String {
    format!(
        "{}\n\n{}",
        title.bold().underline(),
        markdown::render_terminal(text)
    )
}

pub fn code_analysis(analysis: &CodeAnalysis) -> String {
    match analysis {
        CodeAnalysis::Text(text) => markdown::render_terminal(text),
        CodeAnalysis::Review(review) => {
            let mut out = format!("{}\n{}", "Summary".bold(), review.summary);
            if review.issues.is_empty() {
                out.push_str(&format!("\n\n{}", "No issues found.".green()));
                return out;
            }
            for issue in &review.issues {
                let line = issue
                    .line
                    .map(|l| format!("line {}", l))
                    .unwrap_or_else(|| "general".to_string());
                let severity = match issue.severity.to_lowercase().as_str() {
                    "error" | "critical" | "high" => issue.severity.red(),
                    "warning" | "medium" => issue.severity.yellow(),
                    _ => issue.severity.normal(),
                };
                out.push_str(&format!("\n\n[{}] {} {}", severity, line.dimmed(), issue.message));
                if !issue.suggestion.is_empty() {
                    out.push_str(&format!("\n  {} {}", "fix:".cyan(), issue.suggestion));
                }
            }
            out
        }
    }
}

pub fn projects_table(projects: &[Project], expanded: Option<&str>) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Title", "Difficulty", "Time", "Tags"]);
    for project in projects {
        table.add_row(row![
            project.id,
            project.title,
            project.difficulty,
            project.time_estimate,
            project.tags.join(", ")
        ]);
        if expanded == Some(project.id.as_str()) {
            table.add_row(row!["", project.description, "", "", ""]);
            table.add_row(row!["", format!("Parts: {}", project.components.join(", ")), "", "", ""]);
        }
    }
    table
}

pub fn components_table(components: &[Component], selected: &[String]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["", "ID", "Name", "Type", "Voltage", "Pins", "Difficulty"]);
    for component in components {
        let mark = if selected.contains(&component.id) {
            "*"
        } else {
            ""
        };
        table.add_row(row![
            mark,
            component.id,
            component.name,
            component.kind,
            component.voltage,
            component.pins,
            component.difficulty
        ]);
    }
    table
}

pub fn recommendations_table(recommendations: &[Recommendation]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Name", "Type", "Price", "Why"]);
    for rec in recommendations {
        table.add_row(row![
            rec.name,
            rec.kind,
            rec.approximate_price,
            rec.reason_for_recommendation
        ]);
    }
    table
}

pub fn datasets_table(datasets: &[Dataset], attached: Option<&str>) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Name", "Source", "Updated", "Chars", "Attached"]);
    for dataset in datasets {
        let is_attached = if attached == Some(dataset.id.as_str()) {
            "yes"
        } else {
            ""
        };
        table.add_row(row![
            dataset.id,
            dataset.name,
            dataset.source,
            dataset.updated_at.format("%Y-%m-%d %H:%M"),
            dataset.content.chars().count(),
            is_attached
        ]);
    }
    table
}

pub fn dataset(dataset: &Dataset) -> String {
    format!(
        "{} ({})\n{}\n\n{}",
        dataset.name.bold(),
        dataset.id.dimmed(),
        dataset.description.italic(),
        dataset.content
    )
}

pub fn dashboard(dashboard: &Dashboard) -> String {
    let mut out = format!(
        "{}\n{}\nCurrent expertise: {}\n\n{}",
        "Project Workspace".bold().underline(),
        dashboard.headline(),
        dashboard.skill_level.to_string().cyan(),
        "Engineering tools".bold()
    );
    for (i, tool) in dashboard.tools.iter().enumerate() {
        out.push_str(&format!("\n  {}. {} - {}", i + 1, tool.view, tool.blurb));
    }
    out.push_str(&format!("\n\n{}", "Suggested builds".bold()));
    for (i, build) in dashboard.suggestions.iter().enumerate() {
        out.push_str(&format!(
            "\n  {:02} {} ({}) {}",
            i + 1,
            build.project.title,
            build.project.difficulty,
            build.highlights.dimmed()
        ));
    }
    out
}
