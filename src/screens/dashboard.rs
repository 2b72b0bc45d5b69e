//! Dashboard: skill level, quick tools and suggested builds

use crate::catalog::initial_projects;
use crate::domain::{Project, SkillLevel, UserProfile};
use crate::state::{Action, View};

/// A shortcut to one of the tool views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickTool {
    pub view: View,
    pub blurb: &'static str,
}

/// A library project featured on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedBuild {
    pub project: Project,
    pub highlights: &'static str,
}

const SUGGESTED: [(&str, &str); 2] = [
    ("p4", "Ultrasonic Sensor • Piezo • Logic"),
    ("p6", "ESP32 • BME280 • IoT"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub name: String,
    pub skill_level: SkillLevel,
    pub tools: Vec<QuickTool>,
    pub suggestions: Vec<SuggestedBuild>,
}

impl Dashboard {
    pub fn new(profile: &UserProfile) -> Self {
        let library = initial_projects();
        let suggestions = SUGGESTED
            .iter()
            .filter_map(|(id, highlights)| {
                library
                    .iter()
                    .find(|p| p.id == *id)
                    .map(|project| SuggestedBuild {
                        project: project.clone(),
                        highlights: *highlights,
                    })
            })
            .collect();

        Self {
            name: profile.name.clone(),
            skill_level: profile.skill_level,
            tools: vec![
                QuickTool {
                    view: View::CodeWorkbench,
                    blurb: "Write, validate, and optimize C++.",
                },
                QuickTool {
                    view: View::CircuitAnalyzer,
                    blurb: "Verify logic and safety of connections.",
                },
                QuickTool {
                    view: View::Vision,
                    blurb: "Real-time build verification via camera.",
                },
            ],
            suggestions,
        }
    }

    pub fn headline(&self) -> String {
        match self.suggestions.first() {
            Some(build) => format!(
                "Ready to build? Select a tool or continue your work on \"{}\".",
                build.project.title
            ),
            None => "Ready to build? Select a tool.".to_string(),
        }
    }

    /// Action for the n-th suggested build (1-based, as displayed)
    pub fn start(&self, n: usize) -> Option<Action> {
        let build = self.suggestions.get(n.checked_sub(1)?)?;
        Some(Action::StartProject(build.project.clone()))
    }

    /// Action for the n-th quick tool (1-based)
    pub fn open_tool(&self, n: usize) -> Option<Action> {
        let tool = self.tools.get(n.checked_sub(1)?)?;
        Some(Action::Navigate(tool.view))
    }
}
