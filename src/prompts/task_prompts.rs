//! Single-shot task prompts used by the tool screens
//!
//! Each prompt names the agent persona the model should adopt. All of them
//! are pure functions of their inputs.

use crate::domain::{Project, SkillLevel};

/// Code review; the reply is JSON `{summary, issues[]}`
pub fn code_analysis(code: &str) -> String {
    format!(
        "Task: Code Analysis
Role: debug-agent
Analyze the following Arduino C++ code for syntax, logic, and style.
Return a JSON object with:
1. \"summary\": A brief string summarizing the quality.
2. \"issues\": An array of objects: {{line, severity, message, suggestion}}
Code:
{}",
        code
    )
}

pub fn circuit_analysis(description: &str) -> String {
    format!(
        "Task: Circuit Analysis
Role: safety-agent & hardware-agent
Analyze the wiring description for safety risks (voltage, polarity, current) and logic.
Circuit: {}",
        description
    )
}

/// Inspection of one camera frame; the frame itself travels as inline data
pub fn vision_inspection(project_context: &str) -> String {
    format!(
        "Task: Vision Inspection
Role: vision-agent
Analyze this camera frame for the project: {}.
Identify components, verify wiring against known pinouts, and flag hazards.",
        project_context
    )
}

/// Project description used as context for a vision inspection
///
/// ```
/// use arduino_mentor::prompts::task_prompts::vision_context;
///
/// assert_eq!(vision_context(None), "General Arduino prototyping");
/// ```
pub fn vision_context(project: Option<&Project>) -> String {
    match project {
        Some(project) => format!(
            "Building project: {}. Components: {}. Description: {}",
            project.title,
            project.components.join(", "),
            project.description
        ),
        None => "General Arduino prototyping".to_string(),
    }
}

pub fn concept_explanation(concept: &str, level: SkillLevel) -> String {
    format!(
        "Task: Technical Teaching
Role: ux-agent (Tutor)
Explain \"{}\" for a user at the {} skill level. Use analogies for beginners, technical specs for experts.",
        concept, level
    )
}

pub fn project_reference(title: &str, components: &[String], level: SkillLevel) -> String {
    format!(
        "Task: Project Documentation
Role: doc-agent
Create a comprehensive Technical Reference Guide for the project \"{}\".
Components: {}
Target Audience: {} level engineers.
Include: BOM, Wiring Map, Logic Overview, and Troubleshooting.",
        title,
        components.join(", "),
        level
    )
}

/// Custom project design; the reply is a JSON project object
pub fn custom_project(idea: &str, level: SkillLevel) -> String {
    format!(
        "Task: Project Generation
Role: planner-agent
Design a full project structure based on the user idea: \"{}\".
Skill Level: {}.
Return a JSON object with: \"id\", \"title\", \"description\", \"difficulty\" (Beginner, Intermediate, Advanced or Expert), \"timeEstimate\", \"components\" (array of strings), \"tags\" (array of strings).",
        idea, level
    )
}

/// Component shopping list; the reply is a JSON array of three objects
pub fn component_recommendation(term: &str, level: SkillLevel) -> String {
    format!(
        "Task: Procurement Selection
Role: procure-agent
Recommend 3 Arduino-compatible components for: \"{}\".
User Level: {}.
Return a JSON array of objects with: \"name\", \"type\", \"approximatePrice\", \"reasonForRecommendation\".",
        term, level
    )
}

pub fn compatibility_audit(component_names: &[String], context: &str) -> String {
    format!(
        "Task: Compatibility Audit
Role: hardware-agent & safety-agent
Check the interoperability of: {}.
Context: {}.
Identify voltage mismatches, shared pin conflicts, and power draw issues.",
        component_names.join(", "),
        context
    )
}

/// Chat seed produced when the user starts a project
pub fn project_start(title: &str) -> String {
    format!(
        "I want to start the project \"{}\". Can you guide me through the required components and the circuit diagram first?",
        title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::initial_projects;

    #[test]
    fn test_code_analysis_embeds_code_and_persona() {
        let prompt = code_analysis("void loop() {}");
        assert!(prompt.contains("Role: debug-agent"));
        assert!(prompt.ends_with("Code:\nvoid loop() {}"));
        assert!(prompt.contains("{line, severity, message, suggestion}"));
    }

    #[test]
    fn test_vision_context_describes_project() {
        let projects = initial_projects();
        let context = vision_context(Some(&projects[0]));
        assert!(context.starts_with("Building project: Blink an LED. Components: Arduino Uno, LED, 220Ω Resistor."));
    }

    #[test]
    fn test_concept_explanation_names_level() {
        let prompt = concept_explanation("PWM", SkillLevel::Beginner);
        assert!(prompt.contains("Explain \"PWM\" for a user at the Beginner skill level."));
    }

    #[test]
    fn test_project_start_message() {
        assert_eq!(
            project_start("Blink an LED"),
            "I want to start the project \"Blink an LED\". Can you guide me through the required components and the circuit diagram first?"
        );
    }

    #[test]
    fn test_compatibility_audit_lists_components() {
        let prompt = compatibility_audit(
            &["Arduino Uno R3".to_string(), "BME280".to_string()],
            "Weather station",
        );
        assert!(prompt.contains("Check the interoperability of: Arduino Uno R3, BME280."));
        assert!(prompt.contains("Context: Weather station."));
    }
}
