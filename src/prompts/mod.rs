//! Prompt construction
//!
//! Chat prompts carry a context header describing the user's skill, an
//! optional knowledge base block and the query itself. Tool screens use the
//! single-shot prompts in [`task_prompts`].

pub mod system_prompt;
pub mod task_prompts;

pub use system_prompt::build_system_instruction;

use crate::domain::{Dataset, UserProfile};

/// Build the prompt sent for one chat turn
///
/// Pure and deterministic: skills are listed in name order with two
/// decimals, and the knowledge base block only appears when a dataset is
/// attached.
///
/// # Examples
///
/// ```
/// use arduino_mentor::domain::UserProfile;
/// use arduino_mentor::prompts::assemble_prompt;
///
/// let prompt = assemble_prompt("Blink an LED", &UserProfile::default(), None);
/// assert!(prompt.starts_with("[SYSTEM CONTEXT: User Skill Level: Intermediate."));
/// assert!(prompt.ends_with("User Query: Blink an LED"));
/// assert!(!prompt.contains("KNOWLEDGE BASE"));
/// ```
pub fn assemble_prompt(text: &str, profile: &UserProfile, dataset: Option<&Dataset>) -> String {
    let mut header = format!("[SYSTEM CONTEXT: User Skill Level: {}.", profile.skill_level);
    if !profile.skills.is_empty() {
        let breakdown = profile
            .skills
            .iter()
            .map(|(name, value)| format!("{}={:.2}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        header.push_str(&format!(" Skill Breakdown: {}.", breakdown));
    }
    header.push_str(" Adjust your explanation complexity accordingly.]");

    let mut sections = vec![header];
    if let Some(dataset) = dataset {
        sections.push(format!(
            "[SYSTEM: KNOWLEDGE BASE ATTACHED]\nThe user has provided the following specific technical context. Use this information to answer if relevant.\n--- START DATASET: {} ---\n{}\n--- END DATASET ---",
            dataset.name, dataset.content
        ));
    }
    sections.push(format!("User Query: {}", text));
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetSource, SkillLevel};
    use std::collections::BTreeMap;

    #[test]
    fn test_assemble_prompt_lists_sorted_skills() {
        let prompt = assemble_prompt("hi", &UserProfile::default(), None);
        assert!(prompt.contains(
            "Skill Breakdown: debugging=0.30, electronics=0.40, iot=0.20, programming=0.60."
        ));
    }

    #[test]
    fn test_assemble_prompt_with_dataset_block() {
        let dataset = Dataset::new(
            "d1",
            "Uno pinout",
            "notes",
            "Pin 13 has an onboard LED.",
            DatasetSource::Manual,
        );
        let prompt = assemble_prompt("Which pin?", &UserProfile::default(), Some(&dataset));
        assert!(prompt.contains("[SYSTEM: KNOWLEDGE BASE ATTACHED]"));
        assert!(prompt.contains(
            "--- START DATASET: Uno pinout ---\nPin 13 has an onboard LED.\n--- END DATASET ---\n\nUser Query: Which pin?"
        ));
    }

    #[test]
    fn test_assemble_prompt_without_skills_omits_breakdown() {
        let profile = UserProfile {
            name: "Ada".to_string(),
            skill_level: SkillLevel::Expert,
            skills: BTreeMap::new(),
        };
        let prompt = assemble_prompt("x", &profile, None);
        assert_eq!(
            prompt,
            "[SYSTEM CONTEXT: User Skill Level: Expert. Adjust your explanation complexity accordingly.]\n\nUser Query: x"
        );
    }

    #[test]
    fn test_assemble_prompt_is_deterministic() {
        let profile = UserProfile::default();
        assert_eq!(
            assemble_prompt("same", &profile, None),
            assemble_prompt("same", &profile, None)
        );
    }
}
