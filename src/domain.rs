//! Core domain entities shared by the screens
//!
//! Users, projects, components and knowledge base datasets. These are plain
//! data; behavior lives in the screens and the application state reducer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse user proficiency tag used to phrase prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    /// All levels in ascending order
    pub const ALL: [SkillLevel; 4] = [
        SkillLevel::Beginner,
        SkillLevel::Intermediate,
        SkillLevel::Advanced,
        SkillLevel::Expert,
    ];

    /// Parse a skill level from a string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use arduino_mentor::domain::SkillLevel;
    ///
    /// assert_eq!(SkillLevel::parse_str("advanced").unwrap(), SkillLevel::Advanced);
    /// assert!(SkillLevel::parse_str("wizard").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "expert" => Ok(Self::Expert),
            other => Err(format!("Unknown skill level: {}", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Expert => "Expert",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user and their self-declared proficiency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub skill_level: SkillLevel,
    /// Named proficiencies in [0, 1], kept sorted for deterministic prompts
    pub skills: BTreeMap<String, f64>,
}

impl Default for UserProfile {
    fn default() -> Self {
        let mut skills = BTreeMap::new();
        skills.insert("electronics".to_string(), 0.4);
        skills.insert("programming".to_string(), 0.6);
        skills.insert("iot".to_string(), 0.2);
        skills.insert("debugging".to_string(), 0.3);
        Self {
            name: "Engineer".to_string(),
            skill_level: SkillLevel::Intermediate,
            skills,
        }
    }
}

impl UserProfile {
    /// Set a named proficiency, clamping into [0, 1]
    pub fn set_skill(&mut self, name: impl Into<String>, value: f64) {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        self.skills.insert(name.into(), value);
    }
}

/// Where a knowledge base dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSource {
    #[default]
    Manual,
    File,
    Url,
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::File => write!(f, "file"),
            Self::Url => write!(f, "url"),
        }
    }
}

/// User-supplied reference text attached to a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub description: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub source: DatasetSource,
}

impl Dataset {
    /// Create a dataset stamped with the current time
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
        source: DatasetSource,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            content: content.into(),
            updated_at: Utc::now(),
            source,
        }
    }
}

/// A hands-on build in the project library
///
/// Field names follow the camelCase JSON the model is asked to produce for
/// generated projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: SkillLevel,
    pub time_estimate: String,
    pub components: Vec<String>,
    pub tags: Vec<String>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_id: Option<String>,
}

/// A hardware part in the component database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub voltage: String,
    pub pins: String,
    pub common_uses: Vec<String>,
    pub difficulty: SkillLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasheet_url: Option<String>,
}
