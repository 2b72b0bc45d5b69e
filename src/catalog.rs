//! Static project and component catalogs with their filters

use crate::domain::{Component, Project, SkillLevel};
use std::collections::BTreeSet;
use std::fmt;

/// Difficulty filter used by the project library and component database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyFilter {
    #[default]
    All,
    Level(SkillLevel),
}

impl DifficultyFilter {
    /// Parse "All" or a skill level name (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use arduino_mentor::catalog::DifficultyFilter;
    /// use arduino_mentor::domain::SkillLevel;
    ///
    /// assert_eq!(DifficultyFilter::parse_str("all").unwrap(), DifficultyFilter::All);
    /// assert_eq!(
    ///     DifficultyFilter::parse_str("Beginner").unwrap(),
    ///     DifficultyFilter::Level(SkillLevel::Beginner)
    /// );
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        if s.trim().eq_ignore_ascii_case("all") || s.trim().is_empty() {
            return Ok(Self::All);
        }
        SkillLevel::parse_str(s).map(Self::Level)
    }

    pub fn matches(&self, level: SkillLevel) -> bool {
        match self {
            Self::All => true,
            Self::Level(wanted) => *wanted == level,
        }
    }
}

impl fmt::Display for DifficultyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Level(level) => write!(f, "{}", level),
        }
    }
}

/// Filters applied to the component database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentFilter {
    pub search: String,
    /// Component type, or "All"
    pub kind: String,
    pub difficulty: DifficultyFilter,
}

impl Default for ComponentFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            kind: "All".to_string(),
            difficulty: DifficultyFilter::All,
        }
    }
}

impl ComponentFilter {
    pub fn matches(&self, component: &Component) -> bool {
        let term = self.search.to_lowercase();
        let matches_search = component.name.to_lowercase().contains(&term)
            || component.description.to_lowercase().contains(&term)
            || component
                .common_uses
                .iter()
                .any(|usage| usage.to_lowercase().contains(&term));
        let matches_kind = self.kind == "All" || component.kind == self.kind;
        matches_search && matches_kind && self.difficulty.matches(component.difficulty)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The built-in project library
pub fn initial_projects() -> Vec<Project> {
    vec![
        Project {
            id: "p1".to_string(),
            title: "Blink an LED".to_string(),
            description: "The \"Hello World\" of Arduino. Learn to control a digital output pin to make an LED flash on your Uno or Nano.".to_string(),
            difficulty: SkillLevel::Beginner,
            time_estimate: "30 mins".to_string(),
            components: strings(&["Arduino Uno", "LED", "220Ω Resistor"]),
            tags: strings(&["Digital I/O", "Sketches"]),
            completed: false,
            knowledge_base_id: None,
        },
        Project {
            id: "p2".to_string(),
            title: "Traffic Light Shield".to_string(),
            description: "Simulate a traffic light system using multiple LEDs and Arduino timing logic.".to_string(),
            difficulty: SkillLevel::Beginner,
            time_estimate: "1 hour".to_string(),
            components: strings(&["Arduino Uno", "Red LED", "Yellow LED", "Green LED", "Resistors"]),
            tags: strings(&["Timing", "Logic"]),
            completed: false,
            knowledge_base_id: None,
        },
        Project {
            id: "p4".to_string(),
            title: "Distance Sensor Alarm".to_string(),
            description: "Sound a piezo buzzer when an object comes within range of an ultrasonic sensor.".to_string(),
            difficulty: SkillLevel::Intermediate,
            time_estimate: "2 hours".to_string(),
            components: strings(&["Arduino Uno", "HC-SR04 Ultrasonic", "Piezo Buzzer"]),
            tags: strings(&["Sensors", "Logic"]),
            completed: false,
            knowledge_base_id: None,
        },
        Project {
            id: "p6".to_string(),
            title: "ESP32 IoT Weather Station".to_string(),
            description: "Connect your Arduino-compatible ESP32 to the internet to log sensor data via the Arduino Cloud.".to_string(),
            difficulty: SkillLevel::Advanced,
            time_estimate: "4 hours".to_string(),
            components: strings(&["ESP32 (Arduino Core)", "BME280", "OLED Display"]),
            tags: strings(&["IoT", "WiFi", "I2C"]),
            completed: false,
            knowledge_base_id: None,
        },
    ]
}

/// The built-in component database
pub fn components() -> Vec<Component> {
    vec![
        Component {
            id: "m1".to_string(),
            name: "Arduino Uno R3".to_string(),
            kind: "Microcontroller".to_string(),
            description: "The gold standard Arduino board for beginners. ATmega328P.".to_string(),
            voltage: "5V".to_string(),
            pins: "14 Digital, 6 Analog".to_string(),
            common_uses: strings(&["Education", "Shields"]),
            difficulty: SkillLevel::Beginner,
            datasheet_url: Some(
                "https://docs.arduino.cc/resources/datasheets/A000066-datasheet.pdf".to_string(),
            ),
        },
        Component {
            id: "m2".to_string(),
            name: "ESP32 DevKit".to_string(),
            kind: "Microcontroller".to_string(),
            description: "Dual-core WiFi and Bluetooth board programmable with the Arduino core.".to_string(),
            voltage: "3.3V".to_string(),
            pins: "25 GPIO, 18 ADC".to_string(),
            common_uses: strings(&["IoT", "WiFi"]),
            difficulty: SkillLevel::Intermediate,
            datasheet_url: None,
        },
        Component {
            id: "s4".to_string(),
            name: "HC-SR04 Ultrasonic".to_string(),
            kind: "Sensor".to_string(),
            description: "Arduino-compatible ultrasonic distance sensor.".to_string(),
            voltage: "5V".to_string(),
            pins: "Trig, Echo".to_string(),
            common_uses: strings(&["Obstacle Avoidance"]),
            difficulty: SkillLevel::Beginner,
            datasheet_url: Some(
                "https://cdn.sparkfun.com/datasheets/Sensors/Proximity/HCSR04.pdf".to_string(),
            ),
        },
        Component {
            id: "s7".to_string(),
            name: "BME280".to_string(),
            kind: "Sensor".to_string(),
            description: "I2C temperature, humidity and pressure sensor.".to_string(),
            voltage: "3.3V".to_string(),
            pins: "SDA, SCL".to_string(),
            common_uses: strings(&["Weather Stations", "Environmental Logging"]),
            difficulty: SkillLevel::Intermediate,
            datasheet_url: None,
        },
        Component {
            id: "a1".to_string(),
            name: "SG90 Micro Servo".to_string(),
            kind: "Actuator".to_string(),
            description: "Standard Arduino PWM controlled 180° motor.".to_string(),
            voltage: "5V".to_string(),
            pins: "PWM".to_string(),
            common_uses: strings(&["Robot Arms", "Steering"]),
            difficulty: SkillLevel::Beginner,
            datasheet_url: None,
        },
    ]
}

/// Apply a component filter, preserving catalog order
pub fn filter_components<'a>(
    components: &'a [Component],
    filter: &ComponentFilter,
) -> Vec<&'a Component> {
    components.iter().filter(|c| filter.matches(c)).collect()
}

/// "All" followed by each distinct component type in first-seen order
pub fn component_types(components: &[Component]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut types = vec!["All".to_string()];
    for component in components {
        if seen.insert(component.kind.clone()) {
            types.push(component.kind.clone());
        }
    }
    types
}

/// Filter projects by difficulty, preserving library order
pub fn filter_projects<'a>(projects: &'a [Project], filter: DifficultyFilter) -> Vec<&'a Project> {
    projects
        .iter()
        .filter(|p| filter.matches(p.difficulty))
        .collect()
}
