//! Structured model replies
//!
//! The model is asked for a JSON object `{text, metadata}` where metadata
//! describes the simulated agent fleet's plan and results. Models drift from
//! the schema often, so every metadata field is read leniently: a malformed
//! field is dropped and the rest of the reply survives.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Text shown when a structured reply carries no usable `text` field
pub const NO_RESPONSE_TEXT: &str = "No response text.";

/// One step of the plan the model reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub agent: String,
    pub task: String,
}

/// Outcome reported for a simulated agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Ok,
    Fail,
}

/// Kind of artifact attached to an agent result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Code,
    Image,
    Diagram,
    #[default]
    Log,
}

impl ArtifactKind {
    /// Unknown kinds degrade to `Log`
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "code" => Self::Code,
            "image" => Self::Image,
            "diagram" => Self::Diagram,
            _ => Self::Log,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgentResult {
    pub status: AgentStatus,
    pub output: String,
    pub artifacts: Vec<Artifact>,
}

/// Metadata attached to a structured model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResponseMetadata {
    pub user_message: Option<String>,
    pub intent: Option<String>,
    pub plan: Vec<PlanStep>,
    /// Agent results in the order the model listed them
    pub results: Vec<(String, AgentResult)>,
    pub next_actions: Vec<String>,
    /// Confidence in [0, 1]
    pub confidence: Option<f64>,
    pub requires_confirmation: bool,
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn parse_confidence(value: Option<&Value>) -> Option<f64> {
    let raw = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
                None => s.parse::<f64>().ok()?,
            }
        }
        _ => return None,
    };
    if raw.is_nan() {
        return None;
    }
    Some(raw.clamp(0.0, 1.0))
}

fn parse_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn parse_artifact(value: &Value) -> Option<Artifact> {
    let map = value.as_object()?;
    Some(Artifact {
        kind: string_field(map, "type")
            .map(|t| ArtifactKind::parse_lenient(&t))
            .unwrap_or_default(),
        name: string_field(map, "name").unwrap_or_default(),
        content: string_field(map, "content").unwrap_or_default(),
    })
}

fn parse_agent_result(value: &Value) -> Option<AgentResult> {
    let map = value.as_object()?;
    let status = match string_field(map, "status").as_deref() {
        Some(s) if s.eq_ignore_ascii_case("fail") => AgentStatus::Fail,
        _ => AgentStatus::Ok,
    };
    let artifacts = match map.get("artifacts") {
        Some(Value::Array(items)) => items.iter().filter_map(parse_artifact).collect(),
        _ => Vec::new(),
    };
    Some(AgentResult {
        status,
        output: string_field(map, "output").unwrap_or_default(),
        artifacts,
    })
}

impl ResponseMetadata {
    /// Read metadata from an arbitrary JSON value, dropping malformed fields
    pub fn from_value(value: &Value) -> Self {
        let map = match value.as_object() {
            Some(map) => map,
            None => return Self::default(),
        };

        let plan = match map.get("plan") {
            Some(Value::Array(steps)) => steps
                .iter()
                .filter_map(|step| {
                    let step = step.as_object()?;
                    Some(PlanStep {
                        agent: string_field(step, "agent")?,
                        task: string_field(step, "task").unwrap_or_default(),
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        let results = match map.get("results") {
            Some(Value::Object(results)) => results
                .iter()
                .filter_map(|(agent, result)| Some((agent.clone(), parse_agent_result(result)?)))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            user_message: string_field(map, "user_message"),
            intent: string_field(map, "intent"),
            plan,
            results,
            next_actions: string_list(map.get("next_actions")),
            confidence: parse_confidence(map.get("confidence")),
            requires_confirmation: parse_bool(map.get("requires_confirmation")),
        }
    }

    /// Whether there is anything worth rendering
    pub fn is_empty(&self) -> bool {
        self.intent.is_none()
            && self.plan.is_empty()
            && self.results.is_empty()
            && self.next_actions.is_empty()
            && self.confidence.is_none()
            && !self.requires_confirmation
    }
}

/// A model reply after parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// A JSON object following the reply contract (possibly partially)
    Structured {
        text: String,
        metadata: ResponseMetadata,
    },
    /// Anything else; the raw text is kept verbatim
    Unparseable { raw: String, reason: String },
}

/// Strip one surrounding Markdown code fence, if present
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    match body.find('\n') {
        Some(pos) => body[pos + 1..].trim(),
        None => body.trim(),
    }
}

/// Parse raw model output into a [`ModelReply`]
///
/// Never panics. Non-JSON output and JSON that is not an object are both
/// `Unparseable`.
///
/// # Examples
///
/// ```
/// use arduino_mentor::exchange::{parse_reply, ModelReply};
///
/// let reply = parse_reply(r#"{"text":"Hi","metadata":{"confidence":0.9}}"#);
/// match reply {
///     ModelReply::Structured { text, metadata } => {
///         assert_eq!(text, "Hi");
///         assert_eq!(metadata.confidence, Some(0.9));
///     }
///     _ => panic!("expected structured reply"),
/// }
///
/// assert!(matches!(parse_reply("not json"), ModelReply::Unparseable { .. }));
/// ```
pub fn parse_reply(raw: &str) -> ModelReply {
    let candidate = strip_code_fence(raw);
    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            return ModelReply::Unparseable {
                raw: raw.to_string(),
                reason: format!("not JSON: {}", e),
            }
        }
    };

    let Value::Object(map) = value else {
        return ModelReply::Unparseable {
            raw: raw.to_string(),
            reason: "JSON reply is not an object".to_string(),
        };
    };

    let text = match map.get("text") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => NO_RESPONSE_TEXT.to_string(),
    };
    let metadata = map
        .get("metadata")
        .map(ResponseMetadata::from_value)
        .unwrap_or_default();

    ModelReply::Structured { text, metadata }
}

/// Render a confidence value as a whole percentage
///
/// ```
/// use arduino_mentor::exchange::format_confidence;
///
/// assert_eq!(format_confidence(0.9), "90%");
/// assert_eq!(format_confidence(1.5), "100%");
/// ```
pub fn format_confidence(confidence: f64) -> String {
    let clamped = if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    };
    format!("{}%", (clamped * 100.0).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_reply_full_metadata() {
        let raw = json!({
            "text": "Wire the LED to pin 13.",
            "metadata": {
                "user_message": "Blink an LED",
                "intent": "build_guidance",
                "plan": [{"agent": "hw-agent", "task": "wiring"}, {"task": "no agent"}],
                "results": {
                    "hw-agent": {
                        "status": "ok",
                        "output": "Use a 220Ω resistor",
                        "artifacts": [
                            {"type": "code", "name": "blink.ino", "content": "void setup(){}"},
                            {"type": "hologram", "name": "x", "content": "y"}
                        ]
                    },
                    "safety-agent": {"status": "fail", "output": "check polarity"}
                },
                "next_actions": ["Upload the sketch"],
                "confidence": 0.85,
                "requires_confirmation": true
            }
        })
        .to_string();

        let ModelReply::Structured { text, metadata } = parse_reply(&raw) else {
            panic!("expected structured reply");
        };
        assert_eq!(text, "Wire the LED to pin 13.");
        assert_eq!(metadata.intent.as_deref(), Some("build_guidance"));
        assert_eq!(metadata.plan.len(), 1);
        assert_eq!(metadata.results[0].0, "hw-agent");
        assert_eq!(metadata.results[0].1.artifacts[1].kind, ArtifactKind::Log);
        assert_eq!(metadata.results[1].1.status, AgentStatus::Fail);
        assert_eq!(metadata.next_actions, vec!["Upload the sketch"]);
        assert_eq!(metadata.confidence, Some(0.85));
        assert!(metadata.requires_confirmation);
    }

    #[test]
    fn test_parse_reply_missing_text_uses_placeholder() {
        let ModelReply::Structured { text, metadata } = parse_reply(r#"{"metadata":{}}"#) else {
            panic!("expected structured reply");
        };
        assert_eq!(text, NO_RESPONSE_TEXT);
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_parse_reply_malformed_metadata_fields_are_dropped() {
        let raw = r#"{"text":"ok","metadata":{"plan":"oops","results":[1,2],"confidence":"high","next_actions":7}}"#;
        let ModelReply::Structured { text, metadata } = parse_reply(raw) else {
            panic!("expected structured reply");
        };
        assert_eq!(text, "ok");
        assert!(metadata.plan.is_empty());
        assert!(metadata.results.is_empty());
        assert_eq!(metadata.confidence, None);
        assert!(metadata.next_actions.is_empty());
    }

    #[test]
    fn test_parse_reply_tolerates_json_fence() {
        let raw = "```json\n{\"text\":\"fenced\"}\n```\n";
        assert!(matches!(
            parse_reply(raw),
            ModelReply::Structured { ref text, .. } if text == "fenced"
        ));
    }

    #[test]
    fn test_parse_reply_non_object_json_is_unparseable() {
        for raw in ["[1,2]", "\"just a string\"", "42", "null"] {
            match parse_reply(raw) {
                ModelReply::Unparseable { raw: kept, .. } => assert_eq!(kept, raw),
                other => panic!("expected unparseable for {}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_parse_reply_keeps_raw_verbatim() {
        let raw = "  Sorry, plain text here  ";
        let ModelReply::Unparseable { raw: kept, .. } = parse_reply(raw) else {
            panic!("expected unparseable");
        };
        assert_eq!(kept, raw);
    }

    #[test]
    fn test_confidence_clamped_and_parsed_from_strings() {
        let meta = ResponseMetadata::from_value(&json!({"confidence": 3.0}));
        assert_eq!(meta.confidence, Some(1.0));
        let meta = ResponseMetadata::from_value(&json!({"confidence": "75%"}));
        assert_eq!(meta.confidence, Some(0.75));
        let meta = ResponseMetadata::from_value(&json!({"confidence": -1}));
        assert_eq!(meta.confidence, Some(0.0));
    }

    #[test]
    fn test_format_confidence_rounds() {
        assert_eq!(format_confidence(0.9), "90%");
        assert_eq!(format_confidence(0.456), "46%");
        assert_eq!(format_confidence(-0.2), "0%");
    }

    #[test]
    fn test_strip_code_fence_without_fence_is_trimmed_input() {
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```unterminated"), "```unterminated");
    }
}
