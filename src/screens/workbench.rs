//! Code workbench
//!
//! Holds a sketch and sends it to the debug persona for review. The review
//! is asked for as JSON; anything else is shown as text.

use crate::error::Result;
use crate::exchange::reply::strip_code_fence;
use crate::prompts::task_prompts;
use crate::providers::{ModelRequest, Provider};
use crate::screens::{lock, request_text, RequestGate, Submission};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const ANALYSIS_FAILURE: &str = "Error analyzing code. Please check your connection.";

pub const DEFAULT_SKETCH: &str = r#"void setup() {
  pinMode(LED_BUILTIN, OUTPUT);
  Serial.begin(9600);
}

void loop() {
  digitalWrite(LED_BUILTIN, HIGH);
  delay(1000);
  digitalWrite(LED_BUILTIN, LOW);
  delay(1000);
  Serial.println("Blink");
}"#;

#[derive(Debug, Clone, PartialEq)]
pub struct CodeIssue {
    pub line: Option<u64>,
    pub severity: String,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeReview {
    pub summary: String,
    pub issues: Vec<CodeIssue>,
}

/// What the workbench shows after an analysis
#[derive(Debug, Clone, PartialEq)]
pub enum CodeAnalysis {
    Review(CodeReview),
    /// Reply that was not a review object, or a failure message
    Text(String),
}

struct WorkbenchState {
    code: String,
    analysis: Option<CodeAnalysis>,
}

pub struct CodeWorkbench {
    provider: Arc<dyn Provider>,
    state: Mutex<WorkbenchState>,
    gate: RequestGate,
}

impl CodeWorkbench {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            state: Mutex::new(WorkbenchState {
                code: DEFAULT_SKETCH.to_string(),
                analysis: None,
            }),
            gate: RequestGate::new(),
        }
    }

    pub fn code(&self) -> String {
        self.state
            .lock()
            .map(|s| s.code.clone())
            .unwrap_or_default()
    }

    pub fn set_code(&self, code: &str) -> Result<()> {
        lock(&self.state)?.code = code.to_string();
        Ok(())
    }

    /// Replace the sketch with the contents of a file
    pub fn load_file(&self, path: &Path) -> Result<()> {
        let code = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded sketch {} ({} bytes)", path.display(), code.len());
        self.set_code(&code)
    }

    pub fn analysis(&self) -> Option<CodeAnalysis> {
        self.state.lock().ok()?.analysis.clone()
    }

    pub fn clear_analysis(&self) -> Result<()> {
        lock(&self.state)?.analysis = None;
        Ok(())
    }

    pub async fn analyze(&self) -> Result<Submission<CodeAnalysis>> {
        let code = self.code();
        if code.trim().is_empty() {
            return Ok(Submission::EmptyInput);
        }
        let Some(_guard) = self.gate.try_acquire() else {
            return Ok(Submission::Ignored);
        };

        let request = ModelRequest::prompt(task_prompts::code_analysis(&code)).json();
        let analysis = match request_text(self.provider.as_ref(), &request, "analyze_code").await {
            Ok(raw) => parse_review(&raw),
            Err(_) => CodeAnalysis::Text(ANALYSIS_FAILURE.to_string()),
        };

        lock(&self.state)?.analysis = Some(analysis.clone());
        Ok(Submission::Completed(analysis))
    }
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn parse_issue(value: &Value) -> Option<CodeIssue> {
    let object = value.as_object()?;
    let line = match object.get("line") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    Some(CodeIssue {
        line,
        severity: text_of(object.get("severity")),
        message: text_of(object.get("message")),
        suggestion: text_of(object.get("suggestion")),
    })
}

/// Parse a review reply; a reply that is not a JSON object is kept as text
pub fn parse_review(raw: &str) -> CodeAnalysis {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return CodeAnalysis::Review(CodeReview::default());
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => CodeAnalysis::Review(CodeReview {
            summary: text_of(object.get("summary")),
            issues: object
                .get("issues")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(parse_issue).collect())
                .unwrap_or_default(),
        }),
        _ => {
            tracing::warn!("Code review reply is not a JSON object, showing it as text");
            CodeAnalysis::Text(raw.to_string())
        }
    }
}
