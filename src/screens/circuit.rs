//! Circuit analyzer

use crate::error::Result;
use crate::prompts::task_prompts;
use crate::providers::{ModelRequest, Provider};
use crate::screens::{lock, or_fallback, request_text, RequestGate, Submission};
use std::sync::{Arc, Mutex};

pub const ANALYSIS_FAILURE: &str = "Error analyzing circuit. Please check your connection.";
pub const NO_ANALYSIS: &str = "No analysis available.";

/// Wiring of the distance sensor alarm, one connection per line
pub const DEFAULT_CIRCUIT: &str = "Arduino Uno 5V -> Breadboard + Rail
Arduino Uno GND -> Breadboard - Rail
HC-SR04 VCC -> Breadboard + Rail
HC-SR04 GND -> Breadboard - Rail
HC-SR04 Trig -> Arduino Pin 9
HC-SR04 Echo -> Arduino Pin 10
Piezo Buzzer Positive -> Arduino Pin 8
Piezo Buzzer Negative -> Breadboard - Rail";

struct CircuitState {
    description: String,
    analysis: Option<String>,
}

/// Free-text wiring description checked by the safety and hardware personas
pub struct CircuitAnalyzer {
    provider: Arc<dyn Provider>,
    state: Mutex<CircuitState>,
    gate: RequestGate,
}

impl CircuitAnalyzer {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            state: Mutex::new(CircuitState {
                description: DEFAULT_CIRCUIT.to_string(),
                analysis: None,
            }),
            gate: RequestGate::new(),
        }
    }

    pub fn description(&self) -> String {
        self.state
            .lock()
            .map(|s| s.description.clone())
            .unwrap_or_default()
    }

    pub fn set_description(&self, description: &str) -> Result<()> {
        lock(&self.state)?.description = description.to_string();
        Ok(())
    }

    pub fn analysis(&self) -> Option<String> {
        self.state.lock().ok()?.analysis.clone()
    }

    pub async fn analyze(&self) -> Result<Submission<String>> {
        let description = self.description();
        if description.trim().is_empty() {
            return Ok(Submission::EmptyInput);
        }
        let Some(_guard) = self.gate.try_acquire() else {
            return Ok(Submission::Ignored);
        };

        let request = ModelRequest::prompt(task_prompts::circuit_analysis(&description));
        let report = match request_text(self.provider.as_ref(), &request, "analyze_circuit").await
        {
            Ok(text) => or_fallback(text, NO_ANALYSIS),
            Err(_) => ANALYSIS_FAILURE.to_string(),
        };

        lock(&self.state)?.analysis = Some(report.clone());
        Ok(Submission::Completed(report))
    }
}
