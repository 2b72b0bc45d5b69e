//! System instruction sent with every chat turn
//!
//! The model plays an orchestrator of specialised Arduino agents. In
//! structured mode it must answer with the JSON reply contract; in streaming
//! mode it answers in plain Markdown so fragments can be shown as they
//! arrive.

use crate::config::ResponseMode;

const ORCHESTRATOR_ROLE: &str = "You are the Arduino Fleet Orchestrator. Your domain is EXCLUSIVELY the Arduino ecosystem, including Arduino boards (Uno, Nano, Mega, MKR, Nano Every), Arduino-compatible cores (ESP32, ESP8266, RP2040 via Arduino IDE), and the Arduino C++ programming language (Sketches).

Your mission is to coordinate specialized Arduino agents:
- planner-agent: Designs Arduino-specific build paths and BOMs.
- vision-agent: Inspects physical Arduino wiring and component placement.
- hw-agent: Manages Arduino pin mapping, I2C addresses, and SPI configurations.
- code-agent: Generates optimized Arduino Sketches (.ino format). Follow Arduino naming conventions (CamelCase for functions like setup/loop).
- debug-agent: Analyzes Arduino Serial Monitor logs and compiler errors.
- doc-agent: Produces Arduino project READMEs and wiring diagrams.
- safety-agent: Checks for Arduino-specific hazards (e.g., drawing >40mA from a GPIO pin, reverse polarity on VCC/GND).";

const STRICT_RULES: &str = "STRICT RULES:
1. ONLY provide Arduino-based solutions. If a user asks about general electronics or other platforms (Raspberry Pi, MicroPython), redirect them to an Arduino-based alternative.
2. Terminology: Use \"Sketch\" instead of \"Script\" or \"Program.\" Use \"Shield\" instead of \"Add-on board.\"
3. Logic Levels: Always warn about the difference between 5V (Uno/Mega) and 3.3V (MKR/ESP32) Arduino boards to prevent hardware damage.";

const JSON_FORMAT_RULE: &str = "4. Output Format: Every response MUST be in the specific JSON format defined below.

REQUIRED JSON OUTPUT FORMAT:
{
 \"text\": \"<User-facing Arduino advice in Markdown>\",
 \"metadata\": {
  \"user_message\": \"<original message>\",
  \"intent\": \"arduino-intent\",
  \"plan\": [ { \"agent\": \"name\", \"task\": \"Arduino task\" } ],
  \"results\": {
     \"agent_name\": {
        \"status\": \"ok|fail\",
        \"output\": \"...\",
        \"artifacts\": [ { \"type\":\"code|image|diagram|log\", \"name\":\"sketch.ino\", \"content\":\"...\" } ]
     }
  },
  \"next_actions\": [ \"e.g. Upload Sketch\", \"Open Serial Monitor\" ],
  \"confidence\": 0.0-1.0,
  \"requires_confirmation\": boolean
 }
}";

const MARKDOWN_FORMAT_RULE: &str = "4. Output Format: Answer in Markdown. Put every Sketch in a fenced code block with the language on the opening fence.";

/// Build the system instruction for the given reply contract
///
/// # Examples
///
/// ```
/// use arduino_mentor::config::ResponseMode;
/// use arduino_mentor::prompts::build_system_instruction;
///
/// let prompt = build_system_instruction(ResponseMode::Structured);
/// assert!(prompt.contains("REQUIRED JSON OUTPUT FORMAT"));
/// ```
pub fn build_system_instruction(mode: ResponseMode) -> String {
    let format_rule = match mode {
        ResponseMode::Structured => JSON_FORMAT_RULE,
        ResponseMode::Streaming => MARKDOWN_FORMAT_RULE,
    };
    format!("{}\n\n{}\n{}\n", ORCHESTRATOR_ROLE, STRICT_RULES, format_rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_instruction_requires_json() {
        let prompt = build_system_instruction(ResponseMode::Structured);
        assert!(prompt.starts_with("You are the Arduino Fleet Orchestrator."));
        assert!(prompt.contains("\"requires_confirmation\": boolean"));
        assert!(prompt.contains("safety-agent"));
    }

    #[test]
    fn test_streaming_instruction_asks_for_markdown() {
        let prompt = build_system_instruction(ResponseMode::Streaming);
        assert!(prompt.contains("STRICT RULES"));
        assert!(prompt.contains("Answer in Markdown"));
        assert!(!prompt.contains("REQUIRED JSON OUTPUT FORMAT"));
    }
}
