use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use arduino_mentor::commands::Session;
use arduino_mentor::config::{ApiKey, Config, GeminiConfig};
use arduino_mentor::preferences::MemoryPreferenceStore;
use arduino_mentor::providers::GeminiProvider;

/// Path of the non-streamed Gemini endpoint for the default model
#[allow(dead_code)]
pub const GENERATE_PATH: &str = "/v1beta/models/gemini-3-pro-preview:generateContent";

/// Path of the streamed Gemini endpoint for the default model
#[allow(dead_code)]
pub const STREAM_PATH: &str = "/v1beta/models/gemini-3-pro-preview:streamGenerateContent";

#[allow(dead_code)]
pub fn gemini_config(api_base: &str) -> GeminiConfig {
    GeminiConfig {
        api_base: Some(api_base.to_string()),
        api_key: Some(ApiKey::new("test-key")),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn gemini_provider(api_base: &str) -> GeminiProvider {
    GeminiProvider::new(gemini_config(api_base), Duration::from_secs(5))
        .expect("failed to create gemini provider")
}

/// A generateContent response carrying `text` in one candidate
#[allow(dead_code)]
pub fn candidate(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] }
        }]
    })
}

/// SSE body with one event per fragment
#[allow(dead_code)]
pub fn sse_body(fragments: &[&str]) -> String {
    fragments
        .iter()
        .map(|f| format!("data: {}\n\n", candidate(f)))
        .collect()
}

/// Signed-in session talking to a Gemini mock with in-memory preferences
#[allow(dead_code)]
pub fn gemini_session(api_base: &str) -> Session {
    let mut config = Config::default();
    config.preferences.persist = false;
    config.provider.gemini = gemini_config(api_base);
    Session::with_parts(
        config,
        Arc::new(gemini_provider(api_base)),
        Arc::new(MemoryPreferenceStore::new()),
        Some("Ada"),
        None,
    )
    .expect("failed to start session")
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
