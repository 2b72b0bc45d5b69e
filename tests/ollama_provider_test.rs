use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arduino_mentor::config::OllamaConfig;
use arduino_mentor::error::MentorError;
use arduino_mentor::providers::{ModelRequest, OllamaProvider, Provider};

fn provider(host: &str) -> OllamaProvider {
    let config = OllamaConfig {
        host: host.to_string(),
        model: "llava".to_string(),
        ..Default::default()
    };
    OllamaProvider::new(config, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_generate_returns_message_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llava",
            "stream": false,
            "format": "json"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llava",
            "message": { "role": "assistant", "content": "{\"text\":\"Use a 220 ohm resistor\"}" },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = provider(&server.uri())
        .generate(&ModelRequest::prompt("LED resistor?").json())
        .await
        .unwrap();
    assert_eq!(text, "{\"text\":\"Use a 220 ohm resistor\"}");
}

#[tokio::test]
async fn test_stream_reads_json_lines() {
    let server = MockServer::start().await;

    let body = [
        json!({ "message": { "role": "assistant", "content": "Wire " }, "done": false }),
        json!({ "message": { "role": "assistant", "content": "GND first" }, "done": false }),
        json!({ "message": { "role": "assistant", "content": "" }, "done": true }),
    ]
    .iter()
    .map(|line| format!("{}\n", line))
    .collect::<String>();

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let fragments: Vec<String> = provider(&server.uri())
        .generate_stream(&ModelRequest::prompt("hi"))
        .await
        .unwrap()
        .map(|item| item.unwrap())
        .collect()
        .await;
    assert_eq!(fragments, vec!["Wire ", "GND first"]);
}

#[tokio::test]
async fn test_not_found_is_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let err = provider(&server.uri())
        .generate(&ModelRequest::prompt("hi"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MentorError>(),
        Some(MentorError::Transport(_))
    ));
}
