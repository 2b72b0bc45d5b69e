mod common;

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arduino_mentor::config::GeminiConfig;
use arduino_mentor::error::MentorError;
use arduino_mentor::providers::{GeminiProvider, ModelRequest, Provider};
use common::{candidate, gemini_provider, sse_body, GENERATE_PATH, STREAM_PATH};

/// The key travels as a query parameter and the reply text is unwrapped
#[tokio::test]
async fn test_generate_sends_key_and_returns_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "What is PWM?" }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("{\"text\":\"Pulses\"}")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = gemini_provider(&server.uri());
    let text = provider
        .generate(&ModelRequest::prompt("What is PWM?").json())
        .await
        .unwrap();
    assert_eq!(text, "{\"text\":\"Pulses\"}");
}

#[tokio::test]
async fn test_generate_sends_system_instruction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "be brief" }] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = gemini_provider(&server.uri());
    let request = ModelRequest::prompt("hi").with_system_instruction("be brief");
    assert_eq!(provider.generate(&request).await.unwrap(), "ok");
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let provider = gemini_provider(&server.uri());
    let err = provider
        .generate(&ModelRequest::prompt("hi"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MentorError>(),
        Some(MentorError::Transport(_))
    ));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_missing_key_never_reaches_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let config = GeminiConfig {
        api_base: Some(server.uri()),
        ..Default::default()
    };
    let provider = GeminiProvider::new(config, std::time::Duration::from_secs(5)).unwrap();
    let err = provider
        .generate(&ModelRequest::prompt("hi"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MentorError>(),
        Some(MentorError::MissingCredentials(_))
    ));
}

#[tokio::test]
async fn test_stream_yields_fragments_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .and(query_param("key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["Hel", "lo ", "maker"]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = gemini_provider(&server.uri());
    let fragments: Vec<String> = provider
        .generate_stream(&ModelRequest::prompt("hi"))
        .await
        .unwrap()
        .map(|item| item.unwrap())
        .collect()
        .await;
    assert_eq!(fragments, vec!["Hel", "lo ", "maker"]);
}

#[tokio::test]
async fn test_stream_malformed_event_is_an_error_item() {
    let server = MockServer::start().await;

    let body = format!("{}data: {{not json\n\n", sse_body(&["ok"]));
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let provider = gemini_provider(&server.uri());
    let items: Vec<_> = provider
        .generate_stream(&ModelRequest::prompt("hi"))
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "ok");
    assert!(items[1].is_err());
}

#[tokio::test]
async fn test_image_is_sent_as_inline_data() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [
                { "inlineData": { "mimeType": "image/jpeg", "data": "QUJD" } },
                { "text": "inspect" }
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("Looks wired")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = gemini_provider(&server.uri());
    let request = ModelRequest::prompt("inspect").with_image("image/jpeg", "QUJD");
    assert_eq!(provider.generate(&request).await.unwrap(), "Looks wired");
}
