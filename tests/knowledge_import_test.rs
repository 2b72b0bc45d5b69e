use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arduino_mentor::domain::DatasetSource;
use arduino_mentor::error::MentorError;
use arduino_mentor::screens::KnowledgeBase;

fn kb() -> KnowledgeBase {
    KnowledgeBase::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_import_url_names_dataset_after_last_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/datasheets/bme280.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Default I2C address is 0x76"))
        .expect(1)
        .mount(&server)
        .await;

    let dataset = kb()
        .import_url(&format!("{}/datasheets/bme280.txt", server.uri()))
        .await
        .unwrap();

    assert_eq!(dataset.name, "bme280.txt");
    assert_eq!(dataset.content, "Default I2C address is 0x76");
    assert_eq!(dataset.source, DatasetSource::Url);
    assert!(dataset.description.contains("/datasheets/bme280.txt"));
}

#[tokio::test]
async fn test_import_url_rejects_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = kb()
        .import_url(&format!("{}/missing.md", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MentorError>(),
        Some(MentorError::Transport(_))
    ));
}

#[tokio::test]
async fn test_import_url_rejects_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   "))
        .mount(&server)
        .await;

    let err = kb()
        .import_url(&format!("{}/blank.txt", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MentorError>(),
        Some(MentorError::Validation(_))
    ));
}
