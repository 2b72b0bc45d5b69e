//! Error types for Arduino Mentor
//!
//! The taxonomy is deliberately flat: transport failures, response parse
//! failures, missing credentials and camera failures are the four kinds a
//! screen reacts to. The remaining variants cover configuration, local
//! storage and input validation.

use thiserror::Error;

/// Main error type for Arduino Mentor operations
#[derive(Error, Debug)]
pub enum MentorError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider construction or selection errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Network failure, non-2xx status or timeout talking to the model API
    #[error("Transport error: {0}")]
    Transport(String),

    /// The model replied with something that does not match the expected shape
    #[error("Response parse error: {0}")]
    ResponseParse(String),

    /// Missing API key for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Frame source could not be opened or read
    #[error("Camera error: {0}")]
    Camera(String),

    /// User input rejected before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced project, component or dataset does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The screen already has a request outstanding
    #[error("Request already in progress: {0}")]
    Busy(String),

    /// Preference store errors
    #[error("Preference store error: {0}")]
    Preferences(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Image decoding/encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl MentorError {
    /// Whether this error came from the model boundary itself
    ///
    /// Screens use this to decide between the transport apology and a
    /// more specific message.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http(_))
    }
}

/// Result type alias for Arduino Mentor operations
///
/// Uses `anyhow::Error` so handlers can attach context while the typed
/// `MentorError` stays recoverable through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = MentorError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_transport_error_display() {
        let error = MentorError::Transport("connection refused".to_string());
        assert_eq!(error.to_string(), "Transport error: connection refused");
        assert!(error.is_transport());
    }

    #[test]
    fn test_response_parse_error_display() {
        let error = MentorError::ResponseParse("expected object".to_string());
        assert_eq!(error.to_string(), "Response parse error: expected object");
        assert!(!error.is_transport());
    }

    #[test]
    fn test_missing_credentials_error_display() {
        let error = MentorError::MissingCredentials("gemini".to_string());
        assert_eq!(error.to_string(), "Missing credentials for provider: gemini");
    }

    #[test]
    fn test_camera_error_display() {
        let error = MentorError::Camera("permission denied".to_string());
        assert_eq!(error.to_string(), "Camera error: permission denied");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: MentorError = io_error.into();
        assert!(matches!(error, MentorError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: MentorError = json_error.into();
        assert!(matches!(error, MentorError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: MentorError = yaml_error.into();
        assert!(matches!(error, MentorError::Yaml(_)));
    }

    #[test]
    fn test_error_downcasts_through_anyhow() {
        let result: Result<()> = Err(MentorError::Busy("chat".to_string()).into());
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MentorError>(),
            Some(MentorError::Busy(_))
        ));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MentorError>();
    }
}
