//! Knowledge base imports
//!
//! Datasets are created, edited and deleted through [`crate::state::Action`];
//! this module only turns a file or a URL into a new [`Dataset`] ready for
//! `Action::ImportDataset`.

use crate::domain::{Dataset, DatasetSource};
use crate::error::{MentorError, Result};
use std::path::Path;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Loads reference text into new datasets
pub struct KnowledgeBase {
    client: reqwest::Client,
}

impl KnowledgeBase {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("arduino-mentor/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| MentorError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Read a text file into a dataset named after the file
    pub fn import_file(&self, path: &Path) -> Result<Dataset> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MentorError::Validation(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        new_dataset(
            name,
            format!("Imported from {}", path.display()),
            content,
            DatasetSource::File,
        )
    }

    /// Fetch a document over HTTP into a dataset named after the URL
    pub async fn import_url(&self, url: &str) -> Result<Dataset> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| MentorError::Validation(format!("Invalid URL {}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MentorError::Validation(format!(
                "Unsupported URL scheme: {}",
                parsed.scheme()
            ))
            .into());
        }

        tracing::debug!("Fetching dataset from {}", parsed);
        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| MentorError::Transport(format!("Failed to fetch {}: {}", parsed, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(
                MentorError::Transport(format!("Fetching {} returned {}", parsed, status)).into(),
            );
        }
        let content = response
            .text()
            .await
            .map_err(|e| MentorError::Transport(format!("Failed to read {}: {}", parsed, e)))?;

        new_dataset(
            url_name(&parsed),
            format!("Imported from {}", parsed),
            content,
            DatasetSource::Url,
        )
    }
}

/// Last non-empty path segment, or the host
fn url_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

fn new_dataset(
    name: String,
    description: String,
    content: String,
    source: DatasetSource,
) -> Result<Dataset> {
    if content.trim().is_empty() {
        return Err(MentorError::Validation(format!("{} is empty", name)).into());
    }
    Ok(Dataset::new(
        format!("ds-{}", Uuid::new_v4().simple()),
        name,
        description,
        content,
        source,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_error_contains, create_test_file, temp_dir};

    fn kb() -> KnowledgeBase {
        KnowledgeBase::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_import_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "bme280.txt", "I2C address 0x76");
        let dataset = kb().import_file(&path).unwrap();
        assert_eq!(dataset.name, "bme280.txt");
        assert_eq!(dataset.content, "I2C address 0x76");
        assert_eq!(dataset.source, DatasetSource::File);
        assert!(dataset.id.starts_with("ds-"));
    }

    #[test]
    fn test_import_empty_file_is_rejected() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "empty.txt", "  \n");
        assert_error_contains(kb().import_file(&path), "empty.txt is empty");
    }

    #[test]
    fn test_import_missing_file() {
        let dir = temp_dir();
        assert_error_contains(kb().import_file(&dir.path().join("nope.txt")), "Cannot read");
    }

    #[test]
    fn test_url_name() {
        let url = Url::parse("https://example.com/docs/servo.md").unwrap();
        assert_eq!(url_name(&url), "servo.md");
        let url = Url::parse("https://example.com/docs/").unwrap();
        assert_eq!(url_name(&url), "docs");
        let url = Url::parse("https://example.com").unwrap();
        assert_eq!(url_name(&url), "example.com");
    }

    #[tokio::test]
    async fn test_import_url_rejects_other_schemes() {
        assert_error_contains(kb().import_url("ftp://example.com/a").await, "scheme");
        assert_error_contains(kb().import_url("not a url").await, "Invalid URL");
    }
}
