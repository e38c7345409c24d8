use crate::core::error::{ConversionError, Result};
use crate::providers::parser::RateTableParser;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Supplies the raw reference-rate document.
#[async_trait]
pub trait RateDocumentSource: Send + Sync {
    /// Returns the local copy, downloading it first when missing or when `force_refresh` is set.
    async fn fetch(&self, force_refresh: bool) -> Result<String>;
}

/// Reads the ECB document from disk, downloading and persisting it when needed.
pub struct EcbDocumentSource {
    url: String,
    path: PathBuf,
    client: reqwest::Client,
}

impl EcbDocumentSource {
    pub fn new(url: &str, path: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("xrate/1.0")
            .timeout(timeout)
            .build()?;
        Ok(EcbDocumentSource {
            url: url.to_string(),
            path: path.into(),
            client,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn download(&self) -> Result<String> {
        info!("Fetching rate document from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ConversionError::Io(format!("Request error: {} URL: {}", e, self.url)))?;

        if !response.status().is_success() {
            return Err(ConversionError::Io(format!(
                "HTTP error: {} for {}",
                response.status(),
                self.url
            )));
        }

        let text = response.text().await?;
        let table = RateTableParser::new(text.as_str())
            .into_table()
            .map_err(|e| {
                ConversionError::Io(format!("Malformed response from {}: {}", self.url, e))
            })?;
        if table.is_empty() {
            return Err(ConversionError::Io(format!(
                "Malformed response from {}: no reference dates found",
                self.url
            )));
        }
        Ok(text)
    }

    async fn persist(&self, document: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ConversionError::Io(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        tokio::fs::write(&self.path, document).await.map_err(|e| {
            ConversionError::Io(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        debug!("Stored rate document at {}", self.path.display());
        Ok(())
    }

    async fn read_local(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ConversionError::Io(format!("Failed to read {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl RateDocumentSource for EcbDocumentSource {
    #[instrument(name = "RateDocumentFetch", skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self, force_refresh: bool) -> Result<String> {
        let exists = tokio::fs::try_exists(&self.path).await.unwrap_or(false);
        if exists && !force_refresh {
            debug!("Using local rate document");
            return self.read_local().await;
        }

        match self.download().await {
            Ok(document) => {
                self.persist(&document).await?;
                Ok(document)
            }
            Err(e) if exists => {
                warn!(error = %e, "Refresh failed, keeping local rate document");
                self.read_local().await
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::parser::tests::STUB_DOCUMENT;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCUMENT_PATH: &str = "/stats/eurofxref/eurofxref-hist-90d.xml";

    async fn create_mock_server(status: u16, body: &str, expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOCUMENT_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn source(server: &MockServer, dir: &TempDir) -> EcbDocumentSource {
        let url = format!("{}{}", server.uri(), DOCUMENT_PATH);
        EcbDocumentSource::new(&url, dir.path().join("data/rates.xml"), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetches_and_persists_when_missing() {
        let server = create_mock_server(200, STUB_DOCUMENT, 1).await;
        let dir = TempDir::new().unwrap();
        let source = source(&server, &dir);

        let document = source.fetch(false).await.unwrap();
        assert_eq!(document, STUB_DOCUMENT);
        assert_eq!(std::fs::read_to_string(source.path()).unwrap(), STUB_DOCUMENT);

        // Second call reads the local copy; the mock expects a single request.
        let again = source.fetch(false).await.unwrap();
        assert_eq!(again, STUB_DOCUMENT);
    }

    #[tokio::test]
    async fn test_force_refresh_overwrites_local_copy() {
        let server = create_mock_server(200, STUB_DOCUMENT, 1).await;
        let dir = TempDir::new().unwrap();
        let source = source(&server, &dir);
        std::fs::create_dir_all(source.path().parent().unwrap()).unwrap();
        std::fs::write(source.path(), "<Cube/>").unwrap();

        assert_eq!(source.fetch(false).await.unwrap(), "<Cube/>");
        assert_eq!(source.fetch(true).await.unwrap(), STUB_DOCUMENT);
        assert_eq!(std::fs::read_to_string(source.path()).unwrap(), STUB_DOCUMENT);
    }

    #[tokio::test]
    async fn test_http_error_without_local_copy() {
        let server = create_mock_server(500, "", 1).await;
        let dir = TempDir::new().unwrap();
        let source = source(&server, &dir);

        let err = source.fetch(false).await.unwrap_err();
        assert_eq!(err.kind(), "IOError");
        assert!(
            err.to_string()
                .starts_with("HTTP error: 500 Internal Server Error for"),
            "unexpected message: {err}"
        );
        assert!(!source.path().exists());
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_persisted() {
        let server = create_mock_server(200, "<html><body>maintenance", 1).await;
        let dir = TempDir::new().unwrap();
        let source = source(&server, &dir);

        let err = source.fetch(false).await.unwrap_err();
        assert!(err.to_string().contains("Malformed response"));
        assert!(!source.path().exists());
    }

    #[tokio::test]
    async fn test_non_rate_xml_does_not_replace_local_copy() {
        let server =
            create_mock_server(200, "<html><body>Maintenance</body></html>", 1).await;
        let dir = TempDir::new().unwrap();
        let source = source(&server, &dir);
        std::fs::create_dir_all(source.path().parent().unwrap()).unwrap();
        std::fs::write(source.path(), STUB_DOCUMENT).unwrap();

        assert_eq!(source.fetch(true).await.unwrap(), STUB_DOCUMENT);
        assert_eq!(std::fs::read_to_string(source.path()).unwrap(), STUB_DOCUMENT);
    }

    #[tokio::test]
    async fn test_non_rate_xml_without_local_copy() {
        let server = create_mock_server(200, "<error/>", 1).await;
        let dir = TempDir::new().unwrap();
        let source = source(&server, &dir);

        let err = source.fetch(false).await.unwrap_err();
        assert_eq!(err.kind(), "IOError");
        assert!(err.to_string().contains("no reference dates found"));
        assert!(!source.path().exists());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_local_copy() {
        let server = create_mock_server(503, "", 1).await;
        let dir = TempDir::new().unwrap();
        let source = source(&server, &dir);
        std::fs::create_dir_all(source.path().parent().unwrap()).unwrap();
        std::fs::write(source.path(), STUB_DOCUMENT).unwrap();

        assert_eq!(source.fetch(true).await.unwrap(), STUB_DOCUMENT);
    }
}
