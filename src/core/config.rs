use crate::core::cache::DEFAULT_CAPACITY;
use crate::core::money::BASE_CURRENCY;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_SOURCE_URL: &str =
    "https://www.ecb.europa.eu/stats/eurofxref/eurofxref-hist-90d.xml";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    /// Local copy of the rate document; defaults to the data directory.
    pub document_path: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            url: DEFAULT_SOURCE_URL.to_string(),
            document_path: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Values used when a request leaves a field out.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RequestDefaults {
    pub amount: String,
    pub source_currency: String,
    pub destination_currency: String,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        RequestDefaults {
            amount: "9.99".to_string(),
            source_currency: BASE_CURRENCY.to_string(),
            destination_currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub defaults: RequestDefaults,
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when it is absent.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "xrate", "xrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Where the fetched rate document is kept.
    pub fn document_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.source.document_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "xrate", "xrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("rates.xml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
source:
  url: "http://example.com/rates.xml"
  document_path: "/tmp/rates.xml"
  timeout_secs: 5
cache:
  capacity: 10
server:
  bind: "0.0.0.0:9000"
defaults:
  amount: "1"
  source_currency: "USD"
  destination_currency: "GBP"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.source.url, "http://example.com/rates.xml");
        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(
            config.document_path().unwrap(),
            PathBuf::from("/tmp/rates.xml")
        );
        assert_eq!(config.cache.capacity, 10);
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.defaults.amount, "1");
        assert_eq!(config.defaults.source_currency, "USD");
        assert_eq!(config.defaults.destination_currency, "GBP");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml_str = r#"
cache:
  capacity: 5
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.cache.capacity, 5);
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert_eq!(config.source.timeout_secs, 30);
        assert!(config.source.document_path.is_none());
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.defaults.amount, "9.99");
        assert_eq!(config.defaults.source_currency, "EUR");
        assert_eq!(config.defaults.destination_currency, "USD");
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = AppConfig::load_from_path(dir.path().join("missing.yaml"));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
