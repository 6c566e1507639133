use std::fs;
use std::path::Path;
use std::time::Duration;

use article_engine::{BatchSettings, ExtractionSettings, FetchSettings, LlmSettings};
use extract_logging::extract_info;
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_PATH: &str = "./article_app.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_address: String,
    pub log_destination: LogDestination,
    pub log_level: String,
    pub fetch_timeout_secs: u64,
    pub max_body_bytes: u64,
    pub batch_max_urls: usize,
    pub extraction: ExtractionSettings,
    /// No LLM endpoint is served when absent.
    pub llm: Option<LlmSettings>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            log_destination: LogDestination::Terminal,
            log_level: "info".to_string(),
            fetch_timeout_secs: fetch.request_timeout.as_secs(),
            max_body_bytes: fetch.max_bytes,
            batch_max_urls: BatchSettings::default().max_urls,
            extraction: ExtractionSettings::default(),
            llm: None,
        }
    }
}

impl AppConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_bytes: self.max_body_bytes,
            ..FetchSettings::default()
        }
    }

    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            max_urls: self.batch_max_urls,
            per_url_timeout: Duration::from_secs(self.fetch_timeout_secs),
            ..BatchSettings::default()
        }
    }

    /// An API key from the environment wins over the file and enables the LLM
    /// endpoint with default settings if the file did not configure one.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.llm.get_or_insert_with(LlmSettings::default).api_key = key;
        }
        self
    }
}

/// Reads the RON config at `path`. A missing file means defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            extract_info!("No config at {:?}, using defaults", path);
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"(
                bind_address: "0.0.0.0:9000",
                log_destination: Both,
                extraction: (min_paragraphs: 5),
            )"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.extraction.min_paragraphs, 5);
        assert_eq!(
            config.extraction.content_selectors,
            ExtractionSettings::default().content_selectors
        );
        assert_eq!(config.fetch_timeout_secs, 10);
        assert!(config.llm.is_none());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(bind_address: 42").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn env_key_enables_llm() {
        let config = AppConfig::default().with_api_key(Some("k".to_string()));
        let llm = config.llm.unwrap();
        assert_eq!(llm.api_key, "k");
        assert_eq!(llm.model, LlmSettings::default().model);

        let config = AppConfig::default().with_api_key(Some("  ".to_string()));
        assert!(config.llm.is_none());
    }
}
