//! Typed configuration schema.
//!
//! Every section has defaults, so an empty or missing file yields a working
//! config. Keys are camelCase on disk.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8780;
pub const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Providers the binary knows how to construct.
pub const KNOWN_PROVIDERS: &[&str] = &["gemini", "mock"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextliftConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    /// `gemini` or `mock`.
    pub provider: String,
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Override for the provider endpoint, mostly for proxies and tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            api_key: None,
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl ModelConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestConfig {
    pub max_upload_bytes: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    /// Directory for the rolling JSON log. Console only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let cfg: TextliftConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, TextliftConfig::default());
        assert_eq!(cfg.model.model_id, "gemini-2.5-flash");
        assert_eq!(cfg.ingest.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "server:\n  port: 9000\nmodel:\n  provider: mock\n  temperature: 0.3\n";
        let cfg: TextliftConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(cfg.model.provider, "mock");
        assert_eq!(cfg.model.model_id, DEFAULT_MODEL_ID);
        assert!((cfg.model.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn serializes_camel_case() {
        let yaml = serde_yaml::to_string(&TextliftConfig::default()).unwrap();
        assert!(yaml.contains("bindAddress"));
        assert!(yaml.contains("maxUploadBytes"));
        assert!(!yaml.contains("apiKey"));
    }

    #[test]
    fn blank_api_key_does_not_count() {
        let mut model = ModelConfig::default();
        assert!(!model.has_api_key());
        model.api_key = Some("  ".into());
        assert!(!model.has_api_key());
        model.api_key = Some("AIzaSyExample".into());
        assert!(model.has_api_key());
    }
}
