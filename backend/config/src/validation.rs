//! Config validation with field paths in every message.

use thiserror::Error;

use crate::schema::{TextliftConfig, DEFAULT_MAX_UPLOAD_BYTES, KNOWN_PROVIDERS};

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &TextliftConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_model(config, &mut report);
    validate_ingest(config, &mut report);
    report
}

fn validate_server(config: &TextliftConfig, report: &mut ValidationReport) {
    let port = config.server.port;
    if port == 0 {
        report.error("server.port", "Port must be between 1 and 65535");
    } else if port < 1024 && port != 80 && port != 443 {
        report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        );
    }
    if config.server.bind_address.trim().is_empty() {
        report.error("server.bindAddress", "Bind address cannot be empty");
    }
}

fn validate_model(config: &TextliftConfig, report: &mut ValidationReport) {
    let model = &config.model;
    if !KNOWN_PROVIDERS.contains(&model.provider.as_str()) {
        report.error(
            "model.provider",
            format!(
                "Unknown provider '{}'. Use {}",
                model.provider,
                KNOWN_PROVIDERS.join(" or ")
            ),
        );
    }
    if model.provider == "gemini" && !model.has_api_key() {
        report.error(
            "model.apiKey",
            "Gemini requires an API key; set GEMINI_API_KEY or model.apiKey",
        );
    }
    if model.model_id.trim().is_empty() {
        report.error("model.modelId", "Model id cannot be empty");
    }
    let t = model.temperature;
    if !(0.0..=2.0).contains(&t) {
        report.error("model.temperature", format!("Temperature {t} is outside 0.0..=2.0"));
    } else if t > 0.5 {
        report.warn(
            "model.temperature",
            format!("Temperature {t} is high for extraction; transcription may drift"),
        );
    }
}

fn validate_ingest(config: &TextliftConfig, report: &mut ValidationReport) {
    let max = config.ingest.max_upload_bytes;
    if max == 0 {
        report.error("ingest.maxUploadBytes", "maxUploadBytes must be > 0");
    } else if max > DEFAULT_MAX_UPLOAD_BYTES {
        report.error(
            "ingest.maxUploadBytes",
            format!("maxUploadBytes {max} exceeds the {DEFAULT_MAX_UPLOAD_BYTES} byte upload limit"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TextliftConfig {
        let mut cfg = TextliftConfig::default();
        cfg.model.api_key = Some("AIzaTest".into());
        cfg
    }

    #[test]
    fn default_with_key_is_valid() {
        let report = validate(&valid());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn gemini_without_key_is_error() {
        let report = validate(&TextliftConfig::default());
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "model.apiKey");
    }

    #[test]
    fn mock_needs_no_key() {
        let mut cfg = TextliftConfig::default();
        cfg.model.provider = "mock".into();
        assert!(validate(&cfg).is_valid());
    }

    #[test]
    fn unknown_provider_is_error() {
        let mut cfg = valid();
        cfg.model.provider = "openai".into();
        let report = validate(&cfg);
        assert!(report.errors.iter().any(|e| e.path == "model.provider"));
    }

    #[test]
    fn numeric_bounds() {
        let mut cfg = valid();
        cfg.server.port = 0;
        cfg.model.temperature = 2.5;
        cfg.ingest.max_upload_bytes = 0;
        let paths: Vec<_> = validate(&cfg).errors.into_iter().map(|e| e.path).collect();
        assert!(paths.contains(&"server.port".to_string()));
        assert!(paths.contains(&"model.temperature".to_string()));
        assert!(paths.contains(&"ingest.maxUploadBytes".to_string()));

        let mut cfg = valid();
        cfg.ingest.max_upload_bytes = 100 * 1024 * 1024;
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "ingest.maxUploadBytes");

        cfg.ingest.max_upload_bytes = DEFAULT_MAX_UPLOAD_BYTES;
        assert!(validate(&cfg).is_valid());
        cfg.ingest.max_upload_bytes = 512 * 1024;
        assert!(validate(&cfg).is_valid());
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let mut cfg = valid();
        cfg.server.port = 81;
        cfg.model.temperature = 0.9;
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
    }
}
