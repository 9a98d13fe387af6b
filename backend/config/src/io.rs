//! Config file location and read/write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::env::resolve_env_vars;
use crate::schema::TextliftConfig;

const CONFIG_FILE_NAME: &str = "config.yaml";

/// `TEXTLIFT_CONFIG_DIR` if set, otherwise `~/.textlift/`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TEXTLIFT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".textlift"),
        None => PathBuf::from(".textlift"),
    }
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read, substitute `${VAR}` references, and parse the config file.
///
/// A missing file yields the defaults.
pub async fn load_config(path: &Path) -> Result<TextliftConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(TextliftConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to load config at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML text into a config, resolving env var references first.
pub fn parse_config(raw: &str) -> Result<TextliftConfig> {
    if raw.trim().is_empty() {
        return Ok(TextliftConfig::default());
    }
    let value: Value = serde_yaml::from_str(raw).context("Failed to parse config YAML")?;
    let value = resolve_env_vars(&value)?;
    serde_json::from_value(value).context("Config does not match the expected schema")
}

/// Write config atomically, keeping the previous file as `config.yaml.bak`.
pub async fn write_config(config: &TextliftConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        let bak = path.with_extension("yaml.bak");
        if let Err(e) = fs::copy(path, &bak).await {
            warn!("Failed to create backup {}: {}", bak.display(), e);
        }
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}
