//! `textlift-config`: runtime configuration for the textlift binary.
//!
//! - Typed YAML schema with defaults for every field
//! - `${ENV_VAR}` substitution and environment overrides
//! - Validation with errors and warnings
//! - Redaction for safe display

pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{
    apply_env_overrides, apply_env_overrides_with, resolve_env_vars, resolve_env_vars_with,
    MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_config, parse_config, write_config};
pub use redact::{redact, redact_value};
pub use schema::{IngestConfig, LoggingConfig, ModelConfig, ServerConfig, TextliftConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::Result;
use std::path::Path;

/// Load the file and apply environment overrides on top.
///
/// Validation is left to the caller so findings can be reported once
/// logging is up.
pub async fn load_effective(path: &Path) -> Result<TextliftConfig> {
    let mut config = load_config(path).await?;
    apply_env_overrides(&mut config);
    Ok(config)
}
