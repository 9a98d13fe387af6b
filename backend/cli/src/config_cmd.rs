//! `textlift config`: inspect and initialise the config file.

use std::path::Path;

use anyhow::Result;

use textlift_config::{redact, validate, write_config, TextliftConfig};

use crate::terminal_output::{note_error, note_info, note_success, note_warn};

/// Print the effective config with secrets masked.
pub fn show(config: &TextliftConfig) -> Result<()> {
    let redacted = redact(config)?;
    println!("{}", serde_json::to_string_pretty(&redacted)?);
    Ok(())
}

/// Print validation findings. Returns whether the config is usable.
pub fn check(config: &TextliftConfig) -> bool {
    let report = validate(config);
    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
    if report.is_valid() {
        note_success("Config is valid");
    }
    report.is_valid()
}

/// Write a default config unless one exists and `force` is off.
pub async fn init(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        note_info(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ));
        return Ok(false);
    }
    write_config(&TextliftConfig::default(), path).await?;
    note_success(&format!("Wrote default config to {}", path.display()));
    Ok(true)
}
