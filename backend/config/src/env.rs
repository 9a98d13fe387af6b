//! `${VAR}` substitution in config values and environment overrides.
//!
//! Variable names are uppercase `[A-Z_][A-Z0-9_]*`. `$${VAR}` is kept as a
//! literal `${VAR}`.

use std::collections::HashMap;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use crate::schema::TextliftConfig;

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern"));

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references across a config value tree using the
/// process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    Ok(substitute_value(value, env, "")?)
}

fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let child = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                out.insert(k.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing = None;
    let replaced = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let whole = &caps[0];
        let name = &caps[1];
        if whole.starts_with("$$") {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(v) if !v.is_empty() => v.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(replaced.into_owned()),
    }
}

/// Apply environment overrides on top of the file config.
pub fn apply_env_overrides(config: &mut TextliftConfig) {
    apply_env_overrides_with(config, &std::env::vars().collect());
}

/// Recognised variables: `TEXTLIFT_BIND`, `TEXTLIFT_PORT`, `GEMINI_API_KEY`
/// (falling back to `API_KEY`), `TEXTLIFT_MODEL`, `GEMINI_API_BASE`, and
/// `RUST_LOG`.
pub fn apply_env_overrides_with(config: &mut TextliftConfig, env: &HashMap<String, String>) {
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(bind) = get("TEXTLIFT_BIND") {
        config.server.bind_address = bind.to_string();
    }
    if let Some(port) = get("TEXTLIFT_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => debug!(value = %port, "Ignoring unparsable TEXTLIFT_PORT"),
        }
    }
    if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("API_KEY")) {
        config.model.api_key = Some(key.to_string());
    }
    if let Some(model) = get("TEXTLIFT_MODEL") {
        config.model.model_id = model.to_string();
    }
    if let Some(base) = get("GEMINI_API_BASE") {
        config.model.base_url = Some(base.to_string());
    }
    if let Some(level) = get("RUST_LOG") {
        config.logging.level = level.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_nested_var() {
        let v = json!({"model": {"apiKey": "${GEMINI_API_KEY}"}});
        let out = resolve_env_vars_with(&v, &env(&[("GEMINI_API_KEY", "AIzaTest")])).unwrap();
        assert_eq!(out["model"]["apiKey"], "AIzaTest");
    }

    #[test]
    fn missing_var_names_path() {
        let v = json!({"model": {"apiKey": "${NOT_SET}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("NOT_SET"));
        assert!(msg.contains("model.apiKey"));
    }

    #[test]
    fn escaped_reference_stays_literal() {
        let v = json!({"note": "use $${HOME} here"});
        let out = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(out["note"], "use ${HOME} here");
    }

    #[test]
    fn non_strings_pass_through() {
        let v = json!({"port": 8080, "json": true});
        assert_eq!(resolve_env_vars_with(&v, &HashMap::new()).unwrap(), v);
    }

    #[test]
    fn overrides_take_precedence() {
        let mut cfg = TextliftConfig::default();
        apply_env_overrides_with(
            &mut cfg,
            &env(&[
                ("TEXTLIFT_PORT", "9100"),
                ("API_KEY", "fallback"),
                ("TEXTLIFT_MODEL", "gemini-2.5-pro"),
                ("RUST_LOG", "debug"),
            ]),
        );
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.model.api_key.as_deref(), Some("fallback"));
        assert_eq!(cfg.model.model_id, "gemini-2.5-pro");
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn gemini_key_wins_over_generic_key() {
        let mut cfg = TextliftConfig::default();
        apply_env_overrides_with(
            &mut cfg,
            &env(&[("API_KEY", "generic"), ("GEMINI_API_KEY", "specific")]),
        );
        assert_eq!(cfg.model.api_key.as_deref(), Some("specific"));
    }

    #[test]
    fn bad_port_is_ignored() {
        let mut cfg = TextliftConfig::default();
        apply_env_overrides_with(&mut cfg, &env(&[("TEXTLIFT_PORT", "eighty")]));
        assert_eq!(cfg.server.port, crate::schema::DEFAULT_PORT);
    }
}
