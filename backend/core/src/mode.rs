use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which kind of structure to pull out of a document image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Full legible text, line breaks preserved.
    #[default]
    Text,
    /// Key/value form fields.
    Forms,
    /// Every table as a grid of string cells.
    Tables,
}

impl ExtractionMode {
    /// All modes in the order the UI offers them.
    pub const ALL: [ExtractionMode; 3] = [Self::Text, Self::Forms, Self::Tables];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Forms => "forms",
            Self::Tables => "tables",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "Raw Text",
            Self::Forms => "Forms",
            Self::Tables => "Tables",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown extraction mode '{0}' (expected text, forms, or tables)")]
pub struct ParseModeError(pub String);

impl FromStr for ExtractionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "forms" => Ok(Self::Forms),
            "tables" => Ok(Self::Tables),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Tables".parse::<ExtractionMode>().unwrap(), ExtractionMode::Tables);
        assert_eq!(" forms ".parse::<ExtractionMode>().unwrap(), ExtractionMode::Forms);
        assert!("pdf".parse::<ExtractionMode>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&ExtractionMode::Forms).unwrap();
        assert_eq!(json, "\"forms\"");
        let back: ExtractionMode = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(back, ExtractionMode::Text);
    }

    #[test]
    fn default_is_text() {
        assert_eq!(ExtractionMode::default(), ExtractionMode::Text);
        assert_eq!(ExtractionMode::Text.to_string(), "text");
    }
}
