use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::ExtractError;
use crate::mode::ExtractionMode;

/// One row of a table: cell texts in column order. Rows need not be equal length.
pub type Row = Vec<String>;
/// One table: rows in document order.
pub type Table = Vec<Row>;

/// A single key/value pair read from a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub key: String,
    pub value: String,
}

impl FormField {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Outcome of one extraction call.
///
/// Exactly one payload field is populated, chosen by the mode the call was
/// made under. Errors carry nothing but their message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Text {
        raw_text: String,
        summary: Option<String>,
    },
    Forms {
        forms: Vec<FormField>,
        summary: Option<String>,
    },
    Tables {
        tables: Vec<Table>,
        summary: Option<String>,
    },
    Error {
        message: String,
    },
}

impl ExtractionResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Mode that produced this result; `None` for errors.
    pub fn mode(&self) -> Option<ExtractionMode> {
        match self {
            Self::Text { .. } => Some(ExtractionMode::Text),
            Self::Forms { .. } => Some(ExtractionMode::Forms),
            Self::Tables { .. } => Some(ExtractionMode::Tables),
            Self::Error { .. } => None,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            Self::Text { summary, .. }
            | Self::Forms { summary, .. }
            | Self::Tables { summary, .. } => summary.as_deref(),
            Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Decode a model payload under `mode`.
    ///
    /// The payload must be a JSON object carrying the mode's mandatory field
    /// with the right type. Anything else is an error; a partial success is
    /// never produced.
    pub fn from_payload(mode: ExtractionMode, payload: &str) -> Result<Self, ExtractError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| ExtractError::MalformedPayload(e.to_string()))?;

        if !value.is_object() {
            return Err(ExtractError::ShapeMismatch {
                mode,
                detail: format!("expected a JSON object, got {}", json_kind(&value)),
            });
        }

        let mismatch = |e: serde_json::Error| ExtractError::ShapeMismatch {
            mode,
            detail: e.to_string(),
        };

        let result = match mode {
            ExtractionMode::Text => {
                let p: TextPayload = serde_json::from_value(value).map_err(mismatch)?;
                Self::Text {
                    raw_text: p.raw_text,
                    summary: p.summary,
                }
            }
            ExtractionMode::Forms => {
                let p: FormsPayload = serde_json::from_value(value).map_err(mismatch)?;
                Self::Forms {
                    forms: p.forms,
                    summary: p.summary,
                }
            }
            ExtractionMode::Tables => {
                let p: TablesPayload = serde_json::from_value(value).map_err(mismatch)?;
                Self::Tables {
                    tables: p.tables,
                    summary: p.summary,
                }
            }
        };
        Ok(result)
    }
}

impl From<ExtractError> for ExtractionResult {
    fn from(err: ExtractError) -> Self {
        Self::error(err.to_string())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Deserialize)]
struct TextPayload {
    #[serde(rename = "rawText")]
    raw_text: String,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
struct FormsPayload {
    forms: Vec<FormField>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
struct TablesPayload {
    tables: Vec<Table>,
    #[serde(default)]
    summary: Option<String>,
}

/// Wire shape shared with the browser: every field optional, camelCase.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractedData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forms: Option<&'a [FormField]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tables: Option<&'a [Table]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut wire = ExtractedData {
            raw_text: None,
            forms: None,
            tables: None,
            summary: self.summary(),
            error: None,
        };
        match self {
            Self::Text { raw_text, .. } => wire.raw_text = Some(raw_text),
            Self::Forms { forms, .. } => wire.forms = Some(forms),
            Self::Tables { tables, .. } => wire.tables = Some(tables),
            Self::Error { message } => wire.error = Some(message),
        }
        wire.serialize(serializer)
    }
}
