//! Presentation contracts: what a result looks like under a given mode,
//! independent of whether it ends up as HTML or terminal output.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mode::ExtractionMode;
use crate::result::{ExtractionResult, FormField, Row, Table};

pub const NO_TEXT_PLACEHOLDER: &str = "No text extracted.";
pub const NO_FIELDS_PLACEHOLDER: &str = "No form fields detected.";
pub const NO_TABLES_PLACEHOLDER: &str = "No tables detected.";

/// Which view of a result is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultTab {
    /// Mode-specific formatted view.
    #[default]
    Visual,
    /// Raw serialized result.
    Json,
}

impl FromStr for ResultTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "visual" => Ok(Self::Visual),
            "json" | "raw" => Ok(Self::Json),
            other => Err(format!("unknown result tab '{other}'")),
        }
    }
}

/// A table split into its header row and data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub header: Option<Row>,
    pub rows: Vec<Row>,
}

impl TableView {
    fn from_table(table: &Table) -> Self {
        let mut rows = table.iter();
        let header = rows.next().cloned();
        Self {
            header,
            rows: rows.cloned().collect(),
        }
    }
}

/// Mode-specific body of the formatted view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum ViewBody {
    Error(String),
    Text(String),
    NoText,
    Fields(Vec<FormField>),
    NoFields,
    Tables(Vec<TableView>),
    NoTables,
}

impl ViewBody {
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::NoText => Some(NO_TEXT_PLACEHOLDER),
            Self::NoFields => Some(NO_FIELDS_PLACEHOLDER),
            Self::NoTables => Some(NO_TABLES_PLACEHOLDER),
            _ => None,
        }
    }
}

/// Formatted view of a result: optional summary callout plus the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedResult {
    pub summary: Option<String>,
    pub body: ViewBody,
}

/// Render `result` for display under `mode`.
///
/// Errors bypass mode dispatch. Otherwise the body is chosen by `mode`
/// alone, so a result produced under another mode shows that mode's
/// empty placeholder.
pub fn render(result: &ExtractionResult, mode: ExtractionMode) -> RenderedResult {
    if let ExtractionResult::Error { message } = result {
        return RenderedResult {
            summary: None,
            body: ViewBody::Error(message.clone()),
        };
    }

    let body = match (mode, result) {
        (ExtractionMode::Text, ExtractionResult::Text { raw_text, .. }) if !raw_text.is_empty() => {
            ViewBody::Text(raw_text.clone())
        }
        (ExtractionMode::Text, _) => ViewBody::NoText,
        (ExtractionMode::Forms, ExtractionResult::Forms { forms, .. }) if !forms.is_empty() => {
            ViewBody::Fields(forms.clone())
        }
        (ExtractionMode::Forms, _) => ViewBody::NoFields,
        (ExtractionMode::Tables, ExtractionResult::Tables { tables, .. }) if !tables.is_empty() => {
            ViewBody::Tables(tables.iter().map(TableView::from_table).collect())
        }
        (ExtractionMode::Tables, _) => ViewBody::NoTables,
    };

    RenderedResult {
        summary: result.summary().map(str::to_string),
        body,
    }
}

/// The full result as pretty-printed JSON.
pub fn raw_json(result: &ExtractionResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Text placed on the clipboard by the copy action.
///
/// The JSON tab always copies the raw result. The visual tab copies the
/// plain extracted text in text mode and the raw result otherwise.
pub fn export_text(result: &ExtractionResult, mode: ExtractionMode, tab: ResultTab) -> String {
    match (tab, mode) {
        (ResultTab::Visual, ExtractionMode::Text) => match result {
            ExtractionResult::Text { raw_text, .. } => raw_text.clone(),
            _ => String::new(),
        },
        _ => raw_json(result),
    }
}
