//! Mode/schema registry.
//!
//! One table maps an [`ExtractionMode`] to the instruction sent to the model
//! and the structured-output schema its answer must follow. Request building
//! and shape checking both read from here.

use serde_json::{json, Value};

use crate::mode::ExtractionMode;

/// Instruction text and response schema for one extraction call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSpec {
    pub mode: ExtractionMode,
    pub instruction: String,
    pub response_schema: Value,
}

impl ModeSpec {
    /// The field every successful response for this mode must carry.
    pub fn primary_field(&self) -> &'static str {
        primary_field(self.mode)
    }

    /// Field names the schema marks as mandatory.
    pub fn required_fields(&self) -> Vec<&str> {
        self.response_schema["required"]
            .as_array()
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

pub fn primary_field(mode: ExtractionMode) -> &'static str {
    match mode {
        ExtractionMode::Text => "rawText",
        ExtractionMode::Forms => "forms",
        ExtractionMode::Tables => "tables",
    }
}

/// Build the instruction and schema for `mode`.
pub fn spec_for(mode: ExtractionMode, summarize: bool) -> ModeSpec {
    let (base, summary_ask, schema) = match mode {
        ExtractionMode::Text => (
            "Extract all legible text from this image. Preserve original line breaks where possible.",
            "Also provide a brief summary of the content.",
            text_schema(),
        ),
        ExtractionMode::Forms => (
            "Analyze this document as a form. Identify all key-value pairs (fields and their entries). Return a list of fields.",
            "Also provide a brief summary of the document's purpose.",
            forms_schema(),
        ),
        ExtractionMode::Tables => (
            "Analyze this document for tables. Extract all tables found. Represent each table as a grid of strings.",
            "Also provide a brief summary of the tabular data.",
            tables_schema(),
        ),
    };

    let instruction = if summarize {
        format!("{base} {summary_ask}")
    } else {
        base.to_string()
    };

    ModeSpec {
        mode,
        instruction,
        response_schema: schema,
    }
}

fn summary_property(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn text_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "rawText": {
                "type": "STRING",
                "description": "The full extracted text from the document."
            },
            "summary": summary_property("A concise summary of the document content (optional).")
        },
        "required": ["rawText"]
    })
}

fn forms_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "forms": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "key": { "type": "STRING", "description": "The field label or name." },
                        "value": { "type": "STRING", "description": "The field value or entry." }
                    },
                    "required": ["key", "value"]
                }
            },
            "summary": summary_property("A concise summary of the form.")
        },
        "required": ["forms"]
    })
}

fn tables_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "tables": {
                "type": "ARRAY",
                "description": "List of tables found in the document.",
                "items": {
                    "type": "ARRAY",
                    "description": "A single table, represented as a list of rows.",
                    "items": {
                        "type": "ARRAY",
                        "description": "A single row, represented as a list of cell text.",
                        "items": { "type": "STRING" }
                    }
                }
            },
            "summary": summary_property("A concise summary of the table data.")
        },
        "required": ["tables"]
    })
}
