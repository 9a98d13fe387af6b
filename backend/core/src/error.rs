use thiserror::Error;

use crate::mode::ExtractionMode;

/// Message used when the model answers without any textual payload.
pub const EMPTY_RESPONSE_MESSAGE: &str = "No response generated from AI model.";

/// Why an uploaded file was refused at selection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedType,
    TooLarge,
}

/// Ingestion failure. Reported synchronously; never reaches an `ExtractionResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn unsupported_type() -> Self {
        Self {
            kind: ErrorKind::UnsupportedType,
            message: "Please upload an image file (JPG, PNG, WEBP).".to_string(),
        }
    }

    pub fn too_large(max_bytes: u64) -> Self {
        Self {
            kind: ErrorKind::TooLarge,
            message: format!(
                "File size too large. Maximum size is {}.",
                limit_label(max_bytes)
            ),
        }
    }
}

fn limit_label(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= MIB {
        format!("{:.2}MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

/// Failures on the extraction path. The extraction client turns every one of
/// these into `ExtractionResult::Error` before it leaves the client.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0}")]
    Dispatch(String),

    #[error("{}", EMPTY_RESPONSE_MESSAGE)]
    EmptyResponse,

    #[error("model returned malformed JSON: {0}")]
    MalformedPayload(String),

    #[error("model response does not match the {mode} shape: {detail}")]
    ShapeMismatch { mode: ExtractionMode, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_response_message_is_fixed() {
        assert_eq!(
            ExtractError::EmptyResponse.to_string(),
            "No response generated from AI model."
        );
    }

    #[test]
    fn too_large_message_uses_limit() {
        let err = ValidationError::too_large(10 * 1024 * 1024);
        assert_eq!(err.kind, ErrorKind::TooLarge);
        assert_eq!(err.message, "File size too large. Maximum size is 10MB.");
    }

    #[test]
    fn too_large_message_below_one_megabyte() {
        let err = ValidationError::too_large(512 * 1024);
        assert_eq!(err.message, "File size too large. Maximum size is 512KB.");
        assert_eq!(
            ValidationError::too_large(1000).message,
            "File size too large. Maximum size is 1000 bytes."
        );
    }

    #[test]
    fn too_large_message_fractional_megabytes() {
        let err = ValidationError::too_large(1024 * 1024 + 512 * 1024);
        assert_eq!(err.message, "File size too large. Maximum size is 1.50MB.");
    }

    #[test]
    fn shape_mismatch_names_mode() {
        let err = ExtractError::ShapeMismatch {
            mode: ExtractionMode::Forms,
            detail: "missing field `forms`".into(),
        };
        assert!(err.to_string().contains("forms shape"));
    }
}
