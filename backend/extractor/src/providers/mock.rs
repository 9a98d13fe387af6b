use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;
use textlift_core::{RequestPart, VisionModel, VisionRequest, VisionResponse};

#[derive(Debug, Clone)]
enum Canned {
    Text(String),
    NoText,
    Failure(String),
    Sample,
}

/// A vision model double that returns a canned answer and counts calls.
pub struct MockProvider {
    name: String,
    canned: Canned,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            canned: Canned::Text(r#"{"rawText": "Mock response"}"#.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.canned = Canned::Text(response.into());
        self
    }

    /// Answer successfully but without any text.
    pub fn with_no_text(mut self) -> Self {
        self.canned = Canned::NoText;
        self
    }

    /// Fail as a transport error would.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.canned = Canned::Failure(message.into());
        self
    }

    /// Answer with a small payload shaped after the request's schema, plus a
    /// summary when the instruction asks for one. Used by `serve --mock`.
    pub fn with_samples(mut self) -> Self {
        self.canned = Canned::Sample;
        self
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn sample_for(request: &VisionRequest) -> String {
    let required = &request.config.response_schema["required"];
    let wants = |field: &str| {
        required
            .as_array()
            .is_some_and(|fields| fields.iter().any(|f| f == field))
    };
    let wants_summary = request.parts.iter().any(|part| match part {
        RequestPart::Text(text) => text.contains("summary"),
        _ => false,
    });

    let mut payload = if wants("forms") {
        json!({"forms": [
            {"key": "Name", "value": "Jane Doe"},
            {"key": "Date", "value": "2024-01-31"}
        ]})
    } else if wants("tables") {
        json!({"tables": [[["Item", "Qty"], ["Widget", "3"]]]})
    } else {
        json!({"rawText": "Mock response"})
    };
    if wants_summary {
        payload["summary"] = json!("Sample document generated by the mock provider.");
    }
    payload.to_string()
}

#[async_trait]
impl VisionModel for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let text = match &self.canned {
            Canned::Text(text) => Some(text.clone()),
            Canned::NoText => None,
            Canned::Failure(message) => bail!("{message}"),
            Canned::Sample => Some(sample_for(request)),
        };

        Ok(VisionResponse {
            text,
            provider: self.name.clone(),
            model: request.model.clone(),
            latency_ms: self.delay.map(|d| d.as_millis() as u64).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ExtractionClient, ExtractionRequest};
    use bytes::Bytes;
    use std::sync::Arc;
    use textlift_core::{ExtractionMode, ExtractionResult};

    fn request(mode: ExtractionMode, summarize: bool) -> ExtractionRequest {
        ExtractionRequest {
            image: Bytes::from_static(b"img"),
            mime_type: "image/png".into(),
            mode,
            summarize,
        }
    }

    #[tokio::test]
    async fn samples_match_every_mode() {
        let client = ExtractionClient::new(Arc::new(MockProvider::new("mock").with_samples()));
        for mode in ExtractionMode::ALL {
            let result = client.extract(&request(mode, false)).await;
            assert_eq!(result.mode(), Some(mode), "{result:?}");
            assert!(result.summary().is_none());
        }
    }

    #[tokio::test]
    async fn samples_add_summary_when_asked() {
        let client = ExtractionClient::new(Arc::new(MockProvider::new("mock").with_samples()));
        let result = client.extract(&request(ExtractionMode::Forms, true)).await;
        assert!(matches!(result, ExtractionResult::Forms { ref forms, .. } if forms.len() == 2));
        assert!(result.summary().is_some());
    }
}
