use std::sync::Arc;
use std::time::Instant;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use tracing::{debug, error, info};

use textlift_core::{
    spec_for, ExtractError, ExtractionMode, ExtractionResult, GenerationConfig, PendingFile,
    RequestPart, VisionModel, VisionRequest,
};

/// Model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash";
/// Low temperature keeps extraction close to the page.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Inputs of one extraction call, snapshotted from the session.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub image: Bytes,
    pub mime_type: String,
    pub mode: ExtractionMode,
    pub summarize: bool,
}

impl ExtractionRequest {
    pub fn from_file(file: &PendingFile, mode: ExtractionMode, summarize: bool) -> Self {
        Self {
            image: file.bytes().clone(),
            mime_type: file.mime_type().to_string(),
            mode,
            summarize,
        }
    }
}

/// Sends one image to the vision model and decodes its structured answer.
#[derive(Clone)]
pub struct ExtractionClient {
    model: Arc<dyn VisionModel>,
    model_id: String,
    temperature: f32,
}

impl ExtractionClient {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self {
            model,
            model_id: DEFAULT_MODEL_ID.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn provider_name(&self) -> &str {
        self.model.name()
    }

    /// Run one extraction. Never fails: every error becomes `ExtractionResult::Error`.
    pub async fn extract(&self, request: &ExtractionRequest) -> ExtractionResult {
        match self.try_extract(request).await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    provider = %self.model.name(),
                    mode = %request.mode,
                    error = %e,
                    "Extraction failed"
                );
                ExtractionResult::from(e)
            }
        }
    }

    async fn try_extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractError> {
        let vision_request = self.build_request(request);

        debug!(
            provider = %self.model.name(),
            model = %self.model_id,
            mode = %request.mode,
            summarize = request.summarize,
            bytes = request.image.len(),
            "Sending extraction request"
        );

        let start = Instant::now();
        let response = self
            .model
            .generate(&vision_request)
            .await
            .map_err(|e| ExtractError::Dispatch(format!("{e:#}")))?;

        let payload = response
            .text
            .filter(|text| !text.trim().is_empty())
            .ok_or(ExtractError::EmptyResponse)?;

        let result = ExtractionResult::from_payload(request.mode, &payload)?;

        info!(
            provider = %response.provider,
            mode = %request.mode,
            latency_ms = start.elapsed().as_millis() as u64,
            "Extraction completed"
        );
        Ok(result)
    }

    /// Build the model request: image part, then the mode's instruction,
    /// with the mode's schema as the structured-output constraint.
    pub fn build_request(&self, request: &ExtractionRequest) -> VisionRequest {
        let spec = spec_for(request.mode, request.summarize);
        VisionRequest {
            model: self.model_id.clone(),
            parts: vec![
                RequestPart::InlineData {
                    mime_type: request.mime_type.clone(),
                    data: STANDARD.encode(&request.image),
                },
                RequestPart::Text(spec.instruction),
            ],
            config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: spec.response_schema,
                temperature: self.temperature,
            },
        }
    }
}
