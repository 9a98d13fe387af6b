use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A remote multimodal model able to answer with structured JSON.
///
/// The extraction client talks to this seam only; tests swap in a double.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name (e.g., "gemini", "mock").
    fn name(&self) -> &str;

    /// Send one request and wait for its single response.
    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// One request to a vision model.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    /// Ordered request parts: the image first, then the instruction.
    pub parts: Vec<RequestPart>,
    pub config: GenerationConfig,
}

/// A single part of a multimodal request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPart {
    /// Base64-encoded binary data with its MIME type.
    InlineData { mime_type: String, data: String },
    Text(String),
}

/// Generation settings sent with every request.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
    pub temperature: f32,
}

/// Response from a vision model.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    /// Textual payload; `None` when the model produced no text.
    pub text: Option<String>,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}
