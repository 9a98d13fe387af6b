//! Builds runtime components from the loaded config.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tracing::info;

use textlift_config::{ModelConfig, TextliftConfig};
use textlift_core::{ImageIngestor, MemoryPreviewStore, VisionModel};
use textlift_extractor::providers::{GeminiProvider, MockProvider};
use textlift_extractor::ExtractionClient;

pub fn build_model(model: &ModelConfig) -> Result<Arc<dyn VisionModel>> {
    match model.provider.as_str() {
        "mock" => {
            info!("Using mock vision provider");
            Ok(Arc::new(MockProvider::new("mock").with_samples()))
        }
        "gemini" => {
            let key = model
                .api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| anyhow!("Gemini requires an API key; set GEMINI_API_KEY"))?;
            let mut provider = GeminiProvider::new(key);
            if let Some(base) = &model.base_url {
                provider = provider.with_base_url(base.as_str());
            }
            info!(model = %model.model_id, "Using Gemini vision provider");
            Ok(Arc::new(provider))
        }
        other => bail!("Unknown provider '{other}'"),
    }
}

pub fn build_client(config: &TextliftConfig) -> Result<ExtractionClient> {
    let model = build_model(&config.model)?;
    Ok(ExtractionClient::new(model)
        .with_model_id(config.model.model_id.as_str())
        .with_temperature(config.model.temperature))
}

pub fn build_ingestor(config: &TextliftConfig) -> ImageIngestor {
    ImageIngestor::new(Arc::new(MemoryPreviewStore::new()))
        .with_max_bytes(config.ingest.max_upload_bytes)
}
