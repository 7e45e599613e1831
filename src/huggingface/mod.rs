pub mod image_client;
pub mod transport;

use crate::{
    config::HuggingFaceConfig,
    error::{GenerationError, Result},
};
use std::sync::Arc;

pub use image_client::ImageClient;
pub use transport::{InferenceTransport, ReqwestTransport, TransportResponse};

#[derive(Clone)]
pub struct HuggingFaceClient {
    image_client: ImageClient,
    config: HuggingFaceConfig,
}

impl HuggingFaceClient {
    /// Builds a client over HTTP. Fails fast when no API token is configured.
    pub fn new(config: HuggingFaceConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: HuggingFaceConfig,
        transport: Arc<dyn InferenceTransport>,
    ) -> Result<Self> {
        let token = config
            .api_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::ConfigError("HUGGINGFACE_API_TOKEN is required".into())
            })?;

        let image_client = ImageClient::new(transport, config.endpoint(), token, config.retry);

        Ok(Self {
            image_client,
            config,
        })
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn config(&self) -> &HuggingFaceConfig {
        &self.config
    }
}
