//! OpenAI Image Generation Provider

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::ImageProvider;
use crate::ai::provider::ProviderConfig;
use crate::types::{
    ErrorCategory, ErrorClassifier, ForgeError, GeneratedImage, ImageStyle, LlmError,
    PlacementSize, Result,
};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "dall-e-3";

pub struct OpenAiImageProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiImageProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiImageProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                ForgeError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY env var or provide in config"
                        .to_string(),
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ForgeError::ImageApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
        })
    }

    /// Provider canvas for a size bucket; compression shrinks it afterwards
    fn canvas(size: &PlacementSize) -> (u32, u32) {
        match size {
            PlacementSize::Wide => (1792, 1024),
            _ => (1024, 1024),
        }
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    async fn generate_image(
        &self,
        prompt: &str,
        size: &PlacementSize,
        style: ImageStyle,
    ) -> Result<GeneratedImage> {
        let (width, height) = Self::canvas(size);
        info!(
            "Generating image with OpenAI (model: {}, style: {}, {}x{})",
            self.model, style, width, height
        );

        let start_time = Instant::now();
        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: format!("{}. Style: {}", prompt, style.prompt_hint()),
            n: 1,
            size: format!("{}x{}", width, height),
            response_format: "b64_json".to_string(),
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.api_base))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ForgeError::Llm(LlmError::with_provider(
                        ErrorCategory::Unavailable,
                        format!("Failed to reach image API: {}", e),
                        "openai-images",
                    ))
                } else {
                    ForgeError::Llm(ErrorClassifier::classify(&e.to_string(), "openai-images"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ForgeError::Llm(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("Image API error ({}): {}", status, body),
                "openai-images",
            )));
        }

        let body: ImageGenerationResponse = response
            .json()
            .await
            .map_err(|e| ForgeError::ImageApi(format!("Failed to parse image response: {}", e)))?;

        let base64_data = body
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| ForgeError::ImageApi("No image data in response".to_string()))?;

        debug!("Image generated in {:?}", start_time.elapsed());

        Ok(GeneratedImage {
            base64_data,
            media_type: "image/png".to_string(),
            width,
            height,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest {
    model: String,
    prompt: String,
    n: u8,
    size: String,
    response_format: String,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}
