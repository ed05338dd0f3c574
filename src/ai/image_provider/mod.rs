//! Image Provider Abstraction
//!
//! Image-generation backends behind one trait. The generator treats every
//! provider the same way; providers only differ in how they talk to their API
//! and how they recognise a content-policy rejection.

#[cfg(test)]
pub mod mock;
mod openai;

pub use openai::OpenAiImageProvider;

use async_trait::async_trait;
use std::sync::Arc;

use crate::ai::provider::ProviderConfig;
use crate::types::{ErrorCategory, ForgeError, GeneratedImage, ImageStyle, PlacementSize, Result};

/// Names accepted by [`create_image_provider`]
pub const IMAGE_PROVIDERS: [&str; 1] = ["openai"];

pub type SharedImageProvider = Arc<dyn ImageProvider + Send + Sync>;

#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_image(
        &self,
        prompt: &str,
        size: &PlacementSize,
        style: ImageStyle,
    ) -> Result<GeneratedImage>;

    /// Whether `err` is a content-policy rejection (never worth retrying)
    fn is_content_policy_error(&self, err: &ForgeError) -> bool {
        err.category() == ErrorCategory::ContentPolicy
    }

    fn name(&self) -> &str;
}

/// Resolve an image provider by name. Unknown names fail here, not at first use.
pub fn create_image_provider(config: &ProviderConfig) -> Result<SharedImageProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiImageProvider::new(config.clone())?)),
        _ => Err(ForgeError::Config(format!(
            "Unknown image provider: {}. Supported: {}",
            config.provider,
            IMAGE_PROVIDERS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_image_provider_fails_fast() {
        let config = ProviderConfig {
            provider: "midjourney".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_image_provider(&config),
            Err(ForgeError::Config(_))
        ));
    }
}
