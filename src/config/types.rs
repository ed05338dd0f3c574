//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/lessonforge/) and project (.lessonforge/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::ai::provider::{LLM_PROVIDERS, ProviderConfig};
use crate::ai::image_provider::IMAGE_PROVIDERS;
use crate::ai::timeout::RetryPolicy;
use crate::constants::{cache as cache_constants, images as image_constants, network};
use crate::types::{ForgeError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Language model provider settings
    pub llm: LlmConfig,

    /// Image generation settings
    pub images: ImageConfig,

    /// Image cache settings
    pub cache: CacheConfig,

    /// Document output settings
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            images: ImageConfig::default(),
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ForgeError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ForgeError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ForgeError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(ForgeError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                LLM_PROVIDERS.join(", ")
            )));
        }

        if self.images.enabled && !IMAGE_PROVIDERS.contains(&self.images.provider.as_str()) {
            return Err(ForgeError::Config(format!(
                "Unknown image provider: {}. Supported: {}",
                self.images.provider,
                IMAGE_PROVIDERS.join(", ")
            )));
        }

        if self.images.timeout_secs == 0 {
            return Err(ForgeError::Config(
                "Image timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.cache.max_entries == 0 {
            return Err(ForgeError::Config(
                "Cache max_entries must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "openai" or "ollama"
    pub provider: String,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
    /// Never serialized; prefer the provider's env var
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_base: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.7,
            api_key: None,
            api_base: None,
        }
    }
}

impl LlmConfig {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
        }
    }
}

// =============================================================================
// Image Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Disable to skip image generation entirely
    pub enabled: bool,
    pub provider: String,
    pub model: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    /// Per-attempt timeout
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    /// Delay between batch items that were not cache hits
    pub batch_delay_ms: u64,
}

impl std::fmt::Debug for ImageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("batch_delay_ms", &self.batch_delay_ms)
            .finish()
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".to_string(),
            model: None,
            api_key: None,
            api_base: None,
            timeout_secs: image_constants::DEFAULT_TIMEOUT_SECS,
            max_retries: image_constants::DEFAULT_MAX_RETRIES,
            retry_delay_ms: image_constants::DEFAULT_RETRY_DELAY_MS,
            batch_delay_ms: image_constants::DEFAULT_BATCH_DELAY_MS,
        }
    }
}

impl ImageConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            temperature: 0.0,
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
        }
    }
}

// =============================================================================
// Cache & Output
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// LRU ceiling on cached images
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: cache_constants::DEFAULT_MAX_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let mut config = Config::default();
        config.llm.provider = "gemini".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown LLM provider"));
    }

    #[test]
    fn test_rejects_bad_temperature() {
        let mut config = Config::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_image_retry_policy_defaults() {
        let policy = ImageConfig::default().retry_policy();
        assert_eq!(policy.timeout, Duration::from_secs(90));
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(format!("{:?}", config.llm).contains("[REDACTED]"));
    }
}
