//! AI Integration Layer
//!
//! Model and image providers, bounded retry, and decoding of model output.

pub mod image_provider;
pub mod json;
pub mod metrics;
pub mod prompt;
pub mod provider;
pub mod timeout;

pub use image_provider::{
    IMAGE_PROVIDERS, ImageProvider, OpenAiImageProvider, SharedImageProvider,
    create_image_provider,
};
pub use json::{JsonDecodeError, decode_model_json};
pub use metrics::{
    MetricsCollector, MetricsSummary, PhaseMetrics, SharedMetrics, create_shared_metrics,
};
pub use prompt::PromptBuilder;
pub use provider::{
    CompletionOptions, LLM_PROVIDERS, LlmProvider, LlmResponse, OllamaProvider, OpenAiProvider,
    ProviderConfig, ResponseMetadata, ResponseTiming, SharedProvider, TokenUsage,
    create_provider,
};
pub use timeout::{RetryPolicy, attempt_with_policy, with_timeout};
