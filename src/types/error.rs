//! Unified Error Type System
//!
//! Centralized error types for the generation pipeline.
//! Provides error classification for retry and degrade decisions.
//!
//! ## Error Categories
//!
//! - **Transient**: Temporary upstream issues (retry a bounded number of times)
//! - **RateLimit**: API rate limiting (retry after delay)
//! - **ContentPolicy**: Prompt rejected by a safety system (never retry)
//! - **Auth**: Authentication failures (fail fast, propagate)
//! - **Network**: Connectivity issues (retry)
//! - **ParseError**: Malformed model output (caller falls back)

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories for retry and degrade routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry
    RateLimit,
    /// Context/token limit exceeded
    TokenLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues - retry
    Network,
    /// Provider unavailable or misconfigured endpoint
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Rejected by the provider's content policy - retrying always fails again
    ContentPolicy,
    /// Parsing model response failed
    ParseError,
    /// Temporary server issues - retry
    Transient,
    /// Unknown error - conservative retry
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ContentPolicy => write!(f, "CONTENT_POLICY"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is worth another attempt on the same provider
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Transient | Self::Unknown
        )
    }

    /// Conditions no retry or fallback can repair
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth | Self::Unavailable)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Upstream provider error with category and provider context
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: Option<String>,
    /// Suggested wait time before retry (if the provider sent one)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            retry_after: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            retry_after: None,
        }
    }

    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Routes raw provider failures to an [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        // Content policy must be checked before the generic 400 patterns:
        // providers report policy rejections as bad requests.
        if lower.contains("content_policy")
            || lower.contains("content policy")
            || lower.contains("safety system")
            || lower.contains("moderation")
            || lower.contains("safety_violation")
        {
            return LlmError::with_provider(ErrorCategory::ContentPolicy, message, provider);
        }

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30));
        }

        if lower.contains("token")
            && (lower.contains("limit") || lower.contains("exceed") || lower.contains("maximum"))
            || lower.contains("context length")
        {
            return LlmError::with_provider(ErrorCategory::TokenLimit, message, provider);
        }

        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("invalid key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider)
                .retry_after(Duration::from_secs(5));
        }

        if lower.contains("502")
            || lower.contains("503")
            || lower.contains("500")
            || lower.contains("server error")
            || lower.contains("overloaded")
            || lower.contains("temporary")
        {
            return LlmError::with_provider(ErrorCategory::Transient, message, provider)
                .retry_after(Duration::from_secs(2));
        }

        if lower.contains("400") || lower.contains("bad request") || lower.contains("malformed") {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        if lower.contains("parse") || lower.contains("json") || lower.contains("syntax") {
            return LlmError::with_provider(ErrorCategory::ParseError, message, provider);
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            // Policy rejections arrive as 400 with a descriptive body
            400 => {
                let classified = Self::classify(message, provider);
                if classified.category == ErrorCategory::ContentPolicy {
                    classified
                } else {
                    LlmError::with_provider(ErrorCategory::BadRequest, message, provider)
                }
            }
            500 | 502 | 503 | 504 => {
                LlmError::with_provider(ErrorCategory::Transient, message, provider)
                    .retry_after(Duration::from_secs(5))
            }
            404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// Categorised upstream failure
    #[error("LLM error: {0}")]
    Llm(LlmError),

    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("Image API error: {0}")]
    ImageApi(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Model output could not be decoded as a plan
    #[error("Plan parse failed: {0}")]
    PlanParse(String),

    #[error("Repair failed to produce valid JSON: {0}")]
    RepairParse(String),

    /// Basic structural validation of a freshly parsed plan
    #[error("Plan structure invalid at '{field}': {message}")]
    PlanStructure { field: String, message: String },

    #[error("Config error: {0}")]
    Config(String),
}

impl From<LlmError> for ForgeError {
    fn from(err: LlmError) -> Self {
        ForgeError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;

impl ForgeError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn plan_structure(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PlanStructure {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Category used by retry policies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Llm(e) => e.category,
            Self::LlmApi(msg) | Self::ImageApi(msg) => ErrorClassifier::classify(msg, "").category,
            Self::Timeout { .. } => ErrorCategory::Network,
            Self::Io(_) => ErrorCategory::Network,
            Self::Json(_) | Self::PlanParse(_) | Self::RepairParse(_) => ErrorCategory::ParseError,
            Self::PlanStructure { .. } => ErrorCategory::ParseError,
            Self::Image(_) => ErrorCategory::BadRequest,
            Self::Config(_) => ErrorCategory::BadRequest,
        }
    }

    /// Check if this error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Provider-unreachable or auth-misconfiguration conditions that the
    /// pipeline propagates instead of degrading
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Llm(e) => e.category.is_fatal(),
            Self::LlmApi(msg) => ErrorClassifier::classify(msg, "").category == ErrorCategory::Auth,
            _ => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::ContentPolicy.to_string(), "CONTENT_POLICY");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::ContentPolicy.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::BadRequest.is_retryable());
    }

    #[test]
    fn test_classify_content_policy() {
        let err = ErrorClassifier::classify(
            "400 Bad Request: Your request was rejected as a result of our safety system",
            "openai",
        );
        assert_eq!(err.category, ErrorCategory::ContentPolicy);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_http_400_policy_body() {
        let err = ErrorClassifier::classify_http_status(
            400,
            r#"{"error":{"code":"content_policy_violation"}}"#,
            "openai",
        );
        assert_eq!(err.category, ErrorCategory::ContentPolicy);

        let plain = ErrorClassifier::classify_http_status(400, "missing field", "openai");
        assert_eq!(plain.category, ErrorCategory::BadRequest);
    }

    #[test]
    fn test_classify_auth_is_fatal() {
        let err = ErrorClassifier::classify("Invalid API key provided", "openai");
        assert_eq!(err.category, ErrorCategory::Auth);
        assert!(ForgeError::Llm(err).is_fatal());
    }

    #[test]
    fn test_classify_network() {
        let err = ErrorClassifier::classify("Connection timed out after 30s", "ollama");
        assert_eq!(err.category, ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_timeout_is_recoverable_not_fatal() {
        let err = ForgeError::timeout("image generation", Duration::from_secs(90));
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_parse_errors_not_retried() {
        assert!(!ForgeError::PlanParse("bad".into()).is_recoverable());
        assert!(!ForgeError::PlanParse("bad".into()).is_fatal());
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");
    }
}
