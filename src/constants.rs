//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Planner constants
pub mod planner {
    /// Output token budget for a plan generation call
    pub const PLAN_MAX_TOKENS: usize = 8192;

    /// Output token budget for the one-shot repair call
    pub const REPAIR_MAX_TOKENS: usize = 8192;

    /// Plan schema version written by the planner and fallback generator
    pub const PLAN_VERSION: &str = "1.0";

    /// Inspiration text beyond this many characters is truncated in prompts
    pub const MAX_INSPIRATION_CHARS: usize = 4000;
}

/// Validation constants
pub mod validation {
    /// Plans with at most this many errors are eligible for AI repair
    pub const MAX_AUTO_REPAIRABLE_ERRORS: usize = 5;
}

/// Image generation resilience defaults
pub mod images {
    /// Per-attempt timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

    /// Retries after the first attempt
    pub const DEFAULT_MAX_RETRIES: usize = 1;

    /// Fixed delay between retries (milliseconds)
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

    /// Delay between batch items that hit the provider (milliseconds)
    pub const DEFAULT_BATCH_DELAY_MS: u64 = 1000;

    /// Placeholder text is truncated to this many characters
    pub const PLACEHOLDER_DESCRIPTION_CHARS: usize = 60;
}

/// Image cache constants
pub mod cache {
    /// Default LRU entry ceiling
    pub const DEFAULT_MAX_ENTRIES: u64 = 500;
}

/// Compression constants
pub mod compression {
    /// JPEG quality for small batches (<= 3 images)
    pub const QUALITY_FULL: u8 = 85;
    /// Quality for batches of 4-5 images
    pub const QUALITY_REDUCED: u8 = 75;
    /// Quality for batches of 6-8 images
    pub const QUALITY_LOW: u8 = 65;
    /// Quality for batches above 8 images
    pub const QUALITY_MINIMUM: u8 = 55;
}

/// Quality gate constants
pub mod quality {
    /// Minimum score for a billable generation
    pub const CHARGE_THRESHOLD: u8 = 50;

    /// Single-image size ceiling (bytes)
    pub const MAX_SINGLE_IMAGE_BYTES: usize = 5 * 1024 * 1024;

    /// Question count deviation ratio above which an error is raised
    pub const LARGE_DEVIATION_RATIO: f64 = 0.5;

    /// Score penalties per issue kind
    pub mod penalty {
        pub const HTML_STRUCTURE: u8 = 60;
        pub const QUESTION_COUNT_LARGE: u8 = 25;
        pub const QUESTION_COUNT_SMALL: u8 = 10;
        pub const MISSING_ANSWER_KEY: u8 = 20;
        pub const PRINT_FRIENDLY: u8 = 5;
        pub const IMAGE_COUNT: u8 = 10;
        pub const IMAGE_SIZE: u8 = 10;
        pub const PLACEHOLDER_IMAGES: u8 = 10;
        pub const MATH_ERROR: u8 = 10;
    }
}

/// Network constants
pub mod network {
    /// Default LLM request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}
