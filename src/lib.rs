//! LessonForge - Printable Teaching Documents from a Prompt
//!
//! Turns a short request ("grade 3 fractions, 10 questions") into a
//! worksheet, answer key, and optional lesson plan as self-contained HTML
//! with embedded images.
//!
//! ## Pipeline
//!
//! 1. **Plan**: one model call produces a structured plan; a deterministic
//!    fallback plan covers any non-fatal failure
//! 2. **Validate/Repair**: rule checks with a single model repair attempt
//! 3. **Images**: cached, retried, style-degrading generation with SVG
//!    placeholders as the floor
//! 4. **Compress**: re-encode to size and drop low-priority images to fit
//!    the richness budget
//! 5. **Assemble**: print-friendly HTML with inline CSS
//! 6. **Quality Gate**: 0-100 score that decides whether the run is billed
//!
//! ## Quick Start
//!
//! ```ignore
//! use lessonforge::{ConfigLoader, ForgeContext, GenerationPipeline, GenerationRequest};
//! use lessonforge::types::RequestContext;
//!
//! let forge = ForgeContext::from_config(ConfigLoader::load()?)?;
//! let request = GenerationRequest::new(RequestContext::new("Fractions", "3", "math"));
//! let outcome = GenerationPipeline::new(&forge).run(&request).await?;
//! println!("{}", outcome.documents.worksheet_html);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: model and image providers, retry policy, JSON decoding, metrics
//! - [`planner`]: plan prompt, parsing, fallback plan
//! - [`validation`]: plan checks and model-assisted repair
//! - [`images`]: cache, generator, placeholders, compressor
//! - [`render`]: HTML assembly
//! - [`quality`]: quality gate and math checks
//! - [`pipeline`]: end-to-end orchestration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod images;
pub mod pipeline;
pub mod planner;
pub mod quality;
pub mod render;
pub mod types;
pub mod validation;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};

pub use types::error::{ErrorCategory, ForgeError, Result};

pub use types::{Plan, RequestContext, Richness};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{
    ArtifactSink, BillingReporter, DirectorySink, ForgeContext, GenerationOutcome,
    GenerationPipeline, GenerationRequest, GenerationUsage,
};

pub use planner::{Planner, create_fallback_plan};

pub use validation::{PlanRepairer, PlanValidator, ValidationResult};

pub use images::{ImageCache, ImageGenerator, compress_images, create_placeholder};

pub use render::{AssembledDocuments, assemble_all};

pub use quality::{
    QualityResult, get_quality_summary, run_quality_gate, validate_grade_appropriateness,
    validate_math_content,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    ImageProvider, LlmProvider, LlmResponse, MetricsCollector, RetryPolicy, SharedMetrics,
    with_timeout,
};
