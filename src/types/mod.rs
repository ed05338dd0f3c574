pub mod error;
pub mod image;
pub mod plan;
pub mod request;
pub mod utils;

pub use error::{ErrorCategory, ErrorClassifier, ForgeError, LlmError, Result};
pub use image::{
    CompressedImage, GeneratedImage, ImageContext, ImageRequest, ImageResult, ImageStyle,
    PLACEHOLDER_PREFIX,
};
pub use plan::{
    INLINE_VISUAL_KEYS, Item, ItemType, LessonPlanDetails, LessonStep, Plan, PlanHeader,
    PlanMetadata, PlanStructure, PlacementPurpose, PlacementSize, Section, VisualPlacement,
};
pub use request::{
    DocumentKind, GenerationOptions, QualityRequirements, RequestContext, Richness,
    ValidationRequirements, VisualSettings,
};
