//! Image pipeline: cache, resilient generation, placeholders, compression.

pub mod cache;
pub mod compressor;
pub mod generator;
pub mod placeholder;

pub use cache::{CacheEntry, CacheStats, ImageCache};
pub use compressor::{
    OutputSizeReport, compress_image, compress_images, quality_for_count, reduce_to_fit_threshold,
    total_bytes, validate_output_size,
};
pub use generator::{
    BatchOutput, BatchProgress, BatchStats, ImageGenerator, ImageOutcome, ProgressCallback,
    ResilienceOptions,
};
pub use placeholder::{PLACEHOLDER_MEDIA_TYPE, create_placeholder};
