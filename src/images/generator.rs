//! Image Generator
//!
//! Per-image resilience: cache lookup, timed attempts with bounded retry,
//! content-policy short-circuit, one simplified-style fallback, and finally
//! a placeholder. Batches run sequentially to respect provider rate limits.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::cache::ImageCache;
use super::placeholder::create_placeholder;
use crate::ai::{RetryPolicy, SharedImageProvider, attempt_with_policy};
use crate::constants::images::DEFAULT_BATCH_DELAY_MS;
use crate::types::{ForgeError, ImageContext, ImageRequest, ImageResult, ImageStyle, Result};

#[derive(Debug, Clone)]
pub struct ResilienceOptions {
    pub policy: RetryPolicy,
    /// Delay after each batch item that reached the provider
    pub batch_delay: Duration,
    /// Try once more in `simple_icons` style before giving up
    pub style_fallback: bool,
}

impl Default for ResilienceOptions {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
            style_fallback: true,
        }
    }
}

/// How a single image request was satisfied
#[derive(Debug, Clone)]
pub enum ImageOutcome {
    Cached(ImageResult),
    Generated(ImageResult),
    Placeholder(ImageResult),
}

impl ImageOutcome {
    pub fn image(&self) -> &ImageResult {
        match self {
            Self::Cached(image) | Self::Generated(image) | Self::Placeholder(image) => image,
        }
    }

    pub fn into_image(self) -> ImageResult {
        match self {
            Self::Cached(image) | Self::Generated(image) | Self::Placeholder(image) => image,
        }
    }

    pub fn is_cache_hit(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub generated: u32,
    pub cached: u32,
    pub failed: u32,
}

impl BatchStats {
    /// Placeholders only ever count as failed
    fn record(&mut self, outcome: &ImageOutcome) {
        if outcome.image().is_placeholder() {
            self.failed += 1;
        } else if outcome.is_cache_hit() {
            self.cached += 1;
        } else {
            self.generated += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub stats: BatchStats,
    pub current_placement: String,
}

pub type ProgressCallback = dyn Fn(&BatchProgress) + Send + Sync;

#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// One result per request, in request order
    pub images: Vec<ImageResult>,
    pub stats: BatchStats,
}

pub struct ImageGenerator {
    provider: SharedImageProvider,
    cache: Arc<ImageCache>,
}

impl ImageGenerator {
    pub fn new(provider: SharedImageProvider, cache: Arc<ImageCache>) -> Self {
        Self { provider, cache }
    }

    /// Resolve one request. Never fails: the worst case is a placeholder.
    #[instrument(skip_all, fields(placement = %request.placement_id))]
    pub async fn generate_image(
        &self,
        request: &ImageRequest,
        context: &ImageContext,
        options: &ResilienceOptions,
    ) -> ImageOutcome {
        let key = ImageCache::fingerprint(
            request.style,
            context,
            &request.size,
            &request.description,
        );

        if let Some(mut cached) = self.cache.get(&key) {
            debug!("Cache hit");
            cached.placement_id = Some(request.placement_id.clone());
            return ImageOutcome::Cached(cached);
        }

        let err = match self
            .attempt(request, request.style, &options.policy)
            .await
        {
            Ok(image) => {
                self.cache.insert(key, &image);
                return ImageOutcome::Generated(image);
            }
            Err(e) => e,
        };

        if self.provider.is_content_policy_error(&err) {
            warn!("Content policy rejection, using placeholder: {}", err);
            return self.placeholder(request);
        }
        if err.is_fatal() {
            warn!("Image provider unusable, using placeholder: {}", err);
            return self.placeholder(request);
        }

        if options.style_fallback && request.style != ImageStyle::SimpleIcons {
            info!("Retrying with simple_icons style after: {}", err);
            let once = RetryPolicy::once(options.policy.timeout);
            match self.attempt(request, ImageStyle::SimpleIcons, &once).await {
                Ok(image) => {
                    let fallback_key = ImageCache::fingerprint(
                        ImageStyle::SimpleIcons,
                        context,
                        &request.size,
                        &request.description,
                    );
                    // Stored under both styles so a repeat request skips the failing path
                    self.cache.insert(fallback_key, &image);
                    self.cache.insert(key, &image);
                    return ImageOutcome::Generated(image);
                }
                Err(e) => warn!("Style fallback failed: {}", e),
            }
        } else {
            warn!("Image generation failed: {}", err);
        }

        self.placeholder(request)
    }

    async fn attempt(
        &self,
        request: &ImageRequest,
        style: ImageStyle,
        policy: &RetryPolicy,
    ) -> Result<ImageResult> {
        let provider = &self.provider;
        let image = attempt_with_policy(
            policy,
            "image generation",
            |e: &ForgeError| !provider.is_content_policy_error(e) && !e.is_fatal(),
            || provider.generate_image(&request.prompt, &request.size, style),
        )
        .await?;
        Ok(ImageResult::from_generated(image, &request.placement_id))
    }

    fn placeholder(&self, request: &ImageRequest) -> ImageOutcome {
        ImageOutcome::Placeholder(create_placeholder(
            &request.description,
            &request.size,
            &request.placement_id,
        ))
    }

    /// Resolve requests one at a time, pausing after every item that was
    /// not served from cache.
    #[instrument(skip_all, fields(count = requests.len()))]
    pub async fn generate_batch_images(
        &self,
        requests: &[ImageRequest],
        context: &ImageContext,
        options: &ResilienceOptions,
        on_progress: Option<&ProgressCallback>,
    ) -> BatchOutput {
        let total = requests.len();
        let mut stats = BatchStats::default();
        let mut images = Vec::with_capacity(total);

        for (i, request) in requests.iter().enumerate() {
            let outcome = self.generate_image(request, context, options).await;
            stats.record(&outcome);
            let cache_hit = outcome.is_cache_hit();
            images.push(outcome.into_image());

            if let Some(callback) = on_progress {
                callback(&BatchProgress {
                    completed: i + 1,
                    total,
                    stats,
                    current_placement: request.placement_id.clone(),
                });
            }

            if !cache_hit && i + 1 < total && !options.batch_delay.is_zero() {
                tokio::time::sleep(options.batch_delay).await;
            }
        }

        info!(
            "Images: {} generated, {} cached, {} failed",
            stats.generated, stats.cached, stats.failed
        );
        BatchOutput { images, stats }
    }
}
