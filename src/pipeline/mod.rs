//! Generation Pipeline
//!
//! Stages, strictly in order per request:
//! 1. Plan: one model call, fallback plan on any non-fatal failure
//! 2. Validate/Repair: at most one repair call
//! 3. Images: sequential batch with cache and placeholders
//! 4. Compress: concurrent re-encode, then priority drops to fit the budget
//! 5. Assemble: pure HTML rendering
//! 6. Quality Gate: score and charge decision
//!
//! Only fatal errors (auth, unreachable provider, misconfiguration) escape.

mod billing;
mod sink;

pub use billing::{BillingReporter, GenerationUsage, LogBillingReporter};
pub use sink::{ANSWER_KEY_FILE, ArtifactSink, DirectorySink, LESSON_PLAN_FILE, WORKSHEET_FILE};

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use crate::ai::{
    MetricsSummary, RetryPolicy, SharedImageProvider, SharedMetrics, SharedProvider,
    create_image_provider, create_provider, create_shared_metrics,
};
use crate::config::Config;
use crate::images::{
    BatchStats, ImageCache, ImageGenerator, ProgressCallback, ResilienceOptions, compress_images,
    reduce_to_fit_threshold, validate_output_size,
};
use crate::planner::{Planner, create_fallback_plan};
use crate::quality::{QualityResult, run_quality_gate};
use crate::render::{AssembleOptions, AssembledDocuments, assemble_all};
use crate::types::{
    DocumentKind, ImageContext, ImageRequest, ImageResult, Plan, PlacementPurpose,
    QualityRequirements, RequestContext, Result, ValidationRequirements, VisualPlacement,
};
use crate::validation::{PlanRepairer, ValidationResult};

/// Process-wide clients and cache, built once and shared by every run
pub struct ForgeContext {
    pub provider: SharedProvider,
    pub image_provider: Option<SharedImageProvider>,
    pub cache: Arc<ImageCache>,
    pub config: Config,
}

impl ForgeContext {
    /// Resolve providers from configuration. Unknown provider names fail here.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let provider = create_provider(&config.llm.provider_config())?;
        let image_provider = if config.images.enabled {
            Some(create_image_provider(&config.images.provider_config())?)
        } else {
            None
        };
        Ok(Self::new(provider, image_provider, config))
    }

    pub fn new(
        provider: SharedProvider,
        image_provider: Option<SharedImageProvider>,
        config: Config,
    ) -> Self {
        let cache = Arc::new(ImageCache::new(config.cache.max_entries));
        Self {
            provider,
            image_provider,
            cache,
            config,
        }
    }
}

/// One generation request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub context: RequestContext,
    /// Override for the validator's thresholds
    pub validation: Option<ValidationRequirements>,
}

impl GenerationRequest {
    pub fn new(context: RequestContext) -> Self {
        Self {
            context,
            validation: None,
        }
    }

    pub fn validation_requirements(&self) -> ValidationRequirements {
        self.validation.clone().unwrap_or_else(|| {
            ValidationRequirements::for_question_count(self.context.options.question_count, true)
        })
    }

    pub fn wants_lesson_plan(&self) -> bool {
        self.context.options.include_lesson_plan
            || self.context.options.kind == DocumentKind::LessonPlan
    }

    fn visuals_enabled(&self) -> bool {
        self.context.visual_settings.enabled
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub plan: Plan,
    pub documents: AssembledDocuments,
    /// Images as embedded, after compression and budget drops
    pub images: Vec<ImageResult>,
    pub validation: ValidationResult,
    pub was_repaired: bool,
    pub used_fallback_plan: bool,
    pub quality: QualityResult,
    pub usage: GenerationUsage,
    /// Calls, tokens, and phase timings of this run only
    pub metrics: MetricsSummary,
}

pub struct GenerationPipeline<'a> {
    ctx: &'a ForgeContext,
    billing: Arc<dyn BillingReporter>,
    on_progress: Option<Box<ProgressCallback>>,
}

impl<'a> GenerationPipeline<'a> {
    pub fn new(ctx: &'a ForgeContext) -> Self {
        Self {
            ctx,
            billing: Arc::new(LogBillingReporter),
            on_progress: None,
        }
    }

    pub fn with_billing(mut self, billing: Arc<dyn BillingReporter>) -> Self {
        self.billing = billing;
        self
    }

    pub fn with_progress(mut self, callback: Box<ProgressCallback>) -> Self {
        self.on_progress = Some(callback);
        self
    }

    #[instrument(skip_all, fields(grade = %request.context.grade, subject = %request.context.subject))]
    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        let ctx = &request.context;
        let metrics = create_shared_metrics(uuid::Uuid::new_v4().to_string());
        info!("Generation started: {}", ctx.topic_or_prompt());

        // ===== PHASE 1: Plan =====
        let started = Instant::now();
        let (plan, used_fallback_plan) = self.plan(ctx, &metrics).await?;
        metrics.record_phase("plan", started.elapsed());

        // ===== PHASE 2: Validate / Repair =====
        let started = Instant::now();
        let repairer = PlanRepairer::new(self.ctx.provider.clone(), self.model_policy())
            .with_metrics(metrics.clone());
        let repaired = repairer
            .validate_and_repair(plan, &request.validation_requirements())
            .await?;
        metrics.record_phase("validate", started.elapsed());
        let plan = repaired.plan;

        // ===== PHASE 3: Images =====
        let started = Instant::now();
        let (raw_images, stats) = self.images(request, &plan).await;
        metrics.record_images(stats.generated, stats.cached, stats.failed);
        metrics.record_phase("images", started.elapsed());

        // ===== PHASE 4: Compress =====
        let started = Instant::now();
        let images = self.compress(request, &plan, raw_images).await;
        metrics.record_phase("compress", started.elapsed());

        // ===== PHASE 5: Assemble =====
        let started = Instant::now();
        let documents = assemble_all(
            &plan,
            &AssembleOptions {
                include_answer_key: ctx.options.include_answer_key,
                include_lesson_plan: request.wants_lesson_plan(),
                images: images.clone(),
            },
        );
        metrics.record_phase("assemble", started.elapsed());

        // ===== PHASE 6: Quality Gate =====
        let started = Instant::now();
        let requirements = QualityRequirements {
            expected_question_count: Some(ctx.options.question_count),
            require_answer_key: ctx.options.include_answer_key,
            require_print_friendly: true,
            expected_image_count: request
                .visuals_enabled()
                .then_some(plan.visual_placements.len()),
            richness: Some(ctx.visual_settings.richness),
        };
        let quality = run_quality_gate(
            &documents.worksheet_html,
            &plan,
            &requirements,
            &documents.answer_key_html,
            Some(images.as_slice()),
            Some(&ctx.visual_settings),
        );
        metrics.record_phase("quality", started.elapsed());

        let summary = metrics.summary();
        let usage = GenerationUsage::from_run(&summary, &stats);
        self.billing.report(&quality, &usage);
        info!(
            "Generation finished: score {}, charge {}",
            quality.score, quality.should_charge
        );

        Ok(GenerationOutcome {
            plan,
            documents,
            images,
            validation: repaired.validation,
            was_repaired: repaired.was_repaired,
            used_fallback_plan,
            quality,
            usage,
            metrics: summary,
        })
    }

    /// Single attempt bounded by the LLM timeout; failures fall back instead of retrying
    fn model_policy(&self) -> RetryPolicy {
        RetryPolicy::once(Duration::from_secs(self.ctx.config.llm.timeout_secs))
    }

    async fn plan(&self, ctx: &RequestContext, metrics: &SharedMetrics) -> Result<(Plan, bool)> {
        let planner = Planner::new(self.ctx.provider.clone(), self.model_policy())
            .with_metrics(metrics.clone());
        match planner.create_plan(ctx).await {
            Ok(plan) => Ok((plan, false)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Planner failed, using fallback plan: {}", e);
                Ok((create_fallback_plan(ctx), true))
            }
        }
    }

    async fn images(&self, request: &GenerationRequest, plan: &Plan) -> (Vec<ImageResult>, BatchStats) {
        let provider = match &self.ctx.image_provider {
            Some(provider) if request.visuals_enabled() && !plan.visual_placements.is_empty() => {
                provider.clone()
            }
            _ => return (Vec::new(), BatchStats::default()),
        };

        let ctx = &request.context;
        let settings = &ctx.visual_settings;
        let image_ctx = ImageContext {
            grade: ctx.grade.clone(),
            subject: ctx.subject.clone(),
            theme: settings.theme.clone(),
        };
        let requests: Vec<ImageRequest> = plan
            .visual_placements
            .iter()
            .map(|placement| ImageRequest {
                prompt: image_prompt(placement, &image_ctx),
                description: placement.description.clone(),
                style: settings.style,
                size: placement.size.clone(),
                placement_id: placement.after_item_id.clone(),
            })
            .collect();
        let options = ResilienceOptions {
            policy: self.ctx.config.images.retry_policy(),
            batch_delay: self.ctx.config.images.batch_delay(),
            style_fallback: true,
        };

        let generator = ImageGenerator::new(provider, self.ctx.cache.clone());
        let output = generator
            .generate_batch_images(&requests, &image_ctx, &options, self.on_progress.as_deref())
            .await;
        (output.images, output.stats)
    }

    async fn compress(
        &self,
        request: &GenerationRequest,
        plan: &Plan,
        images: Vec<ImageResult>,
    ) -> Vec<ImageResult> {
        if images.is_empty() {
            return images;
        }
        let richness = request.context.visual_settings.richness;
        let sizes: Vec<_> = plan.visual_placements.iter().map(|p| p.size.clone()).collect();
        let purposes: Vec<PlacementPurpose> = plan
            .visual_placements
            .iter()
            .map(|p| p.purpose.clone())
            .collect();

        let compressed = compress_images(images, &sizes).await;
        let report = validate_output_size(&compressed, richness);
        if let Some(recommendation) = &report.recommendation {
            info!("{}", recommendation);
        }
        let compressed = if report.valid {
            compressed
        } else {
            reduce_to_fit_threshold(compressed, &purposes, richness)
        };
        compressed.into_iter().map(|c| c.image).collect()
    }
}

/// Image prompt for one placement
pub fn image_prompt(placement: &VisualPlacement, ctx: &ImageContext) -> String {
    let kind = match placement.purpose {
        PlacementPurpose::Diagram => "Clear educational diagram",
        PlacementPurpose::Decorative => "Small decorative illustration",
        _ => "Educational illustration",
    };
    let mut prompt = format!(
        "{} for a grade {} {} worksheet: {}.",
        kind,
        ctx.grade,
        ctx.subject,
        placement.description.trim().trim_end_matches('.')
    );
    if let Some(theme) = ctx.theme.as_deref().filter(|t| !t.trim().is_empty()) {
        prompt.push_str(&format!(" Theme: {}.", theme.trim()));
    }
    prompt.push_str(" No text or letters in the image.");
    prompt
}
