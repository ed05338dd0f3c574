//! Generate Command
//!
//! Plan, illustrate, assemble, and quality-check one worksheet.
//!
//! Usage:
//!   lessonforge generate -p "fractions practice" --grade 3 --subject math
//!   lessonforge generate -p "water cycle" -g 5 -s science --richness rich -o out/

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Runtime;

use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::images::BatchProgress;
use crate::pipeline::{
    ArtifactSink, DirectorySink, ForgeContext, GenerationOutcome, GenerationPipeline,
    GenerationRequest,
};
use crate::quality::get_quality_summary;
use crate::types::{ImageStyle, RequestContext, Result, Richness};

/// Arguments collected by the CLI layer
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub prompt: String,
    pub grade: String,
    pub subject: String,
    pub topic: Option<String>,
    pub questions: Option<usize>,
    pub richness: Option<Richness>,
    pub style: Option<ImageStyle>,
    pub theme: Option<String>,
    pub no_images: bool,
    pub no_answer_key: bool,
    pub no_lesson_plan: bool,
    pub inspiration: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
}

pub fn run(options: GenerateOptions) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(provider) = &options.provider {
        config.llm.provider = provider.clone();
    }
    if let Some(model) = &options.model {
        config.llm.model = Some(model.clone());
    }
    if options.no_images {
        config.images.enabled = false;
    }
    let output_dir = options
        .output
        .clone()
        .unwrap_or_else(|| config.output.output_dir.clone());

    let request = GenerationRequest::new(build_context(&options, config.images.enabled)?);
    let forge = ForgeContext::from_config(config)?;

    let out = Arc::new(Output::new());
    out.header(&format!(
        "Generating grade {} {} worksheet",
        request.context.grade, request.context.subject
    ));

    let rt = Runtime::new()?;
    let progress_out = out.clone();
    let outcome = rt.block_on(async {
        GenerationPipeline::new(&forge)
            .with_progress(Box::new(move |p: &BatchProgress| {
                progress_out.image_progress(p)
            }))
            .run(&request)
            .await
    })?;

    let sink = DirectorySink::new(&output_dir);
    let paths = sink.save_documents(&outcome.documents)?;

    print_generation_result(&out, &outcome);
    out.section("Files");
    for path in &paths {
        out.success(&path.display().to_string());
    }
    println!("\n{}", outcome.metrics.display());

    Ok(())
}

fn build_context(options: &GenerateOptions, images_enabled: bool) -> Result<RequestContext> {
    let mut ctx = RequestContext::new(&options.prompt, &options.grade, &options.subject);
    ctx.topic = options.topic.clone();
    if let Some(count) = options.questions {
        ctx.options.question_count = count;
    }
    ctx.options.include_answer_key = !options.no_answer_key;
    ctx.options.include_lesson_plan = !options.no_lesson_plan;
    ctx.visual_settings.enabled = images_enabled;
    if let Some(richness) = options.richness {
        ctx.visual_settings.richness = richness;
    }
    if let Some(style) = options.style {
        ctx.visual_settings.style = style;
    }
    ctx.visual_settings.theme = options.theme.clone();
    if let Some(path) = &options.inspiration {
        ctx.inspiration = Some(std::fs::read_to_string(path)?);
    }
    Ok(ctx)
}

fn print_generation_result(out: &Output, outcome: &GenerationOutcome) {
    out.section("Plan");
    println!("  Title:          {}", outcome.plan.metadata.title);
    println!("  Questions:      {}", outcome.plan.question_count());
    println!("  Placements:     {}", outcome.plan.visual_placements.len());
    println!("  Images:         {}", outcome.images.len());
    if outcome.used_fallback_plan {
        out.warning("Planner failed; used the fallback plan");
    }
    if outcome.was_repaired {
        out.info("Plan was repaired before rendering");
    }

    out.section("Quality");
    out.quality(&outcome.quality);
    println!("  {}", get_quality_summary(&outcome.quality));
    println!(
        "  Tokens: {} in / {} out",
        outcome.usage.input_tokens, outcome.usage.output_tokens
    );
}
