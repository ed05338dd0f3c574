use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lessonforge::cli::commands::generate::GenerateOptions;
use lessonforge::types::{ImageStyle, Richness, ValidationRequirements};

#[derive(Parser)]
#[command(name = "lessonforge")]
#[command(
    version,
    about = "Printable worksheets, answer keys, and lesson plans from a short prompt"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a worksheet with answer key and optional lesson plan
    Generate {
        #[arg(long, short, help = "What the worksheet should cover")]
        prompt: String,
        #[arg(long, short, default_value = "3", help = "Grade level (K, 1-12)")]
        grade: String,
        #[arg(long, short, default_value = "math", help = "Subject")]
        subject: String,
        #[arg(long, help = "Topic, when narrower than the prompt")]
        topic: Option<String>,
        #[arg(long, short = 'n', help = "Number of questions")]
        questions: Option<usize>,
        #[arg(long, help = "Visual richness: minimal, standard, rich")]
        richness: Option<Richness>,
        #[arg(long, help = "Image style: educational, cartoon, realistic, watercolor, diagram")]
        style: Option<ImageStyle>,
        #[arg(long, help = "Visual theme, e.g. \"ocean animals\"")]
        theme: Option<String>,
        #[arg(long, help = "Skip image generation")]
        no_images: bool,
        #[arg(long, help = "Skip the answer key")]
        no_answer_key: bool,
        #[arg(long, help = "Skip the lesson plan")]
        no_lesson_plan: bool,
        #[arg(long, help = "Text file with reference material to draw from")]
        inspiration: Option<PathBuf>,
        #[arg(long, short, help = "Output directory")]
        output: Option<PathBuf>,
        #[arg(long, help = "LLM provider (openai, ollama)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
    },

    /// Check arithmetic in a rendered document
    CheckMath {
        #[arg(help = "HTML file to check")]
        path: PathBuf,
        #[arg(long, short, help = "Also check numbers and operators against this grade")]
        grade: Option<String>,
    },

    /// Validate a saved plan JSON file
    ValidatePlan {
        #[arg(help = "Plan JSON file")]
        path: PathBuf,
        #[arg(long, default_value = "1", help = "Minimum question count")]
        min: usize,
        #[arg(long, default_value = "50", help = "Maximum question count")]
        max: usize,
        #[arg(long, help = "Allow items without answers")]
        allow_missing_answers: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mLessonForge encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Generate {
            prompt,
            grade,
            subject,
            topic,
            questions,
            richness,
            style,
            theme,
            no_images,
            no_answer_key,
            no_lesson_plan,
            inspiration,
            output,
            provider,
            model,
        } => {
            lessonforge::cli::commands::generate::run(GenerateOptions {
                prompt,
                grade,
                subject,
                topic,
                questions,
                richness,
                style,
                theme,
                no_images,
                no_answer_key,
                no_lesson_plan,
                inspiration,
                output,
                provider,
                model,
            })?;
        }
        Commands::CheckMath { path, grade } => {
            let problems = lessonforge::cli::commands::check_math::run(&path, grade.as_deref())?;
            if problems > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::ValidatePlan {
            path,
            min,
            max,
            allow_missing_answers,
        } => {
            let requirements = ValidationRequirements {
                min_questions: min,
                max_questions: max,
                require_answers: !allow_missing_answers,
            };
            let result = lessonforge::cli::commands::validate_plan::run(&path, &requirements)?;
            if !result.valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                lessonforge::cli::commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                lessonforge::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    lessonforge::cli::commands::config::init_global(force)?;
                } else {
                    lessonforge::cli::commands::config::init_project()?;
                }
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
