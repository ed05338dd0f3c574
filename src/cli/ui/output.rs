use console::style;

use crate::images::BatchProgress;
use crate::quality::QualityResult;
use crate::validation::{IssueSeverity, ValidationResult};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// One line per resolved image
    pub fn image_progress(&self, progress: &BatchProgress) {
        println!(
            "  {} image {}/{} ({}) {} generated, {} cached, {} failed",
            style("→").cyan(),
            progress.completed,
            progress.total,
            progress.current_placement,
            progress.stats.generated,
            progress.stats.cached,
            progress.stats.failed
        );
    }

    pub fn validation(&self, result: &ValidationResult) {
        if result.issues.is_empty() {
            self.success("Plan is valid");
            return;
        }
        for issue in &result.issues {
            let line = format!("{}: {}", issue.field, issue.message);
            match issue.severity {
                IssueSeverity::Error => self.error(&line),
                IssueSeverity::Warning => self.warning(&line),
            }
        }
        let summary = format!(
            "{} error(s), {} warning(s); auto-repairable: {}",
            result.error_count(),
            result.warning_count(),
            if result.auto_repairable { "yes" } else { "no" }
        );
        if result.valid {
            self.success(&summary);
        } else {
            self.error(&summary);
        }
    }

    pub fn quality(&self, result: &QualityResult) {
        let score = format!("Quality score: {}/100", result.score);
        if result.passed {
            self.success(&score);
        } else {
            self.warning(&score);
        }
        for issue in &result.issues {
            let line = format!("[{}] {}", issue.category, issue.message);
            match issue.severity {
                IssueSeverity::Error => self.error(&line),
                IssueSeverity::Warning => self.warning(&line),
            }
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
