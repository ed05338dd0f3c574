//! Quality Gate
//!
//! Scores a rendered document 0-100 after assembly. The score decides
//! whether a generation is billable; failures never raise.

mod math;

pub use math::{GradeIssue, MathIssue, Operator, validate_grade_appropriateness, validate_math_content};

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::constants::quality::{
    CHARGE_THRESHOLD, LARGE_DEVIATION_RATIO, MAX_SINGLE_IMAGE_BYTES, penalty,
};
use crate::types::{ImageResult, Plan, QualityRequirements, VisualSettings};
use crate::validation::IssueSeverity;

/// Math errors stop costing points past this many
const MAX_MATH_PENALTIES: usize = 2;

static DARK_BACKGROUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)background(?:-color)?\s*:\s*(?:#000\b|#000000\b|#111\b|#111111\b|#222\b|#222222\b|black\b|rgb\(\s*0\s*,\s*0\s*,\s*0\s*\))",
    )
    .expect("background pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCategory {
    HtmlStructure,
    QuestionCount,
    AnswerKey,
    PrintFriendly,
    ImageCount,
    ImageSize,
    PlaceholderImages,
    MathAccuracy,
}

impl QualityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HtmlStructure => "html_structure",
            Self::QuestionCount => "question_count",
            Self::AnswerKey => "answer_key",
            Self::PrintFriendly => "print_friendly",
            Self::ImageCount => "image_count",
            Self::ImageSize => "image_size",
            Self::PlaceholderImages => "placeholder_images",
            Self::MathAccuracy => "math_accuracy",
        }
    }
}

impl fmt::Display for QualityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityIssue {
    pub category: QualityCategory,
    pub severity: IssueSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityResult {
    pub passed: bool,
    pub score: u8,
    pub issues: Vec<QualityIssue>,
    pub should_charge: bool,
}

impl QualityResult {
    pub fn has_category(&self, category: QualityCategory) -> bool {
        self.issues.iter().any(|i| i.category == category)
    }
}

struct Scorer {
    score: u8,
    issues: Vec<QualityIssue>,
    hard_failure: bool,
}

impl Scorer {
    fn new() -> Self {
        Self {
            score: 100,
            issues: Vec::new(),
            hard_failure: false,
        }
    }

    fn error(&mut self, category: QualityCategory, penalty: u8, message: impl Into<String>) {
        self.push(category, IssueSeverity::Error, penalty, message.into());
    }

    fn warning(&mut self, category: QualityCategory, penalty: u8, message: impl Into<String>) {
        self.push(category, IssueSeverity::Warning, penalty, message.into());
    }

    fn push(&mut self, category: QualityCategory, severity: IssueSeverity, penalty: u8, message: String) {
        self.score = self.score.saturating_sub(penalty);
        self.issues.push(QualityIssue {
            category,
            severity,
            message,
        });
    }

    /// Only hard failures fail the gate; charging additionally needs the score
    fn finish(self) -> QualityResult {
        let passed = !self.hard_failure;
        QualityResult {
            passed,
            score: self.score,
            issues: self.issues,
            should_charge: passed && self.score >= CHARGE_THRESHOLD,
        }
    }
}

/// Score a rendered worksheet against the caller's requirements
pub fn run_quality_gate(
    html: &str,
    plan: &Plan,
    requirements: &QualityRequirements,
    answer_key_html: &str,
    images: Option<&[ImageResult]>,
    visual_settings: Option<&VisualSettings>,
) -> QualityResult {
    let mut scorer = Scorer::new();

    check_structure(&mut scorer, html);
    check_question_count(&mut scorer, html, plan, requirements);

    if requirements.require_answer_key && answer_key_html.trim().is_empty() {
        scorer.error(
            QualityCategory::AnswerKey,
            penalty::MISSING_ANSWER_KEY,
            "Answer key is required but missing",
        );
    }

    if requirements.require_print_friendly {
        check_print_friendly(&mut scorer, html);
    }

    if let Some(settings) = visual_settings.filter(|v| v.enabled) {
        check_images(&mut scorer, plan, requirements, settings, images.unwrap_or_default());
    }

    if plan.metadata.subject.to_lowercase().contains("math") {
        for issue in validate_math_content(html).into_iter().take(MAX_MATH_PENALTIES) {
            scorer.warning(QualityCategory::MathAccuracy, penalty::MATH_ERROR, issue.message);
        }
    }

    scorer.finish()
}

fn check_structure(scorer: &mut Scorer, html: &str) {
    let lower = html.to_lowercase();
    let missing: Vec<&str> = [("<!doctype html", "doctype"), ("<head", "head"), ("<body", "body")]
        .into_iter()
        .filter(|(marker, _)| !lower.contains(marker))
        .map(|(_, name)| name)
        .collect();

    if !missing.is_empty() {
        scorer.hard_failure = true;
        scorer.error(
            QualityCategory::HtmlStructure,
            penalty::HTML_STRUCTURE,
            format!("Document is missing required structure: {}", missing.join(", ")),
        );
    }
}

fn check_question_count(
    scorer: &mut Scorer,
    html: &str,
    plan: &Plan,
    requirements: &QualityRequirements,
) {
    let Some(expected) = requirements.expected_question_count.filter(|n| *n > 0) else {
        return;
    };
    let rendered = html.matches("class=\"question\"").count();
    let actual = if rendered > 0 { rendered } else { plan.question_count() };
    if actual == expected {
        return;
    }

    let deviation = actual.abs_diff(expected) as f64 / expected as f64;
    let message = format!("Expected {} questions, found {}", expected, actual);
    if deviation > LARGE_DEVIATION_RATIO {
        scorer.error(QualityCategory::QuestionCount, penalty::QUESTION_COUNT_LARGE, message);
    } else {
        scorer.warning(QualityCategory::QuestionCount, penalty::QUESTION_COUNT_SMALL, message);
    }
}

fn check_print_friendly(scorer: &mut Scorer, html: &str) {
    let lower = html.to_lowercase();
    if !lower.contains("<style") {
        scorer.warning(
            QualityCategory::PrintFriendly,
            penalty::PRINT_FRIENDLY,
            "No stylesheet; printed layout is uncontrolled",
        );
    }
    if DARK_BACKGROUND_RE.is_match(html) {
        scorer.warning(
            QualityCategory::PrintFriendly,
            penalty::PRINT_FRIENDLY,
            "Dark background wastes ink when printed",
        );
    }
    if lower.contains("<script") {
        scorer.warning(
            QualityCategory::PrintFriendly,
            penalty::PRINT_FRIENDLY,
            "Document contains scripts",
        );
    }
}

fn check_images(
    scorer: &mut Scorer,
    plan: &Plan,
    requirements: &QualityRequirements,
    settings: &VisualSettings,
    images: &[ImageResult],
) {
    let expected = requirements
        .expected_image_count
        .unwrap_or_else(|| plan.visual_placements.len());
    let real: Vec<&ImageResult> = images.iter().filter(|i| !i.is_placeholder()).collect();
    let placeholders = images.len() - real.len();

    if expected > 0 && real.len() * 2 < expected {
        scorer.warning(
            QualityCategory::ImageCount,
            penalty::IMAGE_COUNT,
            format!(
                "Only {} of {} expected images for {} richness",
                real.len(),
                expected,
                requirements.richness.unwrap_or(settings.richness)
            ),
        );
    }

    let oversized = real
        .iter()
        .filter(|i| i.approx_bytes() > MAX_SINGLE_IMAGE_BYTES)
        .count();
    if oversized > 0 {
        scorer.warning(
            QualityCategory::ImageSize,
            penalty::IMAGE_SIZE,
            format!("{} image(s) exceed {} MB", oversized, MAX_SINGLE_IMAGE_BYTES / (1024 * 1024)),
        );
    }

    if placeholders > 0 {
        scorer.warning(
            QualityCategory::PlaceholderImages,
            penalty::PLACEHOLDER_IMAGES,
            format!("{} image(s) could not be generated and use placeholders", placeholders),
        );
    }
}

/// One-line verdict for the billing flow and the user
pub fn get_quality_summary(result: &QualityResult) -> String {
    if result.should_charge {
        return format!("Quality check passed (score: {}/100)", result.score);
    }
    let messages: Vec<&str> = result.issues.iter().map(|i| i.message.as_str()).collect();
    if messages.is_empty() {
        format!("Quality check failed (score: {}/100)", result.score)
    } else {
        format!(
            "Quality check failed (score: {}/100): {}",
            result.score,
            messages.join("; ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::create_placeholder;
    use crate::render::tests::image;
    use crate::render::{AssembleOptions, assemble_all};
    use crate::types::{PlacementSize, Richness};
    use crate::validation::tests::{item, plan_with};

    fn five_question_doc() -> (Plan, String, String) {
        let plan = plan_with((1..=5).map(|n| item(&format!("q{}", n), "yes")).collect());
        let docs = assemble_all(
            &plan,
            &AssembleOptions {
                include_answer_key: true,
                include_lesson_plan: false,
                images: Vec::new(),
            },
        );
        (plan, docs.worksheet_html, docs.answer_key_html)
    }

    fn reqs(expected: usize) -> QualityRequirements {
        QualityRequirements {
            expected_question_count: Some(expected),
            require_answer_key: true,
            require_print_friendly: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_well_formed_document_passes() {
        let (plan, html, key) = five_question_doc();
        let result = run_quality_gate(&html, &plan, &reqs(5), &key, None, None);

        assert!(result.passed, "{:?}", result.issues);
        assert!(result.score >= 50);
        assert!(result.should_charge);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_empty_html_fails_hard() {
        let plan = plan_with(vec![item("q1", "4")]);
        let result = run_quality_gate("", &plan, &reqs(5), "", None, None);

        assert!(!result.passed);
        assert!(result.score < 50);
        assert!(!result.should_charge);
        assert!(result.has_category(QualityCategory::HtmlStructure));
    }

    #[test]
    fn test_missing_answer_key() {
        let (plan, html, _) = five_question_doc();
        let result = run_quality_gate(&html, &plan, &reqs(5), "  ", None, None);

        assert!(result.passed);
        assert!(result.should_charge);
        assert!(result.has_category(QualityCategory::AnswerKey));
        assert_eq!(result.score, 100 - penalty::MISSING_ANSWER_KEY);
    }

    #[test]
    fn test_low_score_passes_but_is_not_charged() {
        let plan = plan_with((1..=5).map(|n| item(&format!("q{}", n), "yes")).collect());
        let html = "<!DOCTYPE html><html><head></head><body style=\"background: #000\"><script>x()</script></body></html>";
        let result = run_quality_gate(html, &plan, &reqs(20), "", None, None);

        assert_eq!(
            result.score,
            100 - penalty::QUESTION_COUNT_LARGE
                - penalty::MISSING_ANSWER_KEY
                - 3 * penalty::PRINT_FRIENDLY
        );
        assert!(result.passed);
        assert!(!result.should_charge);
        assert!(get_quality_summary(&result).starts_with("Quality check failed"));
    }

    #[test]
    fn test_never_charged_without_passing() {
        let (plan, html, key) = five_question_doc();
        let cases = [
            run_quality_gate(&html, &plan, &reqs(5), &key, None, None),
            run_quality_gate(&html, &plan, &reqs(20), "", None, None),
            run_quality_gate("", &plan, &reqs(5), &key, None, None),
            run_quality_gate("<p>no document</p>", &plan, &reqs(5), &key, None, None),
        ];
        for result in &cases {
            assert!(!result.should_charge || result.passed, "{:?}", result);
            if result.score < CHARGE_THRESHOLD {
                assert!(!result.should_charge);
            }
        }
    }

    #[test]
    fn test_question_count_deviation() {
        let (plan, html, key) = five_question_doc();

        let small = run_quality_gate(&html, &plan, &reqs(6), &key, None, None);
        assert!(small.passed);
        assert_eq!(small.issues[0].severity, IssueSeverity::Warning);

        let large = run_quality_gate(&html, &plan, &reqs(20), &key, None, None);
        assert!(large.passed);
        assert!(large.should_charge);
        assert_eq!(large.score, 100 - penalty::QUESTION_COUNT_LARGE);
        assert_eq!(large.issues[0].severity, IssueSeverity::Error);
        assert_eq!(large.issues[0].category, QualityCategory::QuestionCount);
    }

    #[test]
    fn test_print_friendly_heuristics() {
        let (plan, _, key) = five_question_doc();
        let html = "<!DOCTYPE html><html><head></head><body style=\"background: #000\"><script>x()</script></body></html>";
        let req = QualityRequirements {
            require_print_friendly: true,
            ..Default::default()
        };
        let result = run_quality_gate(html, &plan, &req, &key, None, None);

        let print_issues = result
            .issues
            .iter()
            .filter(|i| i.category == QualityCategory::PrintFriendly)
            .count();
        assert_eq!(print_issues, 3);
        assert!(result.passed);
    }

    #[test]
    fn test_placeholders_never_count_as_oversized() {
        let (mut plan, html, key) = five_question_doc();
        plan.visual_placements = Vec::new();
        let mut placeholder = create_placeholder("a map", &PlacementSize::Wide, "q1");
        // Pad the payload well past the single-image ceiling
        placeholder.base64_data.push_str(&"A".repeat(MAX_SINGLE_IMAGE_BYTES * 2));
        let images = vec![placeholder, image(Some("q2"), "AAAA")];
        let settings = VisualSettings::default();
        let req = QualityRequirements {
            expected_image_count: Some(2),
            ..reqs(5)
        };

        let result = run_quality_gate(&html, &plan, &req, &key, Some(images.as_slice()), Some(&settings));
        assert!(!result.has_category(QualityCategory::ImageSize));
        assert!(result.has_category(QualityCategory::PlaceholderImages));
        assert!(!result.has_category(QualityCategory::ImageCount));
    }

    #[test]
    fn test_too_few_images() {
        let (plan, html, key) = five_question_doc();
        let settings = VisualSettings {
            richness: Richness::Rich,
            ..Default::default()
        };
        let req = QualityRequirements {
            expected_image_count: Some(6),
            ..reqs(5)
        };
        let images = vec![image(Some("q1"), "AAAA")];

        let result = run_quality_gate(&html, &plan, &req, &key, Some(images.as_slice()), Some(&settings));
        assert!(result.has_category(QualityCategory::ImageCount));
        assert!(result.passed);
    }

    #[test]
    fn test_images_ignored_when_visuals_disabled() {
        let (plan, html, key) = five_question_doc();
        let settings = VisualSettings {
            enabled: false,
            ..Default::default()
        };
        let req = QualityRequirements {
            expected_image_count: Some(6),
            ..reqs(5)
        };
        let result = run_quality_gate(&html, &plan, &req, &key, Some(&[]), Some(&settings));
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_math_errors_cost_points() {
        let (mut plan, _, key) = five_question_doc();
        plan.metadata.subject = "Math".to_string();
        let html = format!(
            "<!DOCTYPE html><html><head><style></style></head><body>{}</body></html>",
            "<div class=\"question\">3 + 4 = 8</div>".repeat(5)
        );
        let result = run_quality_gate(&html, &plan, &reqs(5), &key, None, None);

        let math = result
            .issues
            .iter()
            .filter(|i| i.category == QualityCategory::MathAccuracy)
            .count();
        assert_eq!(math, MAX_MATH_PENALTIES);
        assert!(result.passed);
    }

    #[test]
    fn test_summary_text() {
        let (plan, html, key) = five_question_doc();
        let ok = run_quality_gate(&html, &plan, &reqs(5), &key, None, None);
        assert_eq!(get_quality_summary(&ok), "Quality check passed (score: 100/100)");

        let bad = run_quality_gate("", &plan, &reqs(5), "", None, None);
        let summary = get_quality_summary(&bad);
        assert!(summary.starts_with("Quality check failed"));
        assert!(summary.contains("missing required structure"));
    }
}
