//! Request and Requirement Types
//!
//! What the caller asks for, and the thresholds each stage checks against.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::image::ImageStyle;

/// Caller-selected visual density tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Richness {
    Minimal,
    #[default]
    Standard,
    Rich,
}

impl Richness {
    /// Total compressed-byte ceiling for all images in one document
    pub fn max_total_bytes(&self) -> usize {
        match self {
            Self::Minimal | Self::Standard => 5 * 1024 * 1024,
            Self::Rich => 12 * 1024 * 1024,
        }
    }

    /// Number of images a plan at this tier is expected to carry
    pub fn expected_image_count(&self) -> usize {
        match self {
            Self::Minimal => 1,
            Self::Standard => 3,
            Self::Rich => 6,
        }
    }
}

impl fmt::Display for Richness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minimal => write!(f, "minimal"),
            Self::Standard => write!(f, "standard"),
            Self::Rich => write!(f, "rich"),
        }
    }
}

impl std::str::FromStr for Richness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "standard" => Ok(Self::Standard),
            "rich" => Ok(Self::Rich),
            _ => Err(format!(
                "Unknown richness: {}. Valid values: minimal, standard, rich",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    pub enabled: bool,
    pub richness: Richness,
    pub style: ImageStyle,
    pub theme: Option<String>,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            richness: Richness::Standard,
            style: ImageStyle::Educational,
            theme: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    #[default]
    Worksheet,
    LessonPlan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub kind: DocumentKind,
    pub question_count: usize,
    pub question_types: Vec<String>,
    pub difficulty: Option<String>,
    pub include_answer_key: bool,
    pub include_lesson_plan: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            kind: DocumentKind::Worksheet,
            question_count: 10,
            question_types: vec!["multiple_choice".to_string(), "short_answer".to_string()],
            difficulty: None,
            include_answer_key: true,
            include_lesson_plan: false,
        }
    }
}

/// Everything the planner needs to build one plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    pub prompt: String,
    pub grade: String,
    pub subject: String,
    pub topic: Option<String>,
    pub options: GenerationOptions,
    pub visual_settings: VisualSettings,
    /// Pre-extracted text from an inspiration source
    pub inspiration: Option<String>,
}

impl RequestContext {
    pub fn new(
        prompt: impl Into<String>,
        grade: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            grade: grade.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }

    /// Topic, or the prompt itself when no topic was given
    pub fn topic_or_prompt(&self) -> &str {
        self.topic
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(self.prompt.as_str())
    }
}

/// Thresholds for plan validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequirements {
    pub min_questions: usize,
    pub max_questions: usize,
    pub require_answers: bool,
}

impl Default for ValidationRequirements {
    fn default() -> Self {
        Self {
            min_questions: 1,
            max_questions: 50,
            require_answers: true,
        }
    }
}

impl ValidationRequirements {
    /// Requirements centered on a requested question count
    pub fn for_question_count(count: usize, require_answers: bool) -> Self {
        Self {
            min_questions: count.saturating_sub(count / 5).max(1),
            max_questions: count + count / 5 + 2,
            require_answers,
        }
    }
}

/// Expectations the quality gate scores against
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityRequirements {
    pub expected_question_count: Option<usize>,
    pub require_answer_key: bool,
    pub require_print_friendly: bool,
    pub expected_image_count: Option<usize>,
    pub richness: Option<Richness>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_richness_budgets() {
        assert_eq!(Richness::Minimal.max_total_bytes(), 5 * 1024 * 1024);
        assert_eq!(Richness::Standard.max_total_bytes(), 5 * 1024 * 1024);
        assert_eq!(Richness::Rich.max_total_bytes(), 12 * 1024 * 1024);
    }

    #[test]
    fn test_requirements_for_question_count() {
        let req = ValidationRequirements::for_question_count(10, true);
        assert_eq!(req.min_questions, 8);
        assert_eq!(req.max_questions, 14);

        let tiny = ValidationRequirements::for_question_count(1, false);
        assert_eq!(tiny.min_questions, 1);
    }

    #[test]
    fn test_topic_falls_back_to_prompt() {
        let mut ctx = RequestContext::new("fractions practice", "3", "math");
        assert_eq!(ctx.topic_or_prompt(), "fractions practice");
        ctx.topic = Some("Equivalent fractions".into());
        assert_eq!(ctx.topic_or_prompt(), "Equivalent fractions");
    }
}
