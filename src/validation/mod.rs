//! Plan Validation
//!
//! Structural and semantic checks over a parsed [`Plan`]:
//! - Question count within the requested range
//! - Correct answers present
//! - Visual placements reference real items with known sizes and purposes
//! - Inline visual fields stripped from items
//!
//! Defects are reported as [`ValidationIssue`]s, never raised. The caller
//! decides whether to repair, proceed, or reject.

mod repair;

pub use repair::{PlanRepairer, RepairOutcome, repair_prompt};

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::constants::validation::MAX_AUTO_REPAIRABLE_ERRORS;
use crate::types::{INLINE_VISUAL_KEYS, Plan, ValidationRequirements};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Plan is unusable as-is
    Error,
    /// Plan is usable but degraded
    Warning,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Error => write!(f, "ERROR"),
            IssueSeverity::Warning => write!(f, "WARN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// Dotted path into the plan, e.g. `visualPlacements[0].afterItemId`
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.field, self.message)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub auto_repairable: bool,
}

impl ValidationResult {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let errors = issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
            .count();
        Self {
            valid: errors == 0,
            auto_repairable: errors <= MAX_AUTO_REPAIRABLE_ERRORS,
            issues,
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
            .count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
    }
}

pub struct PlanValidator;

impl PlanValidator {
    /// Run every check. Takes `&mut` because inline visual fields are
    /// stripped from items as they are reported.
    pub fn validate(plan: &mut Plan, requirements: &ValidationRequirements) -> ValidationResult {
        let mut issues = Vec::new();

        Self::check_question_count(plan, requirements, &mut issues);
        Self::check_items(plan, requirements, &mut issues);
        Self::check_placements(plan, &mut issues);
        Self::strip_inline_visuals(plan, &mut issues);

        ValidationResult::from_issues(issues)
    }

    fn check_question_count(
        plan: &Plan,
        requirements: &ValidationRequirements,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let count = plan.question_count();
        if count < requirements.min_questions {
            issues.push(ValidationIssue::error(
                "structure.sections",
                format!(
                    "Plan has {} questions, minimum is {}",
                    count, requirements.min_questions
                ),
            ));
        } else if count > requirements.max_questions {
            issues.push(ValidationIssue::warning(
                "structure.sections",
                format!(
                    "Plan has {} questions, maximum is {}",
                    count, requirements.max_questions
                ),
            ));
        }
    }

    fn check_items(
        plan: &Plan,
        requirements: &ValidationRequirements,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let mut seen = HashSet::new();
        for (si, section) in plan.structure.sections.iter().enumerate() {
            for (ii, item) in section.items.iter().enumerate() {
                let path = format!("structure.sections[{}].items[{}]", si, ii);

                if item.id.trim().is_empty() {
                    issues.push(ValidationIssue::error(
                        format!("{}.id", path),
                        "Item id is empty",
                    ));
                } else if !seen.insert(item.id.as_str()) {
                    issues.push(ValidationIssue::error(
                        format!("{}.id", path),
                        format!("Duplicate item id '{}'", item.id),
                    ));
                }

                if requirements.require_answers && item.correct_answer.trim().is_empty() {
                    issues.push(ValidationIssue::error(
                        format!("{}.correctAnswer", path),
                        format!("Item '{}' has no correct answer", item.id),
                    ));
                }
            }
        }
    }

    fn check_placements(plan: &Plan, issues: &mut Vec<ValidationIssue>) {
        let ids = plan.item_ids();
        for (i, placement) in plan.visual_placements.iter().enumerate() {
            let path = format!("visualPlacements[{}]", i);

            if !ids.contains(placement.after_item_id.as_str()) {
                issues.push(ValidationIssue::warning(
                    format!("{}.afterItemId", path),
                    format!("References unknown item '{}'", placement.after_item_id),
                ));
            }
            if !placement.size.is_recognized() {
                issues.push(ValidationIssue::warning(
                    format!("{}.size", path),
                    format!(
                        "Unknown size '{}', expected small, medium or wide",
                        placement.size
                    ),
                ));
            }
            if !placement.purpose.is_recognized() {
                issues.push(ValidationIssue::warning(
                    format!("{}.purpose", path),
                    format!("Unknown purpose '{}'", placement.purpose),
                ));
            }
            if placement.description.trim().is_empty() {
                issues.push(ValidationIssue::warning(
                    format!("{}.description", path),
                    "Placement has no description",
                ));
            }
        }
    }

    fn strip_inline_visuals(plan: &mut Plan, issues: &mut Vec<ValidationIssue>) {
        for (si, section) in plan.structure.sections.iter_mut().enumerate() {
            for (ii, item) in section.items.iter_mut().enumerate() {
                for key in INLINE_VISUAL_KEYS {
                    if item.extra.remove(key).is_some() {
                        issues.push(ValidationIssue::warning(
                            format!("structure.sections[{}].items[{}].{}", si, ii, key),
                            "Removed inline visual field; use visualPlacements",
                        ));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{
        Item, PlacementPurpose, PlacementSize, PlanHeader, PlanMetadata, PlanStructure, Section,
        VisualPlacement,
    };
    use serde_json::json;

    pub(crate) fn item(id: &str, answer: &str) -> Item {
        Item {
            id: id.to_string(),
            question_text: format!("Question {}", id),
            item_type: Default::default(),
            correct_answer: answer.to_string(),
            explanation: None,
            options: Vec::new(),
            points: None,
            extra: Default::default(),
        }
    }

    pub(crate) fn plan_with(items: Vec<Item>) -> Plan {
        Plan {
            version: "1.0".to_string(),
            metadata: PlanMetadata {
                title: "Test".to_string(),
                ..Default::default()
            },
            structure: PlanStructure {
                header: PlanHeader::default(),
                sections: vec![Section {
                    id: "s1".to_string(),
                    title: "Practice".to_string(),
                    instructions: None,
                    items,
                }],
            },
            visual_placements: Vec::new(),
            lesson_plan: None,
        }
    }

    fn reqs(min: usize, max: usize) -> ValidationRequirements {
        ValidationRequirements {
            min_questions: min,
            max_questions: max,
            require_answers: true,
        }
    }

    #[test]
    fn test_valid_plan() {
        let mut plan = plan_with(vec![item("q1", "4"), item("q2", "5")]);
        let result = PlanValidator::validate(&mut plan, &reqs(1, 5));
        assert!(result.valid);
        assert!(result.auto_repairable);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_question_count_bounds() {
        let mut plan = plan_with(vec![item("q1", "4")]);
        let result = PlanValidator::validate(&mut plan, &reqs(3, 5));
        assert!(!result.valid);
        assert_eq!(result.error_count(), 1);

        let mut plan = plan_with((1..=8).map(|n| item(&format!("q{n}"), "x")).collect());
        let result = PlanValidator::validate(&mut plan, &reqs(1, 5));
        assert!(result.valid, "above maximum is only a warning");
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_missing_answers_are_errors() {
        let mut plan = plan_with(vec![item("q1", ""), item("q2", "  ")]);
        let result = PlanValidator::validate(&mut plan, &reqs(1, 5));
        assert_eq!(result.error_count(), 2);
        assert_eq!(
            result.issues[0].field,
            "structure.sections[0].items[0].correctAnswer"
        );

        let mut plan = plan_with(vec![item("q1", "")]);
        let lenient = ValidationRequirements {
            require_answers: false,
            ..reqs(1, 5)
        };
        assert!(PlanValidator::validate(&mut plan, &lenient).valid);
    }

    #[test]
    fn test_duplicate_ids() {
        let mut plan = plan_with(vec![item("q1", "a"), item("q1", "b")]);
        let result = PlanValidator::validate(&mut plan, &reqs(1, 5));
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_placement_warnings() {
        let mut plan = plan_with(vec![item("q1", "4")]);
        plan.visual_placements = vec![
            VisualPlacement {
                after_item_id: "q9".to_string(),
                description: String::new(),
                purpose: PlacementPurpose::from("poster".to_string()),
                size: PlacementSize::from("huge".to_string()),
            },
            VisualPlacement {
                after_item_id: "q1".to_string(),
                description: "a diagram".to_string(),
                purpose: PlacementPurpose::Diagram,
                size: PlacementSize::Large,
            },
        ];
        let result = PlanValidator::validate(&mut plan, &reqs(1, 5));
        assert!(result.valid);
        assert_eq!(result.warning_count(), 4);
        assert!(result.issues.iter().all(|i| i.field.starts_with("visualPlacements[0]")));
    }

    #[test]
    fn test_inline_visuals_stripped() {
        let mut plan = plan_with(vec![item("q1", "4")]);
        let extra = &mut plan.structure.sections[0].items[0].extra;
        extra.insert("visualHint".to_string(), json!("apples"));
        extra.insert("imageDescription".to_string(), json!("more apples"));
        extra.insert("difficulty".to_string(), json!("easy"));

        let result = PlanValidator::validate(&mut plan, &reqs(1, 5));
        assert!(result.valid);
        assert_eq!(result.warning_count(), 2);

        let extra = &plan.structure.sections[0].items[0].extra;
        assert!(!extra.contains_key("visualHint"));
        assert!(!extra.contains_key("imageDescription"));
        assert!(extra.contains_key("difficulty"));
    }

    #[test]
    fn test_auto_repairable_threshold() {
        let mut plan = plan_with((1..=5).map(|n| item(&format!("q{n}"), "")).collect());
        let result = PlanValidator::validate(&mut plan, &reqs(1, 10));
        assert_eq!(result.error_count(), 5);
        assert!(result.auto_repairable);

        let mut plan = plan_with((1..=6).map(|n| item(&format!("q{n}"), "")).collect());
        let result = PlanValidator::validate(&mut plan, &reqs(1, 10));
        assert!(!result.auto_repairable);
    }
}
