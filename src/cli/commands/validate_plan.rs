//! Validate Plan Command
//!
//! Check a saved plan JSON file without calling any model.
//!
//! Usage:
//!   lessonforge validate-plan plan.json --min 5 --max 12

use std::path::Path;

use crate::cli::Output;
use crate::planner::decode_plan;
use crate::types::{Result, ValidationRequirements};
use crate::validation::{PlanValidator, ValidationResult};

/// Returns the validator's verdict for the plan at `path`
pub fn run(path: &Path, requirements: &ValidationRequirements) -> Result<ValidationResult> {
    let raw = std::fs::read_to_string(path)?;
    let mut plan = decode_plan(&raw)?;
    let result = PlanValidator::validate(&mut plan, requirements);

    let out = Output::new();
    out.header(&format!("Plan: {}", plan.metadata.title));
    println!(
        "  {} questions in {} sections, {} placements",
        plan.question_count(),
        plan.structure.sections.len(),
        plan.visual_placements.len()
    );
    out.validation(&result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_plan(dir: &TempDir, json: &str) -> std::path::PathBuf {
        let path = dir.path().join("plan.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    const PLAN: &str = r#"{
        "version": 1,
        "metadata": {"title": "Adding"},
        "structure": {
            "header": {"title": "Adding"},
            "sections": [{"id": "s1", "title": "Practice", "items": [
                {"id": "q1", "type": "short_answer", "questionText": "2 + 2?", "correctAnswer": "4"},
                {"id": "q2", "type": "short_answer", "questionText": "3 + 3?", "correctAnswer": "6"}
            ]}]
        }
    }"#;

    #[test]
    fn test_valid_plan_file() {
        let dir = TempDir::new().unwrap();
        let path = write_plan(&dir, PLAN);
        let result = run(&path, &ValidationRequirements::default()).unwrap();
        assert!(result.valid);
    }

    #[test]
    fn test_question_count_out_of_range() {
        let dir = TempDir::new().unwrap();
        let path = write_plan(&dir, PLAN);
        let requirements = ValidationRequirements {
            min_questions: 5,
            max_questions: 10,
            require_answers: true,
        };
        let result = run(&path, &requirements).unwrap();
        assert!(!result.valid);
        assert!(result.error_count() >= 1);
    }

    #[test]
    fn test_structurally_broken_plan_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_plan(&dir, r#"{"version": "1.0", "metadata": {}}"#);
        assert!(run(&path, &ValidationRequirements::default()).is_err());
    }
}
