//! Check Math Command
//!
//! Verify arithmetic and grade fit in a rendered worksheet.
//!
//! Usage:
//!   lessonforge check-math output/answer_key.html --grade 2

use std::path::Path;

use crate::cli::Output;
use crate::quality::{GradeIssue, MathIssue, validate_grade_appropriateness, validate_math_content};
use crate::types::Result;

/// Returns the number of problems found
pub fn run(path: &Path, grade: Option<&str>) -> Result<usize> {
    let html = std::fs::read_to_string(path)?;
    let out = Output::new();
    out.header(&format!("Math check: {}", path.display()));

    let math = validate_math_content(&html);
    let grade_issues = grade
        .map(|g| validate_grade_appropriateness(&html, g))
        .unwrap_or_default();

    print_math_issues(&out, &math, &grade_issues);
    Ok(math.len() + grade_issues.len())
}

fn print_math_issues(out: &Output, math: &[MathIssue], grade_issues: &[GradeIssue]) {
    if math.is_empty() && grade_issues.is_empty() {
        out.success("No math problems found");
        return;
    }
    if !math.is_empty() {
        out.section("Incorrect answers");
        for issue in math {
            out.error(&format!("{}: {}", issue.expression, issue.message));
        }
    }
    if !grade_issues.is_empty() {
        out.section("Grade fit");
        for issue in grade_issues {
            out.warning(&format!("{}: {}", issue.expression, issue.reason));
        }
    }
}
