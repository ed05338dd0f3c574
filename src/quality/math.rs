//! Arithmetic checks over rendered HTML.
//!
//! Finds `a op b = c` expressions, recomputes them, and checks each against
//! per-grade rules for operand size, operators, decimals and negatives.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Stated and computed results closer than this are equal
const TOLERANCE: f64 = 0.001;

static EXPRESSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(-?\d+(?:\.\d+)?)\s*([+\-−×*xX÷/])\s*(-?\d+(?:\.\d+)?)\s*=\s*(-?\d+(?:\.\d+)?)",
    )
    .expect("expression pattern is valid")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" | "−" => Some(Self::Subtract),
            "×" | "*" | "x" | "X" => Some(Self::Multiply),
            "÷" | "/" => Some(Self::Divide),
            _ => None,
        }
    }

    fn apply(self, a: f64, b: f64) -> Option<f64> {
        match self {
            Self::Add => Some(a + b),
            Self::Subtract => Some(a - b),
            Self::Multiply => Some(a * b),
            Self::Divide if b == 0.0 => None,
            Self::Divide => Some(a / b),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "Addition",
            Self::Subtract => "Subtraction",
            Self::Multiply => "Multiplication",
            Self::Divide => "Division",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MathIssue {
    pub expression: String,
    pub stated_answer: f64,
    pub expected_answer: f64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeIssue {
    pub expression: String,
    pub reason: String,
}

impl fmt::Display for GradeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.expression, self.reason)
    }
}

struct Expression {
    text: String,
    left: f64,
    op: Operator,
    right: f64,
    stated: f64,
}

impl Expression {
    fn numbers(&self) -> [f64; 3] {
        [self.left, self.right, self.stated]
    }
}

/// Visible text of an HTML fragment with common math entities decoded
fn visible_text(html: &str) -> String {
    TAG_RE
        .replace_all(html, " ")
        .replace("&times;", "×")
        .replace("&divide;", "÷")
        .replace("&minus;", "−")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn extract_expressions(html: &str) -> Vec<Expression> {
    let text = visible_text(html);
    EXPRESSION_RE
        .captures_iter(&text)
        .filter_map(|caps| {
            Some(Expression {
                text: caps[0].trim().to_string(),
                left: caps[1].parse().ok()?,
                op: Operator::parse(&caps[2])?,
                right: caps[3].parse().ok()?,
                stated: caps[4].parse().ok()?,
            })
        })
        .collect()
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        let s = format!("{:.4}", n);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Recompute every `a op b = c` expression and report wrong results.
/// Division by zero is skipped.
pub fn validate_math_content(html: &str) -> Vec<MathIssue> {
    extract_expressions(html)
        .into_iter()
        .filter_map(|expr| {
            let expected = expr.op.apply(expr.left, expr.right)?;
            if (expected - expr.stated).abs() <= TOLERANCE {
                return None;
            }
            Some(MathIssue {
                message: format!(
                    "{} states {} but the correct result is {}",
                    expr.text,
                    format_number(expr.stated),
                    format_number(expected)
                ),
                expression: expr.text,
                stated_answer: expr.stated,
                expected_answer: expected,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct GradeRule {
    max_value: f64,
    operators: &'static [Operator],
    decimals: bool,
    negatives: bool,
}

const ADD_SUB: &[Operator] = &[Operator::Add, Operator::Subtract];
const ALL_OPS: &[Operator] = &[
    Operator::Add,
    Operator::Subtract,
    Operator::Multiply,
    Operator::Divide,
];

/// Rules for a grade label; unknown labels have no rules
fn grade_rule(grade: &str) -> Option<GradeRule> {
    let normalized = grade.trim().to_lowercase();
    let level = match normalized.as_str() {
        "k" | "kindergarten" | "pre-k" | "prek" | "0" => 0,
        other => other
            .trim_start_matches("grade")
            .trim()
            .trim_end_matches(|c: char| c.is_alphabetic())
            .parse::<u32>()
            .ok()?,
    };

    let rule = |max_value, operators, decimals, negatives| GradeRule {
        max_value,
        operators,
        decimals,
        negatives,
    };
    Some(match level {
        0 => rule(10.0, ADD_SUB, false, false),
        1 => rule(20.0, ADD_SUB, false, false),
        2 => rule(100.0, ADD_SUB, false, false),
        3 => rule(1_000.0, ALL_OPS, false, false),
        4 => rule(10_000.0, ALL_OPS, true, false),
        5 => rule(100_000.0, ALL_OPS, true, false),
        _ => rule(1_000_000_000.0, ALL_OPS, true, true),
    })
}

fn grade_label(grade: &str) -> String {
    let g = grade.trim();
    if g.eq_ignore_ascii_case("k") || g.eq_ignore_ascii_case("kindergarten") {
        "K".to_string()
    } else {
        g.to_string()
    }
}

/// Report expressions that fall outside what a grade is expected to handle.
pub fn validate_grade_appropriateness(html: &str, grade: &str) -> Vec<GradeIssue> {
    let Some(rule) = grade_rule(grade) else {
        return Vec::new();
    };
    let label = grade_label(grade);
    let mut issues = Vec::new();

    for expr in extract_expressions(html) {
        let mut report = |reason: String| {
            issues.push(GradeIssue {
                expression: expr.text.clone(),
                reason,
            })
        };

        if !rule.operators.contains(&expr.op) {
            report(format!("{} not expected at grade {}", expr.op.name(), label));
        }
        if let Some(n) = expr.numbers().into_iter().find(|n| n.abs() > rule.max_value) {
            report(format!(
                "{} exceeds the grade {} maximum of {}",
                format_number(n),
                label,
                format_number(rule.max_value)
            ));
        }
        if !rule.decimals && expr.numbers().iter().any(|n| n.fract() != 0.0) {
            report(format!("Decimals not expected at grade {}", label));
        }
        if !rule.negatives && expr.numbers().iter().any(|n| *n < 0.0) {
            report(format!("Negative numbers not expected at grade {}", label));
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_sum_reported() {
        let issues = validate_math_content("<p>3 + 4 = 8</p>");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].stated_answer, 8.0);
        assert_eq!(issues[0].expected_answer, 7.0);
        assert!(issues[0].message.contains("correct result is 7"));
    }

    #[test]
    fn test_correct_expressions_pass() {
        let html = "<li>12 − 5 = 7</li><li>6 &times; 7 = 42</li><li>9 ÷ 3 = 3</li><li>1.5 + 2.25 = 3.75</li><li>10 / 3 = 3.3333</li>";
        assert!(validate_math_content(html).is_empty());
    }

    #[test]
    fn test_expression_split_by_tags() {
        let issues = validate_math_content("<span>5</span> x <span>5</span> = <b>20</b>");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].expected_answer, 25.0);
    }

    #[test]
    fn test_division_by_zero_skipped() {
        assert!(validate_math_content("4 / 0 = 0").is_empty());
    }

    #[test]
    fn test_multiplication_at_kindergarten() {
        let issues = validate_grade_appropriateness("3 × 4 = 12", "K");
        assert!(issues.iter().any(|i| i.reason.contains("Multiplication")));
        assert!(issues.iter().any(|i| i.reason.contains("exceeds")));
    }

    #[test]
    fn test_grade_rules() {
        assert!(validate_grade_appropriateness("45 + 30 = 75", "2").is_empty());

        let issues = validate_grade_appropriateness("45 + 30 = 75", "1");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].reason.contains("exceeds"));

        let issues = validate_grade_appropriateness("2.5 + 1 = 3.5", "3");
        assert!(issues[0].reason.contains("Decimals not expected"));

        let issues = validate_grade_appropriateness("3 - 5 = -2", "4");
        assert!(issues.iter().any(|i| i.reason.contains("Negative numbers not expected")));

        assert!(validate_grade_appropriateness("3 - 5 = -2", "7").is_empty());
    }

    #[test]
    fn test_grade_label_forms() {
        assert!(grade_rule("Grade 3").is_some());
        assert!(grade_rule("3rd").is_some());
        assert!(grade_rule("kindergarten").is_some());
        assert!(grade_rule("university").is_none());
        assert!(validate_grade_appropriateness("99 × 99 = 9801", "university").is_empty());
    }
}
