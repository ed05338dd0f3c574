//! One-shot AI-assisted plan repair.

use tracing::{info, instrument, warn};

use super::{PlanValidator, ValidationIssue, ValidationResult};
use crate::ai::{
    CompletionOptions, PromptBuilder, RetryPolicy, SharedMetrics, SharedProvider,
    attempt_with_policy, decode_model_json,
};
use crate::constants::planner::REPAIR_MAX_TOKENS;
use crate::types::{ForgeError, Plan, Result, ValidationRequirements};

#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub plan: Plan,
    pub validation: ValidationResult,
    pub was_repaired: bool,
}

pub struct PlanRepairer {
    provider: SharedProvider,
    policy: RetryPolicy,
    metrics: Option<SharedMetrics>,
}

impl PlanRepairer {
    pub fn new(provider: SharedProvider, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// One model call to fix the listed issues. Does not re-validate.
    pub async fn attempt_repair(&self, plan: &Plan, issues: &[ValidationIssue]) -> Result<Plan> {
        let prompt = repair_prompt(plan, issues)?;
        let options = CompletionOptions {
            max_tokens: REPAIR_MAX_TOKENS,
            json_mode: true,
        };

        let response = attempt_with_policy(
            &self.policy,
            "plan repair",
            |e: &ForgeError| e.is_recoverable(),
            || self.provider.generate(&prompt, &options),
        )
        .await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_response(&response);
        }

        let value = decode_model_json(&response.content)
            .map_err(|e| ForgeError::RepairParse(e.to_string()))?;
        let mut repaired: Plan =
            serde_json::from_value(value).map_err(|e| ForgeError::RepairParse(e.to_string()))?;

        repaired.metadata.grade = plan.metadata.grade.clone();
        repaired.metadata.subject = plan.metadata.subject.clone();
        Ok(repaired)
    }

    /// Validate once; repair at most once when invalid but salvageable.
    ///
    /// The model is never called for a valid plan or one with more errors
    /// than the auto-repair ceiling. A failed repair call degrades to the
    /// original plan unless the failure is fatal.
    #[instrument(skip_all)]
    pub async fn validate_and_repair(
        &self,
        mut plan: Plan,
        requirements: &ValidationRequirements,
    ) -> Result<RepairOutcome> {
        let validation = PlanValidator::validate(&mut plan, requirements);

        if validation.valid {
            return Ok(RepairOutcome {
                plan,
                validation,
                was_repaired: false,
            });
        }

        if !validation.auto_repairable {
            warn!(
                "Plan has {} errors, too many to repair; keeping it as-is",
                validation.error_count()
            );
            return Ok(RepairOutcome {
                plan,
                validation,
                was_repaired: false,
            });
        }

        info!("Repairing plan ({} errors)", validation.error_count());
        let issues: Vec<ValidationIssue> = validation.errors().cloned().collect();

        match self.attempt_repair(&plan, &issues).await {
            Ok(mut repaired) => {
                let validation = PlanValidator::validate(&mut repaired, requirements);
                if !validation.valid {
                    warn!(
                        "Repaired plan still has {} errors",
                        validation.error_count()
                    );
                }
                Ok(RepairOutcome {
                    plan: repaired,
                    validation,
                    was_repaired: true,
                })
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Plan repair failed, keeping original: {}", e);
                Ok(RepairOutcome {
                    plan,
                    validation,
                    was_repaired: false,
                })
            }
        }
    }
}

/// Corrective prompt listing the issues alongside the current plan
pub fn repair_prompt(plan: &Plan, issues: &[ValidationIssue]) -> Result<String> {
    let listed: Vec<String> = issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect();
    let plan_json = serde_json::to_string_pretty(plan)?;

    Ok(PromptBuilder::new()
        .role("curriculum editor", "correcting structured worksheet plans")
        .objectives(&[
            "Fix every listed problem",
            "Keep all other content unchanged",
            "Return the complete corrected plan",
        ])
        .section("Problems", &listed.join("\n"))
        .rules(&[
            "Respond with a single JSON object and nothing else",
            "Keep the same schema and item ids unless an id is the problem",
            "Every item needs a non-empty correctAnswer",
        ])
        .section("Current Plan", "")
        .code("json", &plan_json)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::MockLlmProvider;
    use crate::types::{ErrorCategory, LlmError};
    use crate::validation::tests::{item, plan_with};
    use std::sync::Arc;
    use std::time::Duration;

    fn reqs() -> ValidationRequirements {
        ValidationRequirements {
            min_questions: 1,
            max_questions: 20,
            require_answers: true,
        }
    }

    fn repairer(mock: Arc<MockLlmProvider>) -> PlanRepairer {
        PlanRepairer::new(mock, RetryPolicy::once(Duration::from_secs(30)))
    }

    #[tokio::test]
    async fn test_valid_plan_never_calls_model() {
        let mock = Arc::new(MockLlmProvider::new());
        let plan = plan_with(vec![item("q1", "4")]);

        let outcome = repairer(mock.clone())
            .validate_and_repair(plan, &reqs())
            .await
            .unwrap();

        assert!(!outcome.was_repaired);
        assert!(outcome.validation.valid);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unsalvageable_plan_never_calls_model() {
        let mock = Arc::new(MockLlmProvider::new());
        let plan = plan_with((1..=6).map(|n| item(&format!("q{n}"), "")).collect());

        let outcome = repairer(mock.clone())
            .validate_and_repair(plan.clone(), &reqs())
            .await
            .unwrap();

        assert!(!outcome.was_repaired);
        assert_eq!(outcome.plan, plan);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_repair_once_and_revalidate() {
        let mut fixed = plan_with(vec![item("q1", "4"), item("q2", "6")]);
        fixed.metadata.grade = "9".to_string();
        let mock = Arc::new(
            MockLlmProvider::new()
                .with_response(format!("```json\n{}\n```", serde_json::to_string(&fixed).unwrap())),
        );

        let mut broken = plan_with(vec![item("q1", "4"), item("q2", "")]);
        broken.metadata.grade = "2".to_string();

        let outcome = repairer(mock.clone())
            .validate_and_repair(broken, &reqs())
            .await
            .unwrap();

        assert!(outcome.was_repaired);
        assert!(outcome.validation.valid);
        assert_eq!(outcome.plan.metadata.grade, "2");
        assert_eq!(mock.call_count(), 1);
        assert!(mock.prompts()[0].contains("structure.sections[0].items[1].correctAnswer"));
    }

    #[tokio::test]
    async fn test_still_invalid_after_repair_is_not_looped() {
        let still_broken = plan_with(vec![item("q1", "")]);
        let mock = Arc::new(
            MockLlmProvider::new()
                .with_response(serde_json::to_string(&still_broken).unwrap())
                .with_response(serde_json::to_string(&still_broken).unwrap()),
        );

        let outcome = repairer(mock.clone())
            .validate_and_repair(plan_with(vec![item("q1", "")]), &reqs())
            .await
            .unwrap();

        assert!(outcome.was_repaired);
        assert!(!outcome.validation.valid);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_attempt_repair_unparseable() {
        let mock = Arc::new(MockLlmProvider::new().with_response("no json here"));
        let err = repairer(mock)
            .attempt_repair(&plan_with(vec![item("q1", "")]), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::RepairParse(_)));
    }

    #[tokio::test]
    async fn test_failed_repair_keeps_original() {
        let mock = Arc::new(MockLlmProvider::new().with_response("garbage"));
        let broken = plan_with(vec![item("q1", "")]);

        let outcome = repairer(mock)
            .validate_and_repair(broken.clone(), &reqs())
            .await
            .unwrap();

        assert!(!outcome.was_repaired);
        assert_eq!(outcome.plan, broken);
    }

    #[tokio::test]
    async fn test_fatal_repair_error_propagates() {
        let mock = Arc::new(MockLlmProvider::new().with_error(ForgeError::Llm(LlmError::new(
            ErrorCategory::Auth,
            "bad key",
        ))));
        let result = repairer(mock)
            .validate_and_repair(plan_with(vec![item("q1", "")]), &reqs())
            .await;
        assert!(result.is_err());
    }
}
