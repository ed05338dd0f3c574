//! Worksheet / Lesson Planner
//!
//! Turns a request into a structured [`Plan`] with one model call. Output is
//! decoded tolerantly (fence strip, then balanced-brace scan), checked for
//! basic structure, and stamped with the request's grade and subject.
//!
//! Callers fall back to [`create_fallback_plan`] on any non-fatal error.

mod fallback;
mod prompts;

pub use fallback::create_fallback_plan;
pub use prompts::plan_prompt;

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::ai::{
    CompletionOptions, RetryPolicy, SharedMetrics, SharedProvider, attempt_with_policy,
    decode_model_json,
};
use crate::constants::planner::PLAN_MAX_TOKENS;
use crate::types::{ForgeError, Plan, RequestContext, Result};

pub struct Planner {
    provider: SharedProvider,
    policy: RetryPolicy,
    metrics: Option<SharedMetrics>,
}

impl Planner {
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

    #[instrument(skip_all, fields(grade = %ctx.grade, subject = %ctx.subject))]
    pub async fn create_plan(&self, ctx: &RequestContext) -> Result<Plan> {
        let prompt = plan_prompt(ctx);
        let options = CompletionOptions {
            max_tokens: PLAN_MAX_TOKENS,
            json_mode: true,
        };

        info!(
            "Requesting plan from {} ({})",
            self.provider.name(),
            self.provider.model()
        );

        let response = attempt_with_policy(
            &self.policy,
            "plan generation",
            |e: &ForgeError| e.is_recoverable(),
            || self.provider.generate(&prompt, &options),
        )
        .await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_response(&response);
        }

        let plan = parse_plan_response(&response.content, ctx)?;
        info!(
            "Plan ready: '{}' with {} questions, {} placements",
            plan.metadata.title,
            plan.question_count(),
            plan.visual_placements.len()
        );
        Ok(plan)
    }
}

/// Decode, structurally check, and stamp a raw model response
pub fn parse_plan_response(raw: &str, ctx: &RequestContext) -> Result<Plan> {
    let mut plan = decode_plan(raw)?;
    plan.metadata.grade = ctx.grade.clone();
    plan.metadata.subject = ctx.subject.clone();

    debug!("Parsed plan with {} sections", plan.structure.sections.len());
    Ok(plan)
}

/// Decode plan JSON, tolerating code fences and surrounding prose
pub fn decode_plan(raw: &str) -> Result<Plan> {
    let mut value =
        decode_model_json(raw).map_err(|e| ForgeError::PlanParse(e.to_string()))?;

    check_plan_structure(&value)?;

    // Models sometimes emit the version as a number
    if let Some(version) = value
        .get("version")
        .filter(|v| v.is_number())
        .map(Value::to_string)
    {
        value["version"] = Value::String(version);
    }

    serde_json::from_value(value).map_err(|e| ForgeError::PlanParse(e.to_string()))
}

/// Strict shape check on the raw JSON, before the recoverable validator runs
pub fn check_plan_structure(value: &Value) -> Result<()> {
    let present = |v: Option<&Value>| match v {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    };

    if !present(value.get("version")) {
        return Err(ForgeError::plan_structure("version", "missing"));
    }
    if !present(value.pointer("/metadata/title")) {
        return Err(ForgeError::plan_structure("metadata.title", "missing"));
    }
    if !value
        .pointer("/structure/header")
        .is_some_and(Value::is_object)
    {
        return Err(ForgeError::plan_structure("structure.header", "missing"));
    }

    let sections = value
        .pointer("/structure/sections")
        .and_then(Value::as_array)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ForgeError::plan_structure("structure.sections", "no sections"))?;

    for (si, section) in sections.iter().enumerate() {
        let items = section
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (ii, item) in items.iter().enumerate() {
            for key in ["id", "questionText", "correctAnswer"] {
                // An empty answer is left to the validator, which can repair it
                let carried = match key {
                    "correctAnswer" => item.get(key).is_some_and(|v| !v.is_null()),
                    _ => present(item.get(key)),
                };
                if !carried {
                    return Err(ForgeError::plan_structure(
                        format!("structure.sections[{}].items[{}].{}", si, ii, key),
                        "missing",
                    ));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::MockLlmProvider;
    use crate::ai::create_shared_metrics;
    use crate::types::{ErrorCategory, LlmError};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn ctx() -> RequestContext {
        RequestContext::new("Addition facts", "1", "Math")
    }

    fn plan_json() -> Value {
        json!({
            "version": 1.0,
            "metadata": { "title": "Adding Fun", "grade": "5", "subject": "Art" },
            "structure": {
                "header": { "title": "Adding Fun", "instructions": "Solve." },
                "sections": [{
                    "id": "s1",
                    "title": "Practice",
                    "items": [
                        { "id": "q1", "questionText": "2 + 3 = ?", "correctAnswer": 5 },
                        { "id": "q2", "questionText": "4 + 1 = ?", "correctAnswer": "5" }
                    ]
                }]
            },
            "visualPlacements": [
                { "afterItemId": "q1", "description": "five apples", "purpose": "illustration", "size": "small" }
            ]
        })
    }

    fn planner(mock: MockLlmProvider) -> Planner {
        Planner::new(Arc::new(mock), RetryPolicy::once(Duration::from_secs(30)))
    }

    #[test]
    fn test_parse_fenced_response_and_stamp_request_fields() {
        let raw = format!("Here you go:\n```json\n{}\n```", plan_json());
        let plan = parse_plan_response(&raw, &ctx()).unwrap();

        assert_eq!(plan.version, "1.0");
        assert_eq!(plan.metadata.grade, "1");
        assert_eq!(plan.metadata.subject, "Math");
        assert_eq!(plan.question_count(), 2);
        assert_eq!(plan.items().next().unwrap().correct_answer, "5");
    }

    #[test]
    fn test_parse_embedded_object() {
        let raw = format!("Sure! {} Hope this helps.", plan_json());
        assert!(parse_plan_response(&raw, &ctx()).is_ok());
    }

    #[test]
    fn test_unparseable_is_plan_parse_error() {
        let err = parse_plan_response("I cannot help with that.", &ctx()).unwrap_err();
        assert!(matches!(err, ForgeError::PlanParse(_)));
    }

    #[test]
    fn test_structure_violations_raise_with_field_path() {
        let mut value = plan_json();
        value["structure"]["sections"][0]["items"][1]
            .as_object_mut()
            .unwrap()
            .remove("correctAnswer");
        let err = parse_plan_response(&value.to_string(), &ctx()).unwrap_err();
        match err {
            ForgeError::PlanStructure { field, .. } => {
                assert_eq!(field, "structure.sections[0].items[1].correctAnswer")
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut value = plan_json();
        value["structure"]["sections"] = json!([]);
        assert!(matches!(
            check_plan_structure(&value),
            Err(ForgeError::PlanStructure { .. })
        ));

        let mut value = plan_json();
        value["metadata"]["title"] = json!("");
        assert!(check_plan_structure(&value).is_err());

        let mut value = plan_json();
        value["structure"].as_object_mut().unwrap().remove("header");
        assert!(check_plan_structure(&value).is_err());
    }

    #[tokio::test]
    async fn test_create_plan_records_usage() {
        let mock = MockLlmProvider::new().with_response(plan_json().to_string());
        let metrics = create_shared_metrics("test");
        let planner = planner(mock).with_metrics(metrics.clone());

        let plan = planner.create_plan(&ctx()).await.unwrap();
        assert_eq!(plan.metadata.title, "Adding Fun");

        let summary = metrics.summary();
        assert_eq!(summary.api_calls, 1);
        assert_eq!(summary.input_tokens, 100);
        assert_eq!(summary.output_tokens, 200);
    }

    #[tokio::test]
    async fn test_create_plan_propagates_provider_error() {
        let mock = MockLlmProvider::new().with_error(ForgeError::Llm(LlmError::new(
            ErrorCategory::Auth,
            "invalid api key",
        )));
        let err = planner(mock).create_plan(&ctx()).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
