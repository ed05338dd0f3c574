//! Plan generation prompt.

use crate::ai::PromptBuilder;
use crate::constants::planner::{MAX_INSPIRATION_CHARS, PLAN_VERSION};
use crate::types::utils::truncate_at_boundary;
use crate::types::{DocumentKind, RequestContext};

const PLAN_SCHEMA: &str = r#"{
  "version": "1.0",
  "metadata": {
    "title": "string",
    "grade": "string",
    "subject": "string",
    "topic": "string",
    "objectives": ["string"],
    "estimatedMinutes": 30
  },
  "structure": {
    "header": {
      "title": "string",
      "instructions": "string",
      "includeName": true,
      "includeDate": true
    },
    "sections": [
      {
        "id": "s1",
        "title": "string",
        "instructions": "string",
        "items": [
          {
            "id": "q1",
            "questionText": "string",
            "type": "multiple_choice | short_answer | fill_in_blank | true_false | essay",
            "options": ["string"],
            "correctAnswer": "string",
            "explanation": "string",
            "points": 1
          }
        ]
      }
    ]
  },
  "visualPlacements": [
    {
      "afterItemId": "q1",
      "description": "string",
      "purpose": "diagram | illustration | decorative",
      "size": "small | medium | wide"
    }
  ]
}"#;

const LESSON_PLAN_SCHEMA: &str = r#""lessonPlan": {
  "materials": ["string"],
  "procedure": [{ "title": "string", "description": "string", "minutes": 10 }],
  "differentiation": "string",
  "assessment": "string"
}"#;

/// Build the single plan-generation prompt for a request
pub fn plan_prompt(ctx: &RequestContext) -> String {
    let options = &ctx.options;
    let visuals = &ctx.visual_settings;

    let document = match options.kind {
        DocumentKind::Worksheet => "worksheet",
        DocumentKind::LessonPlan => "lesson plan with practice questions",
    };

    let mut builder = PromptBuilder::new()
        .role(
            "curriculum designer",
            &format!("grade {} {} materials", ctx.grade, ctx.subject),
        )
        .objectives(&[
            format!("Plan a {} on the requested topic", document),
            format!("Write exactly {} questions", options.question_count),
            "Give every question a correct answer and a short explanation".to_string(),
            "Match vocabulary and number ranges to the grade level".to_string(),
        ])
        .context_item("Grade", &ctx.grade)
        .context_item("Subject", &ctx.subject)
        .context_item("Topic", ctx.topic_or_prompt())
        .context_item("Question count", &options.question_count.to_string());

    if !options.question_types.is_empty() {
        builder = builder.context_item("Question types", &options.question_types.join(", "));
    }
    if let Some(difficulty) = &options.difficulty {
        builder = builder.context_item("Difficulty", difficulty);
    }

    builder = builder.section("Request", &ctx.prompt);

    if let Some(inspiration) = ctx.inspiration.as_deref().filter(|s| !s.trim().is_empty()) {
        builder = builder.section(
            "Inspiration Material",
            &truncate_at_boundary(inspiration, MAX_INSPIRATION_CHARS),
        );
    }

    let visual_rule = if visuals.enabled {
        let mut rule = format!(
            "Add about {} visualPlacements. Each references an existing item id in afterItemId. \
             Use size small, medium or wide and purpose diagram, illustration or decorative",
            visuals.richness.expected_image_count()
        );
        if let Some(theme) = &visuals.theme {
            rule.push_str(&format!(". Visual theme: {}", theme));
        }
        rule
    } else {
        "Return an empty visualPlacements array".to_string()
    };

    let wants_lesson_plan =
        options.include_lesson_plan || options.kind == DocumentKind::LessonPlan;

    let mut rules = vec![
        "Respond with a single JSON object and nothing else".to_string(),
        format!("Set version to \"{}\"", PLAN_VERSION),
        "Every item id must be non-empty and unique across the plan".to_string(),
        "Never attach visualHint or imageDescription to items; images belong in visualPlacements only"
            .to_string(),
        "Multiple choice items list their options and the correct option text".to_string(),
        visual_rule,
    ];
    if wants_lesson_plan {
        rules.push("Include a lessonPlan object with materials and a timed procedure".to_string());
    }

    builder = builder.rules(&rules).code("json", PLAN_SCHEMA);
    if wants_lesson_plan {
        builder = builder.code("json", LESSON_PLAN_SCHEMA);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_request_fields() {
        let mut ctx = RequestContext::new("Adding within 20", "1", "Math");
        ctx.options.question_count = 8;
        let prompt = plan_prompt(&ctx);

        assert!(prompt.contains("**Grade**: 1"));
        assert!(prompt.contains("**Subject**: Math"));
        assert!(prompt.contains("Write exactly 8 questions"));
        assert!(prompt.contains("visualPlacements"));
        assert!(!prompt.contains("lessonPlan"));
    }

    #[test]
    fn test_prompt_without_visuals() {
        let mut ctx = RequestContext::new("Fractions", "4", "Math");
        ctx.visual_settings.enabled = false;
        ctx.options.include_lesson_plan = true;
        let prompt = plan_prompt(&ctx);

        assert!(prompt.contains("Return an empty visualPlacements array"));
        assert!(prompt.contains("\"lessonPlan\""));
    }

    #[test]
    fn test_inspiration_is_truncated() {
        let mut ctx = RequestContext::new("Plants", "2", "Science");
        ctx.inspiration = Some("leaf ".repeat(2000));
        let prompt = plan_prompt(&ctx);

        assert!(prompt.contains("# Inspiration Material"));
        assert!(prompt.contains("[... truncated]"));
    }
}
