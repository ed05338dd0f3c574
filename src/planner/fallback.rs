//! Deterministic fallback plan.
//!
//! Built from the request alone when the planner's model call or parse
//! fails, so generation always has a plan to render.

use crate::constants::planner::PLAN_VERSION;
use crate::types::utils::{capitalize_first, truncate_chars};
use crate::types::{
    DocumentKind, Item, ItemType, LessonPlanDetails, LessonStep, Plan, PlanHeader, PlanMetadata,
    PlanStructure, PlacementPurpose, PlacementSize, RequestContext, Section, VisualPlacement,
};

const MAX_FALLBACK_QUESTIONS: usize = 50;
const TITLE_TOPIC_CHARS: usize = 60;

/// Minimal valid plan with placeholder questions. Pure: no I/O, same input
/// gives the same plan.
pub fn create_fallback_plan(ctx: &RequestContext) -> Plan {
    let topic = truncate_chars(ctx.topic_or_prompt(), TITLE_TOPIC_CHARS);
    let subject = capitalize_first(ctx.subject.trim());
    let title = if topic.is_empty() {
        format!("{} Practice", subject)
    } else {
        format!("{} Practice: {}", subject, topic)
    };

    let count = ctx.options.question_count.clamp(1, MAX_FALLBACK_QUESTIONS);
    let items: Vec<Item> = (1..=count)
        .map(|n| Item {
            id: format!("q{}", n),
            question_text: format!("Question {}: Write what you know about {}.", n, topic),
            item_type: ItemType::ShortAnswer,
            correct_answer: "Answers will vary.".to_string(),
            explanation: None,
            options: Vec::new(),
            points: None,
            extra: Default::default(),
        })
        .collect();

    let visual_placements = if ctx.visual_settings.enabled {
        vec![VisualPlacement {
            after_item_id: "q1".to_string(),
            description: format!("A simple picture about {}", topic),
            purpose: PlacementPurpose::Illustration,
            size: PlacementSize::Medium,
        }]
    } else {
        Vec::new()
    };

    let lesson_plan = (ctx.options.include_lesson_plan
        || ctx.options.kind == DocumentKind::LessonPlan)
        .then(|| LessonPlanDetails {
            materials: vec!["Printed worksheet".to_string(), "Pencils".to_string()],
            procedure: vec![
                LessonStep {
                    title: "Introduction".to_string(),
                    description: format!("Introduce {} and discuss prior knowledge.", topic),
                    minutes: Some(10),
                },
                LessonStep {
                    title: "Practice".to_string(),
                    description: "Students complete the worksheet independently.".to_string(),
                    minutes: Some(20),
                },
                LessonStep {
                    title: "Review".to_string(),
                    description: "Review answers together as a class.".to_string(),
                    minutes: Some(10),
                },
            ],
            differentiation: None,
            assessment: None,
        });

    Plan {
        version: PLAN_VERSION.to_string(),
        metadata: PlanMetadata {
            title: title.clone(),
            grade: ctx.grade.clone(),
            subject: ctx.subject.clone(),
            topic: ctx.topic_or_prompt().to_string(),
            objectives: vec![format!("Practice {}", topic)],
            estimated_minutes: None,
        },
        structure: PlanStructure {
            header: PlanHeader {
                title,
                instructions: "Answer each question in the space provided.".to_string(),
                include_name: true,
                include_date: true,
            },
            sections: vec![Section {
                id: "s1".to_string(),
                title: "Practice Questions".to_string(),
                instructions: None,
                items,
            }],
        },
        visual_placements,
        lesson_plan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationRequirements;
    use crate::validation::PlanValidator;

    fn ctx() -> RequestContext {
        let mut ctx = RequestContext::new("Plant life cycles", "3", "science");
        ctx.options.question_count = 6;
        ctx
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(create_fallback_plan(&ctx()), create_fallback_plan(&ctx()));
    }

    #[test]
    fn test_fallback_shape() {
        let plan = create_fallback_plan(&ctx());
        assert_eq!(plan.question_count(), 6);
        assert_eq!(plan.metadata.grade, "3");
        assert_eq!(plan.metadata.title, "Science Practice: Plant life cycles");
        assert_eq!(plan.visual_placements.len(), 1);
        assert!(plan.lesson_plan.is_none());
    }

    #[test]
    fn test_fallback_passes_validation() {
        let mut plan = create_fallback_plan(&ctx());
        let result =
            PlanValidator::validate(&mut plan, &ValidationRequirements::for_question_count(6, true));
        assert!(result.valid, "{:?}", result.issues);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_fallback_clamps_question_count() {
        let mut c = ctx();
        c.options.question_count = 0;
        assert_eq!(create_fallback_plan(&c).question_count(), 1);
        c.options.question_count = 500;
        assert_eq!(create_fallback_plan(&c).question_count(), 50);
    }

    #[test]
    fn test_fallback_lesson_plan_when_requested() {
        let mut c = ctx();
        c.options.include_lesson_plan = true;
        c.visual_settings.enabled = false;
        let plan = create_fallback_plan(&c);
        assert_eq!(plan.lesson_plan.unwrap().procedure.len(), 3);
        assert!(plan.visual_placements.is_empty());
    }
}
