use super::{escape_html, page};
use crate::types::Plan;

pub fn render_lesson_plan(plan: &Plan) -> String {
    let meta = &plan.metadata;
    let title = format!("{} - Lesson Plan", meta.title);
    let mut body = String::with_capacity(4096);
    body.push_str(&format!("<h1>{}</h1>\n", escape_html(&title)));

    let mut facts = Vec::new();
    if !meta.grade.is_empty() {
        facts.push(format!("Grade: {}", escape_html(&meta.grade)));
    }
    if !meta.subject.is_empty() {
        facts.push(format!("Subject: {}", escape_html(&meta.subject)));
    }
    if !meta.topic.is_empty() {
        facts.push(format!("Topic: {}", escape_html(&meta.topic)));
    }
    if let Some(minutes) = meta.estimated_minutes {
        facts.push(format!("Duration: {} minutes", minutes));
    }
    if !facts.is_empty() {
        body.push_str(&format!("<p class=\"lesson-meta\">{}</p>\n", facts.join(" | ")));
    }

    if !meta.objectives.is_empty() {
        body.push_str("<h2>Objectives</h2>\n");
        push_list(&mut body, &meta.objectives);
    }

    let details = plan.lesson_plan.as_ref();
    if let Some(materials) = details.map(|d| &d.materials).filter(|m| !m.is_empty()) {
        body.push_str("<h2>Materials</h2>\n");
        push_list(&mut body, materials);
    }

    body.push_str("<h2>Procedure</h2>\n<ol class=\"procedure\">\n");
    match details.filter(|d| !d.procedure.is_empty()) {
        Some(details) => {
            for step in &details.procedure {
                body.push_str(&format!("<li><strong>{}</strong>", escape_html(&step.title)));
                if let Some(minutes) = step.minutes {
                    body.push_str(&format!(
                        " <span class=\"step-minutes\">({} min)</span>",
                        minutes
                    ));
                }
                if !step.description.trim().is_empty() {
                    body.push_str(&format!("<p>{}</p>", escape_html(&step.description)));
                }
                body.push_str("</li>\n");
            }
        }
        None => {
            for section in &plan.structure.sections {
                let count = section.items.len();
                body.push_str(&format!(
                    "<li><strong>{}</strong><p>Students complete {} question{}.</p></li>\n",
                    escape_html(&activity_title(&section.title)),
                    count,
                    if count == 1 { "" } else { "s" }
                ));
            }
        }
    }
    body.push_str("</ol>\n");

    if let Some(text) = details.and_then(|d| d.differentiation.as_deref()) {
        body.push_str("<h2>Differentiation</h2>\n");
        body.push_str(&format!("<p>{}</p>\n", escape_html(text)));
    }
    if let Some(text) = details.and_then(|d| d.assessment.as_deref()) {
        body.push_str("<h2>Assessment</h2>\n");
        body.push_str(&format!("<p>{}</p>\n", escape_html(text)));
    }

    page(&title, &body)
}

fn activity_title(section_title: &str) -> String {
    if section_title.trim().is_empty() {
        "Activity".to_string()
    } else {
        format!("Activity: {}", section_title.trim())
    }
}

fn push_list(html: &mut String, entries: &[String]) {
    html.push_str("<ul>\n");
    for entry in entries {
        html.push_str(&format!("<li>{}</li>\n", escape_html(entry)));
    }
    html.push_str("</ul>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LessonPlanDetails, LessonStep};
    use crate::validation::tests::{item, plan_with};

    #[test]
    fn test_procedure_from_lesson_details() {
        let mut plan = plan_with(vec![item("q1", "4")]);
        plan.metadata.objectives = vec!["Add within 10".to_string()];
        plan.lesson_plan = Some(LessonPlanDetails {
            materials: vec!["Counters".to_string()],
            procedure: vec![LessonStep {
                title: "Warm-up".to_string(),
                description: "Count aloud".to_string(),
                minutes: Some(5),
            }],
            differentiation: Some("Use number lines".to_string()),
            assessment: None,
        });
        let html = render_lesson_plan(&plan);

        assert!(html.contains("<h1>Test - Lesson Plan</h1>"));
        assert!(html.contains("<li>Add within 10</li>"));
        assert!(html.contains("<li>Counters</li>"));
        assert!(html.contains("<strong>Warm-up</strong> <span class=\"step-minutes\">(5 min)</span>"));
        assert!(html.contains("<h2>Differentiation</h2>"));
        assert!(!html.contains("<h2>Assessment</h2>"));
    }

    #[test]
    fn test_sections_become_activities() {
        let plan = plan_with(vec![item("q1", "4"), item("q2", "5")]);
        let html = render_lesson_plan(&plan);

        assert!(html.contains("<strong>Activity: Practice</strong>"));
        assert!(html.contains("Students complete 2 questions."));
        assert!(!html.contains("<h2>Materials</h2>"));
    }
}
