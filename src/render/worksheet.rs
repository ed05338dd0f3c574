use std::collections::{HashMap, HashSet};

use super::{escape_html, page, pair_images, size_class};
use crate::types::{ImageResult, Item, ItemType, Plan, VisualPlacement};

pub fn render_worksheet(plan: &Plan, images: &[ImageResult]) -> String {
    let header = &plan.structure.header;
    let title = if header.title.trim().is_empty() {
        &plan.metadata.title
    } else {
        &header.title
    };

    let pairs = pair_images(&plan.visual_placements, images);
    let mut by_item: HashMap<&str, Vec<(&VisualPlacement, &ImageResult)>> = HashMap::new();
    for (placement, image) in &pairs {
        by_item
            .entry(placement.after_item_id.as_str())
            .or_default()
            .push((*placement, *image));
    }

    let mut body = String::with_capacity(8192);
    body.push_str("<header class=\"worksheet-header\">\n");
    body.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));
    if header.include_name || header.include_date {
        body.push_str("<div class=\"student-info\">");
        if header.include_name {
            body.push_str("<span class=\"name-line\">Name: </span>");
        }
        if header.include_date {
            body.push_str("<span class=\"date-line\">Date: </span>");
        }
        body.push_str("</div>\n");
    }
    if !header.instructions.trim().is_empty() {
        body.push_str(&format!(
            "<p class=\"instructions\">{}</p>\n",
            escape_html(&header.instructions)
        ));
    }
    body.push_str("</header>\n");

    let mut number = 0;
    for section in &plan.structure.sections {
        body.push_str("<section class=\"worksheet-section\">\n");
        if !section.title.trim().is_empty() {
            body.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.title)));
        }
        if let Some(instructions) = section.instructions.as_deref().filter(|s| !s.trim().is_empty()) {
            body.push_str(&format!(
                "<p class=\"section-instructions\">{}</p>\n",
                escape_html(instructions)
            ));
        }
        for item in &section.items {
            number += 1;
            render_item(&mut body, number, item);
            if let Some(visuals) = by_item.get(item.id.as_str()) {
                for (placement, image) in visuals {
                    render_figure(&mut body, placement, image);
                }
            }
        }
        body.push_str("</section>\n");
    }

    // Placements pointing at unknown items still render, after the last section
    let item_ids: HashSet<&str> = plan.item_ids();
    for (placement, image) in &pairs {
        if !item_ids.contains(placement.after_item_id.as_str()) {
            render_figure(&mut body, placement, image);
        }
    }

    page(title, &body)
}

fn render_item(html: &mut String, number: usize, item: &Item) {
    html.push_str(&format!(
        "<div class=\"question\" data-item-id=\"{}\">\n",
        escape_html(&item.id)
    ));
    html.push_str(&format!(
        "<p class=\"question-text\"><span class=\"question-number\">{}.</span>{}</p>\n",
        number,
        escape_html(&item.question_text)
    ));

    match item.item_type {
        ItemType::MultipleChoice if !item.options.is_empty() => {
            html.push_str("<ul class=\"options\">\n");
            for (letter, option) in ('A'..='Z').zip(&item.options) {
                html.push_str(&format!(
                    "<li><span class=\"option-letter\">{}.</span>{}</li>\n",
                    letter,
                    escape_html(option)
                ));
            }
            html.push_str("</ul>\n");
        }
        ItemType::TrueFalse => {
            html.push_str("<p class=\"true-false\">True &nbsp;/&nbsp; False</p>\n");
        }
        ItemType::Essay => html.push_str("<div class=\"answer-box\"></div>\n"),
        _ => html.push_str("<div class=\"answer-line\"></div>\n"),
    }
    html.push_str("</div>\n");
}

fn render_figure(html: &mut String, placement: &VisualPlacement, image: &ImageResult) {
    html.push_str(&format!(
        "<figure class=\"visual\"><img class=\"{}\" src=\"{}\" alt=\"{}\"></figure>\n",
        size_class(&placement.size),
        image.data_uri(),
        escape_html(&placement.description)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::create_placeholder;
    use crate::render::tests::{image, placement};
    use crate::types::PlacementSize;
    use crate::validation::tests::{item, plan_with};

    #[test]
    fn test_question_blocks_numbered() {
        let plan = plan_with(vec![item("q1", "4"), item("q2", "5"), item("q3", "6")]);
        let html = render_worksheet(&plan, &[]);

        assert_eq!(html.matches("<div class=\"question\"").count(), 3);
        assert!(html.contains("<span class=\"question-number\">3.</span>"));
        assert!(html.contains("Name: "));
        assert!(html.contains("Date: "));
        assert!(html.contains("<style>"));
    }

    #[test]
    fn test_multiple_choice_lettering() {
        let mut mc = item("q1", "B");
        mc.item_type = ItemType::MultipleChoice;
        mc.options = vec!["3".into(), "4".into(), "5".into(), "6".into()];
        let html = render_worksheet(&plan_with(vec![mc]), &[]);

        assert!(html.contains("<span class=\"option-letter\">A.</span>3"));
        assert!(html.contains("<span class=\"option-letter\">D.</span>6"));
        assert!(!html.contains("<div class=\"answer-line\">"));

        let short = render_worksheet(&plan_with(vec![item("q1", "4")]), &[]);
        assert!(short.contains("<div class=\"answer-line\"></div>"));
    }

    #[test]
    fn test_escapes_model_text() {
        let mut q = item("q1", "x");
        q.question_text = "<script>alert('hi')</script> Is 3 < 4?".to_string();
        let mut plan = plan_with(vec![q]);
        plan.metadata.title = "Tom & Jerry".to_string();
        let html = render_worksheet(&plan, &[]);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Is 3 &lt; 4?"));
        assert!(html.contains("<h1>Tom &amp; Jerry</h1>"));
    }

    #[test]
    fn test_image_follows_its_item() {
        let mut plan = plan_with(vec![item("q1", "4"), item("q2", "5")]);
        plan.visual_placements = vec![placement("q2", "small")];
        let html = render_worksheet(&plan, &[image(Some("q2"), "AAAA")]);

        let q2 = html.find("data-item-id=\"q2\"").unwrap();
        let img = html.find("class=\"img-small\"").unwrap();
        assert!(img > q2);
        assert!(html.contains("src=\"data:image/png;base64,AAAA\""));
    }

    #[test]
    fn test_legacy_and_unknown_sizes() {
        let mut plan = plan_with(vec![item("q1", "4"), item("q2", "5")]);
        plan.visual_placements = vec![placement("q1", "large"), placement("q2", "enormous")];
        let html = render_worksheet(&plan, &[image(None, "AAAA"), image(None, "BBBB")]);

        assert!(html.contains("class=\"img-large\""));
        assert!(html.contains("class=\"img-unknown\""));
    }

    #[test]
    fn test_placeholder_renders_svg() {
        let mut plan = plan_with(vec![item("q1", "4")]);
        plan.visual_placements = vec![placement("q1", "medium")];
        let placeholder = create_placeholder("a volcano", &PlacementSize::Medium, "q1");
        let html = render_worksheet(&plan, &[placeholder]);

        assert!(html.contains("src=\"data:image/svg+xml;base64,"));
        assert!(!html.contains("placeholder:"));
    }

    #[test]
    fn test_orphan_placement_still_rendered() {
        let mut plan = plan_with(vec![item("q1", "4")]);
        plan.visual_placements = vec![placement("q9", "wide")];
        let html = render_worksheet(&plan, &[image(None, "AAAA")]);
        assert!(html.contains("class=\"img-wide\""));
    }
}
