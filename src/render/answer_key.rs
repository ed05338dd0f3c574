use super::{escape_html, page};
use crate::types::{Item, ItemType, Plan};

/// Fixed legend appended to every answer key: (percent range, label)
pub const SCORING_BANDS: [(&str, &str); 5] = [
    ("90-100%", "Excellent"),
    ("80-89%", "Good"),
    ("70-79%", "Satisfactory"),
    ("60-69%", "Needs Practice"),
    ("Below 60%", "Needs Support"),
];

pub fn render_answer_key(plan: &Plan) -> String {
    let title = format!("{} - Answer Key", plan.metadata.title);
    let mut body = String::with_capacity(4096);
    body.push_str(&format!("<h1>{}</h1>\n", escape_html(&title)));

    let mut number = 0;
    let mut total_points = 0;
    for section in &plan.structure.sections {
        if !section.title.trim().is_empty() {
            body.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.title)));
        }
        for item in &section.items {
            number += 1;
            total_points += item.points();
            render_answer(&mut body, number, item);
        }
    }

    body.push_str(&format!(
        "<p class=\"total-points\">Total: {} point{}</p>\n",
        total_points,
        if total_points == 1 { "" } else { "s" }
    ));

    body.push_str("<table class=\"scoring\">\n<tr><th>Score</th><th>Level</th></tr>\n");
    for (range, label) in SCORING_BANDS {
        body.push_str(&format!("<tr><td>{}</td><td>{}</td></tr>\n", range, label));
    }
    body.push_str("</table>\n");

    page(&title, &body)
}

fn render_answer(html: &mut String, number: usize, item: &Item) {
    let points = item.points();
    html.push_str("<div class=\"answer-item\">\n");
    html.push_str(&format!(
        "<span class=\"question-number\">{}.</span><span class=\"answer\">{}</span><span class=\"points\">({} pt{})</span>\n",
        number,
        escape_html(&display_answer(item)),
        points,
        if points == 1 { "" } else { "s" }
    ));
    if let Some(explanation) = item.explanation.as_deref().filter(|e| !e.trim().is_empty()) {
        html.push_str(&format!(
            "<p class=\"explanation\">{}</p>\n",
            escape_html(explanation)
        ));
    }
    html.push_str("</div>\n");
}

/// Multiple-choice answers given as a bare letter also show the option text
fn display_answer(item: &Item) -> String {
    let answer = item.correct_answer.trim();
    if item.item_type != ItemType::MultipleChoice {
        return answer.to_string();
    }

    let mut chars = answer.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => {
            let index = (letter.to_ascii_uppercase() as u8 - b'A') as usize;
            match item.options.get(index) {
                Some(option) => format!("{}. {}", letter.to_ascii_uppercase(), option),
                None => answer.to_string(),
            }
        }
        _ => answer.to_string(),
    }
}
