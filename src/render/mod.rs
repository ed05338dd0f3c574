//! HTML Assembler
//!
//! Pure rendering of a validated [`Plan`] plus images into self-contained
//! HTML documents. No network access, no model calls. All plan text is
//! escaped before it reaches markup.

mod answer_key;
mod lesson_plan;
mod styles;
mod worksheet;

pub use answer_key::{SCORING_BANDS, render_answer_key};
pub use lesson_plan::render_lesson_plan;
pub use styles::{INLINE_CSS, size_class};
pub use worksheet::render_worksheet;

use serde::Serialize;
use std::collections::HashSet;

use crate::types::{ImageResult, Plan, VisualPlacement};

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    pub include_answer_key: bool,
    pub include_lesson_plan: bool,
    pub images: Vec<ImageResult>,
}

/// Rendered documents; a document that was not requested is an empty string
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledDocuments {
    pub worksheet_html: String,
    pub answer_key_html: String,
    pub lesson_plan_html: String,
}

pub fn assemble_all(plan: &Plan, options: &AssembleOptions) -> AssembledDocuments {
    AssembledDocuments {
        worksheet_html: render_worksheet(plan, &options.images),
        answer_key_html: if options.include_answer_key {
            render_answer_key(plan)
        } else {
            String::new()
        },
        lesson_plan_html: if options.include_lesson_plan {
            render_lesson_plan(plan)
        } else {
            String::new()
        },
    }
}

/// Full HTML page around a body fragment
pub(crate) fn page(title: &str, body: &str) -> String {
    let mut html = String::with_capacity(body.len() + 4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str("<style>");
    html.push_str(INLINE_CSS);
    html.push_str("</style>\n</head>\n<body>\n<div class=\"page\">\n");
    html.push_str(body);
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// Pairs each placement with an image: an image whose `placement_id`
/// names the placement's item wins; otherwise the image at the same index,
/// unless that image is claimed by id elsewhere.
pub(crate) fn pair_images<'a>(
    placements: &'a [VisualPlacement],
    images: &'a [ImageResult],
) -> Vec<(&'a VisualPlacement, &'a ImageResult)> {
    let placement_ids: HashSet<&str> = placements
        .iter()
        .map(|p| p.after_item_id.as_str())
        .collect();
    let mut used = vec![false; images.len()];
    let mut pairs = Vec::new();

    for (i, placement) in placements.iter().enumerate() {
        let by_id = images.iter().enumerate().position(|(j, img)| {
            !used[j] && img.placement_id.as_deref() == Some(placement.after_item_id.as_str())
        });
        let free = |j: usize| {
            let claimed_elsewhere = images[j]
                .placement_id
                .as_deref()
                .is_some_and(|id| id != placement.after_item_id && placement_ids.contains(id));
            !used[j] && !claimed_elsewhere
        };
        // Same index first, then the first unclaimed leftover
        let fallback = || {
            (i < images.len() && free(i))
                .then_some(i)
                .or_else(|| (0..images.len()).find(|&j| free(j)))
        };

        if let Some(j) = by_id.or_else(fallback) {
            used[j] = true;
            pairs.push((placement, &images[j]));
        }
    }
    pairs
}
