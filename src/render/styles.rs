//! Inline stylesheet shared by every rendered document.

use crate::types::PlacementSize;

pub const INLINE_CSS: &str = r#"
body { font-family: Georgia, "Times New Roman", serif; color: #222; background: #fff; margin: 0; }
.page { max-width: 800px; margin: 0 auto; padding: 32px; }
h1 { font-size: 1.8em; margin: 0 0 8px; }
h2 { font-size: 1.3em; border-bottom: 1px solid #ccc; padding-bottom: 4px; margin-top: 28px; }
.student-info { display: flex; gap: 32px; margin: 12px 0; }
.student-info span { flex: 1; border-bottom: 1px solid #444; padding-bottom: 2px; }
.instructions, .section-instructions { font-style: italic; color: #444; }
.question { margin: 18px 0; page-break-inside: avoid; }
.question-number { font-weight: bold; margin-right: 6px; }
.options { list-style: none; padding-left: 24px; }
.options li { margin: 4px 0; }
.option-letter { font-weight: bold; margin-right: 6px; }
.answer-line { border-bottom: 1px solid #888; height: 28px; margin: 8px 0 0 24px; }
.answer-box { border: 1px solid #888; height: 120px; margin: 8px 0 0 24px; }
.true-false { padding-left: 24px; }
figure.visual { margin: 16px 0; text-align: center; }
.img-small { max-width: 150px; max-height: 150px; }
.img-medium { max-width: 300px; max-height: 300px; }
.img-wide { width: 100%; max-height: 250px; object-fit: contain; }
.img-large { max-width: 300px; max-height: 300px; }
.img-unknown { max-width: 300px; max-height: 300px; }
.answer-item { margin: 10px 0; }
.answer { font-weight: bold; }
.points { color: #555; font-size: 0.9em; margin-left: 6px; }
.explanation { margin: 4px 0 0 24px; color: #444; }
.total-points { font-weight: bold; margin-top: 20px; }
table.scoring { border-collapse: collapse; margin-top: 12px; }
table.scoring th, table.scoring td { border: 1px solid #999; padding: 4px 12px; text-align: left; }
.lesson-meta { color: #444; }
.step-minutes { color: #555; font-size: 0.9em; }
@media print {
  body { font-size: 12pt; }
  .page { max-width: none; padding: 0; }
  .question, figure.visual { page-break-inside: avoid; }
  a { color: inherit; text-decoration: none; }
}
"#;

/// CSS class for an image in a size bucket. Unrecognized sizes get a
/// dedicated class instead of failing.
pub fn size_class(size: &PlacementSize) -> &'static str {
    match size {
        PlacementSize::Small => "img-small",
        PlacementSize::Medium => "img-medium",
        PlacementSize::Wide => "img-wide",
        PlacementSize::Large => "img-large",
        PlacementSize::Unrecognized(_) => "img-unknown",
    }
}
