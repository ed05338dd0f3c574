//! Plan Model
//!
//! The structured intermediate representation of a worksheet or lesson
//! before rendering. Field names follow the camelCase JSON the language model
//! is asked to emit.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Per-item keys a model sometimes attaches inline; visual cues belong in
/// `visualPlacements` only.
pub const INLINE_VISUAL_KEYS: [&str; 2] = ["visualHint", "imageDescription"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub version: String,
    pub metadata: PlanMetadata,
    pub structure: PlanStructure,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visual_placements: Vec<VisualPlacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_plan: Option<LessonPlanDetails>,
}

impl Plan {
    /// All items across sections, in document order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.structure.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.structure
            .sections
            .iter_mut()
            .flat_map(|s| s.items.iter_mut())
    }

    pub fn question_count(&self) -> usize {
        self.structure.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn item_ids(&self) -> HashSet<&str> {
        self.items().map(|i| i.id.as_str()).collect()
    }

    pub fn find_item(&self, id: &str) -> Option<&Item> {
        self.items().find(|i| i.id == id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanMetadata {
    pub title: String,
    pub grade: String,
    pub subject: String,
    pub topic: String,
    pub objectives: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanStructure {
    pub header: PlanHeader,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanHeader {
    pub title: String,
    pub instructions: String,
    pub include_name: bool,
    pub include_date: bool,
}

impl Default for PlanHeader {
    fn default() -> Self {
        Self {
            title: String::new(),
            instructions: String::new(),
            include_name: true,
            include_date: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(rename = "type", default)]
    pub item_type: ItemType,
    #[serde(default, deserialize_with = "answer_as_string")]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    /// Fields the model emitted that the plan model doesn't know
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn points(&self) -> u32 {
        self.points.unwrap_or(1)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    MultipleChoice,
    #[default]
    ShortAnswer,
    FillInBlank,
    TrueFalse,
    Essay,
    #[serde(other)]
    Other,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::ShortAnswer => "short_answer",
            Self::FillInBlank => "fill_in_blank",
            Self::TrueFalse => "true_false",
            Self::Essay => "essay",
            Self::Other => "other",
        }
    }
}

/// Models answer with strings, numbers, booleans or lists; the plan keeps text.
fn answer_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_answer(&value))
}

pub(crate) fn value_to_answer(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_answer)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

// =============================================================================
// Visual Placements
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisualPlacement {
    #[serde(default)]
    pub after_item_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub purpose: PlacementPurpose,
    #[serde(default)]
    pub size: PlacementSize,
}

/// Why an image is on the page; doubles as its drop priority under budget
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlacementPurpose {
    Diagram,
    #[default]
    Illustration,
    Decorative,
    Unrecognized(String),
}

impl PlacementPurpose {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Lower priority images are dropped first when over budget
    pub fn priority(&self) -> u8 {
        match self {
            Self::Decorative | Self::Unrecognized(_) => 0,
            Self::Illustration => 1,
            Self::Diagram => 2,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Diagram => "diagram",
            Self::Illustration => "illustration",
            Self::Decorative => "decorative",
            Self::Unrecognized(s) => s,
        }
    }
}

impl From<String> for PlacementPurpose {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "diagram" => Self::Diagram,
            "illustration" => Self::Illustration,
            "decorative" | "decoration" => Self::Decorative,
            _ => Self::Unrecognized(s),
        }
    }
}

impl From<PlacementPurpose> for String {
    fn from(p: PlacementPurpose) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for PlacementPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size bucket of a placed image
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlacementSize {
    Small,
    #[default]
    Medium,
    Wide,
    /// Legacy alias of `Medium`, still emitted by older prompts
    Large,
    Unrecognized(String),
}

impl PlacementSize {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Target `(width, height)` box for compression
    pub fn target_dimensions(&self) -> (u32, u32) {
        match self {
            Self::Small => (256, 256),
            Self::Wide => (600, 300),
            Self::Medium | Self::Large | Self::Unrecognized(_) => (400, 300),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Wide => "wide",
            Self::Large => "large",
            Self::Unrecognized(s) => s,
        }
    }
}

impl From<String> for PlacementSize {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "small" => Self::Small,
            "medium" => Self::Medium,
            "wide" => Self::Wide,
            "large" => Self::Large,
            _ => Self::Unrecognized(s),
        }
    }
}

impl From<PlacementSize> for String {
    fn from(s: PlacementSize) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for PlacementSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Lesson Plan
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonPlanDetails {
    pub materials: Vec<String>,
    pub procedure: Vec<LessonStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differentiation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonStep {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
}
