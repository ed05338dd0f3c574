//! Model JSON Decoding
//!
//! Two-stage decode for JSON emitted by a language model:
//!
//! 1. Strip a surrounding markdown code fence, then parse strictly.
//! 2. On failure, scan for the first balanced `{...}` object and parse that.
//!
//! Anything else is a [`JsonDecodeError`]. No partial structures are
//! accepted: a truncated or malformed object fails rather than being patched.

use serde_json::Value;
use tracing::debug;

/// Final decode failure, carrying a short preview of the offending text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonDecodeError {
    pub preview: String,
}

impl std::fmt::Display for JsonDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no decodable JSON object in response: {}...", self.preview)
    }
}

impl std::error::Error for JsonDecodeError {}

/// Decode a JSON object from raw model output
pub fn decode_model_json(raw: &str) -> Result<Value, JsonDecodeError> {
    let cleaned = strip_code_fences(raw.trim().trim_start_matches('\u{feff}'));

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return Ok(value);
    }

    debug!("Strict JSON parse failed, scanning for a balanced object");

    if let Some(candidate) = find_balanced_object(cleaned)
        && let Ok(value) = serde_json::from_str::<Value>(candidate)
    {
        return Ok(value);
    }

    Err(JsonDecodeError {
        preview: cleaned.chars().take(200).collect(),
    })
}

/// Remove a leading ```` ```lang ```` line and a trailing ```` ``` ````
pub fn strip_code_fences(s: &str) -> &str {
    let mut result = s.trim();

    if result.starts_with("```") {
        result = match result.find('\n') {
            Some(first_newline) => &result[first_newline + 1..],
            None => result.trim_start_matches('`'),
        };
    }

    if let Some(stripped) = result.trim_end().strip_suffix("```") {
        result = stripped;
    }

    result.trim()
}

/// First `{...}` substring whose braces balance, ignoring braces in strings
pub fn find_balanced_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
