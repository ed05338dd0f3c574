//! Shared string and result helpers.

use std::fmt::Display;

/// Capitalize the first character of a string.
#[inline]
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// First `max_chars` characters, with an ellipsis when anything was cut.
/// Never splits a UTF-8 sequence.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    match trimmed.char_indices().nth(max_chars) {
        None => trimmed.to_string(),
        Some((byte_idx, _)) => format!("{}...", trimmed[..byte_idx].trim_end()),
    }
}

/// Truncate long source text, preferring a paragraph then a line boundary.
pub fn truncate_at_boundary(content: &str, max_chars: usize) -> String {
    let Some((cut, _)) = content.char_indices().nth(max_chars) else {
        return content.to_string();
    };
    let head = &content[..cut];

    let end = head
        .rfind("\n\n")
        .or_else(|| head.rfind('\n'))
        .unwrap_or(cut);

    format!("{}\n[... truncated]", head[..end].trim_end())
}

/// Log and discard an error. For batch steps where one bad element must not
/// sink the whole batch.
pub fn log_filter_warn<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}: {}", context, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("math"), "Math");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("a cat on a mat", 5), "a cat...");
        assert_eq!(truncate_chars("日本語のテキスト", 3), "日本語...");
    }

    #[test]
    fn test_truncate_at_boundary_prefers_paragraph() {
        let text = "first paragraph\n\nsecond paragraph that is long";
        let out = truncate_at_boundary(text, 25);
        assert!(out.starts_with("first paragraph\n[... truncated]"));
        assert_eq!(truncate_at_boundary("tiny", 100), "tiny");
    }

    #[test]
    fn test_log_filter_warn() {
        let ok: Result<u8, String> = Ok(1);
        let err: Result<u8, String> = Err("bad".into());
        assert_eq!(log_filter_warn(ok, "ctx"), Some(1));
        assert_eq!(log_filter_warn(err, "ctx"), None);
    }
}
