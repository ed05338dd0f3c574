//! Placeholder images.
//!
//! Inline SVG stand-ins for images that could not be generated. The data is
//! tagged with [`PLACEHOLDER_PREFIX`] so billing and size accounting skip it.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::constants::images::PLACEHOLDER_DESCRIPTION_CHARS;
use crate::render::escape_html;
use crate::types::utils::truncate_chars;
use crate::types::{ImageResult, PLACEHOLDER_PREFIX, PlacementSize};

pub const PLACEHOLDER_MEDIA_TYPE: &str = "image/svg+xml";

/// Deterministic placeholder for a placement
pub fn create_placeholder(
    description: &str,
    size: &PlacementSize,
    placement_id: &str,
) -> ImageResult {
    let (width, height) = size.target_dimensions();
    let label = escape_html(&truncate_chars(description, PLACEHOLDER_DESCRIPTION_CHARS));

    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect x="1" y="1" width="{rw}" height="{rh}" fill="#f4f4f4" stroke="#999" stroke-width="2" stroke-dasharray="8 4"/><text x="50%" y="45%" text-anchor="middle" font-family="sans-serif" font-size="14" fill="#555">Image unavailable</text><text x="50%" y="60%" text-anchor="middle" font-family="sans-serif" font-size="12" fill="#777">{label}</text></svg>"##,
        w = width,
        h = height,
        rw = width.saturating_sub(2),
        rh = height.saturating_sub(2),
        label = label,
    );

    ImageResult {
        base64_data: format!("{}{}", PLACEHOLDER_PREFIX, BASE64.encode(svg)),
        media_type: PLACEHOLDER_MEDIA_TYPE.to_string(),
        width,
        height,
        placement_id: Some(placement_id.to_string()),
    }
}
