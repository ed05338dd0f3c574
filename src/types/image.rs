//! Image Request/Result Types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::plan::PlacementSize;

/// Sentinel prefix marking a synthetic stand-in image
pub const PLACEHOLDER_PREFIX: &str = "placeholder:";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStyle {
    #[default]
    Educational,
    Cartoon,
    Realistic,
    Watercolor,
    Diagram,
    /// Simplified flat style used as the last resort before a placeholder
    SimpleIcons,
}

impl ImageStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Educational => "educational",
            Self::Cartoon => "cartoon",
            Self::Realistic => "realistic",
            Self::Watercolor => "watercolor",
            Self::Diagram => "diagram",
            Self::SimpleIcons => "simple_icons",
        }
    }

    /// Style phrase appended to generation prompts
    pub fn prompt_hint(&self) -> &'static str {
        match self {
            Self::Educational => "clean educational illustration, friendly colors, white background",
            Self::Cartoon => "cartoon style, bold outlines, bright colors",
            Self::Realistic => "realistic, natural lighting",
            Self::Watercolor => "soft watercolor illustration",
            Self::Diagram => "labeled diagram, clear lines, minimal color",
            Self::SimpleIcons => "simple flat icon, minimal detail, solid shapes",
        }
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImageStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "educational" => Ok(Self::Educational),
            "cartoon" => Ok(Self::Cartoon),
            "realistic" => Ok(Self::Realistic),
            "watercolor" => Ok(Self::Watercolor),
            "diagram" => Ok(Self::Diagram),
            "simple_icons" => Ok(Self::SimpleIcons),
            _ => Err(format!(
                "Unknown image style: {}. Valid values: educational, cartoon, realistic, watercolor, diagram, simple_icons",
                s
            )),
        }
    }
}

/// One image to produce for one placement
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Full prompt sent to the provider
    pub prompt: String,
    /// Placement description (semantic part of the cache key)
    pub description: String,
    pub style: ImageStyle,
    pub size: PlacementSize,
    pub placement_id: String,
}

/// Shared request-level attributes that make up the rest of the cache key
#[derive(Debug, Clone, Default)]
pub struct ImageContext {
    pub grade: String,
    pub subject: String,
    pub theme: Option<String>,
}

/// Raw provider output before placement tagging
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub base64_data: String,
    pub media_type: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub base64_data: String,
    pub media_type: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_id: Option<String>,
}

impl ImageResult {
    pub fn from_generated(image: GeneratedImage, placement_id: impl Into<String>) -> Self {
        Self {
            base64_data: image.base64_data,
            media_type: image.media_type,
            width: image.width,
            height: image.height,
            placement_id: Some(placement_id.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.base64_data.starts_with(PLACEHOLDER_PREFIX)
    }

    /// Decoded byte size estimated from the base64 length
    pub fn approx_bytes(&self) -> usize {
        if self.is_placeholder() {
            return 0;
        }
        self.base64_data.len() / 4 * 3
    }

    /// `src` attribute value for an `<img>` element
    pub fn data_uri(&self) -> String {
        match self.base64_data.strip_prefix(PLACEHOLDER_PREFIX) {
            Some(payload) => format!("data:{};base64,{}", self.media_type, payload),
            None => format!("data:{};base64,{}", self.media_type, self.base64_data),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    pub image: ImageResult,
    pub original_size: usize,
    pub compressed_size: usize,
    pub compression_ratio: f64,
}

impl CompressedImage {
    /// Pass an image through without re-encoding
    pub fn passthrough(image: ImageResult) -> Self {
        let size = image.approx_bytes();
        Self {
            image,
            original_size: size,
            compressed_size: size,
            compression_ratio: 1.0,
        }
    }
}
