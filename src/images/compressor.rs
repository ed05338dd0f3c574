//! Image Compressor & Budget Enforcer
//!
//! Resizes generated images to their placement bucket, re-encodes them,
//! and keeps the batch under the richness byte ceiling by dropping the
//! lowest-priority images first.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::join_all;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::constants::compression::{
    QUALITY_FULL, QUALITY_LOW, QUALITY_MINIMUM, QUALITY_REDUCED,
};
use crate::types::utils::log_filter_warn;
use crate::types::{
    CompressedImage, ForgeError, ImageResult, PlacementPurpose, PlacementSize, Result, Richness,
};

/// JPEG quality for a batch of `count` images
pub fn quality_for_count(count: usize) -> u8 {
    match count {
        0..=3 => QUALITY_FULL,
        4..=5 => QUALITY_REDUCED,
        6..=8 => QUALITY_LOW,
        _ => QUALITY_MINIMUM,
    }
}

/// Compress a single image for a size bucket. Placeholders pass through.
pub fn compress_image(
    image: ImageResult,
    size: &PlacementSize,
    quality: u8,
) -> Result<CompressedImage> {
    if image.is_placeholder() {
        return Ok(CompressedImage::passthrough(image));
    }

    let original = BASE64
        .decode(image.base64_data.as_bytes())
        .map_err(|e| ForgeError::ImageApi(format!("Invalid base64 image data: {}", e)))?;
    let original_size = original.len();

    let decoded = image::load_from_memory(&original)?;
    let (max_w, max_h) = size.target_dimensions();
    let resized = if decoded.width() > max_w || decoded.height() > max_h {
        decoded.resize(max_w, max_h, FilterType::Triangle)
    } else {
        decoded
    };

    // Smallest candidate wins; lossless WebP alone would ignore `quality`
    let candidates = [
        (encode_webp(&resized)?, "image/webp"),
        (encode_jpeg(&resized, quality)?, "image/jpeg"),
    ];
    let Some((bytes, media_type)) = candidates
        .into_iter()
        .filter(|(bytes, _)| bytes.len() < original_size)
        .min_by_key(|(bytes, _)| bytes.len())
    else {
        debug!("Re-encoding did not shrink image, keeping original");
        return Ok(CompressedImage {
            original_size,
            compressed_size: original_size,
            compression_ratio: 1.0,
            image,
        });
    };

    let compressed_size = bytes.len();
    Ok(CompressedImage {
        image: ImageResult {
            base64_data: BASE64.encode(&bytes),
            media_type: media_type.to_string(),
            width: resized.width(),
            height: resized.height(),
            placement_id: image.placement_id,
        },
        original_size,
        compressed_size,
        compression_ratio: compressed_size as f64 / original_size.max(1) as f64,
    })
}

fn encode_webp(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.to_rgba8())
        .write_with_encoder(WebPEncoder::new_lossless(&mut bytes))?;
    Ok(bytes)
}

/// JPEG has no alpha channel; transparent pixels are flattened onto white
fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend = |channel: u8| -> u8 {
            (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8
        };
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&DynamicImage::ImageRgb8(flattened))?;
    Ok(bytes)
}

/// Compress a batch concurrently on the blocking pool. `sizes[i]` is the
/// bucket for `images[i]` (medium when absent). Order is preserved; an image
/// that fails to compress is kept as-is.
#[instrument(skip_all, fields(count = images.len()))]
pub async fn compress_images(
    images: Vec<ImageResult>,
    sizes: &[PlacementSize],
) -> Vec<CompressedImage> {
    let quality = quality_for_count(images.len());

    let handles = images.iter().enumerate().map(|(i, image)| {
        let image = image.clone();
        let size = sizes.get(i).cloned().unwrap_or_default();
        tokio::task::spawn_blocking(move || compress_image(image, &size, quality))
    });
    let results = join_all(handles).await;

    let compressed: Vec<CompressedImage> = results
        .into_iter()
        .zip(images)
        .map(|(joined, original)| {
            let context = format!("Compressing image {:?}", original.placement_id);
            log_filter_warn(joined, &context)
                .and_then(|result| log_filter_warn(result, &context))
                .unwrap_or_else(|| CompressedImage::passthrough(original))
        })
        .collect();

    let before: usize = compressed.iter().map(|c| c.original_size).sum();
    let after: usize = compressed.iter().map(|c| c.compressed_size).sum();
    info!(
        "Compressed {} images at quality {}: {} -> {} bytes",
        compressed.len(),
        quality,
        before,
        after
    );
    compressed
}

/// Sum of counted bytes. Placeholders contribute nothing.
pub fn total_bytes(images: &[CompressedImage]) -> usize {
    images
        .iter()
        .filter(|c| !c.image.is_placeholder())
        .map(|c| c.compressed_size)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSizeReport {
    pub valid: bool,
    pub total_bytes: usize,
    pub percent_used: f64,
    pub recommendation: Option<String>,
}

pub fn validate_output_size(images: &[CompressedImage], richness: Richness) -> OutputSizeReport {
    let max = richness.max_total_bytes();
    let total = total_bytes(images);
    let percent_used = total as f64 / max as f64 * 100.0;

    let recommendation = if total > max {
        let counted = images.iter().filter(|c| !c.image.is_placeholder()).count();
        let average = total / counted.max(1);
        let to_drop = (total - max).div_ceil(average.max(1));
        Some(format!(
            "Output is {:.0}% of the {} budget; remove about {} image(s)",
            percent_used, richness, to_drop
        ))
    } else if percent_used >= 80.0 {
        Some(format!(
            "Output is close to the {} budget ({:.0}%)",
            richness, percent_used
        ))
    } else {
        None
    };

    OutputSizeReport {
        valid: total <= max,
        total_bytes: total,
        percent_used,
        recommendation,
    }
}

/// Drop images until the batch fits the richness ceiling: decorative first,
/// then illustrations, then diagrams. Survivors keep their relative order.
pub fn reduce_to_fit_threshold(
    images: Vec<CompressedImage>,
    purposes: &[PlacementPurpose],
    richness: Richness,
) -> Vec<CompressedImage> {
    let max = richness.max_total_bytes();
    let mut total = total_bytes(&images);
    if total <= max {
        return images;
    }

    let priority = |i: usize| purposes.get(i).map(PlacementPurpose::priority).unwrap_or(0);
    let mut candidates: Vec<usize> = (0..images.len())
        .filter(|&i| !images[i].image.is_placeholder())
        .collect();
    candidates.sort_by_key(|&i| priority(i));

    let mut removed = vec![false; images.len()];
    for i in candidates {
        if total <= max {
            break;
        }
        total -= images[i].compressed_size;
        removed[i] = true;
        warn!(
            "Dropping image {:?} ({} bytes) to fit {} budget",
            images[i].image.placement_id, images[i].compressed_size, richness
        );
    }

    images
        .into_iter()
        .zip(removed)
        .filter_map(|(image, gone)| (!gone).then_some(image))
        .collect()
}
