//! Convert decoded batch products into viewable 8-bit images.

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::foundation::error::{OrrbError, OrrbResult};

/// Categories representable by the 3-bit segmentation palette.
pub const PALETTE_CATEGORIES: usize = 8;

fn check_len(what: &str, got: usize, width: u32, height: u32, channels: usize) -> OrrbResult<()> {
    let want = width as usize * height as usize * channels;
    if got != want {
        return Err(OrrbError::validation(format!(
            "{what}: expected {want} values for {width}x{height}x{channels}, got {got}"
        )));
    }
    Ok(())
}

/// Wrap packed RGB8 or RGBA8 pixels.
pub fn color_image(data: &[u8], width: u32, height: u32, channels: usize) -> OrrbResult<DynamicImage> {
    check_len("color", data.len(), width, height, channels)?;
    let img = match channels {
        3 => RgbImage::from_raw(width, height, data.to_vec()).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(width, height, data.to_vec()).map(DynamicImage::ImageRgba8),
        _ => None,
    };
    img.ok_or_else(|| OrrbError::validation(format!("unsupported colour channels: {channels}")))
}

/// Depth as grey: `depth / max_depth`, clamped to `[0, 1]`.
pub fn depth_to_rgb(depth: &[f32], width: u32, height: u32, max_depth: f32) -> OrrbResult<RgbImage> {
    check_len("depth", depth.len(), width, height, 1)?;
    if max_depth.is_nan() || max_depth <= 0.0 {
        return Err(OrrbError::validation("max_depth must be > 0"));
    }
    let bytes = depth
        .iter()
        .flat_map(|d| {
            let g = to_u8(d / max_depth);
            [g, g, g]
        })
        .collect();
    RgbImage::from_raw(width, height, bytes)
        .ok_or_else(|| OrrbError::validation("depth image buffer size"))
}

/// Normals already remapped to `[0, 1]`, scaled to bytes.
pub fn normals_to_rgb(normals: &[f32], width: u32, height: u32) -> OrrbResult<RgbImage> {
    check_len("normals", normals.len(), width, height, 3)?;
    let bytes = normals.iter().map(|n| to_u8(*n)).collect();
    RgbImage::from_raw(width, height, bytes)
        .ok_or_else(|| OrrbError::validation("normals image buffer size"))
}

/// Category ids mapped to the 8 extreme colours: bit 0 is red, bit 1 green, bit 2 blue.
///
/// Fails when the image holds [`PALETTE_CATEGORIES`] or more categories.
pub fn segmentation_to_rgb(ids: &[u8], width: u32, height: u32) -> OrrbResult<RgbImage> {
    check_len("segmentation", ids.len(), width, height, 1)?;
    let categories = ids.iter().copied().max().map_or(0, |m| usize::from(m) + 1);
    if categories >= PALETTE_CATEGORIES {
        return Err(OrrbError::validation(format!(
            "only {PALETTE_CATEGORIES} categories supported, got {categories}"
        )));
    }
    let bytes = ids
        .iter()
        .flat_map(|&id| [0u8, 1, 2].map(|bit| ((id >> bit) & 1) * 255))
        .collect();
    RgbImage::from_raw(width, height, bytes)
        .ok_or_else(|| OrrbError::validation("segmentation image buffer size"))
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/client/visualize.rs"]
mod tests;
