// SPDX-License-Identifier: GPL-3.0-only

//! Thumbnail for the captured-image button
//!
//! The source is, in order of preference, the backend's embedded preview,
//! the decoded JPEG, or the captured frame itself (DNG can't be decoded by
//! the `image` crate). Sensors are mounted sideways, so the result is
//! rotated 90° clockwise.

use super::CapturedImage;
use super::encoding::EncodingFormat;
use crate::backends::camera::types::CapturedPhoto;
use crate::constants::ui;
use image::RgbaImage;
use tracing::debug;

/// Build the rotated, downscaled thumbnail for a capture
pub fn thumbnail_for(photo: &CapturedPhoto, encoded: &CapturedImage) -> Option<RgbaImage> {
    let source = photo
        .preview
        .clone()
        .or_else(|| decode(encoded))
        .or_else(|| photo.frame.to_rgba_image())?;
    Some(orient_and_scale(&source, ui::THUMBNAIL_MAX_PIXELS))
}

fn decode(encoded: &CapturedImage) -> Option<RgbaImage> {
    if encoded.format != EncodingFormat::Jpeg {
        return None;
    }
    match image::load_from_memory(&encoded.data) {
        Ok(img) => Some(img.to_rgba8()),
        Err(e) => {
            debug!(error = %e, "Could not decode captured image for thumbnail");
            None
        }
    }
}

/// Rotate 90° clockwise and fit within `max_edge` pixels
pub fn orient_and_scale(image: &RgbaImage, max_edge: u32) -> RgbaImage {
    let rotated = image::imageops::rotate90(image);
    let (width, height) = rotated.dimensions();
    if width <= max_edge && height <= max_edge {
        return rotated;
    }
    let scale = max_edge as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * scale).round() as u32).max(1);
    let new_height = ((height as f32 * scale).round() as u32).max(1);
    image::imageops::thumbnail(&rotated, new_width, new_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_swaps_dimensions() {
        let image = RgbaImage::new(40, 10);
        let thumb = orient_and_scale(&image, 320);
        assert_eq!(thumb.dimensions(), (10, 40));
    }

    #[test]
    fn test_rotation_is_clockwise() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        let thumb = orient_and_scale(&image, 320);
        // Left pixel of a landscape row ends up at the top
        assert_eq!(thumb.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_large_images_are_scaled_down() {
        let image = RgbaImage::new(1280, 960);
        let thumb = orient_and_scale(&image, 320);
        assert_eq!(thumb.dimensions(), (240, 320));
    }
}
