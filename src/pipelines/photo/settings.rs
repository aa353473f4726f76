// SPDX-License-Identifier: GPL-3.0-only

//! One-shot capture settings and the settings a backend resolved them to

use crate::backends::camera::types::{CameraFrame, PhotoOutputCapabilities, PixelFormat};
use crate::constants::capture;
use crate::flash::FlashMode;
use std::path::PathBuf;
use uuid::Uuid;

/// Pixel format and size of the embedded preview image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewFormat {
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
}

/// Describes how a single photo should be captured
///
/// Built fresh for every capture request; never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub unique_id: Uuid,
    /// Bayer format to deliver instead of a processed frame
    pub raw_pixel_format: Option<PixelFormat>,
    /// Where a live-photo clip should be written
    pub live_photo_movie_path: Option<PathBuf>,
    pub high_resolution: bool,
    /// Only set when the output supports the configured mode
    pub flash_mode: Option<FlashMode>,
    pub preview_format: Option<PreviewFormat>,
}

impl CaptureSettings {
    /// Processed capture with no flash, no RAW and no live clip
    pub fn new() -> Self {
        Self {
            unique_id: Uuid::new_v4(),
            raw_pixel_format: None,
            live_photo_movie_path: None,
            high_resolution: false,
            flash_mode: None,
            preview_format: None,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.raw_pixel_format.is_some()
    }

    /// Flash mode the backend should honour (Off when none was requested)
    pub fn effective_flash_mode(&self) -> FlashMode {
        self.flash_mode.unwrap_or(FlashMode::Off)
    }

    /// Check the request against what the output can do
    pub fn validate(&self, caps: &PhotoOutputCapabilities) -> Result<(), String> {
        if let Some(format) = self.raw_pixel_format
            && !caps.raw_pixel_formats.contains(&format)
        {
            return Err(format!("RAW format {} not supported by output", format));
        }
        if self.live_photo_movie_path.is_some() && !caps.live_photo_supported {
            return Err("live photo capture not supported by output".to_string());
        }
        if let Some(mode) = self.flash_mode
            && !caps.supports_flash_mode(mode)
        {
            return Err(format!("flash mode {} not supported by output", mode));
        }
        Ok(())
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings the backend actually applied to a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPhotoSettings {
    pub unique_id: Uuid,
    pub raw: bool,
    pub flash_fired: bool,
    pub high_resolution: bool,
    pub width: u32,
    pub height: u32,
    pub live_photo_movie: Option<PathBuf>,
}

impl ResolvedPhotoSettings {
    /// Echo a request back with the delivered frame size
    pub fn resolve(settings: &CaptureSettings, flash_fired: bool, width: u32, height: u32) -> Self {
        Self {
            unique_id: settings.unique_id,
            raw: settings.is_raw(),
            flash_fired,
            high_resolution: settings.high_resolution,
            width,
            height,
            live_photo_movie: settings.live_photo_movie_path.clone(),
        }
    }
}

/// Downscale a processed frame to the standard width unless high resolution was requested
///
/// RAW frames are sensor data and are never resampled.
pub fn apply_resolution(frame: CameraFrame, settings: &CaptureSettings) -> CameraFrame {
    if settings.high_resolution
        || settings.is_raw()
        || frame.width <= capture::STANDARD_MAX_WIDTH
    {
        return frame;
    }
    let Some(rgba) = frame.to_rgba_image() else {
        return frame;
    };
    let width = capture::STANDARD_MAX_WIDTH;
    let height = ((frame.height as u64 * width as u64) / frame.width as u64).max(1) as u32;
    let scaled = image::imageops::resize(&rgba, width, height, image::imageops::FilterType::Triangle);
    let mut out = CameraFrame::from_rgba(width, height, scaled.into_raw());
    out.captured_at = frame.captured_at;
    out
}

/// Render the preview image requested by `format` from a processed frame
pub fn render_preview(frame: &CameraFrame, format: &PreviewFormat) -> Option<image::RgbaImage> {
    let rgba = frame.to_rgba_image()?;
    if format.width == 0 || format.height == 0 {
        return None;
    }
    Some(image::imageops::thumbnail(&rgba, format.width, format.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> PhotoOutputCapabilities {
        PhotoOutputCapabilities {
            raw_pixel_formats: vec![PixelFormat::BayerRGGB],
            supported_flash_modes: vec![FlashMode::Off, FlashMode::On],
            live_photo_supported: false,
            high_resolution_supported: true,
            preview_pixel_formats: vec![PixelFormat::RGBA],
        }
    }

    #[test]
    fn test_new_settings_have_unique_ids() {
        assert_ne!(CaptureSettings::new().unique_id, CaptureSettings::new().unique_id);
    }

    #[test]
    fn test_validate_rejects_unsupported_requests() {
        let mut settings = CaptureSettings::new();
        assert!(settings.validate(&caps()).is_ok());

        settings.flash_mode = Some(FlashMode::Auto);
        assert!(settings.validate(&caps()).is_err());

        settings.flash_mode = None;
        settings.live_photo_movie_path = Some(PathBuf::from("/tmp/clip"));
        assert!(settings.validate(&caps()).is_err());

        settings.live_photo_movie_path = None;
        settings.raw_pixel_format = Some(PixelFormat::BayerBGGR);
        assert!(settings.validate(&caps()).is_err());
    }

    #[test]
    fn test_standard_resolution_downscales_wide_frames() {
        let frame = CameraFrame::from_rgba(3840, 2, vec![0; 3840 * 2 * 4]);
        let settings = CaptureSettings::new();
        let scaled = apply_resolution(frame, &settings);
        assert_eq!(scaled.width, capture::STANDARD_MAX_WIDTH);
        assert_eq!(scaled.height, 1);
    }

    #[test]
    fn test_high_resolution_keeps_full_frame() {
        let frame = CameraFrame::from_rgba(3840, 2, vec![0; 3840 * 2 * 4]);
        let mut settings = CaptureSettings::new();
        settings.high_resolution = true;
        assert_eq!(apply_resolution(frame, &settings).width, 3840);
    }
}
