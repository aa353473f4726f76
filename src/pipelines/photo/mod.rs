// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! ```text
//! CaptureSession::capture_photo ─▶ Encoding (JPEG | DNG) ─▶ CapturedImage
//!                                        └──▶ Thumbnail (rotated 90°)
//! ```
//!
//! Preview continues uninterrupted; encoding and thumbnailing run on a
//! blocking worker.

pub mod encoding;
pub mod settings;
pub mod thumbnail;

pub use encoding::{CameraMetadata, EncodingFormat, EncodingQuality, PhotoEncoder};
pub use settings::{CaptureSettings, PreviewFormat, ResolvedPhotoSettings};

use crate::backends::camera::types::CapturedPhoto;
use crate::errors::PhotoError;
use image::RgbaImage;
use std::sync::Arc;

/// An encoded photo ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub data: Arc<[u8]>,
    /// `<unique-capture-id>.jpg` or `.dng`
    pub file_name: String,
    pub format: EncodingFormat,
}

/// Output of the pipeline for one capture
#[derive(Debug, Clone)]
pub struct ProcessedCapture {
    pub image: CapturedImage,
    pub thumbnail: Option<RgbaImage>,
    pub resolved: ResolvedPhotoSettings,
}

/// Turns backend captures into encoded images and thumbnails
#[derive(Debug, Clone, Default)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    pub fn new(encoder: PhotoEncoder) -> Self {
        Self { encoder }
    }

    pub fn encoder_mut(&mut self) -> &mut PhotoEncoder {
        &mut self.encoder
    }

    /// Encode a capture and render its thumbnail on a blocking worker
    pub async fn process(&self, photo: CapturedPhoto) -> Result<ProcessedCapture, PhotoError> {
        let encoder = self.encoder.clone();
        tokio::task::spawn_blocking(move || {
            let format = EncodingFormat::for_capture(photo.resolved.raw);
            let image = encoder.encode_blocking(&photo.frame, format, photo.resolved.unique_id)?;
            let thumbnail = thumbnail::thumbnail_for(&photo, &image);
            Ok(ProcessedCapture {
                image,
                thumbnail,
                resolved: photo.resolved,
            })
        })
        .await
        .map_err(|e| PhotoError::EncodingFailed(format!("Processing task error: {}", e)))?
    }
}
