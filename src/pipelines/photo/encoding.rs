// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! - JPEG (with quality control) for processed captures
//! - DNG (linear RGB, uncompressed) for RAW captures
//!
//! Encoding is CPU-bound and runs on a blocking worker.

use super::CapturedImage;
use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::constants::app_info;
use crate::errors::PhotoError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    Jpeg,
    /// DNG format (raw image data)
    Dng,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Dng => "dng",
        }
    }

    /// RAW captures become DNG, everything else JPEG
    pub fn for_capture(raw: bool) -> Self {
        if raw {
            EncodingFormat::Dng
        } else {
            EncodingFormat::Jpeg
        }
    }

    /// `<unique-id>.<ext>`
    pub fn file_name(&self, unique_id: Uuid) -> String {
        format!("{}.{}", unique_id, self.extension())
    }
}

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Camera metadata for DNG encoding
#[derive(Debug, Clone, Default)]
pub struct CameraMetadata {
    /// Camera name (e.g., "Virtual Camera (back)")
    pub camera_name: Option<String>,
    /// Backend that produced the frame (e.g., "PipeWire")
    pub backend: Option<String>,
}

/// Photo encoder
#[derive(Debug, Clone)]
pub struct PhotoEncoder {
    quality: EncodingQuality,
    camera_metadata: CameraMetadata,
}

impl PhotoEncoder {
    /// Create a new encoder with high quality
    pub fn new() -> Self {
        Self {
            quality: EncodingQuality::High,
            camera_metadata: CameraMetadata::default(),
        }
    }

    /// Encoder configured with the given JPEG quality
    pub fn with_quality(quality: EncodingQuality) -> Self {
        Self {
            quality,
            ..Self::new()
        }
    }

    /// Set camera metadata for DNG encoding
    pub fn set_camera_metadata(&mut self, metadata: CameraMetadata) {
        self.camera_metadata = metadata;
    }

    /// Encode a captured frame on the current thread
    pub fn encode_blocking(
        &self,
        frame: &CameraFrame,
        format: EncodingFormat,
        unique_id: Uuid,
    ) -> Result<CapturedImage, PhotoError> {
        let rgb = if frame.format.is_bayer() {
            demosaic_half(frame)
        } else {
            frame
                .to_rgba_image()
                .map(|rgba| image::DynamicImage::ImageRgba8(rgba).to_rgb8())
        };
        let rgb = rgb.ok_or_else(|| PhotoError::EncodingFailed("empty frame".to_string()))?;

        let data = match format {
            EncodingFormat::Jpeg => Self::encode_jpeg(&rgb, self.quality)?,
            EncodingFormat::Dng => Self::encode_dng(&rgb, &self.camera_metadata)?,
        };

        debug!(size = data.len(), "Encoding complete");

        Ok(CapturedImage {
            data: Arc::from(data),
            file_name: format.file_name(unique_id),
            format,
        })
    }

    /// Encode image as JPEG
    fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, PhotoError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.jpeg_quality());

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

        Ok(buffer)
    }

    /// Encode image as DNG
    ///
    /// A simple linear DNG with RGB data stored as a single strip.
    fn encode_dng(image: &RgbImage, camera_metadata: &CameraMetadata) -> Result<Vec<u8>, PhotoError> {
        use dng::ifd::{Ifd, IfdValue, Offsets};
        use dng::tags::ifd as tiff_tags;
        use dng::{DngWriter, FileType};
        use std::io::{Cursor, Write};

        let (width, height) = image.dimensions();
        let raw_data = image.as_raw().clone();
        let raw_data_len = raw_data.len() as u32;

        let mut ifd = Ifd::default();

        ifd.insert(tiff_tags::ImageWidth, IfdValue::Long(width));
        ifd.insert(tiff_tags::ImageLength, IfdValue::Long(height));
        ifd.insert(
            tiff_tags::BitsPerSample,
            IfdValue::List(vec![
                IfdValue::Short(8),
                IfdValue::Short(8),
                IfdValue::Short(8),
            ]),
        );
        ifd.insert(tiff_tags::Compression, IfdValue::Short(1)); // No compression
        ifd.insert(tiff_tags::PhotometricInterpretation, IfdValue::Short(2)); // RGB
        ifd.insert(tiff_tags::SamplesPerPixel, IfdValue::Short(3));
        ifd.insert(tiff_tags::RowsPerStrip, IfdValue::Long(height)); // One strip
        ifd.insert(tiff_tags::PlanarConfiguration, IfdValue::Short(1)); // Chunky (RGBRGB...)
        ifd.insert(
            tiff_tags::Software,
            IfdValue::Ascii(format!("PhotoShot v{}", app_info::version())),
        );

        if let Some(camera_name) = &camera_metadata.camera_name {
            ifd.insert(tiff_tags::Make, IfdValue::Ascii(camera_name.clone()));
            let model = match &camera_metadata.backend {
                Some(backend) => format!("{} ({})", camera_name, backend),
                None => camera_name.clone(),
            };
            ifd.insert(tiff_tags::Model, IfdValue::Ascii(model));
        }

        struct RgbOffsets {
            data: Vec<u8>,
        }

        impl Offsets for RgbOffsets {
            fn size(&self) -> u32 {
                self.data.len() as u32
            }

            fn write(&self, writer: &mut dyn Write) -> std::io::Result<()> {
                writer.write_all(&self.data)
            }
        }

        let offsets: Arc<dyn Offsets + Send + Sync> = Arc::new(RgbOffsets { data: raw_data });
        ifd.insert(tiff_tags::StripOffsets, IfdValue::Offsets(offsets));
        ifd.insert(tiff_tags::StripByteCounts, IfdValue::Long(raw_data_len));

        let mut buffer = Vec::new();
        let cursor = Cursor::new(&mut buffer);

        DngWriter::write_dng(cursor, true, FileType::Dng, vec![ifd])
            .map_err(|e| PhotoError::EncodingFailed(format!("DNG encoding failed: {:?}", e)))?;

        Ok(buffer)
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse each 2x2 Bayer cell into one RGB pixel
fn demosaic_half(frame: &CameraFrame) -> Option<RgbImage> {
    let (width, height) = (frame.width / 2, frame.height / 2);
    if width == 0 || height == 0 {
        return None;
    }
    // Channel of (even row, even col), (even, odd), (odd, even), (odd, odd)
    let cfa: [usize; 4] = match frame.format {
        PixelFormat::BayerBGGR => [2, 1, 1, 0],
        PixelFormat::BayerGRBG => [1, 0, 2, 1],
        PixelFormat::BayerGBRG => [1, 2, 0, 1],
        _ => [0, 1, 1, 2],
    };
    let data: &[u8] = &frame.data;
    let stride = frame.stride as usize;

    Some(RgbImage::from_fn(width, height, |x, y| {
        let mut sum = [0u16; 3];
        let mut count = [0u16; 3];
        for site in 0..4usize {
            let sx = (x * 2) as usize + (site % 2);
            let sy = (y * 2) as usize + (site / 2);
            let value = data.get(sy * stride + sx).copied().unwrap_or(0);
            sum[cfa[site]] += value as u16;
            count[cfa[site]] += 1;
        }
        image::Rgb(std::array::from_fn(|c| (sum[c] / count[c].max(1)) as u8))
    }))
}
