// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::flash::FlashMode;
use crate::pipelines::photo::settings::ResolvedPhotoSettings;
use futures::future::BoxFuture;
use gstreamer::buffer::{MappedBuffer, Readable};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Frame data storage - either pre-copied bytes or zero-copy GStreamer buffer
///
/// The `Mapped` variant keeps the GStreamer buffer mapped and alive until all
/// references are dropped.
#[derive(Clone)]
pub enum FrameData {
    /// Pre-copied bytes (photo capture, synthetic frames, tests)
    Copied(Arc<[u8]>),
    /// Zero-copy mapped GStreamer buffer
    Mapped(Arc<MappedBuffer<Readable>>),
}

impl FrameData {
    /// Create FrameData from a mapped GStreamer buffer (zero-copy)
    pub fn from_mapped_buffer(buffer: MappedBuffer<Readable>) -> Self {
        FrameData::Mapped(Arc::new(buffer))
    }

    pub fn len(&self) -> usize {
        self.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for FrameData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameData::Copied(data) => write!(f, "FrameData::Copied({} bytes)", data.len()),
            FrameData::Mapped(buf) => write!(f, "FrameData::Mapped({} bytes)", buf.len()),
        }
    }
}

impl AsRef<[u8]> for FrameData {
    fn as_ref(&self) -> &[u8] {
        match self {
            FrameData::Copied(data) => data.as_ref(),
            FrameData::Mapped(buf) => buf.as_slice(),
        }
    }
}

impl std::ops::Deref for FrameData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_ref()
    }
}

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// PipeWire backend (modern Linux standard)
    #[default]
    PipeWire,
    /// Synthetic test-pattern camera
    Virtual,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::PipeWire => write!(f, "PipeWire"),
            CameraBackendType::Virtual => write!(f, "virtual"),
        }
    }
}

/// Which side of the device a camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Front,
    #[default]
    Back,
}

impl CameraFacing {
    /// The opposite facing
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Front => CameraFacing::Back,
            CameraFacing::Back => CameraFacing::Front,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CameraFacing::Front => "front",
            CameraFacing::Back => "back",
        }
    }

    /// Map a libcamera location ("front", "back", "external") to a facing
    ///
    /// External cameras have no facing.
    pub fn from_location(location: &str) -> Option<Self> {
        match location.trim().to_ascii_lowercase().as_str() {
            "front" => Some(CameraFacing::Front),
            "back" | "rear" => Some(CameraFacing::Back),
            _ => None,
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CameraFacing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_location(s).ok_or_else(|| format!("unknown camera facing '{}'", s))
    }
}

/// Kind of camera device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    /// Built-in wide-angle camera (phone/laptop sensor)
    #[default]
    BuiltInWideAngle,
    /// USB or other external camera
    External,
}

/// Session preset choosing the capture format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionPreset {
    /// Largest available resolution, for stills
    #[default]
    Photo,
    /// Resolution closest to VGA, for a light preview
    Preview,
}

/// Sensor rotation in degrees (clockwise)
///
/// The rotation value comes from libcamera's `api.libcamera.rotation`
/// property in PipeWire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    #[default]
    None,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    /// Parse rotation from a string value (degrees)
    pub fn from_degrees(degrees: &str) -> Self {
        degrees
            .trim()
            .parse::<i32>()
            .map(Self::from_degrees_int)
            .unwrap_or_default()
    }

    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Represents a camera device
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,                  // Path to capture device (pipewire node serial)
    pub metadata_path: Option<String>, // PipeWire node ID for format enumeration
    pub device_type: DeviceType,
    pub facing: Option<CameraFacing>, // None when the device reports no location
    pub rotation: SensorRotation,
}

/// Framerate as a fraction (numerator/denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    /// Create a framerate from an integer (e.g., 30 becomes 30/1)
    pub fn from_int(fps: u32) -> Self {
        Self { num: fps, denom: 1 }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.denom as f64
    }

    /// Format as GStreamer fraction string (e.g., "60000/1001")
    pub fn as_gst_fraction(&self) -> String {
        format!("{}/{}", self.num, self.denom)
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denom != 1 {
            write!(f, "{:.2}", self.as_f64())
        } else {
            write!(f, "{}", self.num)
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self { num: 30, denom: 1 }
    }
}

/// Camera format (resolution, framerate, pixel format)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<Framerate>,
    pub pixel_format: String, // FourCC / GStreamer name (e.g., "YUY2", "MJPG", "rggb")
}

impl CameraFormat {
    pub fn pixel_count(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Whether this format delivers raw Bayer sensor data
    pub fn is_bayer(&self) -> bool {
        PixelFormat::from_gst_format(&self.pixel_format).is_some_and(|f| f.is_bayer())
    }
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = &self.framerate {
            write!(f, "{}x{} @ {}fps", self.width, self.height, fps)
        } else {
            write!(f, "{}x{}", self.width, self.height)
        }
    }
}

/// Pixel format for camera frames and capture requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel), the canonical frame format
    RGBA,
    /// BGRA - 32-bit with alpha (B G R A byte order)
    BGRA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
    /// RGGB Bayer pattern
    BayerRGGB,
    /// BGGR Bayer pattern
    BayerBGGR,
    /// GRBG Bayer pattern
    BayerGRBG,
    /// GBRG Bayer pattern
    BayerGBRG,
}

impl PixelFormat {
    /// Check if this format is a raw Bayer pattern
    pub fn is_bayer(&self) -> bool {
        matches!(
            self,
            Self::BayerRGGB | Self::BayerBGGR | Self::BayerGRBG | Self::BayerGBRG
        )
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::RGBA | Self::BGRA => 4,
            Self::RGB24 => 3,
            Self::Gray8 => 1,
            Self::BayerRGGB | Self::BayerBGGR | Self::BayerGRBG | Self::BayerGBRG => 1,
        }
    }

    /// Parse format from GStreamer format string
    pub fn from_gst_format(format: &str) -> Option<Self> {
        match format {
            "RGBA" | "RGBx" => Some(Self::RGBA),
            "BGRA" | "BGRx" => Some(Self::BGRA),
            "RGB" => Some(Self::RGB24),
            "GRAY8" | "GREY" | "Y8" => Some(Self::Gray8),
            "rggb" | "RGGB" => Some(Self::BayerRGGB),
            "bggr" | "BGGR" => Some(Self::BayerBGGR),
            "grbg" | "GRBG" => Some(Self::BayerGRBG),
            "gbrg" | "GBRG" => Some(Self::BayerGBRG),
            _ => None,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RGBA => "RGBA",
            Self::BGRA => "BGRA",
            Self::RGB24 => "RGB",
            Self::Gray8 => "GRAY8",
            Self::BayerRGGB => "RGGB",
            Self::BayerBGGR => "BGGR",
            Self::BayerGRBG => "GRBG",
            Self::BayerGBRG => "GBRG",
        };
        f.write_str(name)
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: FrameData,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride (bytes per row, may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build an RGBA frame from tightly packed pixels
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: FrameData::Copied(Arc::from(pixels)),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// Convert to a frame with copied data (safe for background processing)
    ///
    /// Mapped GStreamer buffers become invalid when the pipeline is destroyed.
    pub fn to_copied(&self) -> Self {
        let data = match &self.data {
            FrameData::Copied(data) => FrameData::Copied(Arc::clone(data)),
            FrameData::Mapped(buffer) => {
                let slice: &[u8] = buffer.as_ref();
                FrameData::Copied(Arc::from(slice))
            }
        };
        Self {
            data,
            ..self.clone()
        }
    }

    /// Pixel value (r, g, b) at the given position, format-aware
    pub fn pixel_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let bpp = self.format.bytes_per_pixel() as usize;
        let offset = y as usize * self.stride as usize + x as usize * bpp;
        let data: &[u8] = &self.data;
        if offset + bpp > data.len() {
            return (0, 0, 0);
        }
        match self.format {
            PixelFormat::RGBA | PixelFormat::RGB24 => {
                (data[offset], data[offset + 1], data[offset + 2])
            }
            PixelFormat::BGRA => (data[offset + 2], data[offset + 1], data[offset]),
            // Sensor data is shown as its intensity
            _ => (data[offset], data[offset], data[offset]),
        }
    }

    /// Tightly packed RGBA copy of the frame
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        if self.format == PixelFormat::RGBA && self.stride == self.width * 4 {
            return RgbaImage::from_raw(self.width, self.height, self.data.to_vec());
        }
        let mut pixels = Vec::with_capacity((self.width * self.height * 4) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let (r, g, b) = self.pixel_at(x, y);
                pixels.extend_from_slice(&[r, g, b, 255]);
            }
        }
        RgbaImage::from_raw(self.width, self.height, pixels)
    }

    /// Mean luma (BT.601, 0-255) sampled on a coarse grid
    pub fn mean_luma(&self) -> Option<f32> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let step_x = (self.width / 32).max(1);
        let step_y = (self.height / 32).max(1);
        let mut total = 0.0f32;
        let mut count = 0u32;
        for y in (0..self.height).step_by(step_y as usize) {
            for x in (0..self.width).step_by(step_x as usize) {
                let (r, g, b) = self.pixel_at(x, y);
                total += 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
                count += 1;
            }
        }
        Some(total / count as f32)
    }
}

/// What a session's photo output can do
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhotoOutputCapabilities {
    /// RAW pixel formats the output can deliver (empty = no RAW)
    pub raw_pixel_formats: Vec<PixelFormat>,
    /// Flash modes the output accepts in capture settings
    pub supported_flash_modes: Vec<FlashMode>,
    pub live_photo_supported: bool,
    pub high_resolution_supported: bool,
    /// Pixel formats available for the embedded preview image
    pub preview_pixel_formats: Vec<PixelFormat>,
}

impl PhotoOutputCapabilities {
    pub fn supports_flash_mode(&self, mode: FlashMode) -> bool {
        self.supported_flash_modes.contains(&mode)
    }

    pub fn supports_raw(&self) -> bool {
        !self.raw_pixel_formats.is_empty()
    }
}

/// Result of a single capture request
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    /// Full frame (RGBA, or Bayer data when RAW was requested)
    pub frame: CameraFrame,
    /// Downscaled preview image when a preview format was requested
    pub preview: Option<RgbaImage>,
    /// Settings the backend actually applied
    pub resolved: ResolvedPhotoSettings,
}

/// Handle for an outstanding capture; resolves exactly once
pub type PhotoRequest = BoxFuture<'static, BackendResult<CapturedPhoto>>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Format not supported
    FormatNotSupported(String),
    /// Session was asked to capture while stopped
    SessionNotRunning,
    /// Capture did not produce a photo
    CaptureFailed(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::SessionNotRunning => write!(f, "Capture session is not running"),
            BackendError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_toggle_and_location() {
        assert_eq!(CameraFacing::Back.toggled(), CameraFacing::Front);
        assert_eq!(CameraFacing::Front.toggled(), CameraFacing::Back);
        assert_eq!(CameraFacing::from_location("front"), Some(CameraFacing::Front));
        assert_eq!(CameraFacing::from_location("Back"), Some(CameraFacing::Back));
        assert_eq!(CameraFacing::from_location("external"), None);
    }

    #[test]
    fn test_rotation_parsing() {
        assert_eq!(SensorRotation::from_degrees("90"), SensorRotation::Rotate90);
        assert_eq!(SensorRotation::from_degrees("-90"), SensorRotation::Rotate270);
        assert_eq!(SensorRotation::from_degrees("junk"), SensorRotation::None);
    }

    #[test]
    fn test_bayer_format_detection() {
        let format = CameraFormat {
            width: 640,
            height: 480,
            framerate: None,
            pixel_format: "rggb".to_string(),
        };
        assert!(format.is_bayer());
        assert!(!PixelFormat::RGBA.is_bayer());
    }

    #[test]
    fn test_mean_luma_of_uniform_frame() {
        let frame = CameraFrame::from_rgba(4, 4, vec![100; 64]);
        let luma = frame.mean_luma().unwrap();
        assert!((luma - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_bgra_frame_converts_to_rgba() {
        let mut frame = CameraFrame::from_rgba(1, 1, vec![1, 2, 3, 255]);
        frame.format = PixelFormat::BGRA;
        let image = frame.to_rgba_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [3, 2, 1, 255]);
    }
}
