// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! A synthetic camera with a front and a back device that render scrolling
//! colour bars. Its photo output capabilities are configurable so the
//! controller can be exercised without hardware: RAW formats, live photos,
//! flash modes and forced capture failures.

mod pattern;

pub use pattern::{bayer_mosaic, color_bars, frame_from_image};

use super::types::*;
use super::{CameraBackend, CaptureSession};
use crate::constants::capture;
use crate::flash::FlashMode;
use crate::pipelines::photo::settings::{
    CaptureSettings, ResolvedPhotoSettings, apply_resolution, render_preview,
};
use futures::FutureExt;
use image::codecs::gif::GifEncoder;
use image::{Delay, Frame, RgbaImage};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use tracing::{debug, info};

/// Capabilities and behaviour of the synthetic camera
#[derive(Debug, Clone)]
pub struct VirtualCameraOptions {
    pub width: u32,
    pub height: u32,
    pub raw_pixel_formats: Vec<PixelFormat>,
    pub live_photo_supported: bool,
    pub flash_modes: Vec<FlashMode>,
    /// Every capture resolves with an error; switchable later through
    /// [`VirtualCameraStats::set_fail_captures`]
    pub fail_captures: bool,
    /// Render a dark scene (makes `Auto` flash fire)
    pub dark_scene: bool,
    /// Facings of the devices offered, in enumeration order
    pub facings: Vec<CameraFacing>,
}

impl Default for VirtualCameraOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            raw_pixel_formats: vec![PixelFormat::BayerRGGB],
            live_photo_supported: true,
            flash_modes: FlashMode::ALL.to_vec(),
            fail_captures: false,
            dark_scene: false,
            facings: vec![CameraFacing::Back, CameraFacing::Front],
        }
    }
}

/// Counters shared between the backend and every session it opened, plus
/// the capture failure switch
#[derive(Debug, Clone, Default)]
pub struct VirtualCameraStats {
    sessions_opened: Arc<AtomicUsize>,
    sessions_started: Arc<AtomicUsize>,
    sessions_stopped: Arc<AtomicUsize>,
    captures: Arc<AtomicUsize>,
    fail_captures: Arc<AtomicBool>,
}

impl VirtualCameraStats {
    /// Make later captures of every session fail (or succeed again)
    pub fn set_fail_captures(&self, fail: bool) {
        self.fail_captures.store(fail, Ordering::SeqCst);
    }

    pub fn fail_captures(&self) -> bool {
        self.fail_captures.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_started(&self) -> usize {
        self.sessions_started.load(Ordering::SeqCst)
    }

    pub fn sessions_stopped(&self) -> usize {
        self.sessions_stopped.load(Ordering::SeqCst)
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

/// Synthetic camera backend
pub struct VirtualCameraBackend {
    options: VirtualCameraOptions,
    stats: VirtualCameraStats,
}

impl VirtualCameraBackend {
    pub fn new() -> Self {
        Self::with_options(VirtualCameraOptions::default())
    }

    pub fn with_options(options: VirtualCameraOptions) -> Self {
        let stats = VirtualCameraStats::default();
        stats.set_fail_captures(options.fail_captures);
        Self { options, stats }
    }

    /// Handle to the session counters
    pub fn stats(&self) -> VirtualCameraStats {
        self.stats.clone()
    }

    fn capabilities(&self) -> PhotoOutputCapabilities {
        PhotoOutputCapabilities {
            raw_pixel_formats: self.options.raw_pixel_formats.clone(),
            supported_flash_modes: self.options.flash_modes.clone(),
            live_photo_supported: self.options.live_photo_supported,
            high_resolution_supported: true,
            preview_pixel_formats: vec![PixelFormat::RGBA],
        }
    }
}

impl Default for VirtualCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for VirtualCameraBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.options
            .facings
            .iter()
            .map(|facing| CameraDevice {
                name: format!("Virtual Camera ({})", facing),
                path: format!("virtual-{}", facing),
                metadata_path: None,
                device_type: DeviceType::BuiltInWideAngle,
                facing: Some(*facing),
                rotation: SensorRotation::Rotate90,
            })
            .collect()
    }

    fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
        let full = CameraFormat {
            width: self.options.width,
            height: self.options.height,
            framerate: Some(Framerate::from_int(30)),
            pixel_format: "RGBA".to_string(),
        };
        let half = CameraFormat {
            width: (self.options.width / 2).max(1),
            height: (self.options.height / 2).max(1),
            ..full.clone()
        };
        vec![full, half]
    }

    fn open_session(
        &self,
        device: &CameraDevice,
        preset: SessionPreset,
    ) -> BackendResult<Box<dyn CaptureSession>> {
        let format = super::select_format(&self.get_formats(device), preset)
            .ok_or_else(|| BackendError::FormatNotSupported(device.name.clone()))?;
        self.stats.sessions_opened.fetch_add(1, Ordering::SeqCst);
        info!(device = %device.name, format = %format, "Opening virtual camera session");

        Ok(Box::new(VirtualCameraSession {
            device: device.clone(),
            format,
            capabilities: self.capabilities(),
            high_resolution_enabled: false,
            running: Arc::new(AtomicBool::new(false)),
            phase: Arc::new(AtomicU32::new(0)),
            options: self.options.clone(),
            stats: self.stats.clone(),
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Session of the synthetic camera
pub struct VirtualCameraSession {
    device: CameraDevice,
    format: CameraFormat,
    capabilities: PhotoOutputCapabilities,
    high_resolution_enabled: bool,
    running: Arc<AtomicBool>,
    phase: Arc<AtomicU32>,
    options: VirtualCameraOptions,
    stats: VirtualCameraStats,
}

impl VirtualCameraSession {
    fn facing(&self) -> CameraFacing {
        self.device.facing.unwrap_or_default()
    }

    fn render(&self, width: u32, height: u32) -> RgbaImage {
        let phase = self.phase.fetch_add(4, Ordering::Relaxed);
        color_bars(width, height, phase, self.facing(), self.options.dark_scene)
    }
}

impl CaptureSession for VirtualCameraSession {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn format(&self) -> &CameraFormat {
        &self.format
    }

    fn photo_output(&self) -> &PhotoOutputCapabilities {
        &self.capabilities
    }

    fn set_high_resolution_capture_enabled(&mut self, enabled: bool) {
        self.high_resolution_enabled = enabled;
    }

    fn start_running(&mut self) -> BackendResult<()> {
        if !self.running.swap(true, Ordering::SeqCst) {
            self.stats.sessions_started.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn stop_running(&mut self) -> BackendResult<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            self.stats.sessions_stopped.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn latest_preview(&self) -> Option<CameraFrame> {
        if !self.is_running() {
            return None;
        }
        Some(frame_from_image(self.render(self.format.width, self.format.height)))
    }

    fn capture_photo(&mut self, mut settings: CaptureSettings) -> PhotoRequest {
        if !self.is_running() {
            return futures::future::ready(Err(BackendError::SessionNotRunning)).boxed();
        }
        if let Err(msg) = settings.validate(&self.capabilities) {
            return futures::future::ready(Err(BackendError::CaptureFailed(msg))).boxed();
        }
        self.stats.captures.fetch_add(1, Ordering::SeqCst);
        if self.stats.fail_captures() {
            return futures::future::ready(Err(BackendError::CaptureFailed(
                "virtual camera configured to fail".to_string(),
            )))
            .boxed();
        }
        settings.high_resolution &= self.high_resolution_enabled;

        // High resolution doubles the sensor size
        let scale = if settings.high_resolution { 2 } else { 1 };
        let image = self.render(self.format.width * scale, self.format.height * scale);
        let clip: Vec<RgbaImage> = match settings.live_photo_movie_path {
            Some(_) => (0..capture::LIVE_CLIP_FRAMES)
                .map(|_| self.render(self.format.width / 2, self.format.height / 2))
                .collect(),
            None => Vec::new(),
        };

        async move {
            let scene = frame_from_image(image.clone());
            let fire = settings
                .effective_flash_mode()
                .should_fire(scene.mean_luma());

            if let Some(path) = settings.live_photo_movie_path.clone() {
                tokio::task::spawn_blocking(move || write_live_clip(&path, clip))
                    .await
                    .map_err(|e| BackendError::Other(e.to_string()))??;
            }

            let preview = settings
                .preview_format
                .as_ref()
                .and_then(|format| render_preview(&scene, format));

            let frame = match settings.raw_pixel_format {
                Some(format) => bayer_mosaic(&image, format),
                None => apply_resolution(scene, &settings),
            };

            let resolved = ResolvedPhotoSettings::resolve(&settings, fire, frame.width, frame.height);
            debug!(id = %resolved.unique_id, raw = resolved.raw, flash = fire, "Virtual capture complete");

            Ok::<_, BackendError>(CapturedPhoto {
                frame,
                preview,
                resolved,
            })
        }
        .boxed()
    }
}

/// Write a live-photo clip as an animated GIF
fn write_live_clip(path: &Path, frames: Vec<RgbaImage>) -> BackendResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let mut encoder = GifEncoder::new(file);
    let delay = Delay::from_numer_denom_ms(capture::LIVE_CLIP_FRAME_DELAY_MS, 1);
    encoder
        .encode_frames(
            frames
                .into_iter()
                .map(|image| Frame::from_parts(image, 0, 0, delay)),
        )
        .map_err(|e| BackendError::IoError(e.to_string()))?;
    debug!(path = %path.display(), "Live photo clip written");
    Ok(())
}
