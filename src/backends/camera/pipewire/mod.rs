// SPDX-License-Identifier: MPL-2.0

//! PipeWire camera backend
//!
//! This backend uses PipeWire for camera enumeration, format detection, and capture.
//! It's the modern, recommended approach for Linux camera access.

mod enumeration;
mod pipeline;

pub use enumeration::{enumerate_pipewire_cameras, get_pipewire_formats, is_pipewire_available};
pub use pipeline::{FrameSlot, PipeWirePipeline};

use super::types::*;
use super::{CameraBackend, CaptureSession, select_format};
use crate::constants::capture;
use crate::flash::{self, FlashDevice, FlashMode};
use crate::pipelines::photo::settings::{
    CaptureSettings, ResolvedPhotoSettings, apply_resolution, render_preview,
};
use futures::FutureExt;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

/// PipeWire backend implementation
pub struct PipeWireBackend;

impl PipeWireBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PipeWireBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for PipeWireBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        info!("Using PipeWire backend for camera enumeration");

        if let Some(cameras) = enumerate_pipewire_cameras() {
            info!(count = cameras.len(), "PipeWire cameras enumerated");
            cameras
        } else {
            info!("PipeWire enumeration returned None");
            Vec::new()
        }
    }

    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        get_pipewire_formats(&device.path, device.metadata_path.as_deref())
    }

    fn open_session(
        &self,
        device: &CameraDevice,
        preset: SessionPreset,
    ) -> BackendResult<Box<dyn CaptureSession>> {
        let formats = self.get_formats(device);
        let format = select_format(&formats, preset).ok_or_else(|| {
            BackendError::FormatNotSupported(format!("No formats available for {}", device.name))
        })?;

        info!(device = %device.name, format = %format, ?preset, "Opening PipeWire session");
        Ok(Box::new(PipeWireSession::new(device.clone(), format)))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::PipeWire
    }

    fn is_available(&self) -> bool {
        is_pipewire_available()
    }
}

/// A running (or stopped) PipeWire capture session
pub struct PipeWireSession {
    device: CameraDevice,
    format: CameraFormat,
    capabilities: PhotoOutputCapabilities,
    high_resolution_enabled: bool,
    pipeline: Option<PipeWirePipeline>,
    processed: FrameSlot,
    raw: FrameSlot,
    flash_devices: Arc<Vec<FlashDevice>>,
}

impl PipeWireSession {
    fn new(device: CameraDevice, format: CameraFormat) -> Self {
        let flash_devices = FlashDevice::discover();
        let capabilities = capabilities_for(&format, !flash_devices.is_empty());
        debug!(?capabilities, "Photo output capabilities");

        Self {
            device,
            format,
            capabilities,
            high_resolution_enabled: false,
            pipeline: None,
            processed: Arc::new(Mutex::new(None)),
            raw: Arc::new(Mutex::new(None)),
            flash_devices: Arc::new(flash_devices),
        }
    }
}

/// What a PipeWire photo output can deliver for a given format
fn capabilities_for(format: &CameraFormat, has_flash: bool) -> PhotoOutputCapabilities {
    let raw_pixel_formats = PixelFormat::from_gst_format(&format.pixel_format)
        .filter(PixelFormat::is_bayer)
        .into_iter()
        .collect();

    let supported_flash_modes = if has_flash {
        FlashMode::ALL.to_vec()
    } else {
        vec![FlashMode::Off]
    };

    PhotoOutputCapabilities {
        raw_pixel_formats,
        supported_flash_modes,
        live_photo_supported: false,
        high_resolution_supported: true,
        preview_pixel_formats: vec![PixelFormat::RGBA],
    }
}

impl CaptureSession for PipeWireSession {
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
        self.high_resolution_enabled = enabled && self.capabilities.high_resolution_supported;
    }

    fn start_running(&mut self) -> BackendResult<()> {
        if self.pipeline.is_some() {
            return Ok(());
        }
        let pipeline = PipeWirePipeline::new(
            &self.device,
            &self.format,
            Arc::clone(&self.processed),
            Arc::clone(&self.raw),
        )?;
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn stop_running(&mut self) -> BackendResult<()> {
        flash::all_off(&self.flash_devices);
        match self.pipeline.take() {
            Some(pipeline) => pipeline.stop(),
            None => Ok(()),
        }
    }

    fn is_running(&self) -> bool {
        self.pipeline.is_some()
    }

    fn latest_preview(&self) -> Option<CameraFrame> {
        self.processed.lock().ok()?.clone()
    }

    fn capture_photo(&mut self, mut settings: CaptureSettings) -> PhotoRequest {
        if !self.is_running() {
            return futures::future::ready(Err(BackendError::SessionNotRunning)).boxed();
        }
        if let Err(msg) = settings.validate(&self.capabilities) {
            return futures::future::ready(Err(BackendError::CaptureFailed(msg))).boxed();
        }
        settings.high_resolution &= self.high_resolution_enabled;

        let processed = Arc::clone(&self.processed);
        let raw = Arc::clone(&self.raw);
        let flash_devices = Arc::clone(&self.flash_devices);

        async move {
            let scene_luma = latest_frame(&processed).and_then(|f| f.mean_luma());
            let fire = settings.effective_flash_mode().should_fire(scene_luma);

            if fire {
                flash::all_on(&flash_devices);
                tokio::time::sleep(capture::FLASH_WARMUP).await;
            }

            let requested_at = Instant::now();
            let frame = wait_for_frame_after(&processed, requested_at).await;
            let raw_frame = match settings.raw_pixel_format {
                Some(_) => wait_for_frame_after(&raw, requested_at).await,
                None => None,
            };

            if fire {
                flash::all_off(&flash_devices);
            }

            let frame = frame.ok_or_else(|| {
                BackendError::CaptureFailed("no frame arrived in time".to_string())
            })?;

            let preview = settings
                .preview_format
                .as_ref()
                .and_then(|format| render_preview(&frame, format));

            let delivered = match settings.raw_pixel_format {
                Some(_) => raw_frame.ok_or_else(|| {
                    BackendError::CaptureFailed("no RAW frame arrived in time".to_string())
                })?,
                None => apply_resolution(frame, &settings),
            };

            let resolved =
                ResolvedPhotoSettings::resolve(&settings, fire, delivered.width, delivered.height);
            debug!(id = %resolved.unique_id, raw = resolved.raw, flash = fire, "PipeWire capture complete");

            Ok::<_, BackendError>(CapturedPhoto {
                frame: delivered,
                preview,
                resolved,
            })
        }
        .boxed()
    }
}

impl Drop for PipeWireSession {
    fn drop(&mut self) {
        if let Err(e) = self.stop_running() {
            warn!(error = %e, "Failed to stop PipeWire session");
        }
    }
}

fn latest_frame(slot: &FrameSlot) -> Option<CameraFrame> {
    slot.lock().ok()?.as_ref().map(CameraFrame::to_copied)
}

/// Wait for the first frame produced after `after`
async fn wait_for_frame_after(slot: &FrameSlot, after: Instant) -> Option<CameraFrame> {
    let deadline = after + capture::FRAME_WAIT_TIMEOUT;
    loop {
        if let Some(frame) = latest_frame(slot)
            && frame.captured_at >= after
        {
            return Some(frame);
        }
        if Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(capture::FRAME_WAIT_POLL).await;
    }
}
