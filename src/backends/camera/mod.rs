// SPDX-License-Identifier: MPL-2.0
// Camera backend with trait-based abstraction for PipeWire and the synthetic camera

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  CaptureController  │
//! └──────────┬──────────┘
//!            │ default_device / open_session
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← Device discovery
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CaptureSession Trait│  ← Running device input + photo output + preview sink
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!  ┌────────┐ ┌─────────┐
//!  │PipeWire│ │ Virtual │
//!  └────────┘ └─────────┘
//! ```

pub mod pipewire;
pub mod types;
pub mod virtual_camera;

pub use types::*;

use crate::constants::formats;
use crate::pipelines::photo::settings::CaptureSettings;
use tracing::{debug, info, warn};

/// Camera discovery and session factory
pub trait CameraBackend: Send + Sync {
    // ===== Enumeration =====

    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Get supported formats for a specific camera device
    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat>;

    /// Pick the camera of the given kind on the given side
    ///
    /// Falls back to the first camera of that kind when no camera reports a
    /// location at all, since plain webcams carry no facing information.
    fn default_device(&self, device_type: DeviceType, facing: CameraFacing) -> Option<CameraDevice> {
        let cameras = self.enumerate_cameras();
        let of_type = || cameras.iter().filter(|c| c.device_type == device_type);

        if let Some(exact) = of_type().find(|c| c.facing == Some(facing)) {
            return Some(exact.clone());
        }

        if of_type().all(|c| c.facing.is_none()) {
            let fallback = of_type().next().cloned();
            if let Some(ref device) = fallback {
                debug!(device = %device.name, %facing, "No camera reports a location, using first device");
            }
            return fallback;
        }

        None
    }

    // ===== Lifecycle =====

    /// Build a session for the device; the session is created stopped
    fn open_session(
        &self,
        device: &CameraDevice,
        preset: SessionPreset,
    ) -> BackendResult<Box<dyn CaptureSession>>;

    // ===== Metadata =====

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Check if this backend is available on the current system
    fn is_available(&self) -> bool;
}

/// A live device input wired to a photo output and a preview sink
pub trait CaptureSession: Send {
    /// Device the session reads from
    fn device(&self) -> &CameraDevice;

    /// Active capture format
    fn format(&self) -> &CameraFormat;

    /// What the photo output can deliver
    fn photo_output(&self) -> &PhotoOutputCapabilities;

    /// Allow full-sensor captures on the photo output
    fn set_high_resolution_capture_enabled(&mut self, enabled: bool);

    fn start_running(&mut self) -> BackendResult<()>;

    fn stop_running(&mut self) -> BackendResult<()>;

    fn is_running(&self) -> bool;

    /// Most recent preview frame, if any has arrived
    fn latest_preview(&self) -> Option<CameraFrame>;

    /// Issue a capture; the returned request resolves exactly once
    ///
    /// Requests cannot be cancelled and carry no timeout of their own.
    fn capture_photo(&mut self, settings: CaptureSettings) -> PhotoRequest;
}

/// Get a concrete backend instance for the given type
pub fn get_backend_for_type(backend_type: CameraBackendType) -> Box<dyn CameraBackend> {
    match backend_type {
        CameraBackendType::PipeWire => Box::new(pipewire::PipeWireBackend::new()),
        CameraBackendType::Virtual => Box::new(virtual_camera::VirtualCameraBackend::new()),
    }
}

/// Get the first available backend, preferring the requested one
pub fn get_backend(preferred: CameraBackendType) -> Box<dyn CameraBackend> {
    let backend = get_backend_for_type(preferred);
    if backend.is_available() {
        info!(backend = %preferred, "Using camera backend");
        return backend;
    }
    warn!(backend = %preferred, "Camera backend not available, using virtual camera");
    get_backend_for_type(CameraBackendType::Virtual)
}

/// Choose the capture format for a session preset
pub fn select_format(formats: &[CameraFormat], preset: SessionPreset) -> Option<CameraFormat> {
    match preset {
        SessionPreset::Photo => formats.iter().max_by_key(|f| f.pixel_count()).cloned(),
        SessionPreset::Preview => formats
            .iter()
            .min_by_key(|f| (f.pixel_count() - formats::PREVIEW_TARGET_PIXELS).abs())
            .cloned(),
    }
}
