// SPDX-License-Identifier: GPL-3.0-only

//! Camera session handlers
//!
//! Session setup, camera facing toggle and suspend/resume. A facing change
//! always tears the session down and builds a new one.

use crate::app::CaptureController;
use crate::app::state::LivePhotoMode;
use crate::app::view::LabelWeight;
use crate::backends::camera::types::{CameraDevice, CameraFacing, DeviceType};
use crate::constants::messages;
use crate::pipelines::photo::CameraMetadata;
use tracing::{debug, error, info, warn};

impl CaptureController {
    // =========================================================================
    // Camera Session Handlers
    // =========================================================================

    /// Find the device for the current facing, open a session and start it
    ///
    /// Failures are logged and leave the controller without a session.
    pub fn load_camera(&mut self) {
        let facing = self.configuration.facing;
        let Some(device) = self.find_device(facing) else {
            error!(%facing, "No camera available");
            return;
        };

        let mut session = match self.backend.open_session(&device, self.preset) {
            Ok(session) => session,
            Err(e) => {
                error!(device = %device.name, error = %e, "Failed to open camera session");
                return;
            }
        };

        let output = session.photo_output().clone();
        // The output always allows it; the per-capture flag follows the toggle
        if output.high_resolution_supported {
            session.set_high_resolution_capture_enabled(true);
        }
        if !output.live_photo_supported && self.configuration.live_photo != LivePhotoMode::Unsupported
        {
            debug!(device = %device.name, "Live photo not supported by this output");
            self.configuration.live_photo = LivePhotoMode::Unsupported;
            self.view.live_label = LabelWeight::Thin;
        }

        if let Err(e) = session.start_running() {
            error!(device = %device.name, error = %e, "Failed to start camera session");
            return;
        }

        self.pipeline
            .encoder_mut()
            .set_camera_metadata(CameraMetadata {
                camera_name: Some(device.name.clone()),
                backend: Some(self.backend.backend_type().to_string()),
            });

        info!(
            device = %device.name,
            %facing,
            format = %session.format(),
            raw_formats = output.raw_pixel_formats.len(),
            "Camera session running"
        );
        self.session = Some(session);
    }

    fn find_device(&self, facing: CameraFacing) -> Option<CameraDevice> {
        self.backend
            .default_device(DeviceType::BuiltInWideAngle, facing)
            .or_else(|| {
                debug!(%facing, "No built-in camera, trying external cameras");
                self.backend.default_device(DeviceType::External, facing)
            })
    }

    /// Stop and drop the current session
    pub(crate) fn teardown_session(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.is_running()
            && let Err(e) = session.stop_running()
        {
            warn!(error = %e, "Failed to stop camera session");
        }
        debug!(device = %session.device().name, "Camera session torn down");
    }

    /// Switch between the front and back camera
    pub(crate) fn handle_toggle_camera(&mut self) {
        let facing = self.configuration.facing.toggled();
        self.configuration.facing = facing;
        self.show_toast(match facing {
            CameraFacing::Front => messages::CAMERA_FRONT,
            CameraFacing::Back => messages::CAMERA_BACK,
        });

        info!(%facing, "Switching camera");
        self.teardown_session();
        self.load_camera();
    }

    /// The view went away: stop a running session
    pub(crate) fn handle_suspend(&mut self) {
        if let Some(session) = self.session.as_mut()
            && session.is_running()
        {
            match session.stop_running() {
                Ok(()) => debug!("Camera session suspended"),
                Err(e) => warn!(error = %e, "Failed to suspend camera session"),
            }
        }
    }

    /// The view came back: restart the session, or build one if there is none
    pub(crate) fn handle_resume(&mut self) {
        if self.session.is_none() {
            self.load_camera();
            return;
        }
        if let Some(session) = self.session.as_mut()
            && !session.is_running()
        {
            match session.start_running() {
                Ok(()) => debug!("Camera session resumed"),
                Err(e) => error!(error = %e, "Failed to resume camera session"),
            }
        }
    }
}
