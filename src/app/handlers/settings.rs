// SPDX-License-Identifier: GPL-3.0-only

//! Capture setting handlers
//!
//! Flash, RAW, high resolution and live photo toggles. Each one updates the
//! configuration, restyles its control and shows a toast.

use crate::app::CaptureController;
use crate::app::state::LivePhotoMode;
use crate::app::view::LabelWeight;
use crate::constants::messages;
use tracing::{debug, info};

impl CaptureController {
    // =========================================================================
    // Settings Handlers
    // =========================================================================

    /// Cycle Off -> On -> Auto -> Off
    pub(crate) fn handle_toggle_flash(&mut self) {
        let mode = self.configuration.flash_mode.next();
        self.configuration.flash_mode = mode;
        self.view.flash_icon = mode.icon();
        info!(%mode, "Flash mode changed");
        self.show_toast(mode.status_message());
    }

    /// Flip RAW capture, if the photo output offers any RAW format
    pub(crate) fn handle_toggle_raw(&mut self) {
        let available = self.photo_output().is_some_and(|o| o.supports_raw());
        if !available {
            debug!("RAW toggle ignored, no RAW pixel formats");
            self.show_toast(messages::RAW_NOT_AVAILABLE);
            return;
        }

        let raw = !self.configuration.raw;
        self.configuration.raw = raw;
        self.view.raw_label = LabelWeight::for_state(raw);
        self.show_toast(format!("RAW: {}", raw));
    }

    pub(crate) fn handle_toggle_high_resolution(&mut self) {
        let enabled = !self.configuration.high_resolution;
        self.configuration.high_resolution = enabled;
        self.view.high_resolution_label = LabelWeight::for_state(enabled);
        self.show_toast(format!("High resolution: {}", enabled));
    }

    pub(crate) fn handle_toggle_live(&mut self) {
        match self.configuration.live_photo {
            LivePhotoMode::Unsupported => self.show_toast(messages::LIVE_NOT_SUPPORTED),
            LivePhotoMode::Off => {
                self.configuration.live_photo = LivePhotoMode::On;
                self.view.live_label = LabelWeight::Heavy;
                self.show_toast(messages::LIVE_ON);
            }
            LivePhotoMode::On => {
                self.configuration.live_photo = LivePhotoMode::Off;
                self.view.live_label = LabelWeight::Thin;
                self.show_toast(messages::LIVE_OFF);
            }
        }
    }
}
