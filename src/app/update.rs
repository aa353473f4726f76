// SPDX-License-Identifier: GPL-3.0-only

//! Event and completion dispatch
//!
//! `update()` routes UI events to the focused handler methods in the
//! `handlers` submodules; `handle_completion()` does the same for results
//! of asynchronous work.

use crate::app::CaptureController;
use crate::app::state::{Completion, UiEvent};
use tracing::debug;

impl CaptureController {
    /// Main event handler - routes UI events to handler methods
    pub fn update(&mut self, event: UiEvent) {
        debug!(?event, "UI event");
        match event {
            // ===== Capture =====
            UiEvent::TakePhoto => self.handle_take_photo(),
            UiEvent::Save => self.handle_save(),

            // ===== Settings =====
            UiEvent::ToggleFlash => self.handle_toggle_flash(),
            UiEvent::ToggleRaw => self.handle_toggle_raw(),
            UiEvent::ToggleHighResolution => self.handle_toggle_high_resolution(),
            UiEvent::ToggleLive => self.handle_toggle_live(),

            // ===== Camera =====
            UiEvent::ToggleCamera => self.handle_toggle_camera(),
            UiEvent::Suspend => self.handle_suspend(),
            UiEvent::Resume => self.handle_resume(),

            // ===== Presentation =====
            UiEvent::TogglePreview => self.handle_toggle_preview(),
            UiEvent::ToggleMenu => self.handle_toggle_menu(),
        }
    }

    /// Apply the result of an asynchronous request on the UI thread
    pub fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::PhotoCaptured { unique_id, result } => {
                self.handle_photo_captured(unique_id, result)
            }
            Completion::PhotoProcessed { unique_id, result } => {
                self.handle_photo_processed(unique_id, result)
            }
            Completion::Authorization(status) => self.handle_authorization(status),
            Completion::Saved(outcome) => self.handle_saved(outcome),
        }
    }
}
