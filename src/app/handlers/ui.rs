// SPDX-License-Identifier: GPL-3.0-only

//! Presentation handlers
//!
//! Handles toasts, the captured-image preview expansion and the menu fade.

use crate::app::CaptureController;
use std::time::Instant;
use tracing::debug;

impl CaptureController {
    // =========================================================================
    // Presentation Handlers
    // =========================================================================

    /// Show a toast, replacing whatever is on screen
    pub(crate) fn show_toast(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!(toast = %text, "Showing toast");
        self.view.show_toast(text, Instant::now());
    }

    /// Animate the thumbnail between its corner frame and full screen
    ///
    /// The save button is shown while expanded and hidden when collapsed.
    pub(crate) fn handle_toggle_preview(&mut self) {
        self.view.preview.toggle(Instant::now());
        self.view.save_visible = self.view.preview.expanded;
        debug!(expanded = self.view.preview.expanded, "Preview toggled");
    }

    pub(crate) fn handle_toggle_menu(&mut self) {
        self.view.menu.toggle(Instant::now());
        debug!(visible = self.view.menu.visible, "Menu toggled");
    }
}
