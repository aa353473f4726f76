// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Toast animation timeline
///
/// A toast fades in over [`FADE_IN`], stays fully visible, then fades out
/// over [`FADE_OUT`] starting [`FADE_OUT_DELAY`] after it was shown.
pub mod toast {
    use super::Duration;

    pub const FADE_IN: Duration = Duration::from_secs(1);
    pub const FADE_OUT_DELAY: Duration = Duration::from_secs(2);
    pub const FADE_OUT: Duration = Duration::from_secs(1);
}

/// User-visible status strings
pub mod messages {
    pub const CAMERA_FRONT: &str = "Camera: front";
    pub const CAMERA_BACK: &str = "Camera: back";
    pub const FLASH_ON: &str = "Flash mode: on";
    pub const FLASH_AUTO: &str = "Flash mode: auto";
    pub const FLASH_OFF: &str = "Flash mode: off";
    pub const RAW_NOT_AVAILABLE: &str = "RAW not available";
    pub const LIVE_NOT_SUPPORTED: &str = "Live photo not supported";
    pub const LIVE_ON: &str = "Live on";
    pub const LIVE_OFF: &str = "Live: off";
    pub const NOT_AUTHORIZED: &str = "Not authorized!";
    pub const IMAGE_SAVED: &str = "Image saved";
}

/// Terminal layout constants (in cells)
pub mod ui {
    use super::Duration;

    /// Thumbnail button width
    pub const THUMBNAIL_WIDTH: u16 = 15;

    /// Thumbnail button height (each cell holds two pixel rows)
    pub const THUMBNAIL_HEIGHT: u16 = 10;

    /// Distance between the thumbnail and the screen's bottom-left corner
    pub const THUMBNAIL_MARGIN: u16 = 2;

    /// Thumbnail <-> full screen animation
    pub const PREVIEW_ANIMATION: Duration = Duration::from_millis(500);

    /// Settings menu fade
    pub const MENU_FADE: Duration = Duration::from_secs(1);

    /// Longest edge of the decoded thumbnail image in pixels
    pub const THUMBNAIL_MAX_PIXELS: u32 = 320;

    /// Pixels per terminal cell used to size the embedded capture preview
    pub const PREVIEW_PIXELS_PER_CELL: u32 = 8;

    /// Input poll interval, also the redraw cadence (~60 fps)
    pub const POLL_INTERVAL: Duration = Duration::from_millis(16);
}

/// Photo capture constants
pub mod capture {
    use super::Duration;

    /// Prefix of the live-photo movie written to the scratch directory
    pub const LIVE_PHOTO_PREFIX: &str = "Photoshot_";

    /// Widest frame kept when high-resolution capture is off
    pub const STANDARD_MAX_WIDTH: u32 = 1920;

    /// How long the backend waits for a fresh frame after a capture request
    pub const FRAME_WAIT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Poll interval while waiting for a fresh frame
    pub const FRAME_WAIT_POLL: Duration = Duration::from_millis(10);

    /// LED on-time before the shutter frame is taken
    pub const FLASH_WARMUP: Duration = Duration::from_millis(300);

    /// Mean preview luma (0-255) under which `Auto` fires the flash
    pub const AUTO_FLASH_LUMA_THRESHOLD: f32 = 60.0;

    /// Frames in a live-photo clip
    pub const LIVE_CLIP_FRAMES: u32 = 8;

    /// Delay between live-photo clip frames
    pub const LIVE_CLIP_FRAME_DELAY_MS: u32 = 100;
}

/// Video format constants
pub mod formats {
    /// Common frame rates to try when exact enumeration fails
    pub const COMMON_FRAMERATES: &[u32] = &[30, 60, 15, 24];

    /// Pixel count the preview preset aims for (VGA)
    pub const PREVIEW_TARGET_PIXELS: i64 = 640 * 480;
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Get number of threads for videoconvert based on available CPU threads
    pub fn videoconvert_threads() -> u32 {
        std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(4)
    }

    /// Output pixel format for appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";
}

/// Timing constants
pub mod timing {
    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Camera warm-up before a one-shot CLI capture
    pub const CLI_WARMUP_MS: u64 = 500;
}

/// Application information utilities
pub mod app_info {
    /// Directory / file stem used for config, logs and the library folder
    pub const APP_ID: &str = "photoshot";

    /// Library folder name inside the pictures directory
    pub const LIBRARY_FOLDER: &str = "PhotoShot";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_timeline_is_ordered() {
        assert!(toast::FADE_IN <= toast::FADE_OUT_DELAY);
    }

    #[test]
    fn test_thumbnail_fits_margin() {
        assert!(ui::THUMBNAIL_WIDTH > ui::THUMBNAIL_MARGIN);
        assert!(ui::THUMBNAIL_HEIGHT > ui::THUMBNAIL_MARGIN);
    }
}
