// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! Builds per-capture settings from the configuration, issues the request
//! and turns completed captures into the current image and its thumbnail.

use crate::app::CaptureController;
use crate::app::state::{CaptureConfiguration, CaptureState, Completion};
use crate::backends::camera::types::{BackendResult, CapturedPhoto, PhotoOutputCapabilities};
use crate::constants::{capture, ui};
use crate::errors::PhotoError;
use crate::pipelines::photo::{CaptureSettings, PreviewFormat, ProcessedCapture};
use crate::storage;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Settings for one capture with the given configuration and output
///
/// RAW uses the output's first RAW format, the flash mode is only passed
/// when the output supports it, and the embedded preview is sized to the
/// thumbnail frame before its 90° rotation.
pub fn capture_settings_for(
    configuration: &CaptureConfiguration,
    output: &PhotoOutputCapabilities,
    scratch_dir: &Path,
) -> CaptureSettings {
    let mut settings = CaptureSettings::new();

    if configuration.raw {
        settings.raw_pixel_format = output.raw_pixel_formats.first().copied();
    }
    if configuration.live_photo.is_on() {
        let name = format!("{}{}", capture::LIVE_PHOTO_PREFIX, settings.unique_id);
        settings.live_photo_movie_path = Some(scratch_dir.join(name));
    }
    settings.high_resolution = configuration.high_resolution;
    if output.supports_flash_mode(configuration.flash_mode) {
        settings.flash_mode = Some(configuration.flash_mode);
    }
    settings.preview_format =
        output
            .preview_pixel_formats
            .first()
            .map(|&pixel_format| PreviewFormat {
                pixel_format,
                width: ui::THUMBNAIL_HEIGHT as u32 * 2 * ui::PREVIEW_PIXELS_PER_CELL,
                height: ui::THUMBNAIL_WIDTH as u32 * ui::PREVIEW_PIXELS_PER_CELL,
            });

    settings
}

impl CaptureController {
    // =========================================================================
    // Capture Operations Handlers
    // =========================================================================

    /// Issue a capture request with the current configuration
    pub(crate) fn handle_take_photo(&mut self) {
        let Some(session) = self.session.as_mut() else {
            warn!("No camera session, ignoring capture");
            return;
        };

        let settings = capture_settings_for(
            &self.configuration,
            session.photo_output(),
            &self.scratch_dir,
        );
        let unique_id = settings.unique_id;
        if let Some(path) = &settings.live_photo_movie_path {
            self.pending_live_movies.insert(unique_id, path.clone());
        }

        if self.outstanding_captures > 0 {
            debug!(
                outstanding = self.outstanding_captures,
                "Capture requested while another is in flight"
            );
        }
        info!(
            %unique_id,
            raw = settings.is_raw(),
            high_resolution = settings.high_resolution,
            flash = ?settings.flash_mode,
            live = settings.live_photo_movie_path.is_some(),
            "Capturing photo"
        );

        let request = session.capture_photo(settings);
        self.outstanding_captures += 1;
        self.capture_state = CaptureState::Requested;

        self.spawn_completion(async move {
            Completion::PhotoCaptured {
                unique_id,
                result: request.await,
            }
        });
    }

    /// The backend delivered (or failed) a capture; encode it off-thread
    pub(crate) fn handle_photo_captured(
        &mut self,
        unique_id: Uuid,
        result: BackendResult<CapturedPhoto>,
    ) {
        let photo = match result {
            Ok(photo) => photo,
            Err(e) => {
                error!(%unique_id, error = %e, "Photo capture failed");
                self.discard_pending_live_movie(unique_id);
                self.finish_capture(CaptureState::Failed);
                return;
            }
        };

        debug!(
            %unique_id,
            width = photo.resolved.width,
            height = photo.resolved.height,
            flash_fired = photo.resolved.flash_fired,
            "Photo captured, encoding"
        );
        let pipeline = self.pipeline.clone();
        self.spawn_completion(async move {
            Completion::PhotoProcessed {
                unique_id,
                result: pipeline.process(photo).await,
            }
        });
    }

    /// Store the encoded image and show its thumbnail
    pub(crate) fn handle_photo_processed(
        &mut self,
        unique_id: Uuid,
        result: Result<ProcessedCapture, PhotoError>,
    ) {
        match result {
            Ok(processed) => {
                info!(
                    %unique_id,
                    file_name = %processed.image.file_name,
                    size = processed.image.data.len(),
                    "Photo ready"
                );
                self.pending_live_movies.remove(&unique_id);
                self.current_image = Some(processed.image);
                self.replace_live_movie(processed.resolved.live_photo_movie);
                if let Some(thumbnail) = processed.thumbnail {
                    self.view.thumbnail = Some(thumbnail);
                    self.view.thumbnail_visible = true;
                }
                self.finish_capture(CaptureState::Succeeded);
            }
            Err(e) => {
                error!(%unique_id, error = %e, "Photo processing failed");
                self.discard_pending_live_movie(unique_id);
                self.finish_capture(CaptureState::Failed);
            }
        }
    }

    /// The clip of the previous image goes away with it
    fn replace_live_movie(&mut self, movie: Option<PathBuf>) {
        if let Some(old) = self.current_live_movie.take()
            && movie.as_ref() != Some(&old)
        {
            remove_live_movie(&old);
        }
        self.current_live_movie = movie;
    }

    fn discard_pending_live_movie(&mut self, unique_id: Uuid) {
        if let Some(path) = self.pending_live_movies.remove(&unique_id) {
            remove_live_movie(&path);
        }
    }

    fn finish_capture(&mut self, state: CaptureState) {
        self.outstanding_captures = self.outstanding_captures.saturating_sub(1);
        self.capture_state = if self.outstanding_captures > 0 {
            CaptureState::Requested
        } else {
            state
        };
    }
}

fn remove_live_movie(path: &Path) {
    if let Err(e) = storage::remove_scratch_file(path) {
        warn!(path = %path.display(), error = %e, "Failed to remove live photo clip");
    }
}
