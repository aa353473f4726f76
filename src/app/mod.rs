// SPDX-License-Identifier: GPL-3.0-only

//! Capture controller
//!
//! The controller owns the camera session, the capture configuration, the
//! most recent captured image and the presentation state. UI events enter
//! through [`CaptureController::update`]. Asynchronous work (captures,
//! encoding, library requests) runs on the tokio runtime and reports back
//! through a [`Completion`] channel that the UI loop drains on its own
//! thread, so all state mutation happens in one place.
//!
//! # Handler Modules
//!
//! - `handlers::camera`: Session setup, facing toggle, suspend/resume
//! - `handlers::settings`: Flash, RAW, high resolution and live photo toggles
//! - `handlers::capture`: Capture requests and their completions
//! - `handlers::save`: Library authorization and asset creation
//! - `handlers::ui`: Toasts, preview expansion, menu fade

mod handlers;
pub mod state;
mod update;
pub mod view;

pub use handlers::capture::capture_settings_for;
pub use state::{
    CaptureConfiguration, CaptureState, Completion, LivePhotoMode, SaveOutcome, UiEvent,
};
pub use view::{LabelWeight, MenuFade, PreviewPresentation, Toast, ViewState};

use crate::backends::camera::types::{CameraFrame, PhotoOutputCapabilities, SessionPreset};
use crate::backends::camera::{CameraBackend, CaptureSession};
use crate::backends::library::MediaLibrary;
use crate::config::Config;
use crate::pipelines::photo::{CapturedImage, PhotoEncoder, PhotoPipeline};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Orchestrates the camera session, capture settings and saving
pub struct CaptureController {
    backend: Arc<dyn CameraBackend>,
    library: Arc<dyn MediaLibrary>,
    runtime: tokio::runtime::Handle,
    session: Option<Box<dyn CaptureSession>>,
    preset: SessionPreset,
    configuration: CaptureConfiguration,
    current_image: Option<CapturedImage>,
    /// Live photo clip belonging to `current_image`
    current_live_movie: Option<PathBuf>,
    /// Clip paths of captures still in flight
    pending_live_movies: HashMap<Uuid, PathBuf>,
    capture_state: CaptureState,
    outstanding_captures: usize,
    view: ViewState,
    pipeline: PhotoPipeline,
    scratch_dir: PathBuf,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl CaptureController {
    /// Create a controller without a session; call [`Self::load_camera`] to start
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        library: Arc<dyn MediaLibrary>,
        runtime: tokio::runtime::Handle,
        config: &Config,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let configuration = CaptureConfiguration {
            facing: config.initial_facing,
            high_resolution: config.high_resolution,
            ..CaptureConfiguration::default()
        };
        let view = ViewState {
            high_resolution_label: LabelWeight::for_state(configuration.high_resolution),
            ..ViewState::default()
        };

        Self {
            backend,
            library,
            runtime,
            session: None,
            preset: config.session_preset,
            configuration,
            current_image: None,
            current_live_movie: None,
            pending_live_movies: HashMap::new(),
            capture_state: CaptureState::Idle,
            outstanding_captures: 0,
            view,
            pipeline: PhotoPipeline::new(PhotoEncoder::with_quality(config.jpeg_quality)),
            scratch_dir: config.scratch_dir(),
            completion_tx,
            completion_rx,
        }
    }

    // ===== Accessors =====

    pub fn configuration(&self) -> &CaptureConfiguration {
        &self.configuration
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture_state
    }

    pub fn outstanding_captures(&self) -> usize {
        self.outstanding_captures
    }

    pub fn current_image(&self) -> Option<&CapturedImage> {
        self.current_image.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_running())
    }

    pub fn session_device_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.device().name.as_str())
    }

    pub fn photo_output(&self) -> Option<&PhotoOutputCapabilities> {
        self.session.as_ref().map(|s| s.photo_output())
    }

    /// Frame for the live preview surface
    pub fn latest_preview(&self) -> Option<CameraFrame> {
        self.session.as_ref().and_then(|s| s.latest_preview())
    }

    /// Advance time-based presentation state
    pub fn tick(&mut self, now: Instant) {
        self.view.expire_toast(now);
    }

    // ===== Completions =====

    /// Run `future` on the runtime and post its result as a completion
    fn spawn_completion<F>(&self, future: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completion_tx.clone();
        self.runtime.spawn(async move {
            // Receiver lives as long as the controller
            let _ = tx.send(future.await);
        });
    }

    /// Handle every completion that has already arrived
    pub fn try_process_completions(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.handle_completion(completion);
            handled += 1;
        }
        if handled > 0 {
            debug!(handled, "Processed completions");
        }
        handled
    }

    /// Wait for the next completion and handle it
    pub async fn process_next_completion(&mut self) {
        if let Some(completion) = self.completion_rx.recv().await {
            self.handle_completion(completion);
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.teardown_session();
    }
}
