// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::backends::camera::types::{BackendResult, CameraFacing, CapturedPhoto};
use crate::backends::library::{AuthorizationStatus, LibraryError, SavedAsset};
use crate::errors::PhotoError;
use crate::flash::FlashMode;
use crate::pipelines::photo::ProcessedCapture;
use std::path::PathBuf;
use uuid::Uuid;

/// Input events from the UI surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    TakePhoto,
    /// Expand or collapse the captured-image preview
    TogglePreview,
    Save,
    ToggleMenu,
    ToggleLive,
    ToggleHighResolution,
    ToggleRaw,
    ToggleFlash,
    ToggleCamera,
    /// The view went away
    Suspend,
    /// The view came back
    Resume,
}

/// Results of asynchronous work, delivered back to the UI thread
#[derive(Debug)]
pub enum Completion {
    /// The backend finished a capture request
    PhotoCaptured {
        unique_id: Uuid,
        result: BackendResult<CapturedPhoto>,
    },
    /// Encoding and thumbnailing finished
    PhotoProcessed {
        unique_id: Uuid,
        result: Result<ProcessedCapture, PhotoError>,
    },
    /// Library authorization was answered
    Authorization(AuthorizationStatus),
    /// The save flow finished
    Saved(SaveOutcome),
}

/// How a save request ended
#[derive(Debug)]
pub enum SaveOutcome {
    Saved {
        asset: SavedAsset,
        scratch_path: PathBuf,
        /// Live photo clip stored with the asset
        live_movie: Option<PathBuf>,
    },
    /// Writing the scratch file failed
    ScratchWriteFailed(PhotoError),
    /// The library refused or failed the change request
    LibraryFailed {
        error: LibraryError,
        scratch_path: PathBuf,
    },
}

/// Capture state machine
///
/// `Idle → Requested → {Succeeded | Failed} → Idle`; the terminal states
/// are reported once and fall back to `Idle` on the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Requested,
    Succeeded,
    Failed,
}

impl CaptureState {
    pub fn is_in_flight(self) -> bool {
        self == CaptureState::Requested
    }
}

/// Live photo toggle state
///
/// `Unsupported` is absorbing: once the output reports no live photo
/// support, toggling never leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LivePhotoMode {
    Unsupported,
    #[default]
    Off,
    On,
}

impl LivePhotoMode {
    pub fn is_on(self) -> bool {
        self == LivePhotoMode::On
    }
}

/// Per-capture options chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfiguration {
    pub flash_mode: FlashMode,
    pub facing: CameraFacing,
    pub high_resolution: bool,
    pub raw: bool,
    pub live_photo: LivePhotoMode,
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            flash_mode: FlashMode::Off,
            facing: CameraFacing::Back,
            high_resolution: true,
            raw: false,
            live_photo: LivePhotoMode::Off,
        }
    }
}
