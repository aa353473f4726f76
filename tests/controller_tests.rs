// SPDX-License-Identifier: GPL-3.0-only

//! Capture controller tests against the virtual camera

use futures::FutureExt;
use futures::future::BoxFuture;
use photoshot::app::{
    CaptureConfiguration, CaptureController, CaptureState, LabelWeight, LivePhotoMode, UiEvent,
    capture_settings_for,
};
use photoshot::backends::camera::types::{CameraFacing, PhotoOutputCapabilities, PixelFormat};
use photoshot::backends::camera::virtual_camera::{
    VirtualCameraBackend, VirtualCameraOptions, VirtualCameraStats,
};
use photoshot::backends::library::{
    AssetCreationRequest, AuthorizationStatus, DirectoryLibrary, LibraryError, MediaLibrary,
    SavedAsset,
};
use photoshot::config::Config;
use photoshot::constants::messages;
use photoshot::flash::{FlashIcon, FlashMode};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Library that refuses access and counts write attempts
#[derive(Default)]
struct DeniedLibrary {
    writes: Arc<AtomicUsize>,
}

impl MediaLibrary for DeniedLibrary {
    fn request_authorization(&self) -> BoxFuture<'static, AuthorizationStatus> {
        async { AuthorizationStatus::Denied }.boxed()
    }

    fn perform_changes(
        &self,
        _request: AssetCreationRequest,
    ) -> BoxFuture<'static, Result<SavedAsset, LibraryError>> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        async { Err(LibraryError::NotAuthorized) }.boxed()
    }
}

/// Library that grants access but fails every change request
struct FailingLibrary;

impl MediaLibrary for FailingLibrary {
    fn request_authorization(&self) -> BoxFuture<'static, AuthorizationStatus> {
        async { AuthorizationStatus::Authorized }.boxed()
    }

    fn perform_changes(
        &self,
        _request: AssetCreationRequest,
    ) -> BoxFuture<'static, Result<SavedAsset, LibraryError>> {
        async { Err(LibraryError::Io("disk full".to_string())) }.boxed()
    }
}

struct Harness {
    controller: CaptureController,
    stats: VirtualCameraStats,
    dir: TempDir,
}

impl Harness {
    fn library_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("library")
    }

    fn scratch_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("scratch")
    }
}

fn harness_with(
    options: VirtualCameraOptions,
    library: Option<Arc<dyn MediaLibrary>>,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        library_dir: Some(dir.path().join("library")),
        scratch_dir: Some(dir.path().join("scratch")),
        ..Config::default()
    };
    let backend = VirtualCameraBackend::with_options(options);
    let stats = backend.stats();
    let library =
        library.unwrap_or_else(|| Arc::new(DirectoryLibrary::new(config.library_dir())));
    let mut controller = CaptureController::new(
        Arc::new(backend),
        library,
        tokio::runtime::Handle::current(),
        &config,
    );
    controller.load_camera();
    Harness {
        controller,
        stats,
        dir,
    }
}

fn harness() -> Harness {
    harness_with(VirtualCameraOptions::default(), None)
}

/// Take a photo and wait for capture and encoding to finish
async fn capture(controller: &mut CaptureController) {
    controller.update(UiEvent::TakePhoto);
    assert_eq!(controller.capture_state(), CaptureState::Requested);
    controller.process_next_completion().await;
    controller.process_next_completion().await;
}

fn files_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test(flavor = "multi_thread")]
async fn test_load_camera_starts_back_session() {
    let h = harness();
    assert!(h.controller.session_running());
    assert_eq!(
        h.controller.session_device_name(),
        Some("Virtual Camera (back)")
    );
    assert_eq!(h.stats.sessions_started(), 1);
    assert!(h.controller.latest_preview().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_flash_cycles_with_icon_and_toast() {
    let mut h = harness();
    let c = &mut h.controller;

    c.update(UiEvent::ToggleFlash);
    assert_eq!(c.configuration().flash_mode, FlashMode::On);
    assert_eq!(c.view().flash_icon, FlashIcon::FlashOn);
    assert_eq!(c.view().toast_text(), Some(messages::FLASH_ON));

    c.update(UiEvent::ToggleFlash);
    assert_eq!(c.view().flash_icon, FlashIcon::FlashAuto);
    assert_eq!(c.view().toast_text(), Some(messages::FLASH_AUTO));

    c.update(UiEvent::ToggleFlash);
    assert_eq!(c.configuration().flash_mode, FlashMode::Off);
    assert_eq!(c.view().flash_icon, FlashIcon::FlashOff);
    assert_eq!(c.view().toast_text(), Some(messages::FLASH_OFF));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_toggle_restyles_label() {
    let mut h = harness();
    let c = &mut h.controller;

    c.update(UiEvent::ToggleRaw);
    assert!(c.configuration().raw);
    assert_eq!(c.view().raw_label, LabelWeight::Heavy);
    assert_eq!(c.view().toast_text(), Some("RAW: true"));

    c.update(UiEvent::ToggleRaw);
    assert!(!c.configuration().raw);
    assert_eq!(c.view().raw_label, LabelWeight::Thin);
    assert_eq!(c.view().toast_text(), Some("RAW: false"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_refused_without_raw_formats() {
    let options = VirtualCameraOptions {
        raw_pixel_formats: Vec::new(),
        ..VirtualCameraOptions::default()
    };
    let mut h = harness_with(options, None);

    h.controller.update(UiEvent::ToggleRaw);
    assert!(!h.controller.configuration().raw);
    assert_eq!(h.controller.view().raw_label, LabelWeight::Thin);
    assert_eq!(
        h.controller.view().toast_text(),
        Some(messages::RAW_NOT_AVAILABLE)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_high_resolution_defaults_on_and_toggles() {
    let mut h = harness();
    assert!(h.controller.configuration().high_resolution);
    assert_eq!(h.controller.view().high_resolution_label, LabelWeight::Heavy);

    h.controller.update(UiEvent::ToggleHighResolution);
    assert!(!h.controller.configuration().high_resolution);
    assert_eq!(h.controller.view().high_resolution_label, LabelWeight::Thin);
    assert_eq!(
        h.controller.view().toast_text(),
        Some("High resolution: false")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_live_toggle_on_and_off() {
    let mut h = harness();
    let c = &mut h.controller;

    c.update(UiEvent::ToggleLive);
    assert_eq!(c.configuration().live_photo, LivePhotoMode::On);
    assert_eq!(c.view().live_label, LabelWeight::Heavy);
    assert_eq!(c.view().toast_text(), Some(messages::LIVE_ON));

    c.update(UiEvent::ToggleLive);
    assert_eq!(c.configuration().live_photo, LivePhotoMode::Off);
    assert_eq!(c.view().live_label, LabelWeight::Thin);
    assert_eq!(c.view().toast_text(), Some(messages::LIVE_OFF));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_live_unsupported_stays_unsupported() {
    let options = VirtualCameraOptions {
        live_photo_supported: false,
        ..VirtualCameraOptions::default()
    };
    let mut h = harness_with(options, None);
    assert_eq!(
        h.controller.configuration().live_photo,
        LivePhotoMode::Unsupported
    );

    for _ in 0..3 {
        h.controller.update(UiEvent::ToggleLive);
        assert_eq!(
            h.controller.configuration().live_photo,
            LivePhotoMode::Unsupported
        );
        assert_eq!(
            h.controller.view().toast_text(),
            Some(messages::LIVE_NOT_SUPPORTED)
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_camera_toggle_rebuilds_session() {
    let mut h = harness();

    h.controller.update(UiEvent::ToggleCamera);
    assert_eq!(h.controller.configuration().facing, CameraFacing::Front);
    assert_eq!(
        h.controller.view().toast_text(),
        Some(messages::CAMERA_FRONT)
    );
    assert_eq!(
        h.controller.session_device_name(),
        Some("Virtual Camera (front)")
    );
    assert_eq!(h.stats.sessions_opened(), 2);
    assert_eq!(h.stats.sessions_stopped(), 1);

    h.controller.update(UiEvent::ToggleCamera);
    assert_eq!(h.controller.configuration().facing, CameraFacing::Back);
    assert_eq!(h.controller.view().toast_text(), Some(messages::CAMERA_BACK));
    assert_eq!(h.stats.sessions_opened(), 3);
    assert!(h.controller.session_running());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_camera_leaves_no_session() {
    let options = VirtualCameraOptions {
        facings: vec![CameraFacing::Back],
        ..VirtualCameraOptions::default()
    };
    let mut h = harness_with(options, None);
    assert!(h.controller.has_session());

    h.controller.update(UiEvent::ToggleCamera);
    assert!(!h.controller.has_session());

    // Capturing without a session is ignored
    h.controller.update(UiEvent::TakePhoto);
    assert_eq!(h.controller.capture_state(), CaptureState::Idle);
    assert_eq!(h.stats.captures(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_capture_produces_jpeg_and_thumbnail() {
    let mut h = harness();
    capture(&mut h.controller).await;

    let image = h.controller.current_image().unwrap();
    assert!(image.file_name.ends_with(".jpg"));
    assert_eq!(&image.data[..2], &[0xFF, 0xD8]);
    assert_eq!(h.controller.capture_state(), CaptureState::Succeeded);
    assert!(h.controller.view().thumbnail_visible);

    // Portrait after the 90° rotation
    let (width, height) = h.controller.view().thumbnail.as_ref().unwrap().dimensions();
    assert!(height > width);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_capture_produces_dng() {
    let mut h = harness();
    h.controller.update(UiEvent::ToggleRaw);
    capture(&mut h.controller).await;

    let image = h.controller.current_image().unwrap();
    assert!(image.file_name.ends_with(".dng"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_capture_keeps_previous_image() {
    let mut h = harness();
    capture(&mut h.controller).await;
    let previous = h.controller.current_image().unwrap().file_name.clone();

    h.stats.set_fail_captures(true);
    h.controller.update(UiEvent::TakePhoto);
    h.controller.process_next_completion().await;

    assert_eq!(h.controller.capture_state(), CaptureState::Failed);
    assert_eq!(h.controller.outstanding_captures(), 0);
    assert_eq!(h.controller.current_image().unwrap().file_name, previous);
    assert!(h.controller.view().toast.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_capture_without_image() {
    let options = VirtualCameraOptions {
        fail_captures: true,
        ..VirtualCameraOptions::default()
    };
    let mut h = harness_with(options, None);

    h.controller.update(UiEvent::TakePhoto);
    h.controller.process_next_completion().await;

    assert!(h.controller.current_image().is_none());
    assert_eq!(h.controller.capture_state(), CaptureState::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_overlapping_captures_last_completion_wins() {
    let mut h = harness();
    h.controller.update(UiEvent::TakePhoto);
    h.controller.update(UiEvent::TakePhoto);
    assert_eq!(h.controller.outstanding_captures(), 2);
    assert_eq!(h.stats.captures(), 2);

    // Two capture completions and two processing completions
    let mut images = Vec::new();
    for _ in 0..4 {
        assert_eq!(h.controller.capture_state(), CaptureState::Requested);
        h.controller.process_next_completion().await;
        if let Some(image) = h.controller.current_image()
            && images.last() != Some(&image.file_name)
        {
            images.push(image.file_name.clone());
        }
    }

    assert_eq!(h.controller.outstanding_captures(), 0);
    assert_eq!(h.controller.capture_state(), CaptureState::Succeeded);
    // Both results landed in turn; the slot holds the one that arrived last
    assert_eq!(images.len(), 2);
    assert_eq!(
        h.controller.current_image().map(|image| &image.file_name),
        images.last()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_replaced_live_capture_removes_old_clip() {
    let mut h = harness();
    h.controller.update(UiEvent::ToggleLive);
    capture(&mut h.controller).await;
    capture(&mut h.controller).await;

    let clips: Vec<String> = files_in(&h.scratch_dir())
        .into_iter()
        .filter(|name| name.starts_with("Photoshot_"))
        .collect();
    assert_eq!(clips.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_new_capture_replaces_current_image() {
    let mut h = harness();
    capture(&mut h.controller).await;
    let first = h.controller.current_image().unwrap().file_name.clone();

    capture(&mut h.controller).await;
    let second = h.controller.current_image().unwrap().file_name.clone();
    assert_ne!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_save_without_image_is_noop() {
    let mut h = harness();
    h.controller.update(UiEvent::Save);
    h.controller.try_process_completions();
    assert!(h.controller.view().toast.is_none());
    assert!(files_in(&h.library_dir()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_save_writes_asset_and_cleans_scratch() {
    let mut h = harness();
    capture(&mut h.controller).await;
    h.controller.update(UiEvent::TogglePreview);
    assert!(h.controller.view().save_visible);

    h.controller.update(UiEvent::Save);
    h.controller.process_next_completion().await;
    h.controller.process_next_completion().await;

    let file_name = h.controller.current_image().unwrap().file_name.clone();
    assert_eq!(files_in(&h.library_dir()), vec![file_name.clone()]);
    assert_eq!(
        files_in(&h.library_dir().join("alternates")),
        vec![file_name]
    );
    assert!(files_in(&h.scratch_dir()).is_empty());
    assert!(!h.controller.view().save_visible);
    assert_eq!(h.controller.view().toast_text(), Some(messages::IMAGE_SAVED));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_live_capture_saves_paired_clip() {
    let mut h = harness();
    h.controller.update(UiEvent::ToggleLive);
    capture(&mut h.controller).await;

    h.controller.update(UiEvent::Save);
    h.controller.process_next_completion().await;
    h.controller.process_next_completion().await;

    let paired = files_in(&h.library_dir().join("paired"));
    assert_eq!(paired.len(), 1);
    assert!(paired[0].starts_with("Photoshot_"));
    assert!(files_in(&h.scratch_dir()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_library_failure_keeps_scratch_file() {
    let mut h = harness_with(VirtualCameraOptions::default(), Some(Arc::new(FailingLibrary)));
    capture(&mut h.controller).await;
    h.controller.update(UiEvent::TogglePreview);

    h.controller.update(UiEvent::Save);
    h.controller.process_next_completion().await;
    h.controller.process_next_completion().await;

    let file_name = h.controller.current_image().unwrap().file_name.clone();
    assert!(h.controller.view().toast.is_none());
    assert!(h.controller.view().save_visible);
    assert_eq!(files_in(&h.scratch_dir()), vec![file_name]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_denied_save_only_toasts() {
    let library = Arc::new(DeniedLibrary::default());
    let writes = Arc::clone(&library.writes);
    let mut h = harness_with(VirtualCameraOptions::default(), Some(library));
    capture(&mut h.controller).await;

    h.controller.update(UiEvent::Save);
    h.controller.process_next_completion().await;

    assert_eq!(
        h.controller.view().toast_text(),
        Some(messages::NOT_AUTHORIZED)
    );
    assert_eq!(writes.load(Ordering::SeqCst), 0);
    assert!(files_in(&h.scratch_dir()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_preview_toggle_controls_save_button() {
    let mut h = harness();
    h.controller.update(UiEvent::TogglePreview);
    assert!(h.controller.view().preview.expanded);
    assert!(h.controller.view().save_visible);

    h.controller.update(UiEvent::TogglePreview);
    assert!(!h.controller.view().preview.expanded);
    assert!(!h.controller.view().save_visible);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_suspend_and_resume() {
    let mut h = harness();
    h.controller.update(UiEvent::Suspend);
    assert!(!h.controller.session_running());
    assert_eq!(h.stats.sessions_stopped(), 1);

    h.controller.update(UiEvent::Resume);
    assert!(h.controller.session_running());
    assert_eq!(h.stats.sessions_started(), 2);
}

fn output(flash: Vec<FlashMode>) -> PhotoOutputCapabilities {
    PhotoOutputCapabilities {
        raw_pixel_formats: vec![PixelFormat::BayerGRBG, PixelFormat::BayerRGGB],
        supported_flash_modes: flash,
        live_photo_supported: true,
        high_resolution_supported: true,
        preview_pixel_formats: vec![PixelFormat::RGBA],
    }
}

#[test]
fn test_settings_follow_configuration() {
    let configuration = CaptureConfiguration {
        flash_mode: FlashMode::Auto,
        raw: true,
        live_photo: LivePhotoMode::On,
        ..CaptureConfiguration::default()
    };
    let settings = capture_settings_for(
        &configuration,
        &output(FlashMode::ALL.to_vec()),
        Path::new("/tmp/scratch"),
    );

    assert_eq!(settings.raw_pixel_format, Some(PixelFormat::BayerGRBG));
    assert_eq!(settings.flash_mode, Some(FlashMode::Auto));
    assert!(settings.high_resolution);
    let movie = settings.live_photo_movie_path.unwrap();
    assert_eq!(
        movie,
        Path::new("/tmp/scratch").join(format!("Photoshot_{}", settings.unique_id))
    );
    let preview = settings.preview_format.unwrap();
    assert_eq!(preview.pixel_format, PixelFormat::RGBA);
    assert!(preview.width > preview.height);
}

#[test]
fn test_settings_omit_unsupported_and_disabled_options() {
    let configuration = CaptureConfiguration {
        flash_mode: FlashMode::On,
        ..CaptureConfiguration::default()
    };
    let settings = capture_settings_for(
        &configuration,
        &output(vec![FlashMode::Off]),
        Path::new("/tmp"),
    );

    assert_eq!(settings.flash_mode, None);
    assert_eq!(settings.raw_pixel_format, None);
    assert!(settings.live_photo_movie_path.is_none());
}
