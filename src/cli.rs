// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! - Listing available cameras
//! - Taking a single photo without the terminal UI

use photoshot::app::{CaptureConfiguration, LivePhotoMode, capture_settings_for};
use photoshot::backends::camera::types::{
    BackendError, CameraDevice, CameraFacing, DeviceType, PhotoRequest,
};
use photoshot::backends::camera::{CameraBackend, CaptureSession};
use photoshot::backends::library::{
    AssetCreationRequest, DirectoryLibrary, LibraryError, MediaLibrary, ResourceType,
};
use photoshot::config::Config;
use photoshot::constants::timing;
use photoshot::errors::AppResult;
use photoshot::flash::FlashMode;
use photoshot::pipelines::photo::{CameraMetadata, PhotoEncoder, PhotoPipeline};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// List all available cameras
pub fn list_cameras(backend: &dyn CameraBackend) -> AppResult<()> {
    let cameras = backend.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let facing = camera
            .facing
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("  [{}] {} (facing: {})", index, camera.name, facing);

        let mut formats = backend.get_formats(camera);
        if !formats.is_empty() {
            formats.sort_by_key(|f| std::cmp::Reverse(f.pixel_count()));
            formats.dedup_by_key(|f| (f.width, f.height));

            // Show top 3 resolutions
            let res_strs: Vec<String> = formats
                .iter()
                .take(3)
                .map(|f| format!("{}x{} {}", f.width, f.height, f.pixel_format))
                .collect();
            println!("      Formats: {}", res_strs.join(", "));
        }
        println!();
    }

    Ok(())
}

/// Options for a single capture
pub struct PhotoOptions {
    pub facing: CameraFacing,
    pub raw: bool,
    pub flash: FlashMode,
    pub output: Option<PathBuf>,
}

/// Take a photo and store it in the library, or at `output` when given
pub fn take_photo(
    backend: &dyn CameraBackend,
    config: &Config,
    options: PhotoOptions,
) -> AppResult<()> {
    let device = find_device(backend, options.facing)
        .ok_or_else(|| BackendError::DeviceNotFound(format!("{} camera", options.facing)))?;
    println!("Using camera: {}", device.name);

    let mut session = backend.open_session(&device, config.session_preset)?;
    if session.photo_output().high_resolution_supported {
        session.set_high_resolution_capture_enabled(true);
    }
    if options.raw && !session.photo_output().supports_raw() {
        return Err("RAW not available on this camera".into());
    }
    println!("Capture format: {}", session.format());

    session.start_running()?;
    let result = capture_and_store(session.as_mut(), config, &options);
    session.stop_running()?;

    let path = result?;
    println!("Photo saved: {}", path.display());
    Ok(())
}

fn find_device(backend: &dyn CameraBackend, facing: CameraFacing) -> Option<CameraDevice> {
    backend
        .default_device(DeviceType::BuiltInWideAngle, facing)
        .or_else(|| backend.default_device(DeviceType::External, facing))
        .or_else(|| backend.enumerate_cameras().into_iter().next())
}

fn capture_and_store(
    session: &mut dyn CaptureSession,
    config: &Config,
    options: &PhotoOptions,
) -> AppResult<PathBuf> {
    // Camera warm-up
    println!("Capturing...");
    std::thread::sleep(Duration::from_millis(timing::CLI_WARMUP_MS));

    let configuration = CaptureConfiguration {
        flash_mode: options.flash,
        facing: options.facing,
        high_resolution: config.high_resolution,
        raw: options.raw,
        live_photo: LivePhotoMode::Off,
    };
    let settings = capture_settings_for(&configuration, session.photo_output(), &config.scratch_dir());
    let request = session.capture_photo(settings);

    let mut encoder = PhotoEncoder::with_quality(config.jpeg_quality);
    encoder.set_camera_metadata(CameraMetadata {
        camera_name: Some(session.device().name.clone()),
        backend: None,
    });
    let pipeline = PhotoPipeline::new(encoder);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(store_capture(request, pipeline, config, options.output.as_deref()))
}

async fn store_capture(
    request: PhotoRequest,
    pipeline: PhotoPipeline,
    config: &Config,
    output: Option<&Path>,
) -> AppResult<PathBuf> {
    let photo = request.await?;
    let image = pipeline.process(photo).await?.image;

    if let Some(path) = output.filter(|p| !p.is_dir()) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &image.data)?;
        return Ok(path.to_path_buf());
    }

    let root = output.map(Path::to_path_buf).unwrap_or_else(|| config.library_dir());
    let library = DirectoryLibrary::new(root);
    if !library.request_authorization().await.is_authorized() {
        return Err(LibraryError::NotAuthorized.into());
    }
    let request = AssetCreationRequest::for_asset().add_resource_with_data(
        ResourceType::Photo,
        image.data,
        image.file_name,
    );
    let asset = library.perform_changes(request).await?;
    let path = asset.paths.into_iter().next().ok_or("Library stored no files")?;
    Ok(path)
}
