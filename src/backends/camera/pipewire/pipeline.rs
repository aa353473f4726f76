// SPDX-License-Identifier: MPL-2.0

//! PipeWire GStreamer pipeline for camera capture
//!
//! ```text
//! pipewiresrc ! <decode/convert> ! video/x-raw,format=RGBA ! appsink name=sink
//! pipewiresrc ! video/x-bayer ! tee ─┬─ bayer2rgb ! … ! appsink name=sink
//!                                    └─ appsink name=rawsink
//! ```
//!
//! Each appsink stores the newest frame into a shared slot; capture requests
//! read from those slots.

use super::super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Newest frame delivered by an appsink
pub type FrameSlot = Arc<Mutex<Option<CameraFrame>>>;

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// PipeWire camera pipeline
pub struct PipeWirePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    raw_appsink: Option<AppSink>,
}

impl PipeWirePipeline {
    /// Build and start a pipeline; processed frames land in `processed`,
    /// Bayer frames (when the format is Bayer) in `raw`
    pub fn new(
        device: &CameraDevice,
        format: &CameraFormat,
        processed: FrameSlot,
        raw: FrameSlot,
    ) -> BackendResult<Self> {
        info!(
            device = %device.name,
            format = %format,
            "Creating PipeWire pipeline"
        );

        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let device_path = determine_pipewire_path(&device.path);
        let pipeline_str = build_pipeline_string(&device_path, format);
        info!(pipeline = %pipeline_str, "Launching pipeline");

        let pipeline = gstreamer::parse::launch(&pipeline_str)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| BackendError::InitializationFailed("Failed to cast to pipeline".into()))?;

        let appsink = sink_by_name(&pipeline, "sink")?;
        configure_appsink(&appsink);
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| store_processed_sample(appsink, &processed))
                .build(),
        );

        let raw_appsink = if format.is_bayer() {
            let sink = sink_by_name(&pipeline, "rawsink")?;
            configure_appsink(&sink);
            sink.set_callbacks(
                gstreamer_app::AppSinkCallbacks::builder()
                    .new_sample(move |appsink| store_raw_sample(appsink, &raw))
                    .build(),
            );
            Some(sink)
        } else {
            None
        };

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
        })?;

        let (result, state, pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");
        if state != gstreamer::State::Playing {
            warn!("Pipeline is not in PLAYING state");
        }

        Ok(Self {
            pipeline,
            appsink,
            raw_appsink,
        })
    }

    /// Stop the pipeline and release the camera
    pub fn stop(self) -> BackendResult<()> {
        info!("Stopping PipeWire pipeline");
        self.clear_callbacks();

        self.pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)))?;

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => info!(state = ?state, "PipeWire pipeline stopped successfully"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }
        Ok(())
    }

    fn clear_callbacks(&self) {
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        if let Some(ref raw) = self.raw_appsink {
            raw.set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        }
    }
}

impl Drop for PipeWirePipeline {
    fn drop(&mut self) {
        self.clear_callbacks();
        // Release the device immediately
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

fn sink_by_name(pipeline: &gstreamer::Pipeline, name: &str) -> BackendResult<AppSink> {
    pipeline
        .by_name(name)
        .ok_or_else(|| BackendError::InitializationFailed(format!("Failed to get {}", name)))?
        .dynamic_cast::<AppSink>()
        .map_err(|_| BackendError::InitializationFailed(format!("Failed to cast {}", name)))
}

fn configure_appsink(appsink: &AppSink) {
    appsink.set_property("emit-signals", true);
    appsink.set_property("sync", false);
    appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
    appsink.set_property("drop", true);
    appsink.set_property("enable-last-sample", false);
}

fn store_processed_sample(
    appsink: &AppSink,
    slot: &FrameSlot,
) -> Result<gstreamer::FlowSuccess, gstreamer::FlowError> {
    let frame_start = Instant::now();
    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

    let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
    let video_info = VideoInfo::from_caps(caps).map_err(|e| {
        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
            error!(frame = frame_num, error = ?e, "Failed to get video info");
        }
        gstreamer::FlowError::Error
    })?;

    let buffer = sample.buffer_owned().ok_or(gstreamer::FlowError::Error)?;
    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
        return Ok(gstreamer::FlowSuccess::Ok);
    }
    let mapped = buffer
        .into_mapped_buffer_readable()
        .map_err(|_| gstreamer::FlowError::Error)?;

    let frame = CameraFrame {
        width: video_info.width(),
        height: video_info.height(),
        data: FrameData::from_mapped_buffer(mapped),
        format: PixelFormat::RGBA,
        stride: video_info.stride()[0] as u32,
        captured_at: frame_start,
    };

    if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
        debug!(
            frame = frame_num,
            width = frame.width,
            height = frame.height,
            stride = frame.stride,
            "Preview frame"
        );
    }

    if let Ok(mut latest) = slot.lock() {
        *latest = Some(frame);
    }
    Ok(gstreamer::FlowSuccess::Ok)
}

fn store_raw_sample(
    appsink: &AppSink,
    slot: &FrameSlot,
) -> Result<gstreamer::FlowSuccess, gstreamer::FlowError> {
    let captured_at = Instant::now();
    let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
    let structure = caps.structure(0).ok_or(gstreamer::FlowError::Error)?;

    // video/x-bayer caps carry no VideoInfo
    let width = structure.get::<i32>("width").map_err(|_| gstreamer::FlowError::Error)? as u32;
    let height = structure.get::<i32>("height").map_err(|_| gstreamer::FlowError::Error)? as u32;
    let format = structure
        .get::<&str>("format")
        .ok()
        .and_then(PixelFormat::from_gst_format)
        .unwrap_or(PixelFormat::BayerRGGB);

    let buffer = sample.buffer_owned().ok_or(gstreamer::FlowError::Error)?;
    let mapped = buffer
        .into_mapped_buffer_readable()
        .map_err(|_| gstreamer::FlowError::Error)?;

    let frame = CameraFrame {
        width,
        height,
        data: FrameData::from_mapped_buffer(mapped),
        format,
        stride: width,
        captured_at,
    };

    if let Ok(mut latest) = slot.lock() {
        *latest = Some(frame);
    }
    Ok(gstreamer::FlowSuccess::Ok)
}

/// Determine the `pipewiresrc` target property from a device path
pub(crate) fn determine_pipewire_path(device_path: &str) -> String {
    if device_path.is_empty() {
        // Empty path = PipeWire auto-selects the default camera
        String::new()
    } else if let Some(serial) = device_path.strip_prefix("pipewire-serial-") {
        format!("target-object={} ", serial)
    } else if let Some(node_id) = device_path.strip_prefix("pipewire-") {
        format!("target-object={} ", node_id)
    } else if device_path.starts_with("v4l2:") {
        format!("path={} ", device_path)
    } else if device_path.starts_with("/dev/video") {
        format!("path=v4l2:{} ", device_path)
    } else {
        warn!(device_path, "Unknown device path format, using path property");
        format!("path={} ", device_path)
    }
}

/// Build the `gst-launch` description for a camera format
pub(crate) fn build_pipeline_string(pw_path_prop: &str, format: &CameraFormat) -> String {
    let mut caps = format!("width=(int){},height=(int){}", format.width, format.height);
    if let Some(fps) = format.framerate {
        caps.push_str(&format!(",framerate=(fraction){}", fps.as_gst_fraction()));
    }

    let convert = format!(
        "videoconvert n-threads={} ! video/x-raw,format={} ! \
         appsink name=sink",
        pipeline::videoconvert_threads(),
        pipeline::OUTPUT_FORMAT
    );

    if format.is_bayer() {
        let bayer_format = format.pixel_format.to_lowercase();
        return format!(
            "pipewiresrc {}do-timestamp=true ! video/x-bayer,format={},{} ! tee name=t \
             t. ! queue max-size-buffers={} leaky=downstream ! bayer2rgb ! {} \
             t. ! queue max-size-buffers={} leaky=downstream ! appsink name=rawsink",
            pw_path_prop,
            bayer_format,
            caps,
            pipeline::MAX_BUFFERS,
            convert,
            pipeline::MAX_BUFFERS
        );
    }

    match format.pixel_format.as_str() {
        "MJPG" | "MJPEG" => format!(
            "pipewiresrc {}do-timestamp=true ! image/jpeg,{} ! jpegparse ! jpegdec ! \
             queue max-size-buffers={} leaky=downstream ! {}",
            pw_path_prop,
            caps,
            pipeline::MAX_BUFFERS,
            convert
        ),
        _ => format!(
            "pipewiresrc {}do-timestamp=true ! video/x-raw,{} ! \
             queue max-size-buffers={} leaky=downstream ! {}",
            pw_path_prop,
            caps,
            pipeline::MAX_BUFFERS,
            convert
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(pixel_format: &str) -> CameraFormat {
        CameraFormat {
            width: 1280,
            height: 720,
            framerate: Some(Framerate::from_int(30)),
            pixel_format: pixel_format.to_string(),
        }
    }

    #[test]
    fn test_pipewire_path_variants() {
        assert_eq!(determine_pipewire_path(""), "");
        assert_eq!(
            determine_pipewire_path("pipewire-serial-2146"),
            "target-object=2146 "
        );
        assert_eq!(determine_pipewire_path("pipewire-76"), "target-object=76 ");
        assert_eq!(
            determine_pipewire_path("/dev/video0"),
            "path=v4l2:/dev/video0 "
        );
    }

    #[test]
    fn test_mjpeg_pipeline_decodes_to_rgba() {
        let desc = build_pipeline_string("target-object=1 ", &format("MJPG"));
        assert!(desc.contains("image/jpeg,width=(int)1280,height=(int)720,framerate=(fraction)30/1"));
        assert!(desc.contains("jpegdec"));
        assert!(desc.contains("video/x-raw,format=RGBA"));
        assert!(!desc.contains("rawsink"));
    }

    #[test]
    fn test_bayer_pipeline_has_raw_branch() {
        let desc = build_pipeline_string("", &format("rggb"));
        assert!(desc.contains("video/x-bayer,format=rggb"));
        assert!(desc.contains("bayer2rgb"));
        assert!(desc.contains("appsink name=rawsink"));
        assert!(desc.contains("appsink name=sink"));
    }
}
