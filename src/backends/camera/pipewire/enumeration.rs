// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera enumeration and format detection
//!
//! Cameras are discovered through `pw-cli ls Node`; the libcamera location and
//! rotation come from `pw-cli info <id>`, formats from
//! `pw-cli enum-params <id> EnumFormat`.

use super::super::types::{
    CameraDevice, CameraFacing, CameraFormat, DeviceType, Framerate, SensorRotation,
};
use crate::constants::formats;
use tracing::{debug, info, warn};

/// A `Video/Source` node as listed by `pw-cli ls Node`
#[derive(Debug, Clone, PartialEq, Eq)]
struct VideoNode {
    id: String,
    serial: Option<String>,
    name: String,
}

impl VideoNode {
    /// Device path understood by the pipeline builder
    fn device_path(&self) -> String {
        match &self.serial {
            Some(serial) => format!("pipewire-serial-{}", serial),
            None => format!("pipewire-{}", self.id),
        }
    }
}

/// libcamera properties only visible through `pw-cli info`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NodeProperties {
    rotation: SensorRotation,
    location: Option<String>,
}

/// Enumerate cameras using PipeWire
///
/// Falls back to a single auto-selected camera when `pw-cli` lists nothing.
pub fn enumerate_pipewire_cameras() -> Option<Vec<CameraDevice>> {
    debug!("Attempting to enumerate cameras via PipeWire");

    if !is_pipewire_available() {
        debug!("pipewiresrc not available");
        return None;
    }

    if let Some(cameras) = try_enumerate_with_pw_cli() {
        debug!(count = cameras.len(), "Found PipeWire cameras");
        return Some(cameras);
    }

    info!("Using PipeWire auto-selection (default camera)");
    Some(vec![CameraDevice {
        name: "Default Camera (PipeWire)".to_string(),
        path: String::new(), // Empty path = PipeWire auto-selects
        metadata_path: None,
        device_type: DeviceType::BuiltInWideAngle,
        facing: None,
        rotation: SensorRotation::None,
    }])
}

fn try_enumerate_with_pw_cli() -> Option<Vec<CameraDevice>> {
    debug!("Trying pw-cli for camera enumeration");

    let stdout = run_pw_cli(&["ls", "Node"])?;
    let cameras: Vec<CameraDevice> = parse_video_nodes(&stdout)
        .into_iter()
        .map(|node| {
            let props = query_node_properties(&node.id);
            camera_from_node(node, props)
        })
        .collect();

    if cameras.is_empty() {
        debug!("No cameras found via pw-cli");
        None
    } else {
        Some(cameras)
    }
}

fn run_pw_cli(args: &[&str]) -> Option<String> {
    let output = std::process::Command::new("pw-cli").args(args).output().ok()?;
    if !output.status.success() {
        debug!(?args, "pw-cli command failed");
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn camera_from_node(node: VideoNode, props: NodeProperties) -> CameraDevice {
    let facing = props.location.as_deref().and_then(CameraFacing::from_location);
    let device_type = match props.location.as_deref() {
        Some("external") => DeviceType::External,
        _ => DeviceType::BuiltInWideAngle,
    };
    let path = node.device_path();

    debug!(
        id = %node.id,
        name = %node.name,
        %path,
        rotation = %props.rotation,
        location = ?props.location,
        "Found video camera"
    );

    CameraDevice {
        name: node.name,
        path,
        metadata_path: Some(node.id), // Node ID for format enumeration
        device_type,
        facing,
        rotation: props.rotation,
    }
}

/// Parse `pw-cli ls Node` output into video source nodes
fn parse_video_nodes(stdout: &str) -> Vec<VideoNode> {
    let mut nodes = Vec::new();
    let mut current_id: Option<String> = None;
    let mut current_serial: Option<String> = None;
    let mut current_name: Option<String> = None;
    let mut is_video_source = false;

    let mut flush = |id: &Option<String>,
                     serial: &Option<String>,
                     name: &Option<String>,
                     is_video: bool| {
        if let (true, Some(id), Some(name)) = (is_video, id, name) {
            nodes.push(VideoNode {
                id: id.clone(),
                serial: serial.clone(),
                name: name.clone(),
            });
        }
    };

    for line in stdout.lines() {
        let trimmed = line.trim();

        // "id 76, type PipeWire:Interface:Node/3"
        if trimmed.starts_with("id ") && trimmed.contains("type PipeWire:Interface:Node") {
            flush(&current_id, &current_serial, &current_name, is_video_source);

            current_id = trimmed
                .strip_prefix("id ")
                .and_then(|rest| rest.split(',').next())
                .map(|id| id.trim().to_string());
            current_serial = None;
            current_name = None;
            is_video_source = false;
            continue;
        }

        if trimmed.contains("media.class") && trimmed.contains("\"Video/Source\"") {
            is_video_source = true;
        } else if trimmed.contains("object.serial") {
            current_serial = extract_quoted_value(trimmed);
        } else if trimmed.contains("node.description") {
            current_name = extract_quoted_value(trimmed);
        }
    }

    flush(&current_id, &current_serial, &current_name, is_video_source);
    nodes
}

/// Extract quoted value from a property line (e.g., 'property = "value"' -> "value")
fn extract_quoted_value(line: &str) -> Option<String> {
    let start = line.find('"')?;
    let end = line[start + 1..].find('"')?;
    Some(line[start + 1..start + 1 + end].to_string())
}

/// Query rotation and location for a PipeWire node
///
/// `pw-cli ls Node` doesn't include the `api.libcamera.*` properties.
fn query_node_properties(node_id: &str) -> NodeProperties {
    match run_pw_cli(&["info", node_id]) {
        Some(stdout) => parse_node_properties(&stdout),
        None => {
            debug!(node_id, "Failed to query node info");
            NodeProperties::default()
        }
    }
}

fn parse_node_properties(stdout: &str) -> NodeProperties {
    let mut props = NodeProperties::default();
    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.contains("api.libcamera.rotation")
            && let Some(value) = extract_quoted_value(trimmed)
        {
            props.rotation = SensorRotation::from_degrees(&value);
        } else if trimmed.contains("api.libcamera.location")
            && let Some(value) = extract_quoted_value(trimmed)
        {
            props.location = Some(value.to_ascii_lowercase());
        }
    }
    props
}

/// Get supported formats for a PipeWire camera
pub fn get_pipewire_formats(device_path: &str, metadata_path: Option<&str>) -> Vec<CameraFormat> {
    debug!(device_path, metadata_path = ?metadata_path, "Getting PipeWire formats");

    if let Some(node_id) = metadata_path {
        let parsed = run_pw_cli(&["enum-params", node_id, "EnumFormat"])
            .map(|stdout| parse_enum_formats(&stdout))
            .filter(|formats| !formats.is_empty());
        match parsed {
            Some(formats) => {
                info!(count = formats.len(), node_id = %node_id, "Enumerated formats via pw-cli");
                return formats;
            }
            None => warn!(node_id = %node_id, "Failed to enumerate formats from node, using fallback"),
        }
    } else {
        warn!(
            device_path,
            "No node ID provided for format enumeration, using fallback"
        );
    }

    get_fallback_formats()
}

/// Fallback formats when PipeWire enumeration fails
fn get_fallback_formats() -> Vec<CameraFormat> {
    let resolutions = [(1920, 1080), (1280, 720), (640, 480)];
    resolutions
        .iter()
        .flat_map(|&(width, height)| {
            formats::COMMON_FRAMERATES.iter().map(move |&fps| CameraFormat {
                width,
                height,
                framerate: Some(Framerate::from_int(fps)),
                pixel_format: "MJPG".to_string(),
            })
        })
        .collect()
}

/// Format group being accumulated while walking `EnumFormat` objects
#[derive(Default)]
struct FormatGroup {
    width: Option<u32>,
    height: Option<u32>,
    framerates: Vec<Framerate>,
    subtype: Option<String>,
    video_format: Option<String>,
}

impl FormatGroup {
    fn drain_into(&mut self, out: &mut Vec<CameraFormat>) {
        let group = std::mem::take(self);
        let (Some(width), Some(height), Some(subtype)) = (group.width, group.height, group.subtype)
        else {
            return;
        };

        // Raw groups carry a VideoFormat; bayer and compressed ones are named by subtype
        let pixel_format = match subtype.as_str() {
            "raw" => group.video_format.unwrap_or_else(|| "YUY2".to_string()),
            "bayer" => group
                .video_format
                .map(|f| f.to_lowercase())
                .unwrap_or_else(|| "rggb".to_string()),
            other => other.to_uppercase(),
        };

        // libcamera nodes expose no framerates; let it negotiate
        if group.framerates.is_empty() {
            out.push(CameraFormat {
                width,
                height,
                framerate: None,
                pixel_format,
            });
        } else {
            for fps in group.framerates {
                out.push(CameraFormat {
                    width,
                    height,
                    framerate: Some(fps),
                    pixel_format: pixel_format.clone(),
                });
            }
        }
    }
}

/// Parse `pw-cli enum-params <id> EnumFormat` output
fn parse_enum_formats(stdout: &str) -> Vec<CameraFormat> {
    let mut formats = Vec::new();
    let mut group = FormatGroup::default();

    for line in stdout.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("Object:") {
            group.drain_into(&mut formats);
            continue;
        }

        // "Id 1   (Spa:Enum:MediaSubtype:raw)"
        if trimmed.contains("Spa:Enum:MediaSubtype:")
            && let Some(start) = trimmed.rfind(':')
        {
            group.subtype = Some(trimmed[start + 1..].trim_end_matches(')').to_lowercase());
        }

        // "Id 4   (Spa:Enum:VideoFormat:YUY2)"
        if trimmed.contains("Spa:Enum:VideoFormat:")
            && let Some(start) = trimmed.rfind(':')
        {
            group.video_format = Some(trimmed[start + 1..].trim_end_matches(')').to_uppercase());
        }

        // "Rectangle 1920x1080"
        if let Some(res) = trimmed.strip_prefix("Rectangle ")
            && let Some((w, h)) = res.split_once('x')
        {
            group.width = w.trim().parse().ok();
            group.height = h.trim().parse().ok();
        }

        // "Fraction 60000/1001"
        if let Some(frac) = trimmed.strip_prefix("Fraction ")
            && let Some((num, denom)) = frac.split_once('/')
            && let (Ok(num), Ok(denom)) = (num.trim().parse::<u32>(), denom.trim().parse::<u32>())
            && denom > 0
            && num > 0
        {
            let fps = Framerate::new(num, denom);
            if !group.framerates.contains(&fps) {
                group.framerates.push(fps);
            }
        }
    }

    group.drain_into(&mut formats);
    formats
}

/// Test if PipeWire is available and working
pub fn is_pipewire_available() -> bool {
    if gstreamer::init().is_err() {
        return false;
    }
    gstreamer::ElementFactory::find("pipewiresrc").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LS_NODE: &str = r#"
	id 31, type PipeWire:Interface:Node/3
 		object.serial = "31"
 		node.description = "Dummy-Driver"
 		media.class = "Audio/Sink"
	id 76, type PipeWire:Interface:Node/3
 		object.serial = "2146"
 		object.path = "v4l2:/dev/video0"
 		node.description = "Laptop Webcam (V4L2)"
 		media.class = "Video/Source"
	id 81, type PipeWire:Interface:Node/3
 		node.description = "Front Camera"
 		media.class = "Video/Source"
"#;

    #[test]
    fn test_parse_video_nodes_keeps_only_video_sources() {
        let nodes = parse_video_nodes(LS_NODE);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "Laptop Webcam (V4L2)");
        assert_eq!(nodes[0].device_path(), "pipewire-serial-2146");
        assert_eq!(nodes[1].id, "81");
        assert_eq!(nodes[1].device_path(), "pipewire-81");
    }

    #[test]
    fn test_node_properties_map_to_facing() {
        let props = parse_node_properties(
            r#"
  properties:
    api.libcamera.location = "front"
    api.libcamera.rotation = "270"
"#,
        );
        assert_eq!(props.rotation, SensorRotation::Rotate270);

        let node = VideoNode {
            id: "81".to_string(),
            serial: None,
            name: "Front Camera".to_string(),
        };
        let device = camera_from_node(node, props);
        assert_eq!(device.facing, Some(CameraFacing::Front));
        assert_eq!(device.device_type, DeviceType::BuiltInWideAngle);
        assert_eq!(device.metadata_path.as_deref(), Some("81"));
    }

    #[test]
    fn test_external_location_has_no_facing() {
        let props = parse_node_properties(r#"api.libcamera.location = "external""#);
        let node = VideoNode {
            id: "90".to_string(),
            serial: Some("7".to_string()),
            name: "USB".to_string(),
        };
        let device = camera_from_node(node, props);
        assert_eq!(device.facing, None);
        assert_eq!(device.device_type, DeviceType::External);
    }

    #[test]
    fn test_parse_enum_formats_groups_objects() {
        let stdout = r#"
  Object: size 232, type Spa:Pod:Object:Param:Format (262147), id Spa:Enum:ParamId:EnumFormat (3)
    Prop: key Spa:Pod:Object:Param:Format:mediaSubtype (2), flags 00000000
      Id 1        (Spa:Enum:MediaSubtype:raw)
    Prop: key Spa:Pod:Object:Param:Format:Video:format (131073), flags 00000000
      Id 4        (Spa:Enum:VideoFormat:YUY2)
      Rectangle 640x480
      Fraction 30/1
      Fraction 15/1
  Object: size 200, type Spa:Pod:Object:Param:Format (262147), id Spa:Enum:ParamId:EnumFormat (3)
      Id 131074   (Spa:Enum:MediaSubtype:bayer)
      Rectangle 3280x2464
"#;
        let formats = parse_enum_formats(stdout);
        assert_eq!(formats.len(), 3);
        assert_eq!(formats[0].pixel_format, "YUY2");
        assert_eq!(formats[0].framerate, Some(Framerate::from_int(30)));
        assert_eq!(formats[2].width, 3280);
        assert_eq!(formats[2].framerate, None);
        assert!(formats[2].is_bayer());
    }

    #[test]
    fn test_fallback_formats_are_not_empty() {
        let formats = get_fallback_formats();
        assert!(!formats.is_empty());
        assert!(formats.iter().all(|f| f.pixel_format == "MJPG"));
    }
}
