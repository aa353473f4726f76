// SPDX-License-Identifier: GPL-3.0-only

//! Flash mode and hardware flash LED control via Linux sysfs
//!
//! Discovers and controls flash LEDs exposed at `/sys/class/leds/*:flash`.
//! Uses torch mode (brightness file) which is group-writable by `feedbackd`,
//! avoiding the root-only `flash_strobe`/`flash_brightness` interface.

use crate::constants::{capture, messages};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Flash operating mode for still capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlashMode {
    /// Flash never fires
    #[default]
    Off,
    /// Flash fires for every capture
    On,
    /// Flash fires when the scene is dark
    Auto,
}

impl FlashMode {
    /// All modes in toggle order
    pub const ALL: [FlashMode; 3] = [FlashMode::Off, FlashMode::On, FlashMode::Auto];

    /// Cycle to the next mode: Off -> On -> Auto -> Off
    pub fn next(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Auto,
            FlashMode::Auto => FlashMode::Off,
        }
    }

    /// Icon shown on the flash button
    pub fn icon(self) -> FlashIcon {
        match self {
            FlashMode::Off => FlashIcon::FlashOff,
            FlashMode::On => FlashIcon::FlashOn,
            FlashMode::Auto => FlashIcon::FlashAuto,
        }
    }

    /// Status message shown after switching to this mode
    pub fn status_message(self) -> &'static str {
        match self {
            FlashMode::Off => messages::FLASH_OFF,
            FlashMode::On => messages::FLASH_ON,
            FlashMode::Auto => messages::FLASH_AUTO,
        }
    }

    /// Decide whether the LED fires for a capture, given the mean scene luma (0-255)
    pub fn should_fire(self, scene_luma: Option<f32>) -> bool {
        match self {
            FlashMode::Off => false,
            FlashMode::On => true,
            // Without a preview frame we can't judge the scene, so stay dark
            FlashMode::Auto => {
                scene_luma.is_some_and(|luma| luma < capture::AUTO_FLASH_LUMA_THRESHOLD)
            }
        }
    }
}

impl std::fmt::Display for FlashMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlashMode::Off => write!(f, "off"),
            FlashMode::On => write!(f, "on"),
            FlashMode::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for FlashMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(FlashMode::Off),
            "on" => Ok(FlashMode::On),
            "auto" => Ok(FlashMode::Auto),
            _ => Err(format!("unknown flash mode '{}'", s)),
        }
    }
}

/// Flash button icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashIcon {
    #[default]
    FlashOff,
    FlashOn,
    FlashAuto,
}

impl FlashIcon {
    /// Asset name of the icon
    pub fn name(self) -> &'static str {
        match self {
            FlashIcon::FlashOff => "FlashOff",
            FlashIcon::FlashOn => "FlashOn",
            FlashIcon::FlashAuto => "FlashAuto",
        }
    }

    /// Terminal glyph for the icon
    pub fn glyph(self) -> &'static str {
        match self {
            FlashIcon::FlashOff => "⚡̸ off",
            FlashIcon::FlashOn => "⚡ on",
            FlashIcon::FlashAuto => "⚡ A",
        }
    }
}

/// A flash LED device discovered via sysfs
#[derive(Debug, Clone)]
pub struct FlashDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
    /// Human-readable name (directory basename)
    name: String,
}

impl FlashDevice {
    /// Scan `/sys/class/leds/` for writable `*:flash` entries
    pub fn discover() -> Vec<FlashDevice> {
        Self::discover_in(Path::new("/sys/class/leds"))
    }

    /// Scan a leds directory for writable `*:flash` entries
    pub fn discover_in(leds_dir: &Path) -> Vec<FlashDevice> {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            debug!(dir = %leds_dir.display(), "Cannot read leds directory, no flash");
            return Vec::new();
        };

        let mut devices = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };

            // Match entries like "white:flash", "yellow:flash"
            if !name_str.ends_with(":flash") {
                continue;
            }

            let led_path = entry.path();
            let brightness_path = led_path.join("brightness");
            let max_brightness_path = led_path.join("max_brightness");

            let max_brightness = match std::fs::read_to_string(&max_brightness_path) {
                Ok(s) => match s.trim().parse::<u32>() {
                    Ok(v) if v > 0 => v,
                    _ => {
                        warn!(
                            path = %max_brightness_path.display(),
                            "Invalid max_brightness value"
                        );
                        continue;
                    }
                },
                Err(e) => {
                    warn!(
                        path = %max_brightness_path.display(),
                        error = %e,
                        "Cannot read max_brightness"
                    );
                    continue;
                }
            };

            if let Err(e) = std::fs::OpenOptions::new()
                .write(true)
                .open(&brightness_path)
            {
                warn!(
                    path = %brightness_path.display(),
                    error = %e,
                    "Cannot write brightness, user may need to be in 'feedbackd' group"
                );
                continue;
            }

            info!(name = name_str, max_brightness, "Discovered flash LED");

            devices.push(FlashDevice {
                path: led_path,
                max_brightness,
                name: name_str.to_string(),
            });
        }

        // Deterministic ordering (white before yellow)
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        devices
    }

    /// Get the device name (e.g. "white:flash")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set raw brightness value (0 = off, max_brightness = full)
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        let clamped = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), clamped.to_string())
    }

    /// Turn off the LED
    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }

    /// Turn on at a fraction of max brightness (0.0 = off, 1.0 = full)
    pub fn torch(&self, intensity: f32) -> io::Result<()> {
        let clamped = intensity.clamp(0.0, 1.0);
        let value = (clamped * self.max_brightness as f32).round() as u32;
        self.set_brightness(value)
    }
}

/// Turn on all discovered flash devices at full brightness
pub fn all_on(devices: &[FlashDevice]) {
    for dev in devices {
        if let Err(e) = dev.torch(1.0) {
            warn!(device = %dev.name, error = %e, "Failed to turn on flash LED");
        }
    }
}

/// Turn off all discovered flash devices
pub fn all_off(devices: &[FlashDevice]) {
    for dev in devices {
        if let Err(e) = dev.off() {
            warn!(device = %dev.name, error = %e, "Failed to turn off flash LED");
        }
    }
}
