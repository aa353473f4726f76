// SPDX-License-Identifier: MPL-2.0

//! PhotoShot - a single-screen camera
//!
//! Shows a live camera preview, captures still photos (optionally RAW,
//! high-resolution, live or with flash), toggles the camera facing and
//! saves the result to the photo library.
//!
//! # Architecture
//!
//! - [`app`]: Capture controller, UI events and presentation state
//! - [`backends`]: Camera backends (PipeWire, virtual) and the photo library
//! - [`pipelines`]: Photo encoding and thumbnails
//! - [`flash`]: Flash modes and sysfs flash LEDs
//! - [`config`]: User configuration handling
//! - [`storage`]: Library and scratch paths, atomic scratch writes
//! - [`terminal`]: Full-screen terminal UI

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureController, UiEvent};
pub use config::Config;
pub use errors::{AppError, AppResult};
