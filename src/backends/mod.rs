// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture and the photo library
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               CaptureController              │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │     Camera       │  │  Photo library  │  │
//! │  │ PipeWire/Virtual │  │   (directory)   │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Camera backends with device enumeration, sessions and photo capture
//! - [`library`]: Photo library authorization and asset creation

pub mod camera;
pub mod library;
