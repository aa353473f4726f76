// SPDX-License-Identifier: GPL-3.0-only

//! Event handler modules
//!
//! Handlers are organized by functional domain, each adding methods to
//! [`CaptureController`](crate::app::CaptureController).

pub mod camera;
pub mod capture;
pub mod save;
pub mod settings;
pub mod ui;
