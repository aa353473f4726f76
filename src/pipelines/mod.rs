// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for captured media
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ CapturedPhoto│ ──▶ │  Photo Pipeline   │ ──▶ │ CapturedImage│
//! │ (RGBA/Bayer) │     │  - Demosaic       │     │ JPEG | DNG   │
//! │              │     │  - Encoding       │     │ + thumbnail  │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! Heavy work runs in background tasks so the preview keeps updating.

pub mod photo;
