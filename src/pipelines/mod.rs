// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for photo, burst and video capture
//!
//! Heavy work (compositing, encoding) runs on the blocking pool so the
//! countdown and burst timers keep their cadence.
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Still frame  │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG        │
//! │   (RGBA)     │     │  - Filters        │     │              │
//! │              │     │  - Stickers       │     │              │
//! │              │     │  - Watermark      │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Live stream  │ ──▶ │  Burst Sampler    │ ──▶ │ Animated GIF │
//! │              │     │  - Timed stills   │     │              │
//! │              │     │  - 320x320 crop   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Live stream  │ ──▶ │  Video Recorder   │ ──▶ │  Container   │
//! │ (+ audio)    │     │  - Max duration   │     │  (platform)  │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Capture, compositing, burst sampling and encoding
//! - [`video`]: Recording driver around the platform recorder

pub mod photo;
pub mod video;
