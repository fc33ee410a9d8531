// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! # Architecture
//!
//! The backend layer hides the platform's media devices behind two traits,
//! so the session and pipelines never talk to hardware directly:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Capture Session                │
//! └────────────────────┬────────────────────────┘
//!                      │ ScopedStream (leased)
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌──────────────────────────────────────┐   │
//! │  │ CameraStreamManager                  │   │
//! │  │  CameraDevice ──▶ LiveStream         │   │
//! │  └──────────────────────────────────────┘   │
//! │  ┌──────────────────────────────────────┐   │
//! │  │ Virtual Camera                       │   │
//! │  │  (test pattern / image file)         │   │
//! │  └──────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Device traits, stream leases and shared frame types
//! - [`virtual_camera`]: Synthetic device with fault injection

pub mod camera;
pub mod virtual_camera;
