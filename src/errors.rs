// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture and composition pipeline
//!
//! Each pipeline stage owns a small error enum. [`SessionError`] collects them
//! so the session state machine can report any failure upward with a
//! human-readable cause.

use crate::app::state::SessionPhase;
use std::fmt;

/// Result type alias using SessionError
pub type SessionResult<T> = Result<T, SessionError>;

/// Camera and microphone acquisition errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The user or platform refused camera access
    PermissionDenied,
    /// No matching capture device exists
    NotFound(String),
    /// The device is already held by another stream owner
    Busy(String),
    /// The device went away while a stream was live
    Disconnected,
    /// Backend-specific failure
    Backend(String),
}

/// Burst sampling errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplingError {
    /// The live stream became unavailable before the burst completed
    Interrupted {
        captured: usize,
        expected: usize,
        cause: DeviceError,
    },
    /// A captured frame could not be rasterized
    Frame(CompositingError),
    /// Burst parameters are outside the supported range
    InvalidConfig(String),
}

/// Compositing and encoding errors
///
/// These indicate a broken contract (bad frame input, encoder failure) rather
/// than a transient condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositingError {
    /// Frame has a zero dimension
    EmptyFrame { width: u32, height: u32 },
    /// Pixel buffer length does not match the frame dimensions
    MalformedFrame { expected: usize, actual: usize },
    /// Image encoding failed
    Encoding(String),
    /// Background worker failed
    Task(String),
    /// Overlay rasterization failed (canvas too large, unusable font)
    Render(String),
}

/// Media store errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store refused the artifact
    Rejected(String),
    /// Transport or filesystem failure
    Io(String),
}

/// Video recording errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    /// Recording already in progress
    AlreadyRecording,
    /// No recording in progress
    NotRecording,
    /// The stream was opened without an audio track
    NoAudioDevice,
    /// The platform recorder failed
    Failed(String),
}

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Reading or writing the config file failed
    Io(String),
    /// The config file is not valid JSON for [`crate::Config`]
    Parse(String),
    /// A referenced asset (e.g. branding logo) could not be loaded
    Asset(String),
}

/// Session-level error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Device(DeviceError),
    Sampling(SamplingError),
    Compositing(CompositingError),
    Store(StoreError),
    Recording(RecordingError),
    /// The requested action is not valid in the current phase
    InvalidTransition {
        phase: SessionPhase,
        action: &'static str,
    },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::PermissionDenied => {
                write!(f, "Camera access denied. Please enable permissions.")
            }
            DeviceError::NotFound(msg) => write!(f, "No camera found: {}", msg),
            DeviceError::Busy(device) => write!(f, "Camera {} is busy", device),
            DeviceError::Disconnected => write!(f, "Camera disconnected"),
            DeviceError::Backend(msg) => write!(f, "Camera backend error: {}", msg),
        }
    }
}

impl fmt::Display for SamplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingError::Interrupted {
                captured,
                expected,
                cause,
            } => write!(
                f,
                "Burst interrupted after {} of {} frames: {}",
                captured, expected, cause
            ),
            SamplingError::Frame(e) => write!(f, "Burst frame rejected: {}", e),
            SamplingError::InvalidConfig(msg) => write!(f, "Invalid burst settings: {}", msg),
        }
    }
}

impl fmt::Display for CompositingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositingError::EmptyFrame { width, height } => {
                write!(f, "Frame has no pixels ({}x{})", width, height)
            }
            CompositingError::MalformedFrame { expected, actual } => write!(
                f,
                "Frame buffer size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            CompositingError::Encoding(msg) => write!(f, "Encoding failed: {}", msg),
            CompositingError::Task(msg) => write!(f, "Compositing task failed: {}", msg),
            CompositingError::Render(msg) => write!(f, "Overlay rendering failed: {}", msg),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Rejected(msg) => write!(f, "Upload rejected: {}", msg),
            StoreError::Io(msg) => write!(f, "Upload failed: {}", msg),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::AlreadyRecording => write!(f, "Recording already in progress"),
            RecordingError::NotRecording => write!(f, "No recording in progress"),
            RecordingError::NoAudioDevice => write!(f, "No audio track available for recording"),
            RecordingError::Failed(msg) => write!(f, "Recording failed: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Asset(msg) => write!(f, "Config asset error: {}", msg),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Device(e) => write!(f, "{}", e),
            SessionError::Sampling(e) => write!(f, "{}", e),
            SessionError::Compositing(e) => write!(f, "{}", e),
            SessionError::Store(e) => write!(f, "{}", e),
            SessionError::Recording(e) => write!(f, "{}", e),
            SessionError::InvalidTransition { phase, action } => {
                write!(f, "Cannot {} while {}", action, phase)
            }
        }
    }
}

impl std::error::Error for DeviceError {}
impl std::error::Error for SamplingError {}
impl std::error::Error for CompositingError {}
impl std::error::Error for StoreError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for SessionError {}

// Conversions from stage errors to SessionError
impl From<DeviceError> for SessionError {
    fn from(err: DeviceError) -> Self {
        SessionError::Device(err)
    }
}

impl From<SamplingError> for SessionError {
    fn from(err: SamplingError) -> Self {
        SessionError::Sampling(err)
    }
}

impl From<CompositingError> for SessionError {
    fn from(err: CompositingError) -> Self {
        SessionError::Compositing(err)
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Store(err)
    }
}

impl From<RecordingError> for SessionError {
    fn from(err: RecordingError) -> Self {
        SessionError::Recording(err)
    }
}

impl From<CompositingError> for SamplingError {
    fn from(err: CompositingError) -> Self {
        SamplingError::Frame(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<image::ImageError> for CompositingError {
    fn from(err: image::ImageError) -> Self {
        CompositingError::Encoding(err.to_string())
    }
}
