// SPDX-License-Identifier: GPL-3.0-only

//! Camera stream lifecycle manager
//!
//! The manager provides:
//! - Exclusive device leases (one live stream per device)
//! - Scoped streams that stop their tracks when dropped
//! - Thread-safe sharing across tasks

use super::types::*;
use super::{CameraDevice, LiveStream};
use crate::errors::DeviceError;
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

type LeaseSet = Arc<Mutex<HashSet<String>>>;

/// Claim on a device id, released on drop
#[derive(Debug)]
struct Lease {
    device_id: String,
    leases: LeaseSet,
}

impl Lease {
    fn claim(leases: &LeaseSet, device_id: String) -> BackendResult<Self> {
        let mut held = leases.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(device_id.clone()) {
            return Err(DeviceError::Busy(device_id));
        }
        Ok(Self {
            device_id,
            leases: Arc::clone(leases),
        })
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.leases
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.device_id);
    }
}

/// A live stream owned by exactly one holder
///
/// Dropping the handle stops every track and frees the device lease, so the
/// camera indicator turns off on every exit path.
pub struct ScopedStream<S: LiveStream> {
    stream: S,
    constraints: StreamConstraints,
    _lease: Lease,
}

impl<S: LiveStream> ScopedStream<S> {
    /// Constraints the stream was opened with
    pub fn constraints(&self) -> &StreamConstraints {
        &self.constraints
    }
}

impl<S: LiveStream> Deref for ScopedStream<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.stream
    }
}

impl<S: LiveStream> DerefMut for ScopedStream<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

impl<S: LiveStream> Drop for ScopedStream<S> {
    fn drop(&mut self) {
        self.stream.stop();
        info!(device = %self.stream.device_id(), "Camera stream released");
    }
}

impl<S: LiveStream> std::fmt::Debug for ScopedStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedStream")
            .field("device", &self.stream.device_id())
            .field("constraints", &self.constraints)
            .field("live", &self.stream.is_live())
            .finish()
    }
}

/// Camera stream manager
///
/// Hands out [`ScopedStream`]s for a single device and refuses a second
/// acquisition while one is outstanding. Cheap to clone; clones share leases.
pub struct CameraStreamManager<D: CameraDevice> {
    device: Arc<D>,
    leases: LeaseSet,
}

impl<D: CameraDevice> Clone for CameraStreamManager<D> {
    fn clone(&self) -> Self {
        Self {
            device: Arc::clone(&self.device),
            leases: Arc::clone(&self.leases),
        }
    }
}

impl<D: CameraDevice> CameraStreamManager<D> {
    /// Create a manager for `device`
    pub fn new(device: D) -> Self {
        info!(device = %device.device_id(), "Creating camera stream manager");
        Self {
            device: Arc::new(device),
            leases: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// The managed device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Check if a stream is currently held
    pub fn is_leased(&self) -> bool {
        let id = self.device.device_id();
        self.leases
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&id)
    }

    /// Open a live stream
    ///
    /// # Returns
    /// * `Ok(ScopedStream)` - The stream, released when dropped
    /// * `Err(DeviceError::Busy)` - Another holder owns the device
    /// * `Err(_)` - The device refused the request
    pub async fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> BackendResult<ScopedStream<D::Stream>> {
        let lease = Lease::claim(&self.leases, self.device.device_id())?;
        debug!(device = %lease.device_id, constraints = %constraints, "Requesting camera stream");

        match self.device.acquire(constraints).await {
            Ok(stream) => {
                info!(
                    device = %lease.device_id,
                    resolution = %stream.resolution(),
                    audio = stream.has_audio(),
                    "Camera stream acquired"
                );
                Ok(ScopedStream {
                    stream,
                    constraints: *constraints,
                    _lease: lease,
                })
            }
            Err(e) => {
                warn!(device = %lease.device_id, error = %e, "Camera acquisition failed");
                Err(e)
            }
        }
    }
}

impl<D: CameraDevice> std::fmt::Debug for CameraStreamManager<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraStreamManager")
            .field("device", &self.device.device_id())
            .field("leased", &self.is_leased())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_camera::VirtualCamera;

    #[tokio::test]
    async fn test_second_acquire_is_busy() {
        let manager = CameraStreamManager::new(VirtualCamera::test_pattern());
        let first = manager.acquire(&StreamConstraints::photo()).await.unwrap();
        let second = manager.acquire(&StreamConstraints::photo()).await;
        assert!(matches!(second, Err(DeviceError::Busy(_))));
        drop(first);
        assert!(manager.acquire(&StreamConstraints::photo()).await.is_ok());
    }

    #[tokio::test]
    async fn test_drop_stops_stream_and_frees_lease() {
        let camera = VirtualCamera::test_pattern();
        let stats = camera.stats();
        let manager = CameraStreamManager::new(camera);

        let stream = manager.acquire(&StreamConstraints::photo()).await.unwrap();
        assert!(manager.is_leased());
        drop(stream);

        assert!(!manager.is_leased());
        assert_eq!(stats.acquisitions(), 1);
        assert_eq!(stats.releases(), 1);
    }

    #[tokio::test]
    async fn test_failed_acquire_frees_lease() {
        let manager = CameraStreamManager::new(VirtualCamera::test_pattern().deny_permission());
        let result = manager.acquire(&StreamConstraints::photo()).await;
        assert_eq!(result.unwrap_err(), DeviceError::PermissionDenied);
        assert!(!manager.is_leased());
    }
}
