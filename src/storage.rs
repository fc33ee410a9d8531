// SPDX-License-Identifier: GPL-3.0-only

//! Media store interface and implementations
//!
//! A session hands its finished artifact to a [`MediaStore`] together with
//! [`ArtifactMetadata`] and records the public URL the store returns.

use crate::app::state::CaptureMode;
use crate::backends::camera::types::RecordedClip;
use crate::errors::StoreError;
use crate::pipelines::photo::encoding::EncodedImage;
use crate::pipelines::photo::processing::FilterSettings;
use crate::pipelines::photo::stickers::StickerPlacement;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Finished media ready for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    pub data: Arc<[u8]>,
    pub mime: String,
    pub mode: CaptureMode,
    /// Pixel dimensions, when known
    pub dimensions: Option<(u32, u32)>,
}

impl MediaArtifact {
    pub fn from_encoded(encoded: EncodedImage, mode: CaptureMode) -> Self {
        Self {
            mime: encoded.format.mime().to_string(),
            dimensions: Some((encoded.width, encoded.height)),
            data: encoded.data.into(),
            mode,
        }
    }

    pub fn from_clip(clip: RecordedClip, dimensions: Option<(u32, u32)>) -> Self {
        Self {
            data: clip.data.into(),
            mime: clip.mime,
            mode: CaptureMode::Video,
            dimensions,
        }
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        let essence = self.mime.split(';').next().unwrap_or_default().trim();
        match essence {
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/png" => "png",
            "video/webm" => "webm",
            "video/mp4" => "mp4",
            "video/x-motion-jpeg" => "mjpeg",
            _ => "bin",
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Metadata row stored alongside the artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub session_id: String,
    pub mode: CaptureMode,
    pub mime: String,
    /// Photo only
    pub filter_settings: Option<FilterSettings>,
    /// Photo only
    pub sticker_placements: Vec<StickerPlacement>,
    pub event_id: Option<String>,
    /// RFC 3339 local time
    pub captured_at: String,
    /// Stills in the burst (gif/boomerang only)
    pub frame_count: Option<usize>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Destination for finished media
pub trait MediaStore: Send + Sync {
    /// Persist `artifact` and return its public URL
    fn store(
        &self,
        artifact: &MediaArtifact,
        metadata: &ArtifactMetadata,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;
}

/// Store that writes artifacts into a local directory
///
/// Each artifact is written as `<mode>-<timestamp>-<short id>.<ext>` with a
/// `.json` metadata sidecar next to it.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    dir: PathBuf,
}

impl LocalMediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for an artifact
    pub fn file_name(artifact: &MediaArtifact, metadata: &ArtifactMetadata) -> String {
        let timestamp = chrono::DateTime::parse_from_rfc3339(&metadata.captured_at)
            .map(|t| t.format("%Y%m%d_%H%M%S").to_string())
            .unwrap_or_else(|_| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
        let short_id: String = metadata
            .session_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(8)
            .collect();
        format!(
            "{}-{}-{}.{}",
            metadata.mode.tag(),
            timestamp,
            short_id,
            artifact.extension()
        )
    }
}

impl MediaStore for LocalMediaStore {
    fn store(
        &self,
        artifact: &MediaArtifact,
        metadata: &ArtifactMetadata,
    ) -> impl Future<Output = Result<String, StoreError>> + Send {
        let dir = self.dir.clone();
        let artifact = artifact.clone();
        let metadata = metadata.clone();

        async move {
            if artifact.is_empty() {
                return Err(StoreError::Rejected("artifact is empty".to_string()));
            }

            tokio::fs::create_dir_all(&dir).await?;

            let path = dir.join(Self::file_name(&artifact, &metadata));
            info!(path = %path.display(), bytes = artifact.len(), "Saving artifact");
            tokio::fs::write(&path, &artifact.data).await?;

            let sidecar = path.with_extension(format!("{}.json", artifact.extension()));
            let json = serde_json::to_vec_pretty(&metadata)
                .map_err(|e| StoreError::Rejected(format!("metadata: {}", e)))?;
            tokio::fs::write(&sidecar, json).await?;
            debug!(path = %sidecar.display(), "Metadata sidecar written");

            let absolute = tokio::fs::canonicalize(&path).await;
            let url = format!("file://{}", absolute.as_deref().unwrap_or(&path).display());
            info!(url = %url, "Artifact saved successfully");
            Ok(url)
        }
    }
}

/// In-memory store
///
/// Keeps every accepted artifact and can be told to fail a number of uploads,
/// for kiosks without storage and for exercising export recovery.
#[derive(Debug, Clone, Default)]
pub struct MemoryMediaStore {
    accepted: Arc<Mutex<Vec<(MediaArtifact, ArtifactMetadata)>>>,
    failures_left: Arc<AtomicUsize>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` uploads with [`StoreError::Io`]
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Artifacts accepted so far, oldest first
    pub fn accepted(&self) -> Vec<(MediaArtifact, ArtifactMetadata)> {
        self.accepted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl MediaStore for MemoryMediaStore {
    fn store(
        &self,
        artifact: &MediaArtifact,
        metadata: &ArtifactMetadata,
    ) -> impl Future<Output = Result<String, StoreError>> + Send {
        let result = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        let outcome = if result.is_ok() {
            warn!(session = %metadata.session_id, "Memory store rejecting upload");
            Err(StoreError::Io("simulated network failure".to_string()))
        } else {
            let mut accepted = self.accepted.lock().unwrap_or_else(|e| e.into_inner());
            accepted.push((artifact.clone(), metadata.clone()));
            Ok(format!(
                "memory://{}/{}",
                metadata.mode.tag(),
                accepted.len()
            ))
        };

        std::future::ready(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(mode: CaptureMode) -> ArtifactMetadata {
        ArtifactMetadata {
            session_id: "0123abcd-ffff-4000-8000-000000000000".to_string(),
            mode,
            mime: "image/jpeg".to_string(),
            filter_settings: None,
            sticker_placements: Vec::new(),
            event_id: Some("evt-1".to_string()),
            captured_at: "2026-10-17T15:04:05+02:00".to_string(),
            frame_count: None,
            width: Some(2),
            height: Some(2),
        }
    }

    fn artifact() -> MediaArtifact {
        MediaArtifact {
            data: Arc::from(vec![0xFF, 0xD8, 0xFF, 0xD9]),
            mime: "image/jpeg".to_string(),
            mode: CaptureMode::Photo,
            dimensions: Some((2, 2)),
        }
    }

    #[test]
    fn test_file_name_layout() {
        let name = LocalMediaStore::file_name(&artifact(), &metadata(CaptureMode::Photo));
        assert_eq!(name, "photo-20261017_150405-0123abcd.jpg");
    }

    #[test]
    fn test_extension_from_mime() {
        let mut a = artifact();
        a.mime = "video/webm;codecs=vp8,opus".to_string();
        assert_eq!(a.extension(), "webm");
        a.mime = "application/unknown".to_string();
        assert_eq!(a.extension(), "bin");
    }

    #[tokio::test]
    async fn test_local_store_writes_artifact_and_sidecar() {
        let dir = std::env::temp_dir().join(format!("pixelbooth-store-{}", uuid::Uuid::new_v4()));
        let store = LocalMediaStore::new(&dir);

        let url = store
            .store(&artifact(), &metadata(CaptureMode::Photo))
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with(".jpg"));

        let path = dir.join("photo-20261017_150405-0123abcd.jpg");
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
        let sidecar = std::fs::read_to_string(dir.join("photo-20261017_150405-0123abcd.jpg.json")).unwrap();
        let parsed: ArtifactMetadata = serde_json::from_str(&sidecar).unwrap();
        assert_eq!(parsed.event_id.as_deref(), Some("evt-1"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryMediaStore::new();
        store.fail_next(1);
        assert!(store.store(&artifact(), &metadata(CaptureMode::Photo)).await.is_err());
        let url = store
            .store(&artifact(), &metadata(CaptureMode::Photo))
            .await
            .unwrap();
        assert_eq!(url, "memory://photo/1");
        assert_eq!(store.accepted().len(), 1);
    }
}
