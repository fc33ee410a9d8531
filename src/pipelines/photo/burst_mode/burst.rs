// SPDX-License-Identifier: GPL-3.0-only
//! Timed burst sampling
//!
//! One still is taken at each interval boundary measured from the start of
//! the burst (`start + interval * (i + 1)`), so a slow snapshot never pushes
//! later frames back.

use super::{BurstBuffer, BurstModeConfig, BurstProgress};
use crate::backends::camera::LiveStream;
use crate::errors::SamplingError;
use crate::pipelines::photo::capture::rasterize;
use futures::{Stream, StreamExt};
use image::RgbaImage;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

/// Single-use burst sampler
///
/// Consumed by [`BurstSampler::frames`] or [`BurstSampler::run`], so a burst
/// cannot be restarted. Observers hold a [`BurstProgress`] taken beforehand.
#[derive(Debug)]
pub struct BurstSampler {
    config: BurstModeConfig,
    progress: BurstProgress,
}

impl BurstSampler {
    /// Create a sampler after validating `config`
    pub fn new(config: BurstModeConfig) -> Result<Self, SamplingError> {
        config.validate()?;
        Ok(Self {
            progress: BurstProgress::new(config.frame_count),
            config,
        })
    }

    pub fn config(&self) -> &BurstModeConfig {
        &self.config
    }

    /// Read-only progress handle
    pub fn progress(&self) -> BurstProgress {
        self.progress.clone()
    }

    /// Lazy stream of rasterized stills
    ///
    /// Yields exactly `frame_count` items on success. On a device failure it
    /// yields one `SamplingError::Interrupted` and ends.
    pub fn frames<S>(self, stream: &S) -> impl Stream<Item = Result<RgbaImage, SamplingError>> + '_
    where
        S: LiveStream + ?Sized,
    {
        let BurstSampler { config, progress } = self;

        async_stream::try_stream! {
            let expected = config.frame_count;
            let interval = config.interval();
            let start = Instant::now();

            for index in 0..expected {
                sleep_until(start + interval * (index as u32 + 1)).await;

                let frame = stream.snapshot().map_err(|cause| {
                    warn!(captured = index, expected, error = %cause, "Burst interrupted");
                    SamplingError::Interrupted {
                        captured: index,
                        expected,
                        cause,
                    }
                })?;

                let still = rasterize(&frame, config.frame_size, config.frame_size)
                    .map_err(SamplingError::from)?;

                let captured = progress.advance();
                debug!(frame = captured, total = expected, "Burst frame captured");
                // Signal before yielding: consumers stop polling at the last frame
                if captured == expected {
                    progress.finish();
                }
                yield still;
            }
        }
    }

    /// Capture the whole burst
    ///
    /// # Arguments
    /// * `stream` - Live stream to sample
    /// * `on_progress` - Called after each frame with (captured, total)
    ///
    /// # Returns
    /// The full ordered buffer, or the first error (no partial buffer)
    pub async fn run<S, F>(self, stream: &S, mut on_progress: F) -> Result<BurstBuffer, SamplingError>
    where
        S: LiveStream + ?Sized,
        F: FnMut(usize, usize),
    {
        info!(
            frame_count = self.config.frame_count,
            interval_ms = self.config.frame_interval_ms,
            size = self.config.frame_size,
            "Starting burst capture"
        );

        let expected = self.config.frame_count;
        let mut buffer = BurstBuffer::with_capacity(expected);
        let frames = self.frames(stream);
        futures::pin_mut!(frames);

        while let Some(still) = frames.next().await {
            buffer.push(still?);
            on_progress(buffer.len(), expected);
            if buffer.is_complete() {
                break;
            }
        }

        info!(captured = buffer.len(), "Burst capture complete");
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::StreamConstraints;
    use crate::backends::camera::CameraDevice;
    use crate::backends::virtual_camera::VirtualCamera;
    use crate::errors::DeviceError;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_gif_burst_four_frames() {
        let stream = VirtualCamera::test_pattern()
            .acquire(&StreamConstraints::burst())
            .await
            .unwrap();
        let sampler = BurstSampler::new(BurstModeConfig::gif()).unwrap();
        let progress = sampler.progress();

        let start = Instant::now();
        let mut seen = Vec::new();
        let buffer = sampler
            .run(&stream, |captured, total| seen.push((captured, total)))
            .await
            .unwrap();

        assert_eq!(buffer.len(), 4);
        assert!(buffer.frames().iter().all(|f| f.dimensions() == (320, 320)));
        assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
        assert!(progress.is_complete());
        assert_eq!(progress.captured(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(3200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_set_with_last_frame() {
        let stream = VirtualCamera::test_pattern()
            .acquire(&StreamConstraints::burst())
            .await
            .unwrap();
        let sampler = BurstSampler::new(BurstModeConfig::gif()).unwrap();
        let progress = sampler.progress();

        let frames = sampler.frames(&stream);
        futures::pin_mut!(frames);
        for _ in 0..3 {
            frames.next().await.unwrap().unwrap();
            assert!(!progress.is_complete());
        }
        // No further poll after the fourth frame
        frames.next().await.unwrap().unwrap();
        assert!(progress.is_complete());
        assert_eq!(progress.fraction(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_boomerang_spacing() {
        let stream = VirtualCamera::test_pattern()
            .acquire(&StreamConstraints::burst())
            .await
            .unwrap();
        let sampler = BurstSampler::new(BurstModeConfig::boomerang()).unwrap();

        let start = Instant::now();
        let mut stamps = Vec::new();
        let frames = sampler.frames(&stream);
        futures::pin_mut!(frames);
        while let Some(frame) = frames.next().await {
            frame.unwrap();
            stamps.push(start.elapsed());
        }

        assert_eq!(stamps.len(), 8);
        for (i, stamp) in stamps.iter().enumerate() {
            assert_eq!(*stamp, Duration::from_millis(200 * (i as u64 + 1)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_interrupts_burst() {
        let stream = VirtualCamera::test_pattern()
            .disconnect_after(2)
            .acquire(&StreamConstraints::burst())
            .await
            .unwrap();
        let sampler = BurstSampler::new(BurstModeConfig::gif()).unwrap();
        let progress = sampler.progress();

        let err = sampler.run(&stream, |_, _| {}).await.unwrap_err();
        assert_eq!(
            err,
            SamplingError::Interrupted {
                captured: 2,
                expected: 4,
                cause: DeviceError::Disconnected,
            }
        );
        assert_eq!(progress.captured(), 2);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BurstModeConfig {
            frame_count: 0,
            ..BurstModeConfig::gif()
        };
        assert!(BurstSampler::new(config).is_err());
    }
}
