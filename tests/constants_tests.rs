// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use pixelbooth::constants::*;
use pixelbooth::pipelines::photo::BurstModeConfig;

#[test]
fn test_burst_profiles_within_limits() {
    // Both shipped profiles must pass their own validation
    for config in [BurstModeConfig::gif(), BurstModeConfig::boomerang()] {
        assert!(config.validate().is_ok(), "{:?} should be valid", config);
        assert_eq!(config.frame_size, BURST_FRAME_SIZE);
    }
}

#[test]
fn test_burst_durations() {
    // gif: 4 x 800ms, boomerang: 8 x 200ms
    assert_eq!(BurstModeConfig::gif().total_duration().as_millis(), 3200);
    assert_eq!(BurstModeConfig::boomerang().total_duration().as_millis(), 1600);
}

#[test]
fn test_sticker_size_ordering() {
    assert!(STICKER_MIN_SIZE < STICKER_DEFAULT_SIZE);
    assert!(STICKER_DEFAULT_SIZE < STICKER_MAX_SIZE);
}

#[test]
fn test_watermark_fits_in_band() {
    // Logo and timestamp must sit inside the band
    assert!(WATERMARK_LOGO_SIZE < WATERMARK_BAND_HEIGHT);
    assert!(WATERMARK_TIMESTAMP_MARGIN_BOTTOM < WATERMARK_BAND_HEIGHT);
    assert!((0.0..=1.0).contains(&WATERMARK_BAND_OPACITY));
    assert!((0.0..=1.0).contains(&WATERMARK_TIMESTAMP_OPACITY));
}

#[test]
fn test_countdown_total() {
    let total = COUNTDOWN_TICK * DEFAULT_COUNTDOWN_SECONDS + COUNTDOWN_FIRE_GRACE;
    assert_eq!(total.as_secs(), 4);
}
