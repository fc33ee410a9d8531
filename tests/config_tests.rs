// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use pixelbooth::Config;
use pixelbooth::app::CaptureMode;
use pixelbooth::config::CONFIG_VERSION;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("pixelbooth-config-tests-{}", uuid::Uuid::new_v4()))
        .join(name)
}

#[test]
fn test_config_default() {
    // Test that default config matches the calibrated booth profiles
    let config = Config::default();

    assert_eq!(config.version, CONFIG_VERSION);
    assert_eq!(config.countdown_seconds, 3, "Countdown should start at 3");
    assert_eq!(config.gif.frame_count, 4);
    assert_eq!(config.gif.frame_interval_ms, 800);
    assert_eq!(config.boomerang.frame_count, 8);
    assert_eq!(config.boomerang.frame_interval_ms, 200);
    assert!(config.event_name.is_none());
}

#[test]
fn test_config_save_and_load_round_trip() {
    let path = temp_path("config.json");
    let config = Config {
        countdown_seconds: 5,
        event_name: Some("Summer Gala".to_string()),
        event_id: Some("gala-2026".to_string()),
        max_video_secs: 12,
        ..Config::default()
    };

    config.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);

    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}

#[test]
fn test_broken_config_falls_back_to_defaults() {
    let path = temp_path("config.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::load(&path).is_err());
    assert_eq!(Config::load_or_default(Some(&path)), Config::default());

    // The broken file is left for the operator to fix
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");

    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}

#[test]
fn test_missing_config_uses_defaults() {
    let path = temp_path("absent.json");
    assert_eq!(Config::load_or_default(Some(&path)), Config::default());
}

#[test]
fn test_branding_uses_event_fields() {
    let config = Config {
        event_name: Some("Wedding".to_string()),
        event_id: Some("w-42".to_string()),
        ..Config::default()
    };
    let branding = config.branding().unwrap();
    assert_eq!(branding.title(), "Wedding");
    assert_eq!(branding.event_id.as_deref(), Some("w-42"));
    assert!(branding.logo.is_none());

    assert_eq!(Config::default().branding().unwrap().title(), "PixelBooth Lite");
}

#[test]
fn test_video_constraints_request_audio() {
    let config = Config::default();
    for mode in CaptureMode::ALL {
        assert_eq!(
            config.constraints_for(mode).audio,
            mode == CaptureMode::Video,
            "Only video mode should request a microphone"
        );
    }
}
