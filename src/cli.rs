// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for booth sessions
//!
//! This module runs one complete session against the virtual camera and the
//! local media store:
//! - Photos with presets and stickers
//! - GIF and boomerang bursts
//! - Video clips

use clap::Args;
use pixelbooth::app::{CaptureOutcome, CaptureSession, SessionEvent};
use pixelbooth::backends::camera::CameraStreamManager;
use pixelbooth::backends::virtual_camera::VirtualCamera;
use pixelbooth::pipelines::photo::{FilterPreset, StickerGlyph};
use pixelbooth::storage::LocalMediaStore;
use pixelbooth::{CaptureMode, Config};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Options shared by every capture command
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Directory for the exported artifact (default: ~/Pictures/pixelbooth)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Still image to use as the camera feed instead of the test pattern
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Event name printed in the watermark band
    #[arg(long)]
    event_name: Option<String>,

    /// Event identifier recorded in the metadata sidecar
    #[arg(long)]
    event_id: Option<String>,

    /// Logo image drawn in the watermark band
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Countdown length in seconds
    #[arg(short, long)]
    countdown: Option<u32>,

    /// Config file (default: ~/.config/pixelbooth/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// A sticker requested on the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickerSpec {
    glyph: StickerGlyph,
    x: f32,
    y: f32,
}

/// Parse `GLYPH@X,Y`
pub fn parse_sticker(value: &str) -> Result<StickerSpec, String> {
    let (name, position) = value
        .split_once('@')
        .ok_or_else(|| format!("expected GLYPH@X,Y, got '{}'", value))?;
    let glyph = StickerGlyph::from_name(name).ok_or_else(|| {
        format!(
            "unknown sticker '{}' (expected smile, heart, star or lightning)",
            name
        )
    })?;
    let (x, y) = position
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y after '@', got '{}'", position))?;
    let x = x.trim().parse::<f32>().map_err(|e| format!("x: {}", e))?;
    let y = y.trim().parse::<f32>().map_err(|e| format!("y: {}", e))?;
    Ok(StickerSpec { glyph, x, y })
}

pub fn parse_preset(value: &str) -> Result<FilterPreset, String> {
    FilterPreset::from_name(value).ok_or_else(|| format!("unknown preset '{}'", value))
}

/// Print filter presets and sticker glyphs
pub fn list_presets() {
    println!("Filter presets:");
    println!();
    for preset in FilterPreset::ALL {
        println!("  {:<10} {}", preset.label(), preset.settings().to_css());
    }
    println!();
    println!("Stickers:");
    println!();
    for glyph in StickerGlyph::ALL {
        println!("  {:<10} {}", glyph.label(), glyph.default_color().to_hex());
    }
}

/// Load the config and apply command-line overrides
fn resolve_config(args: &SessionArgs) -> Config {
    let mut config = Config::load_or_default(args.config.as_deref());
    if let Some(dir) = &args.output {
        config.output_dir = dir.clone();
    }
    if let Some(name) = &args.event_name {
        config.event_name = Some(name.clone());
    }
    if let Some(id) = &args.event_id {
        config.event_id = Some(id.clone());
    }
    if let Some(logo) = &args.logo {
        config.logo_path = Some(logo.clone());
    }
    if let Some(seconds) = args.countdown {
        config.countdown_seconds = seconds;
    }
    config
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::CountdownTick(0) => println!("  ...smile!"),
        SessionEvent::CountdownTick(n) => println!("  {}...", n),
        SessionEvent::CountdownFired => println!("  *click*"),
        SessionEvent::FrameCaptured { captured, total } => {
            println!("  Frame {}/{}", captured, total)
        }
        SessionEvent::RecordingStarted => println!("Recording... (press Ctrl+C to cancel)"),
        SessionEvent::RecordingStopped { duration_ms } => {
            println!("Recorded {:.1}s", *duration_ms as f64 / 1000.0)
        }
        SessionEvent::Failed { message, recovery } => {
            eprintln!("Session failed: {} (recovery: {:?})", message, recovery)
        }
        SessionEvent::PhaseChanged { .. } | SessionEvent::Exported { .. } => {}
    }
}

/// Run one session in `mode`
///
/// `capture` performs the mode-specific steps between arming and review.
async fn run_session<F>(
    args: SessionArgs,
    mode: CaptureMode,
    capture: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: AsyncFnOnce(
        &mut CaptureSession<VirtualCamera, LocalMediaStore>,
    ) -> Result<CaptureOutcome, pixelbooth::SessionError>,
{
    let config = resolve_config(&args);
    let branding = config.branding()?;
    let camera = match &args.source {
        Some(path) => VirtualCamera::from_image_file(path)?,
        None => VirtualCamera::test_pattern(),
    };
    let store = LocalMediaStore::new(&config.output_dir);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = CaptureSession::new(CameraStreamManager::new(camera), store, config, branding)
        .with_events(tx);

    // Ctrl+C cancels whatever the session is doing
    let control = session.control();
    ctrlc::set_handler(move || control.cancel())?;

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    println!("Session {} ({})", session.id(), mode);
    session.arm(mode).await?;

    let result = match capture(&mut session).await? {
        CaptureOutcome::Ready => session.confirm().await.map(Some),
        CaptureOutcome::Retaken | CaptureOutcome::Cancelled => Ok(None),
    };

    drop(session);
    printer.await?;

    match result? {
        Some(exported) => println!("Saved {}: {}", exported.mime, exported.url),
        None => println!("Session cancelled."),
    }
    Ok(())
}

/// Take a photo with optional preset and stickers
pub fn run_photo(
    args: SessionArgs,
    preset: Option<FilterPreset>,
    stickers: Vec<StickerSpec>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_session(args, CaptureMode::Photo, async move |session| {
        session
            .edit(|filters, board| {
                if let Some(preset) = preset {
                    filters.apply_preset(preset);
                }
                for sticker in &stickers {
                    board.add_at(sticker.glyph, sticker.x, sticker.y);
                }
            })
            .await?;
        session.trigger_capture().await
    }))
}

/// Capture a gif or boomerang burst
pub fn run_burst(args: SessionArgs, mode: CaptureMode) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_session(args, mode, async |session| {
        session.trigger_capture().await
    }))
}

/// Record a clip of `duration` seconds
pub fn run_video(args: SessionArgs, duration: u64) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_session(args, CaptureMode::Video, async move |session| {
        session
            .record_video(tokio::time::sleep(Duration::from_secs(duration)))
            .await
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sticker() {
        let spec = parse_sticker("heart@50,60.5").unwrap();
        assert_eq!(
            spec,
            StickerSpec {
                glyph: StickerGlyph::Heart,
                x: 50.0,
                y: 60.5
            }
        );
        assert!(parse_sticker("heart").is_err());
        assert!(parse_sticker("unicorn@1,2").is_err());
        assert!(parse_sticker("star@1").is_err());
    }

    #[test]
    fn test_parse_preset_accepts_label_and_name() {
        assert_eq!(parse_preset("bw").unwrap(), FilterPreset::BlackAndWhite);
        assert_eq!(parse_preset("B&W").unwrap(), FilterPreset::BlackAndWhite);
        assert!(parse_preset("sparkle").is_err());
    }
}
