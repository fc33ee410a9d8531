// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use pixelbooth::CaptureMode;
use pixelbooth::pipelines::photo::FilterPreset;

mod cli;

use cli::{SessionArgs, StickerSpec};

#[derive(Parser)]
#[command(name = "pixelbooth")]
#[command(about = "Headless photo booth: capture, compose and export one session")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a photo with filters, stickers and the event watermark
    Photo {
        #[command(flatten)]
        session: SessionArgs,

        /// Filter preset (original, vintage, bw, warm, cool, dramatic)
        #[arg(short, long, value_parser = cli::parse_preset)]
        preset: Option<FilterPreset>,

        /// Place a sticker, e.g. heart@50,50 (repeatable)
        #[arg(short = 'k', long = "sticker", value_parser = cli::parse_sticker)]
        stickers: Vec<StickerSpec>,
    },

    /// Capture a 4-frame looping GIF
    Gif {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Capture an 8-frame boomerang (forward then reverse)
    Boomerang {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Record a video clip
    Video {
        #[command(flatten)]
        session: SessionArgs,

        /// Recording duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },

    /// List filter presets and sticker glyphs
    Presets,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=pixelbooth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Photo {
            session,
            preset,
            stickers,
        } => cli::run_photo(session, preset, stickers),
        Commands::Gif { session } => cli::run_burst(session, CaptureMode::Gif),
        Commands::Boomerang { session } => cli::run_burst(session, CaptureMode::Boomerang),
        Commands::Video { session, duration } => cli::run_video(session, duration),
        Commands::Presets => {
            cli::list_presets();
            Ok(())
        }
    }
}
