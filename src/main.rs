//! Slidereel - Slideshow Video Builder
//!
//! Entry point: parses the command line, loads configuration, sets up
//! logging and dispatches to the slideshow workflow or the metadata stripper.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use slidereel::cli::{Args, Commands};
use slidereel::config::{Config, VideoCodec};
use slidereel::error::SlideshowError;
use slidereel::media::{select_encoder, MediaProcessorFactory};
use slidereel::strip::MetadataStripper;
use slidereel::workflow::{open_in_player, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Create { options, open } => {
            options.apply(&mut config);

            let workflow = Workflow::new(config)?;
            let summary = workflow.create_slideshow().await?;

            println!(
                "\nSlideshow created: {} ({} images, {} videos, {})",
                summary.output.display(),
                summary.images,
                summary.videos,
                format_duration(summary.duration)
            );
            if let Some(music) = &summary.music {
                println!("Music: {}", music.display());
            }

            if open {
                open_in_player(&summary.output)?;
            }
        }
        Commands::List { media_dir } => {
            if let Some(dir) = media_dir {
                config.slideshow.media_dir = dir;
            }

            let workflow = Workflow::new(config)?;
            let items = workflow.discover()?;
            if items.is_empty() {
                return Err(SlideshowError::NoMedia(workflow.config().slideshow.media_dir.clone()).into());
            }

            println!("Files to include from {}:", workflow.config().slideshow.media_dir.display());
            for (index, item) in items.iter().enumerate() {
                println!("{:>4}  {}", index + 1, item.describe());
            }

            match workflow.locate_music()? {
                Some(music) => println!("Music: {}", music.display()),
                None => println!("Music: none"),
            }
        }
        Commands::Strip { media_dir } => {
            let dir = media_dir.unwrap_or_else(|| config.slideshow.media_dir.clone());
            info!("Stripping metadata in {}", dir.display());

            let media = MediaProcessorFactory::create_processor(config.media.clone());
            media.check_availability().await?;

            let report = MetadataStripper::new(media).strip_directory(&dir).await?;
            println!(
                "\nDone! Success: {}, Failed: {}, Skipped: {}",
                report.succeeded, report.failed, report.skipped
            );
            if report.failed > 0 {
                anyhow::bail!("{} file(s) could not be stripped", report.failed);
            }
        }
        Commands::Encoders { no_hardware } => {
            let media = MediaProcessorFactory::create_processor(config.media.clone());
            println!("{}", media.version_info().await?);

            let available = media.list_encoders().await?;
            let hardware = config.slideshow.hardware_acceleration && !no_hardware;
            println!("{:<8} {:<20} {:<10} {}", "Codec", "Encoder", "Type", "Arguments");
            println!("{}", "-".repeat(60));
            for codec in [VideoCodec::H264, VideoCodec::H265] {
                let encoder = select_encoder(codec, &available, hardware, &config.media.preset);
                let available_mark = if available.contains(&encoder.name) { "" } else { " (missing)" };
                println!(
                    "{:<8} {:<20} {:<10} {}{}",
                    codec,
                    encoder.name,
                    if encoder.is_hardware() { "hardware" } else { "software" },
                    encoder.args.join(" "),
                    available_mark
                );
            }
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".slidereel").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "slidereel.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("slidereel.log").display());

    Ok(())
}

/// Format duration in seconds to human readable string
fn format_duration(seconds: f64) -> String {
    let seconds = seconds.round() as u64;
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
