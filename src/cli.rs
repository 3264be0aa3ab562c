use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, Resolution, VideoCodec};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the slideshow video from the media folder
    Create {
        #[command(flatten)]
        options: CreateOptions,

        /// Open the finished video in the default media player
        #[arg(long)]
        open: bool,
    },

    /// Show the files that would go into the slideshow, in order
    List {
        /// Folder holding images and clips
        #[arg(short, long)]
        media_dir: Option<PathBuf>,
    },

    /// Remove metadata (EXIF, location) from images and videos in place
    Strip {
        /// Folder holding images and clips
        #[arg(short, long)]
        media_dir: Option<PathBuf>,
    },

    /// Show the encoder chosen for each codec
    Encoders {
        /// Ignore hardware encoders
        #[arg(long)]
        no_hardware: bool,
    },
}

/// Flags of `create`; every one overrides the matching config value
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct CreateOptions {
    /// Folder holding images and clips
    #[arg(short, long)]
    pub media_dir: Option<PathBuf>,

    /// Output video file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seconds each image is shown
    #[arg(long)]
    pub slide_duration: Option<f64>,

    /// Seconds of every fade transition
    #[arg(long)]
    pub fade_duration: Option<f64>,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Output resolution, e.g. 1920x1080
    #[arg(short, long)]
    pub resolution: Option<Resolution>,

    /// Background music file (default: first mp3 next to or inside the media folder)
    #[arg(long, conflicts_with = "no_music")]
    pub music: Option<PathBuf>,

    /// Build the slideshow without background music
    #[arg(long)]
    pub no_music: bool,

    /// Seconds cut from the start of the music
    #[arg(long)]
    pub music_trim: Option<f64>,

    /// Seconds of music fade in
    #[arg(long)]
    pub music_fade_in: Option<f64>,

    /// Seconds of music fade out at the end of the video
    #[arg(long)]
    pub music_fade_out: Option<f64>,

    /// Video codec
    #[arg(long, value_enum)]
    pub codec: Option<VideoCodec>,

    /// Use software encoders even where a hardware encoder exists
    #[arg(long)]
    pub no_hardware: bool,
}

impl CreateOptions {
    /// Layer the flags that were given over `config`
    pub fn apply(&self, config: &mut Config) {
        let slideshow = &mut config.slideshow;
        if let Some(dir) = &self.media_dir {
            slideshow.media_dir = dir.clone();
        }
        if let Some(output) = &self.output {
            slideshow.output = output.clone();
        }
        if let Some(v) = self.slide_duration {
            slideshow.slide_duration = v;
        }
        if let Some(v) = self.fade_duration {
            slideshow.fade_duration = v;
        }
        if let Some(v) = self.fps {
            slideshow.fps = v;
        }
        if let Some(v) = self.resolution {
            slideshow.resolution = v;
        }
        if let Some(v) = self.codec {
            slideshow.codec = v;
        }
        if self.no_hardware {
            slideshow.hardware_acceleration = false;
        }

        let music = &mut config.music;
        if let Some(file) = &self.music {
            music.file = Some(file.clone());
        }
        if self.no_music {
            music.disabled = true;
        }
        if let Some(v) = self.music_trim {
            music.trim_start = v;
        }
        if let Some(v) = self.music_fade_in {
            music.fade_in = v;
        }
        if let Some(v) = self.music_fade_out {
            music.fade_out = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_codec_values() {
        for codec in ["h264", "h265"] {
            let args = Args::try_parse_from(["slidereel", "create", "--codec", codec]).unwrap();
            let Commands::Create { options, .. } = args.command else {
                panic!("expected create");
            };
            assert!(options.codec.is_some());
        }

        assert!(Args::try_parse_from(["slidereel", "create", "--codec", "invalid"]).is_err());
    }

    #[test]
    fn test_help_mentions_codecs() {
        let mut cmd = Args::command();
        let create = cmd.find_subcommand_mut("create").unwrap();
        let help = create.render_long_help().to_string();
        assert!(help.contains("--codec"));
        assert!(help.contains("h264"));
        assert!(help.contains("h265"));
    }

    #[test]
    fn test_resolution_flag_validated() {
        assert!(Args::try_parse_from(["slidereel", "create", "-r", "1280x720"]).is_ok());
        assert!(Args::try_parse_from(["slidereel", "create", "-r", "1281x720"]).is_err());
    }

    #[test]
    fn test_music_flags_conflict() {
        assert!(Args::try_parse_from(["slidereel", "create", "--music", "a.mp3", "--no-music"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "slidereel",
            "create",
            "--slide-duration",
            "3",
            "--fade-duration",
            "1",
            "--fps",
            "24",
            "--music-trim",
            "0",
            "--codec",
            "h265",
            "--no-hardware",
            "-o",
            "out/show.mp4",
        ])
        .unwrap();
        let Commands::Create { options, open } = args.command else {
            panic!("expected create");
        };
        assert!(!open);

        let mut config = Config::default();
        options.apply(&mut config);

        assert_eq!(config.slideshow.slide_duration, 3.0);
        assert_eq!(config.slideshow.fade_duration, 1.0);
        assert_eq!(config.slideshow.fps, 24);
        assert_eq!(config.slideshow.codec, VideoCodec::H265);
        assert!(!config.slideshow.hardware_acceleration);
        assert_eq!(config.slideshow.output, PathBuf::from("out/show.mp4"));
        assert_eq!(config.music.trim_start, 0.0);
        // untouched values keep their defaults
        assert_eq!(config.music.fade_out, 6.0);
        assert_eq!(config.slideshow.media_dir, PathBuf::from("media"));
    }
}
