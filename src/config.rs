use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use crate::error::{Result, SlideshowError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub slideshow: SlideshowConfig,
    pub music: MusicConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideshowConfig {
    /// Folder holding the numbered images and clips
    pub media_dir: PathBuf,
    /// Output video file
    pub output: PathBuf,
    /// Seconds each image stays on screen (before music scaling)
    pub slide_duration: f64,
    /// Length of every fade transition in seconds
    pub fade_duration: f64,
    /// Output frame rate
    pub fps: u32,
    /// Output frame size, e.g. "1920x1080"
    pub resolution: Resolution,
    /// Video codec family for the segments
    pub codec: VideoCodec,
    /// Use a platform hardware encoder when one is available
    pub hardware_acceleration: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    /// Explicit music file; when unset an mp3 is looked up automatically
    pub file: Option<PathBuf>,
    /// Disable background music entirely
    pub disabled: bool,
    /// Seconds cut from the start of the track
    pub trim_start: f64,
    pub fade_in: f64,
    /// Fade out length, ending together with the video
    pub fade_out: f64,
    pub sample_rate: u32,
    pub bitrate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_path: String,
    /// Software encoder preset (ultrafast, fast, medium, slow, veryslow)
    pub preset: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoCodec::H264 => write!(f, "h264"),
            VideoCodec::H265 => write!(f, "h265"),
        }
    }
}

/// Output frame size. Both sides must be even for yuv420p output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl FromStr for Resolution {
    type Err = SlideshowError;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| SlideshowError::Config(format!(
                "Invalid resolution '{}'. Expected WIDTHxHEIGHT, e.g. 1920x1080",
                s
            )))?;

        let parse = |v: &str| {
            v.trim().parse::<u32>().map_err(|_| {
                SlideshowError::Config(format!("Invalid resolution '{}': '{}' is not a number", s, v))
            })
        };
        let (width, height) = (parse(w)?, parse(h)?);

        if width == 0 || height == 0 {
            return Err(SlideshowError::Config(format!("Resolution '{}' must be non-zero", s)));
        }
        if width % 2 != 0 || height % 2 != 0 {
            return Err(SlideshowError::Config(format!(
                "Resolution '{}' must have even width and height",
                s
            )));
        }

        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = SlideshowError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            media_dir: PathBuf::from("media"),
            output: PathBuf::from("slideshow.mp4"),
            slide_duration: 4.0,
            fade_duration: 0.5,
            fps: 30,
            resolution: Resolution { width: 1920, height: 1080 },
            codec: VideoCodec::H264,
            hardware_acceleration: true,
        }
    }
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            file: None,
            disabled: false,
            trim_start: 20.0,
            fade_in: 2.0,
            fade_out: 6.0,
            sample_rate: 44100,
            bitrate: "192k".to_string(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            probe_path: "ffprobe".to_string(),
            preset: "medium".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SlideshowError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SlideshowError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SlideshowError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SlideshowError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject settings that would make ffmpeg produce broken segments.
    pub fn validate(&self) -> Result<()> {
        let s = &self.slideshow;
        if !(s.slide_duration > 0.0) {
            return Err(SlideshowError::Config(format!(
                "Slide duration must be positive, got {}",
                s.slide_duration
            )));
        }
        if !(s.fade_duration >= 0.0) || s.fade_duration > s.slide_duration {
            return Err(SlideshowError::Config(format!(
                "Fade duration must be between 0 and the slide duration ({}), got {}",
                s.slide_duration, s.fade_duration
            )));
        }
        if s.fps == 0 {
            return Err(SlideshowError::Config("Frame rate must be positive".to_string()));
        }

        let m = &self.music;
        for (name, value) in [
            ("trim start", m.trim_start),
            ("fade in", m.fade_in),
            ("fade out", m.fade_out),
        ] {
            if !(value >= 0.0) {
                return Err(SlideshowError::Config(format!(
                    "Music {} must not be negative, got {}",
                    name, value
                )));
            }
        }
        if m.sample_rate == 0 {
            return Err(SlideshowError::Config("Music sample rate must be positive".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        let r: Resolution = "1920x1080".parse().unwrap();
        assert_eq!(r, Resolution { width: 1920, height: 1080 });
        assert_eq!(r.to_string(), "1920x1080");

        assert!("1920".parse::<Resolution>().is_err());
        assert!("0x1080".parse::<Resolution>().is_err());
        assert!("1921x1080".parse::<Resolution>().is_err());
        assert!("widexhigh".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.slideshow.slide_duration, 4.0);
        assert_eq!(config.slideshow.fade_duration, 0.5);
        assert_eq!(config.music.trim_start, 20.0);
        assert_eq!(config.slideshow.codec, VideoCodec::H264);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.slideshow.fade_duration = 5.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.slideshow.slide_duration = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.slideshow.fps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.music.fade_out = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [slideshow]
            resolution = "1280x720"
            codec = "h265"

            [music]
            trim_start = 0.0
            "#,
        )
        .unwrap();

        assert_eq!(config.slideshow.resolution, Resolution { width: 1280, height: 720 });
        assert_eq!(config.slideshow.codec, VideoCodec::H265);
        assert_eq!(config.slideshow.fps, 30);
        assert_eq!(config.music.trim_start, 0.0);
        assert_eq!(config.music.fade_out, 6.0);
        assert_eq!(config.media.binary_path, "ffmpeg");
    }

    #[test]
    fn test_invalid_resolution_in_toml() {
        let parsed: std::result::Result<Config, _> = toml::from_str(
            r#"
            [slideshow]
            resolution = "big"
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.slideshow.fps = 25;
        config.music.file = Some(PathBuf::from("song.mp3"));
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.slideshow.fps, 25);
        assert_eq!(loaded.music.file, Some(PathBuf::from("song.mp3")));
    }
}
