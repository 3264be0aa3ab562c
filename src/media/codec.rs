use tracing::debug;

use crate::config::VideoCodec;

/// Encoder name plus the quality arguments that go with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub name: String,
    pub args: Vec<String>,
}

impl EncoderSettings {
    pub fn is_hardware(&self) -> bool {
        self.name.ends_with("_videotoolbox")
    }
}

/// Parse `ffmpeg -encoders` output into encoder names.
///
/// Lines after the `------` separator look like
/// ` V....D libx264              libx264 H.264 / AVC ...`.
pub fn parse_encoder_list(output: &str) -> Vec<String> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("------"))
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let flags = fields.next()?;
            let name = fields.next()?;
            (flags.len() == 6).then(|| name.to_string())
        })
        .collect()
}

/// Pick the encoder for `codec`, preferring VideoToolbox on macOS.
pub fn select_encoder(
    codec: VideoCodec,
    available: &[String],
    hardware: bool,
    preset: &str,
) -> EncoderSettings {
    select_encoder_for(codec, available, hardware && cfg!(target_os = "macos"), preset)
}

fn select_encoder_for(
    codec: VideoCodec,
    available: &[String],
    use_hardware: bool,
    preset: &str,
) -> EncoderSettings {
    let has = |name: &str| available.iter().any(|e| e == name);
    let to_args = |args: &[&str]| args.iter().map(|a| a.to_string()).collect::<Vec<_>>();

    let settings = match codec {
        VideoCodec::H264 if use_hardware && has("h264_videotoolbox") => EncoderSettings {
            name: "h264_videotoolbox".to_string(),
            args: to_args(&["-q:v", "65"]),
        },
        VideoCodec::H264 => EncoderSettings {
            name: "libx264".to_string(),
            args: to_args(&["-preset", preset, "-crf", "23"]),
        },
        VideoCodec::H265 if use_hardware && has("hevc_videotoolbox") => EncoderSettings {
            name: "hevc_videotoolbox".to_string(),
            args: to_args(&["-q:v", "65", "-tag:v", "hvc1"]),
        },
        VideoCodec::H265 => EncoderSettings {
            name: "libx265".to_string(),
            args: to_args(&["-preset", preset, "-crf", "28", "-tag:v", "hvc1"]),
        },
    };

    debug!("Selected encoder {} for {}", settings.name, codec);
    settings
}
