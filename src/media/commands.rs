use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SlideshowError};
use super::{EncoderSettings, Rotation};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy video stream
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Disable audio
    pub fn no_audio(self) -> Self {
        self.arg("-an")
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Apply encoder name and its quality arguments
    pub fn encoder(self, settings: &EncoderSettings) -> Self {
        self.video_codec(settings.name.clone()).args(settings.args.iter().cloned())
    }

    /// Pixel format every player understands
    pub fn compatible_pixels(self) -> Self {
        self.arg("-pix_fmt").arg("yuv420p")
    }

    /// Move the moov atom up front so playback can start while downloading
    pub fn faststart(self) -> Self {
        self.arg("-movflags").arg("+faststart")
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        self.run().await.map(|_| ())
    }

    /// Execute the command and return its standard output
    pub async fn execute_capture(&self) -> Result<String> {
        self.run().await
    }

    async fn run(&self) -> Result<String> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| SlideshowError::ToolNotFound(format!("{}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SlideshowError::Tool {
                description: self.description.clone(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Timing and framing of one encoded segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Segment length in seconds, used to place the fade out
    pub duration: f64,
    pub fade_duration: f64,
    pub fade_in: bool,
    pub fade_out: bool,
    pub rotation: Rotation,
}

/// Background music placement over the finished video
#[derive(Debug, Clone, PartialEq)]
pub struct MusicMix {
    /// Length of the silent video the music is laid under
    pub video_duration: f64,
    /// Full length of the music file
    pub audio_duration: f64,
    pub trim_start: f64,
    pub fade_in: f64,
    pub fade_out: f64,
    pub sample_rate: u32,
    pub bitrate: String,
}

/// Build the `-vf` chain: rotate, letterbox into the frame, then fade.
pub fn segment_filter(spec: &SegmentSpec) -> String {
    let mut parts: Vec<String> = spec
        .rotation
        .transpose_filters()
        .iter()
        .map(|f| f.to_string())
        .collect();

    let (w, h) = (spec.width, spec.height);
    parts.push(format!("scale={w}:{h}:force_original_aspect_ratio=decrease"));
    parts.push(format!("pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black"));
    parts.push("setsar=1".to_string());
    parts.push(format!("fps={}", spec.fps));

    // ffmpeg reads d=0 as unset and falls back to its default fade length
    if spec.fade_in && spec.fade_duration > 0.0 {
        parts.push(format!("fade=t=in:st=0:d={}", spec.fade_duration));
    }
    if spec.fade_out && spec.fade_duration > 0.0 {
        let start = (spec.duration - spec.fade_duration).max(0.0);
        parts.push(format!("fade=t=out:st={}:d={}", start, spec.fade_duration));
    }

    parts.join(",")
}

/// Build the `-filter_complex` graph mixing trimmed, faded music under a
/// silent bed as long as the video.
pub fn music_filter(mix: &MusicMix) -> String {
    let mut chain = vec![
        format!("[1:a]atrim={}:{}", mix.trim_start, mix.audio_duration),
        "asetpts=PTS-STARTPTS".to_string(),
    ];
    if mix.fade_in > 0.0 {
        chain.push(format!("afade=t=in:st=0:d={}", mix.fade_in));
    }
    if mix.fade_out > 0.0 {
        let start = (mix.video_duration - mix.fade_out).max(0.0);
        chain.push(format!("afade=t=out:st={}:d={}", start, mix.fade_out));
    }

    format!(
        "anullsrc=channel_layout=stereo:sample_rate={}:duration={}[a0];\
         {}[a1];\
         [a0][a1]amix=inputs=2:duration=first:dropout_transition=2[outa]",
        mix.sample_rate,
        mix.video_duration,
        chain.join(","),
    )
}

/// Builder for the slideshow's ffmpeg/ffprobe invocations
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, probe_path: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            probe_path: probe_path.into(),
        }
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }

    /// Build encoder listing command
    pub fn list_encoders(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Encoder listing")
            .arg("-hide_banner")
            .arg("-encoders")
    }

    /// Build a JSON probe of the container and first video stream
    pub fn probe<P: AsRef<Path>>(&self, path: P) -> MediaCommand {
        MediaCommand::new(&self.probe_path, format!("Probe of {}", path.as_ref().display()))
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .args(["-select_streams", "v:0"])
            .output(path)
    }

    /// Build a looping still-image segment
    pub fn image_segment<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        image_path: P,
        output_path: Q,
        spec: &SegmentSpec,
        encoder: &EncoderSettings,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(
            &self.binary_path,
            format!("Image segment from {}", image_path.as_ref().display()),
        )
        .overwrite()
        .arg("-loop").arg("1")
        .arg("-t").arg(spec.duration.to_string());

        if spec.rotation != Rotation::None {
            cmd = cmd.arg("-noautorotate");
        }

        cmd.input(image_path)
            .video_filter(segment_filter(spec))
            .encoder(encoder)
            .compatible_pixels()
            .output(output_path)
    }

    /// Build a silent, re-framed segment from a video clip
    pub fn video_segment<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video_path: P,
        output_path: Q,
        spec: &SegmentSpec,
        encoder: &EncoderSettings,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(
            &self.binary_path,
            format!("Video segment from {}", video_path.as_ref().display()),
        )
        .overwrite();

        if spec.rotation != Rotation::None {
            cmd = cmd.arg("-noautorotate");
        }

        cmd.input(video_path)
            .video_filter(segment_filter(spec))
            .encoder(encoder)
            .compatible_pixels()
            .no_audio()
            .output(output_path)
    }

    /// Build command for concatenating segments listed in a manifest
    pub fn concatenate<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        list_file: P,
        output_path: Q,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Segment concatenation")
            .overwrite()
            .arg("-f").arg("concat")
            .arg("-safe").arg("0")
            .input(list_file)
            .copy_video()
            .no_audio()
            .output(output_path)
    }

    /// Build command laying background music under the video
    pub fn mix_music<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        &self,
        video_path: P,
        music_path: Q,
        output_path: R,
        mix: &MusicMix,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Background music mix")
            .overwrite()
            .input(video_path)
            .input(music_path)
            .arg("-filter_complex").arg(music_filter(mix))
            .arg("-map").arg("0:v")
            .arg("-map").arg("[outa]")
            .copy_video()
            .audio_codec("aac")
            .arg("-b:a").arg(mix.bitrate.clone())
            .arg("-shortest")
            .faststart()
            .output(output_path)
    }

    /// Build command copying the video into its final, stream-friendly container
    pub fn remux<P: AsRef<Path>, Q: AsRef<Path>>(&self, video_path: P, output_path: Q) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Final remux")
            .overwrite()
            .input(video_path)
            .arg("-c").arg("copy")
            .faststart()
            .output(output_path)
    }

    /// Build command re-writing an image without its metadata
    pub fn strip_image<P: AsRef<Path>, Q: AsRef<Path>>(&self, image_path: P, temp_path: Q) -> MediaCommand {
        let is_png = crate::discovery::extension_of(image_path.as_ref()).as_deref() == Some("png");
        let cmd = MediaCommand::new(
            &self.binary_path,
            format!("Metadata strip of {}", image_path.as_ref().display()),
        )
        .overwrite()
        .input(&image_path)
        .arg("-map_metadata").arg("-1");

        let cmd = if is_png {
            cmd.arg("-pix_fmt").arg("rgba")
                .arg("-update").arg("1")
                .arg("-frames:v").arg("1")
        } else {
            cmd.arg("-update").arg("1")
                .arg("-frames:v").arg("1")
                .arg("-codec").arg("copy")
        };

        cmd.output(temp_path)
    }

    /// Build command re-muxing a video without metadata or location tags
    pub fn strip_video<P: AsRef<Path>, Q: AsRef<Path>>(&self, video_path: P, temp_path: Q) -> MediaCommand {
        MediaCommand::new(
            &self.binary_path,
            format!("Metadata strip of {}", video_path.as_ref().display()),
        )
        .overwrite()
        .input(&video_path)
        .arg("-map_metadata").arg("-1")
        .arg("-metadata").arg("location=")
        .arg("-metadata").arg("com.apple.quicktime.location=")
        .arg("-metadata").arg("com.apple.quicktime.location.ISO6709=")
        .arg("-codec").arg("copy")
        .output(temp_path)
    }
}
