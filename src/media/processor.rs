use async_trait::async_trait;
use std::path::Path;
use tracing::{info, debug};

use crate::config::MediaConfig;
use crate::error::{Result, SlideshowError};
use super::{
    parse_encoder_list, parse_probe_output, EncoderSettings, MediaCommandBuilder, MediaInfo,
    MediaProcessorTrait, MusicMix, SegmentSpec,
};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| match e {
                SlideshowError::ToolNotFound(_) => SlideshowError::ToolNotFound(format!(
                    "{} is not installed or not in PATH (macOS: brew install ffmpeg)",
                    self.config.binary_path
                )),
                other => other,
            })?;

        info!("Media processor is available");
        Ok(())
    }

    async fn version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let stdout = self.command_builder.version_check().execute_capture().await?;
        Ok(stdout.lines().next().unwrap_or("Unknown version").to_string())
    }

    async fn list_encoders(&self) -> Result<Vec<String>> {
        let stdout = self.command_builder.list_encoders().execute_capture().await?;
        let encoders = parse_encoder_list(&stdout);
        debug!("Media processor reports {} encoders", encoders.len());
        Ok(encoders)
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let stdout = self.command_builder.probe(path).execute_capture().await?;
        let info = parse_probe_output(&stdout)?;
        debug!("Probed {}: {:?}", path.display(), info);
        Ok(info)
    }

    async fn encode_image_segment(
        &self,
        image_path: &Path,
        output_path: &Path,
        spec: &SegmentSpec,
        encoder: &EncoderSettings,
    ) -> Result<()> {
        self.command_builder
            .image_segment(image_path, output_path, spec, encoder)
            .execute()
            .await
    }

    async fn encode_video_segment(
        &self,
        video_path: &Path,
        output_path: &Path,
        spec: &SegmentSpec,
        encoder: &EncoderSettings,
    ) -> Result<()> {
        self.command_builder
            .video_segment(video_path, output_path, spec, encoder)
            .execute()
            .await
    }

    async fn concat_segments(&self, manifest_path: &Path, output_path: &Path) -> Result<()> {
        info!("Concatenating segments into {}", output_path.display());
        self.command_builder
            .concatenate(manifest_path, output_path)
            .execute()
            .await
    }

    async fn mix_music(
        &self,
        video_path: &Path,
        music_path: &Path,
        output_path: &Path,
        mix: &MusicMix,
    ) -> Result<()> {
        info!("Mixing {} under {}", music_path.display(), video_path.display());
        self.command_builder
            .mix_music(video_path, music_path, output_path, mix)
            .execute()
            .await
    }

    async fn remux(&self, video_path: &Path, output_path: &Path) -> Result<()> {
        self.command_builder.remux(video_path, output_path).execute().await
    }

    async fn strip_metadata(&self, path: &Path, temp_path: &Path, is_video: bool) -> Result<()> {
        let command = if is_video {
            self.command_builder.strip_video(path, temp_path)
        } else {
            self.command_builder.strip_image(path, temp_path)
        };
        command.execute().await
    }
}
