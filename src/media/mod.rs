// Media processing on top of ffmpeg/ffprobe subprocesses
//
// - Commands: invocation builders and filter graph construction
// - Probe: ffprobe JSON parsing (duration, rotation)
// - Codec: encoder discovery and selection
// - Processor: the ffmpeg-backed implementation of the trait below

pub mod codec;
pub mod commands;
pub mod probe;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use codec::*;
pub use commands::*;
pub use probe::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Check if media processor is available
    async fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn version_info(&self) -> Result<String>;

    /// List encoder names the media processor was built with
    async fn list_encoders(&self) -> Result<Vec<String>>;

    /// Read duration and rotation of a file
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Encode a still image into a fixed-length segment
    async fn encode_image_segment(
        &self,
        image_path: &Path,
        output_path: &Path,
        spec: &SegmentSpec,
        encoder: &EncoderSettings,
    ) -> Result<()>;

    /// Re-frame a video clip into a silent segment
    async fn encode_video_segment(
        &self,
        video_path: &Path,
        output_path: &Path,
        spec: &SegmentSpec,
        encoder: &EncoderSettings,
    ) -> Result<()>;

    /// Join the segments listed in a concat manifest
    async fn concat_segments(&self, manifest_path: &Path, output_path: &Path) -> Result<()>;

    /// Lay background music under a silent video
    async fn mix_music(
        &self,
        video_path: &Path,
        music_path: &Path,
        output_path: &Path,
        mix: &MusicMix,
    ) -> Result<()>;

    /// Copy a video into its final container without music
    async fn remux(&self, video_path: &Path, output_path: &Path) -> Result<()>;

    /// Write a copy of `path` without metadata to `temp_path`
    async fn strip_metadata(&self, path: &Path, temp_path: &Path, is_video: bool) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
