use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::discovery::{collect_media, find_music_file, MediaItem, MediaKind};
use crate::error::{Result, SlideshowError};
use crate::manifest::write_concat_manifest;
use crate::media::{
    select_encoder, EncoderSettings, MediaProcessorFactory, MediaProcessorTrait, MusicMix,
    Rotation, SegmentSpec,
};

/// Assumed clip length when ffprobe cannot tell
const DEFAULT_CLIP_DURATION: f64 = 5.0;

/// One input scheduled for encoding
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    pub item: MediaItem,
    /// Seconds on screen; images are already scaled to the music
    pub duration: f64,
    pub rotation: Rotation,
}

/// Background track chosen for this run
#[derive(Debug, Clone, PartialEq)]
pub struct MusicPlan {
    pub path: PathBuf,
    pub audio_duration: f64,
    /// Track length left after trimming; the slideshow is stretched to it
    pub target_duration: f64,
}

#[derive(Debug, Clone)]
pub struct SlideshowSummary {
    pub output: PathBuf,
    pub images: usize,
    pub videos: usize,
    pub duration: f64,
    pub music: Option<PathBuf>,
}

pub struct Workflow {
    config: Config,
    media: Box<dyn MediaProcessorTrait>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        Self::with_processor(config, media)
    }

    pub fn with_processor(config: Config, media: Box<dyn MediaProcessorTrait>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, media })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ordered inputs from the media directory, never including the output itself
    pub fn discover(&self) -> Result<Vec<MediaItem>> {
        collect_media(&self.config.slideshow.media_dir, Some(self.config.slideshow.output.as_path()))
    }

    /// Explicit music file, or the first mp3 next to the media folder or inside it
    pub fn locate_music(&self) -> Result<Option<PathBuf>> {
        let music = &self.config.music;
        if music.disabled {
            return Ok(None);
        }

        if let Some(file) = &music.file {
            if !file.is_file() {
                return Err(SlideshowError::MissingInput(format!(
                    "music file not found: {}",
                    file.display()
                )));
            }
            return Ok(Some(file.clone()));
        }

        let media_dir = self.config.slideshow.media_dir.as_path();
        let project_dir = match media_dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        Ok(find_music_file(&[project_dir, media_dir]))
    }

    /// Encoder for the configured codec, given what this ffmpeg build offers
    pub async fn select_encoder(&self) -> Result<EncoderSettings> {
        let available = match self.media.list_encoders().await {
            Ok(list) => list,
            Err(e) => {
                warn!("Could not list encoders, assuming software encoders: {}", e);
                Vec::new()
            }
        };

        let slideshow = &self.config.slideshow;
        Ok(select_encoder(
            slideshow.codec,
            &available,
            slideshow.hardware_acceleration,
            &self.config.media.preset,
        ))
    }

    /// Probe the music track and work out how long the slideshow should run
    pub async fn plan_music(&self, path: &Path) -> Result<Option<MusicPlan>> {
        let audio_duration = match self.media.probe(path).await {
            Ok(info) => info.duration.unwrap_or(0.0),
            Err(e) => {
                warn!("Could not read duration of {}: {}", path.display(), e);
                0.0
            }
        };

        let target_duration = audio_duration - self.config.music.trim_start;
        if target_duration <= 0.0 {
            warn!(
                "Music {} ({:.2}s) is not longer than the {}s trim, continuing without music",
                path.display(),
                audio_duration,
                self.config.music.trim_start
            );
            return Ok(None);
        }

        info!("Target slideshow duration: {:.2}s (from trimmed audio)", target_duration);
        Ok(Some(MusicPlan {
            path: path.to_path_buf(),
            audio_duration,
            target_duration,
        }))
    }

    /// Probe every input and fix segment lengths.
    ///
    /// Clips keep their own length. With a music target, stills are
    /// stretched by `target / total` so the show roughly follows the track.
    pub async fn plan_segments(
        &self,
        items: &[MediaItem],
        target_duration: Option<f64>,
    ) -> Result<Vec<SegmentPlan>> {
        let slide_duration = self.config.slideshow.slide_duration;

        let mut plans = Vec::with_capacity(items.len());
        for item in items {
            let info = match self.media.probe(&item.path).await {
                Ok(info) => info,
                Err(e) => {
                    warn!("Could not probe {}: {}", item.path.display(), e);
                    Default::default()
                }
            };

            let duration = match item.kind {
                MediaKind::Image => slide_duration,
                MediaKind::Video => info.duration.unwrap_or(DEFAULT_CLIP_DURATION),
            };

            plans.push(SegmentPlan {
                item: item.clone(),
                duration,
                rotation: info.rotation,
            });
        }

        let total: f64 = plans.iter().map(|p| p.duration).sum();
        if let Some(target) = target_duration {
            if total > 0.0 {
                let scale = target / total;
                info!("Duration scale factor: {:.3}", scale);
                for plan in plans.iter_mut().filter(|p| p.item.kind == MediaKind::Image) {
                    plan.duration *= scale;
                }
            }
        }

        Ok(plans)
    }

    fn segment_spec(&self, plan: &SegmentPlan) -> SegmentSpec {
        let slideshow = &self.config.slideshow;
        SegmentSpec {
            width: slideshow.resolution.width,
            height: slideshow.resolution.height,
            fps: slideshow.fps,
            duration: plan.duration,
            fade_duration: slideshow.fade_duration.min(plan.duration),
            fade_in: !plan.item.skip_fade_in,
            fade_out: !plan.item.skip_fade_out,
            rotation: plan.rotation,
        }
    }

    /// Build the slideshow: one segment per input, concat, then music or remux.
    pub async fn create_slideshow(&self) -> Result<SlideshowSummary> {
        self.media.check_availability().await?;

        let slideshow = &self.config.slideshow;
        let output = slideshow.output.clone();

        let items = self.discover()?;
        if items.is_empty() {
            return Err(SlideshowError::NoMedia(slideshow.media_dir.clone()));
        }

        let images = items.iter().filter(|i| i.kind == MediaKind::Image).count();
        let videos = items.len() - images;
        info!("Found {} files ({} images, {} videos)", items.len(), images, videos);

        let encoder = self.select_encoder().await?;
        info!("Creating slideshow {} with {} at {} {}fps", output.display(), encoder.name, slideshow.resolution, slideshow.fps);
        info!("Image duration: {}s, Fade: {}s", slideshow.slide_duration, slideshow.fade_duration);

        let music = match self.locate_music()? {
            Some(path) => {
                info!(
                    "Music: {} (trim first {}s, fade in {}s, fade out {}s at end)",
                    path.display(),
                    self.config.music.trim_start,
                    self.config.music.fade_in,
                    self.config.music.fade_out
                );
                self.plan_music(&path).await?
            }
            None => None,
        };

        let plans = self
            .plan_segments(&items, music.as_ref().map(|m| m.target_duration))
            .await?;

        let output_dir = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&output_dir).await?;

        // Removed on drop, so a failed run leaves nothing behind either.
        let work_dir = tempfile::Builder::new()
            .prefix(".slidereel-")
            .tempdir_in(&output_dir)?;

        let segments = self.encode_segments(&plans, &encoder, work_dir.path()).await?;

        let manifest = work_dir.path().join("concat_list.txt");
        write_concat_manifest(&manifest, &segments).await?;

        let silent_video = work_dir.path().join("video_no_audio.mp4");
        self.media.concat_segments(&manifest, &silent_video).await?;

        let planned: f64 = plans.iter().map(|p| p.duration).sum();
        let video_duration = match self.media.probe(&silent_video).await {
            Ok(info) => info.duration.unwrap_or(planned),
            Err(e) => {
                warn!("Could not probe concatenated video, using planned length: {}", e);
                planned
            }
        };

        match &music {
            Some(plan) => {
                info!(
                    "Video duration: {:.2}s, Trimmed audio: {:.2}s",
                    video_duration, plan.target_duration
                );
                let mix = MusicMix {
                    video_duration,
                    audio_duration: plan.audio_duration,
                    trim_start: self.config.music.trim_start,
                    fade_in: self.config.music.fade_in,
                    fade_out: self.config.music.fade_out,
                    sample_rate: self.config.music.sample_rate,
                    bitrate: self.config.music.bitrate.clone(),
                };
                self.media.mix_music(&silent_video, &plan.path, &output, &mix).await?;
            }
            None => {
                self.media.remux(&silent_video, &output).await?;
            }
        }

        info!("Cleaning up temporary files");
        work_dir.close()?;

        info!("Slideshow created: {}", output.display());
        Ok(SlideshowSummary {
            output,
            images,
            videos,
            duration: video_duration,
            music: music.map(|m| m.path),
        })
    }

    async fn encode_segments(
        &self,
        plans: &[SegmentPlan],
        encoder: &EncoderSettings,
        work_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let pb = ProgressBar::new(plans.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut segments = Vec::with_capacity(plans.len());
        for (index, plan) in plans.iter().enumerate() {
            let segment = work_dir.join(format!("segment_{:03}.mp4", index + 1));
            let spec = self.segment_spec(plan);
            let name = plan.item.file_name();

            pb.set_message(name.clone());
            info!(
                "[{}/{}] {} ({}){} {:.2}s",
                index + 1,
                plans.len(),
                name,
                plan.item.kind.as_str(),
                plan.item.fade_note(),
                plan.duration
            );

            let result = match plan.item.kind {
                MediaKind::Image => {
                    self.media
                        .encode_image_segment(&plan.item.path, &segment, &spec, encoder)
                        .await
                }
                MediaKind::Video => {
                    self.media
                        .encode_video_segment(&plan.item.path, &segment, &spec, encoder)
                        .await
                }
            };
            if let Err(e) = result {
                pb.abandon_with_message(format!("failed on {}", name));
                return Err(e);
            }

            segments.push(segment);
            pb.inc(1);
        }

        pb.finish_with_message("segments encoded");
        Ok(segments)
    }
}

/// Open a finished video in the platform's default player
pub fn open_in_player(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SlideshowError::MissingInput(format!(
            "video file not found: {}",
            path.display()
        )));
    }
    info!("Opening {}", path.display());
    open::that(path)?;
    Ok(())
}
