use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::discovery::extension_of;
use crate::error::{Result, SlideshowError};
use crate::media::MediaProcessorTrait;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "avi", "mkv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "wav"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripKind {
    Image,
    Video,
    /// Audio keeps its tags
    Audio,
}

impl StripKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = extension_of(path)?;
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(StripKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(StripKind::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(StripKind::Audio)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripOutcome {
    Stripped,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripReport {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StripReport {
    pub fn record(&mut self, outcome: StripOutcome) {
        match outcome {
            StripOutcome::Stripped => self.succeeded += 1,
            StripOutcome::Skipped => self.skipped += 1,
            StripOutcome::Failed => self.failed += 1,
        }
    }
}

/// Media files in `dir` that the stripper knows about, sorted by name
pub fn collect_strip_targets(dir: &Path) -> Result<Vec<(PathBuf, StripKind)>> {
    if !dir.is_dir() {
        return Err(SlideshowError::MissingInput(format!(
            "media directory not found: {}",
            dir.display()
        )));
    }

    let mut targets: Vec<(PathBuf, StripKind)> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| !e.file_name().to_string_lossy().starts_with(".tmp_"))
        .filter_map(|e| StripKind::from_path(e.path()).map(|kind| (e.into_path(), kind)))
        .collect();
    targets.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(targets)
}

/// Rewrites every image and video in a folder without its metadata
pub struct MetadataStripper {
    media: Box<dyn MediaProcessorTrait>,
}

impl MetadataStripper {
    pub fn new(media: Box<dyn MediaProcessorTrait>) -> Self {
        Self { media }
    }

    pub async fn strip_directory(&self, dir: &Path) -> Result<StripReport> {
        let targets = collect_strip_targets(dir)?;
        if targets.is_empty() {
            return Err(SlideshowError::NoMedia(dir.to_path_buf()));
        }

        info!("Found {} files to process", targets.len());

        let mut report = StripReport::default();
        for (path, kind) in targets {
            let outcome = self.strip_file(&path, kind).await?;
            match outcome {
                StripOutcome::Stripped => info!("Stripped {}", path.display()),
                StripOutcome::Skipped => info!("Skipped {} (keeping metadata)", path.display()),
                StripOutcome::Failed => warn!("Failed to strip {}", path.display()),
            }
            report.record(outcome);
        }

        info!(
            "Done! Success: {}, Failed: {}, Skipped: {}",
            report.succeeded, report.failed, report.skipped
        );
        Ok(report)
    }

    /// Strip one file in place via a `.tmp_` sibling.
    ///
    /// The original is only replaced when the tool left a non-empty file.
    pub async fn strip_file(&self, path: &Path, kind: StripKind) -> Result<StripOutcome> {
        if kind == StripKind::Audio {
            return Ok(StripOutcome::Skipped);
        }

        let temp_path = temp_path_for(path)?;
        let result = self
            .media
            .strip_metadata(path, &temp_path, kind == StripKind::Video)
            .await;

        if let Err(e) = &result {
            warn!("{}", e);
        }

        let written = match fs::metadata(&temp_path).await {
            Ok(meta) => meta.len() > 0,
            Err(_) => false,
        };

        if result.is_ok() && written {
            fs::rename(&temp_path, path).await?;
            Ok(StripOutcome::Stripped)
        } else {
            if fs::try_exists(&temp_path).await.unwrap_or(false) {
                fs::remove_file(&temp_path).await?;
            }
            Ok(StripOutcome::Failed)
        }
    }
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| SlideshowError::MissingInput(format!("not a file: {}", path.display())))?;
    Ok(path.with_file_name(format!(".tmp_{}", name.to_string_lossy())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaProcessorTrait;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[test]
    fn test_strip_kind() {
        assert_eq!(StripKind::from_path(Path::new("a.JPG")), Some(StripKind::Image));
        assert_eq!(StripKind::from_path(Path::new("a.mkv")), Some(StripKind::Video));
        assert_eq!(StripKind::from_path(Path::new("a.wav")), Some(StripKind::Audio));
        assert_eq!(StripKind::from_path(Path::new("a.txt")), None);
    }

    #[test]
    fn test_collect_targets_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        temp.child("b.mov").touch().unwrap();
        temp.child("a.jpeg").touch().unwrap();
        temp.child("song.mp3").touch().unwrap();
        temp.child("notes.txt").touch().unwrap();
        temp.child(".tmp_a.jpeg").touch().unwrap();

        let targets = collect_strip_targets(temp.path()).unwrap();
        let names: Vec<_> = targets
            .iter()
            .map(|(p, k)| (p.file_name().unwrap().to_string_lossy().to_string(), *k))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a.jpeg".to_string(), StripKind::Image),
                ("b.mov".to_string(), StripKind::Video),
                ("song.mp3".to_string(), StripKind::Audio),
            ]
        );
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path_for(Path::new("media/a b.png")).unwrap(),
            PathBuf::from("media/.tmp_a b.png")
        );
    }

    #[tokio::test]
    async fn test_strip_replaces_original() {
        let temp = TempDir::new().unwrap();
        let photo = temp.child("photo.jpg");
        photo.write_str("with exif").unwrap();

        let mut mock = MockMediaProcessorTrait::new();
        mock.expect_strip_metadata()
            .times(1)
            .returning(|_, temp_path, is_video| {
                assert!(!is_video);
                std::fs::write(temp_path, "clean").unwrap();
                Ok(())
            });

        let stripper = MetadataStripper::new(Box::new(mock));
        let outcome = stripper.strip_file(photo.path(), StripKind::Image).await.unwrap();

        assert_eq!(outcome, StripOutcome::Stripped);
        assert_eq!(std::fs::read_to_string(photo.path()).unwrap(), "clean");
        assert!(!temp.child(".tmp_photo.jpg").path().exists());
    }

    #[tokio::test]
    async fn test_empty_output_counts_as_failure() {
        let temp = TempDir::new().unwrap();
        let clip = temp.child("clip.mov");
        clip.write_str("original").unwrap();

        let mut mock = MockMediaProcessorTrait::new();
        mock.expect_strip_metadata().returning(|_, temp_path, is_video| {
            assert!(is_video);
            std::fs::write(temp_path, "").unwrap();
            Ok(())
        });

        let stripper = MetadataStripper::new(Box::new(mock));
        let outcome = stripper.strip_file(clip.path(), StripKind::Video).await.unwrap();

        assert_eq!(outcome, StripOutcome::Failed);
        assert_eq!(std::fs::read_to_string(clip.path()).unwrap(), "original");
        assert!(!temp.child(".tmp_clip.mov").path().exists());
    }

    #[tokio::test]
    async fn test_directory_report_continues_after_failure() {
        let temp = TempDir::new().unwrap();
        temp.child("a.png").write_str("png").unwrap();
        temp.child("b.mp4").write_str("mp4").unwrap();
        temp.child("c.mp3").write_str("mp3").unwrap();

        let mut mock = MockMediaProcessorTrait::new();
        mock.expect_strip_metadata().times(2).returning(|path, temp_path, _| {
            if path.extension().is_some_and(|e| e == "png") {
                Err(SlideshowError::Tool {
                    description: "Metadata strip".to_string(),
                    stderr: "Invalid PNG signature".to_string(),
                })
            } else {
                std::fs::write(temp_path, "clean").unwrap();
                Ok(())
            }
        });

        let stripper = MetadataStripper::new(Box::new(mock));
        let report = stripper.strip_directory(temp.path()).await.unwrap();

        assert_eq!(report, StripReport { succeeded: 1, failed: 1, skipped: 1 });
        let read = |name: &str| std::fs::read_to_string(temp.child(name).path()).unwrap();
        assert_eq!(read("a.png"), "png");
        assert_eq!(read("b.mp4"), "clean");
        assert_eq!(read("c.mp3"), "mp3");
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        let stripper = MetadataStripper::new(Box::new(MockMediaProcessorTrait::new()));
        let err = stripper.strip_directory(temp.path()).await.unwrap_err();
        assert!(matches!(err, SlideshowError::NoMedia(_)));
    }
}
