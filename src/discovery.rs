use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SlideshowError};

static ORDINAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) of \d+").expect("ordinal pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a path by extension. Only png, mp4 and mov take part in a slideshow.
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension_of(path).as_deref() {
            Some("png") => Some(MediaKind::Image),
            Some("mp4") | Some("mov") => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// One input of the slideshow, in playback order.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub ordinal: u64,
    pub skip_fade_in: bool,
    pub skip_fade_out: bool,
}

impl MediaItem {
    fn new(path: PathBuf, kind: MediaKind, ordinal: u64) -> Self {
        Self {
            path,
            kind,
            ordinal,
            skip_fade_in: false,
            skip_fade_out: false,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Listing line such as "Trip - 3 of 5.mov (video, #3) [no fade-out]"
    pub fn describe(&self) -> String {
        let number = if self.ordinal == 0 {
            "unnumbered".to_string()
        } else {
            format!("#{}", self.ordinal)
        };
        format!("{} ({}, {}){}", self.file_name(), self.kind.as_str(), number, self.fade_note())
    }

    /// Short annotation such as " [no fade-in]" for listings, empty when both fades apply.
    pub fn fade_note(&self) -> String {
        let mut notes = Vec::new();
        if self.skip_fade_in {
            notes.push("no fade-in");
        }
        if self.skip_fade_out {
            notes.push("no fade-out");
        }
        if notes.is_empty() {
            String::new()
        } else {
            format!(" [{}]", notes.join(", "))
        }
    }
}

/// Extract the ordinal from names like "Griffin and Faja - 1 of 38.png".
/// Names without an "N of M" part sort first with ordinal 0.
pub fn extract_ordinal(file_name: &str) -> u64 {
    ORDINAL_PATTERN
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Collect png/mp4/mov files from `dir` in slideshow order.
///
/// Files are grouped by ordinal. When a group holds both a mov clip and a
/// png still, the clip plays first without fading out and the still follows
/// without fading in, so the clip appears to settle into the photo.
pub fn collect_media<P: AsRef<Path>>(dir: P, exclude: Option<&Path>) -> Result<Vec<MediaItem>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(SlideshowError::MissingInput(format!(
            "media directory not found: {}",
            dir.display()
        )));
    }

    let exclude_name = exclude.and_then(|p| p.file_name()).map(|n| n.to_os_string());

    let mut groups: BTreeMap<u64, Vec<MediaItem>> = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| SlideshowError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if exclude_name.as_deref().is_some_and(|name| path.file_name() == Some(name)) {
            debug!("Skipping output file {}", path.display());
            continue;
        }
        let Some(kind) = MediaKind::from_path(path) else {
            continue;
        };

        let ordinal = extract_ordinal(&entry.file_name().to_string_lossy());
        groups
            .entry(ordinal)
            .or_default()
            .push(MediaItem::new(path.to_path_buf(), kind, ordinal));
    }

    let mut result = Vec::new();
    for (_, group) in groups {
        result.extend(order_group(group));
    }
    Ok(result)
}

fn order_group(group: Vec<MediaItem>) -> Vec<MediaItem> {
    let mut movs = Vec::new();
    let mut pngs = Vec::new();
    let mut others = Vec::new();
    for item in group {
        match extension_of(&item.path).as_deref() {
            Some("mov") => movs.push(item),
            Some("png") => pngs.push(item),
            _ => others.push(item),
        }
    }
    for list in [&mut movs, &mut pngs, &mut others] {
        list.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    }

    if !movs.is_empty() && !pngs.is_empty() {
        for mov in &mut movs {
            mov.skip_fade_out = true;
        }
        for png in &mut pngs {
            png.skip_fade_in = true;
        }
    }

    movs.into_iter().chain(pngs).chain(others).collect()
}

/// Find the first mp3 (by name) in the first directory that has one.
pub fn find_music_file(search_dirs: &[&Path]) -> Option<PathBuf> {
    search_dirs.iter().find_map(|dir| {
        let mut candidates: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| extension_of(p).as_deref() == Some("mp3"))
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    })
}

pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    fn names(items: &[MediaItem]) -> Vec<String> {
        items.iter().map(|i| i.file_name()).collect()
    }

    #[test]
    fn test_extract_ordinal() {
        assert_eq!(extract_ordinal("Griffin and Faja - 1 of 38.png"), 1);
        assert_eq!(extract_ordinal("Griffin and Faja - 10 of 38.mov"), 10);
        assert_eq!(extract_ordinal("test.png"), 0);
        assert_eq!(extract_ordinal("file - 5 of 20.png"), 5);
        assert_eq!(extract_ordinal("5of20.png"), 0);
    }

    #[test]
    fn test_media_kind() {
        assert_eq!(MediaKind::from_path(Path::new("a.png")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path(Path::new("a.PNG")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path(Path::new("a.mov")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("a.mp4")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("a.jpg")), None);
        assert_eq!(MediaKind::from_path(Path::new("a.mp3")), None);
    }

    #[test]
    fn test_collect_orders_by_ordinal() {
        let temp = TempDir::new().unwrap();
        temp.child("Trip - 10 of 12.png").touch().unwrap();
        temp.child("Trip - 2 of 12.png").touch().unwrap();
        temp.child("Trip - 1 of 12.mp4").touch().unwrap();
        temp.child("notes.txt").touch().unwrap();
        temp.child("song.mp3").touch().unwrap();

        let items = collect_media(temp.path(), None).unwrap();
        assert_eq!(
            names(&items),
            vec!["Trip - 1 of 12.mp4", "Trip - 2 of 12.png", "Trip - 10 of 12.png"]
        );
        assert!(items.iter().all(|i| !i.skip_fade_in && !i.skip_fade_out));
        assert_eq!(items[0].kind, MediaKind::Video);
    }

    #[test]
    fn test_collect_pairs_mov_and_png() {
        let temp = TempDir::new().unwrap();
        temp.child("Trip - 3 of 5.png").touch().unwrap();
        temp.child("Trip - 3 of 5.mov").touch().unwrap();
        temp.child("Trip - 4 of 5.png").touch().unwrap();

        let items = collect_media(temp.path(), None).unwrap();
        assert_eq!(
            names(&items),
            vec!["Trip - 3 of 5.mov", "Trip - 3 of 5.png", "Trip - 4 of 5.png"]
        );

        assert!(!items[0].skip_fade_in);
        assert!(items[0].skip_fade_out);
        assert!(items[1].skip_fade_in);
        assert!(!items[1].skip_fade_out);
        assert!(!items[2].skip_fade_in && !items[2].skip_fade_out);
        assert_eq!(items[0].fade_note(), " [no fade-out]");
        assert_eq!(items[1].fade_note(), " [no fade-in]");
        assert_eq!(items[2].fade_note(), "");
    }

    #[test]
    fn test_describe_shows_ordinal() {
        let temp = TempDir::new().unwrap();
        temp.child("Trip - 3 of 5.png").touch().unwrap();
        temp.child("Trip - 3 of 5.mov").touch().unwrap();
        temp.child("cover.png").touch().unwrap();

        let items = collect_media(temp.path(), None).unwrap();
        let lines: Vec<String> = items.iter().map(|i| i.describe()).collect();
        assert_eq!(
            lines,
            vec![
                "cover.png (image, unnumbered)",
                "Trip - 3 of 5.mov (video, #3) [no fade-out]",
                "Trip - 3 of 5.png (image, #3) [no fade-in]",
            ]
        );
    }

    #[test]
    fn test_mp4_does_not_pair_with_png() {
        let temp = TempDir::new().unwrap();
        temp.child("Trip - 1 of 2.png").touch().unwrap();
        temp.child("Trip - 1 of 2.mp4").touch().unwrap();

        let items = collect_media(temp.path(), None).unwrap();
        assert_eq!(names(&items), vec!["Trip - 1 of 2.png", "Trip - 1 of 2.mp4"]);
        assert!(items.iter().all(|i| !i.skip_fade_in && !i.skip_fade_out));
    }

    #[test]
    fn test_paired_group_keeps_extra_clips() {
        let temp = TempDir::new().unwrap();
        temp.child("Trip - 1 of 2.png").touch().unwrap();
        temp.child("Trip - 1 of 2.mov").touch().unwrap();
        temp.child("Trip - 1 of 2.mp4").touch().unwrap();

        let items = collect_media(temp.path(), None).unwrap();
        assert_eq!(
            names(&items),
            vec!["Trip - 1 of 2.mov", "Trip - 1 of 2.png", "Trip - 1 of 2.mp4"]
        );
        assert!(!items[2].skip_fade_in && !items[2].skip_fade_out);
    }

    #[test]
    fn test_collect_excludes_output() {
        let temp = TempDir::new().unwrap();
        temp.child("slideshow.mp4").touch().unwrap();
        temp.child("a - 1 of 1.png").touch().unwrap();

        let items = collect_media(temp.path(), Some(Path::new("/elsewhere/slideshow.mp4"))).unwrap();
        assert_eq!(names(&items), vec!["a - 1 of 1.png"]);
    }

    #[test]
    fn test_collect_ignores_subdirectories() {
        let temp = TempDir::new().unwrap();
        temp.child("nested/a - 1 of 1.png").touch().unwrap();
        temp.child("b - 2 of 2.png").touch().unwrap();

        let items = collect_media(temp.path(), None).unwrap();
        assert_eq!(names(&items), vec!["b - 2 of 2.png"]);
    }

    #[test]
    fn test_collect_missing_dir() {
        let temp = TempDir::new().unwrap();
        let err = collect_media(temp.path().join("missing"), None).unwrap_err();
        assert!(matches!(err, SlideshowError::MissingInput(_)));
    }

    #[test]
    fn test_find_music_prefers_first_dir() {
        let root = TempDir::new().unwrap();
        root.child("media/b.mp3").touch().unwrap();
        root.child("media/a.mp3").touch().unwrap();

        let media = root.path().join("media");
        assert_eq!(
            find_music_file(&[root.path(), media.as_path()]),
            Some(media.join("a.mp3"))
        );

        root.child("top.mp3").touch().unwrap();
        assert_eq!(
            find_music_file(&[root.path(), media.as_path()]),
            Some(root.path().join("top.mp3"))
        );
    }

    #[test]
    fn test_find_music_none() {
        let root = TempDir::new().unwrap();
        root.child("clip.mp4").touch().unwrap();
        assert_eq!(find_music_file(&[root.path()]), None);
    }
}
