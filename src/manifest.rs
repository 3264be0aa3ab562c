use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::Result;

/// Render concat demuxer lines, one `file '...'` entry per segment.
///
/// Entries are written relative to `base_dir` when possible, since the
/// demuxer resolves relative paths against the manifest's own directory.
pub fn render_concat_manifest<P: AsRef<Path>>(base_dir: &Path, segments: &[P]) -> String {
    segments
        .iter()
        .map(|segment| {
            let segment = segment.as_ref();
            let entry: PathBuf = pathdiff::diff_paths(segment, base_dir)
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| segment.to_path_buf());
            format!("file '{}'\n", escape_quotes(&entry.to_string_lossy()))
        })
        .collect()
}

/// Write the concat manifest for `segments` to `manifest_path`.
pub async fn write_concat_manifest<P: AsRef<Path>>(manifest_path: &Path, segments: &[P]) -> Result<()> {
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    let content = render_concat_manifest(base_dir, segments);
    debug!("Writing concat manifest {} ({} entries)", manifest_path.display(), segments.len());
    fs::write(manifest_path, content).await?;
    Ok(())
}

fn escape_quotes(path: &str) -> String {
    path.replace('\'', "'\\''")
}
