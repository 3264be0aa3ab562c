use serde::Deserialize;

use crate::error::{Result, SlideshowError};

/// Clockwise rotation a stream needs before display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Snap clockwise degrees to a quarter turn. Odd angles are ignored.
    pub fn from_clockwise_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Cw90,
            180 => Rotation::Cw180,
            270 => Rotation::Cw270,
            _ => Rotation::None,
        }
    }

    pub fn transpose_filters(&self) -> &'static [&'static str] {
        match self {
            Rotation::None => &[],
            Rotation::Cw90 => &["transpose=1"],
            Rotation::Cw180 => &["transpose=1", "transpose=1"],
            Rotation::Cw270 => &["transpose=2"],
        }
    }
}

/// What one probe call tells us about a file
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MediaInfo {
    /// Container duration in seconds, when known and positive
    pub duration: Option<f64>,
    pub rotation: Rotation,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    side_data_list: Vec<SideData>,
    #[serde(default)]
    tags: Option<StreamTags>,
}

#[derive(Debug, Deserialize)]
struct SideData {
    rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StreamTags {
    rotate: Option<String>,
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
///
/// The display matrix reports counter-clockwise degrees, the legacy
/// `rotate` tag reports clockwise degrees.
pub fn parse_probe_output(json: &str) -> Result<MediaInfo> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| SlideshowError::Probe(format!("unreadable ffprobe output: {}", e)))?;

    let duration = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    let rotation = probe
        .streams
        .first()
        .and_then(|stream| {
            let from_matrix = stream
                .side_data_list
                .iter()
                .find_map(|sd| sd.rotation)
                .map(|ccw| -(ccw.round() as i64));
            let from_tag = stream
                .tags
                .as_ref()
                .and_then(|t| t.rotate.as_deref())
                .and_then(|r| r.trim().parse::<f64>().ok())
                .map(|cw| cw.round() as i64);
            from_matrix.or(from_tag)
        })
        .map(Rotation::from_clockwise_degrees)
        .unwrap_or_default();

    Ok(MediaInfo { duration, rotation })
}
