use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlideshowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{description} failed:\n{stderr}")]
    Tool { description: String, stderr: String },

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Expected input missing: {0}")]
    MissingInput(String),

    #[error("No media files found in {}", .0.display())]
    NoMedia(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Probe error: {0}")]
    Probe(String),
}

pub type Result<T> = std::result::Result<T, SlideshowError>;
