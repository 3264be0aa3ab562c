//! Slidereel - Slideshow Video Builder
//!
//! Assembles a slideshow video from a folder of numbered images and clips,
//! adding fade transitions and background music. All media work is done by
//! ffmpeg/ffprobe invoked as subprocesses, one at a time.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod manifest;
pub mod media;
pub mod strip;
pub mod workflow;
pub mod error;
