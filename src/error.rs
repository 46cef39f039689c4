//! Error types for the renderer

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid output size {width}x{height}")]
    OutputSize { width: u32, height: u32 },

    #[error("invalid camera: {0}")]
    Camera(&'static str),
}

pub type Result<T> = std::result::Result<T, RenderError>;
