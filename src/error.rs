use std::path::PathBuf;

use thiserror::Error;

use crate::export::ExportFormat;

#[derive(Debug, Error)]
pub enum EditorError {
    /// The pixel crop collapsed to nothing. The crop model's minimum size makes
    /// this unreachable in practice; a commit that hits it changes nothing.
    #[error("degenerate crop: {width}x{height} px")]
    DegenerateCrop { width: i64, height: i64 },

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode {format} image: {source}")]
    Encode {
        format: ExportFormat,
        #[source]
        source: image::ImageError,
    },

    /// Nothing to draw yet (no image loaded). Not a fault; retry next frame.
    #[error("no render surface available")]
    NoRenderSurface,

    #[error("image processing service failed: {0}")]
    Processor(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
