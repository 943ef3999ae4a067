//! Crop Studio: the crop and geometry engine behind a photo editor.
//!
//! The crop rectangle lives in normalized image space ([`crop`]), is driven
//! by handle drags ([`resize`]) through a zoomable, pannable view
//! ([`viewport`]), and is cut from a raster baked through rotation, flips and
//! colour filters ([`bake`], [`export`]). [`session::CropEditorSession`] ties
//! them together behind a pointer-event API.

pub mod adjust;
pub mod aspect;
pub mod bake;
pub mod config;
pub mod crop;
pub mod error;
pub mod export;
pub mod logging;
pub mod processor;
pub mod resize;
pub mod session;
pub mod viewport;

pub use adjust::{AdjustmentSettings, FilterPreset};
pub use aspect::AspectRatioMode;
pub use config::EditorConfig;
pub use crop::{CropRect, ImageSize};
pub use error::{ConfigError, EditorError};
pub use export::{EncodedImage, ExportFormat, ExportOptions};
pub use processor::{ImageProcessor, ProcessorError};
pub use resize::DragHandle;
pub use session::{CropEditorSession, Interaction, Tool};
pub use viewport::{GridConfig, ViewportState};
