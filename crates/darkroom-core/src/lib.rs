//! Darkroom Core: domain layer for the photo editor.
//!
//! Pixel buffers, the edit parameter model, tone/colour math, the
//! geometry stage, the per-pixel filter pipeline, black-and-white
//! conversion, 3D LUT colour transfer, presets and export encoding.
//! No threads; the engine crate schedules.

pub mod color_management;
pub mod error;
pub mod export;
pub mod grading;
pub mod image;
pub mod presets;
pub mod transform;

// Re-exports for convenience.
pub use error::CoreError;
pub use export::{ExportFormat, ExportOptions};
pub use image::PixelBuffer;
pub use presets::{KeyValueStore, MemoryStore, Preset, PresetLibrary};
pub use transform::filter::apply_filters;
pub use transform::geometry::apply_geometry;
pub use transform::lut::Lut3D;
pub use transform::params::{EditParams, GeometryParams, NormalizedRect, Rotation};
