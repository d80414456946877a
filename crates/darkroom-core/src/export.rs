//! Full-resolution render and encoding for download.

use std::path::Path;
use std::time::Instant;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use rand::Rng;
use tracing::debug;

use crate::error::CoreError;
use crate::image::PixelBuffer;
use crate::transform::filter::apply_filters_with_rng;
use crate::transform::geometry::apply_geometry;
use crate::transform::params::EditParams;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 95;

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Pick a format from the source's MIME type, then its extension,
    /// falling back to PNG.
    pub fn resolve(mime: Option<&str>, extension: Option<&str>) -> Self {
        mime.and_then(Self::from_mime)
            .or_else(|| extension.and_then(Self::from_extension))
            .unwrap_or_default()
    }

    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Webp => "WebP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// JPEG quality, 1–100. PNG and lossless WebP ignore it.
    pub quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ExportOptions {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    fn clamped_quality(&self) -> u8 {
        self.quality.clamp(1, 100)
    }
}

/// Geometry then filters on the full-resolution original.
pub fn render(original: &PixelBuffer, params: &EditParams) -> PixelBuffer {
    render_with_rng(original, params, &mut rand::rng())
}

pub fn render_with_rng<R: Rng>(original: &PixelBuffer, params: &EditParams, rng: &mut R) -> PixelBuffer {
    let started = Instant::now();
    let working = apply_geometry(original, &params.geometry);
    let out = apply_filters_with_rng(&working, params, rng);
    debug!(
        width = out.width(),
        height = out.height(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "export render finished"
    );
    out
}

/// Encode `buffer` into the container named by `options`.
pub fn encode(buffer: &PixelBuffer, options: &ExportOptions) -> Result<Vec<u8>, CoreError> {
    let (width, height) = buffer.dimensions();
    let format = options.format;
    let mut bytes = Vec::new();

    let result = match format {
        ExportFormat::Png => PngEncoder::new(&mut bytes).write_image(
            buffer.as_bytes(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        ExportFormat::Jpeg => {
            let rgb: Vec<u8> = buffer
                .pixels()
                .iter()
                .flat_map(|&[r, g, b, _]| [r, g, b])
                .collect();
            JpegEncoder::new_with_quality(&mut bytes, options.clamped_quality()).encode(
                &rgb,
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        ExportFormat::Webp => WebPEncoder::new_lossless(&mut bytes).encode(
            buffer.as_bytes(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    };
    result.map_err(|source| CoreError::Encode {
        format: format.name(),
        source,
    })?;

    debug!(format = format.name(), width, height, bytes = bytes.len(), "encoded export");
    Ok(bytes)
}

/// Render and encode in one step.
pub fn export(
    original: &PixelBuffer,
    params: &EditParams,
    options: &ExportOptions,
) -> Result<Vec<u8>, CoreError> {
    encode(&render(original, params), options)
}
