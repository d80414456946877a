//! Decoding into [`PixelBuffer`] and writing encoded bytes.

use std::path::Path;

use darkroom_core::{ExportFormat, PixelBuffer};
use image::ImageReader;
use tracing::debug;

/// A decoded image plus the container it came in.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub buffer: PixelBuffer,
    /// `None` when the container is not one we can write back.
    pub format: Option<ExportFormat>,
}

/// Load an image from disk as 8-bit RGBA.
///
/// The container is sniffed from the file contents, so a misnamed file
/// still decodes.
pub fn load_image(path: &Path) -> Result<LoadedImage, ImageLoadError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader
        .format()
        .and_then(|f| ExportFormat::from_mime(f.to_mime_type()));
    let img = reader.decode().map_err(ImageLoadError::Decode)?;
    let buffer = PixelBuffer::from(img.to_rgba8());
    debug!(
        path = %path.display(),
        width = buffer.width(),
        height = buffer.height(),
        ?format,
        "decoded image"
    );
    Ok(LoadedImage { buffer, format })
}

/// Output format for `output`: an explicit choice, then the output's
/// extension, then the source container, then PNG.
pub fn output_format(
    explicit: Option<ExportFormat>,
    output: &Path,
    source: Option<ExportFormat>,
) -> ExportFormat {
    explicit
        .or_else(|| ExportFormat::from_path(output))
        .or(source)
        .unwrap_or_default()
}

/// Write encoded bytes, creating parent directories as needed.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ImageLoadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Errors that can occur during image loading.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
