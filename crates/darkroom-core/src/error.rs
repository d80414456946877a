//! Error type shared by the core crate.

/// Errors produced by the core processing layer.
///
/// Per-pixel stages never fail; these cover the boundaries where outside
/// data enters (raw buffers, parameter documents, `.cube` files, stored
/// presets) or leaves (encoded exports).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("pixel buffer of {width}x{height} needs {expected} bytes, got {actual}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("rotation must be 0, 90, 180 or 270 degrees, got {0}")]
    InvalidRotation(u16),
    #[error("invalid LUT: {0}")]
    Lut(String),
    #[error("failed to encode {format} image: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
    #[error("malformed parameter document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("key-value store error: {0}")]
    Store(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
