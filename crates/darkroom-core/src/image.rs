//! Image representation for the editing pipeline.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::error::CoreError;

/// Bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

/// Contiguous RGBA8 pixel storage, row-major.
///
/// Invariant: `data.len() == width * height * 4`. Every constructor checks
/// it, so the pixel views below never see a ragged tail.
///
/// Buffers are moved between pipeline stages rather than shared; a stage
/// either mutates its own copy or returns a fresh buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; byte_len(width, height)],
        }
    }

    /// Buffer with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.pixels_mut().fill(rgba);
        buffer
    }

    /// Wrap raw RGBA8 bytes, rejecting a length that does not match the
    /// dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        let expected = byte_len(width, height);
        if data.len() != expected {
            return Err(CoreError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut buffer = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                buffer.set_pixel(x, y, f(x, y));
            }
        }
        buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// View the storage as `[r, g, b, a]` pixels.
    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.data)
    }

    /// Mutable `[r, g, b, a]` view.
    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Pixel at `(x, y)`. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels()[self.index(x, y)]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let idx = self.index(x, y);
        self.pixels_mut()[idx] = rgba;
    }

    /// Copy scaled so the longer edge is at most `max_edge`.
    ///
    /// Never upscales; a buffer that already fits is cloned unchanged.
    pub fn resized_to_fit(&self, max_edge: u32) -> PixelBuffer {
        let (width, height) = fit_within(self.width, self.height, max_edge);
        if (width, height) == (self.width, self.height) {
            return self.clone();
        }
        let src = self.to_rgba_image();
        let scaled = imageops::resize(&src, width, height, FilterType::Triangle);
        PixelBuffer::from(scaled)
    }

    /// Copy into an `image` crate buffer for codecs and resampling.
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{}",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

impl From<PixelBuffer> for RgbaImage {
    fn from(buffer: PixelBuffer) -> Self {
        let (width, height) = buffer.dimensions();
        RgbaImage::from_raw(width, height, buffer.data)
            .unwrap_or_else(|| RgbaImage::new(width, height))
    }
}

/// Dimensions scaled to fit inside a `max_edge` square, aspect preserved.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 || max_edge == 0 || (width <= max_edge && height <= max_edge) {
        return (width, height);
    }
    let aspect = width as f64 / height as f64;
    if width >= height {
        let h = (max_edge as f64 / aspect).round().max(1.0) as u32;
        (max_edge, h)
    } else {
        let w = (max_edge as f64 * aspect).round().max(1.0) as u32;
        (w, max_edge)
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        let err = PixelBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::BufferSize {
                expected: 16,
                actual: 15,
                ..
            }
        ));
    }

    #[test]
    fn test_pixel_views_are_row_major() {
        let buffer = PixelBuffer::from_fn(3, 2, |x, y| [x as u8, y as u8, 0, 255]);
        assert_eq!(buffer.pixels().len(), 6);
        assert_eq!(buffer.pixel(2, 1), [2, 1, 0, 255]);
        assert_eq!(&buffer.as_bytes()[4..8], &[1, 0, 0, 255]);
    }

    #[test]
    fn test_fit_within_keeps_aspect() {
        assert_eq!(fit_within(4000, 2000, 1920), (1920, 960));
        assert_eq!(fit_within(1000, 3000, 1920), (640, 1920));
        assert_eq!(fit_within(800, 600, 1920), (800, 600));
    }

    #[test]
    fn test_resized_to_fit_never_upscales() {
        let buffer = PixelBuffer::filled(10, 5, [9, 9, 9, 255]);
        assert_eq!(buffer.resized_to_fit(512), buffer);
        let small = buffer.resized_to_fit(4);
        assert_eq!(small.dimensions(), (4, 2));
        assert!(small.pixels().iter().all(|p| *p == [9, 9, 9, 255]));
    }

    #[test]
    fn test_rgba_image_round_trip() {
        let buffer = PixelBuffer::from_fn(4, 3, |x, y| [x as u8 * 10, y as u8 * 20, 7, 200]);
        let img: RgbaImage = buffer.clone().into();
        assert_eq!(PixelBuffer::from(img), buffer);
    }
}
