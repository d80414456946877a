//! Geometry stage: crop → rotate → straighten → flip in one resampling pass.
//!
//! The output canvas is the cropped size, with width and height swapped for
//! odd quarter turns. The forward map from cropped-source space (origin at
//! the crop centre) to canvas space is
//! ```text
//! T(canvas_center) · R(rotate) · R(straighten) · S(±1, ±1)
//! ```
//! and every output pixel centre is pulled back through its inverse.
//!
//! With `straighten == 0` the map is a permutation of pixel centres, done
//! in doubled integer coordinates with no resampling. Otherwise pixels are
//! sampled bilinearly (premultiplied alpha) and anything falling outside
//! the crop is transparent.

use glam::{Affine2, Vec2};
use tracing::debug;

use crate::image::PixelBuffer;
use crate::transform::params::{GeometryParams, NormalizedRect, Rotation};

/// Crop rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x as i64
            && y >= self.y as i64
            && x < (self.x + self.width) as i64
            && y < (self.y + self.height) as i64
    }
}

/// Resolve a normalized crop against a `width × height` source.
///
/// `None` (or a crop that normalizes away) selects the whole source. The
/// result is clamped to the source and is at least one pixel in each
/// direction for a non-empty source.
pub fn crop_rect(width: u32, height: u32, crop: Option<NormalizedRect>) -> PixelRect {
    let full = PixelRect {
        x: 0,
        y: 0,
        width,
        height,
    };
    let Some(rect) = crop.and_then(|c| c.normalized()) else {
        return full;
    };
    if width == 0 || height == 0 {
        return full;
    }

    let x = ((rect.x * width as f32).round() as u32).min(width - 1);
    let y = ((rect.y * height as f32).round() as u32).min(height - 1);
    let w = ((rect.w * width as f32).round() as u32).clamp(1, width - x);
    let h = ((rect.h * height as f32).round() as u32).clamp(1, height - y);
    PixelRect {
        x,
        y,
        width: w,
        height: h,
    }
}

/// Output size of the geometry stage.
pub fn output_dimensions(width: u32, height: u32, geometry: &GeometryParams) -> (u32, u32) {
    let rect = crop_rect(width, height, geometry.crop);
    if geometry.rotate.swaps_dimensions() {
        (rect.height, rect.width)
    } else {
        (rect.width, rect.height)
    }
}

/// Produce the working buffer for `geometry` from `src`.
///
/// The source is only read; the result is always a fresh buffer.
pub fn apply_geometry(src: &PixelBuffer, geometry: &GeometryParams) -> PixelBuffer {
    if src.is_empty() {
        return src.clone();
    }
    let rect = crop_rect(src.width(), src.height(), geometry.crop);
    let out = if geometry.straighten == 0.0 {
        permute(src, rect, geometry.rotate, geometry.flip_h, geometry.flip_v)
    } else {
        resample(src, rect, geometry)
    };
    debug!(
        src_width = src.width(),
        src_height = src.height(),
        width = out.width(),
        height = out.height(),
        straighten = geometry.straighten,
        "geometry applied"
    );
    out
}

/// Exact quarter-turn/flip/crop, no interpolation.
fn permute(
    src: &PixelBuffer,
    rect: PixelRect,
    rotation: Rotation,
    flip_h: bool,
    flip_v: bool,
) -> PixelBuffer {
    let (out_w, out_h) = if rotation.swaps_dimensions() {
        (rect.height, rect.width)
    } else {
        (rect.width, rect.height)
    };
    let (sw, sh) = (rect.width as i64, rect.height as i64);

    PixelBuffer::from_fn(out_w, out_h, |ox, oy| {
        // Doubled coordinates relative to the canvas centre.
        let cx = 2 * ox as i64 + 1 - out_w as i64;
        let cy = 2 * oy as i64 + 1 - out_h as i64;
        let (mut lx, mut ly) = match rotation {
            Rotation::None => (cx, cy),
            Rotation::Cw90 => (cy, -cx),
            Rotation::Cw180 => (-cx, -cy),
            Rotation::Cw270 => (-cy, cx),
        };
        if flip_h {
            lx = -lx;
        }
        if flip_v {
            ly = -ly;
        }
        let sx = (lx + sw - 1) / 2 + rect.x as i64;
        let sy = (ly + sh - 1) / 2 + rect.y as i64;
        src.pixel(sx as u32, sy as u32)
    })
}

/// Forward map from crop-centred source space to canvas space.
pub fn forward_transform(out_w: u32, out_h: u32, geometry: &GeometryParams) -> Affine2 {
    let angle = (geometry.rotate.degrees() as f32 + geometry.straighten).to_radians();
    let scale = Vec2::new(
        if geometry.flip_h { -1.0 } else { 1.0 },
        if geometry.flip_v { -1.0 } else { 1.0 },
    );
    Affine2::from_translation(Vec2::new(out_w as f32, out_h as f32) * 0.5)
        * Affine2::from_angle(angle)
        * Affine2::from_scale(scale)
}

fn resample(src: &PixelBuffer, rect: PixelRect, geometry: &GeometryParams) -> PixelBuffer {
    let (out_w, out_h) = if geometry.rotate.swaps_dimensions() {
        (rect.height, rect.width)
    } else {
        (rect.width, rect.height)
    };
    let inverse = forward_transform(out_w, out_h, geometry).inverse();
    let origin = Vec2::new(
        rect.x as f32 + rect.width as f32 * 0.5,
        rect.y as f32 + rect.height as f32 * 0.5,
    );

    PixelBuffer::from_fn(out_w, out_h, |ox, oy| {
        let centre = Vec2::new(ox as f32 + 0.5, oy as f32 + 0.5);
        let p = inverse.transform_point2(centre) + origin;
        sample_bilinear(src, rect, p)
    })
}

/// Bilinear sample at continuous source position `p` (pixel centres at
/// `i + 0.5`), treating pixels outside `rect` as transparent.
fn sample_bilinear(src: &PixelBuffer, rect: PixelRect, p: Vec2) -> [u8; 4] {
    let fx = p.x - 0.5;
    let fy = p.y - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut acc = [0.0_f32; 4];
    for (dx, dy, w) in [
        (0, 0, (1.0 - tx) * (1.0 - ty)),
        (1, 0, tx * (1.0 - ty)),
        (0, 1, (1.0 - tx) * ty),
        (1, 1, tx * ty),
    ] {
        let (x, y) = (x0 + dx, y0 + dy);
        if w <= 0.0 || !rect.contains(x, y) {
            continue;
        }
        let px = src.pixel(x as u32, y as u32);
        let a = px[3] as f32 / 255.0;
        acc[0] += px[0] as f32 * a * w;
        acc[1] += px[1] as f32 * a * w;
        acc[2] += px[2] as f32 * a * w;
        acc[3] += a * w;
    }

    let alpha = acc[3];
    if alpha <= 0.0 {
        return [0, 0, 0, 0];
    }
    [
        to_u8(acc[0] / alpha),
        to_u8(acc[1] / alpha),
        to_u8(acc[2] / alpha),
        to_u8(alpha * 255.0),
    ]
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
