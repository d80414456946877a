//! 3D LUT colour transfer: learn from a source image, apply to a target,
//! and `.cube` file I/O.
//!
//! # Learning
//! Sampled source pixels are decoded to linear light and bucketed by
//! `floor(linear × (size − 1))` per channel. Each filled bucket stores the
//! mean of its samples. Empty buckets copy the nearest filled bucket
//! (squared Euclidean distance in grid-index space, first found wins on
//! ties). A source with no samples yields the identity grid.
//!
//! A cell's mean lies above its lower node, so learning from an image and
//! applying the result to the same image is not exact: values rise by up to
//! half a cell, most in the darkest cell.
//!
//! # Application
//! Target pixels are decoded, trilinearly sampled, re-encoded to sRGB and
//! blended with the original by `intensity / 100`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::color_management::transfer::{linear_to_srgb_level, srgb_u8_to_linear};
use crate::error::CoreError;
use crate::image::PixelBuffer;

/// Grid size used by [`Lut3D::learn`].
pub const LUT_SIZE: usize = 16;
/// Longest source edge read when learning.
pub const MAX_SAMPLE_EDGE: u32 = 512;
/// Upper bound on samples read when learning.
pub const MAX_SAMPLE_COUNT: usize = 120_000;
/// Largest grid accepted from a `.cube` file.
pub const MAX_CUBE_SIZE: usize = 256;
/// Intensity the colour-transfer tool starts at.
pub const DEFAULT_INTENSITY: f32 = 85.0;

/// A cubic grid of linear-RGB triples, red varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3D {
    size: usize,
    data: Vec<[f32; 3]>,
}

impl Lut3D {
    /// Grid whose value at each node is the node's own coordinate.
    pub fn identity(size: usize) -> Self {
        let size = size.max(2);
        let max = (size - 1) as f32;
        let mut data = Vec::with_capacity(size * size * size);
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    data.push([r as f32 / max, g as f32 / max, b as f32 / max]);
                }
            }
        }
        Self { size, data }
    }

    /// Wrap grid data in red-fastest order.
    pub fn from_data(size: usize, data: Vec<[f32; 3]>) -> Result<Self, CoreError> {
        if size < 2 {
            return Err(CoreError::Lut(format!("grid size must be at least 2, got {size}")));
        }
        let expected = size
            .checked_mul(size)
            .and_then(|n| n.checked_mul(size))
            .ok_or_else(|| CoreError::Lut(format!("grid size {size} is too large")))?;
        if data.len() != expected {
            return Err(CoreError::Lut(format!(
                "expected {expected} entries for size {size}, found {}",
                data.len()
            )));
        }
        Ok(Self { size, data })
    }

    /// Build a grid from linear-RGB samples.
    pub fn from_samples(size: usize, samples: impl IntoIterator<Item = [f32; 3]>) -> Self {
        let size = size.max(2);
        let bins = size * size * size;
        let max = (size - 1) as f32;
        let mut sums = vec![[0.0_f32; 3]; bins];
        let mut counts = vec![0u32; bins];

        for s in samples {
            let idx = s.map(|v| ((v * max).floor().max(0.0) as usize).min(size - 1));
            let bin = index(size, idx[0], idx[1], idx[2]);
            for c in 0..3 {
                sums[bin][c] += s[c];
            }
            counts[bin] += 1;
        }

        let filled: Vec<(usize, usize, usize, usize)> = (0..size)
            .flat_map(|b| (0..size).flat_map(move |g| (0..size).map(move |r| (r, g, b))))
            .map(|(r, g, b)| (r, g, b, index(size, r, g, b)))
            .filter(|&(_, _, _, bin)| counts[bin] > 0)
            .collect();
        if filled.is_empty() {
            return Self::identity(size);
        }

        let mut data = vec![[0.0_f32; 3]; bins];
        for &(_, _, _, bin) in &filled {
            let n = counts[bin] as f32;
            data[bin] = sums[bin].map(|v| v / n);
        }

        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    let bin = index(size, r, g, b);
                    if counts[bin] > 0 {
                        continue;
                    }
                    data[bin] = data[nearest_filled(&filled, r, g, b)];
                }
            }
        }

        debug!(size, filled = filled.len(), bins, "3D LUT grid built");
        Self { size, data }
    }

    /// Learn the colour response of `source`.
    ///
    /// The source is downscaled so its longer edge is at most
    /// [`MAX_SAMPLE_EDGE`] and then strided so at most
    /// [`MAX_SAMPLE_COUNT`] pixels are read.
    pub fn learn(source: &PixelBuffer) -> Self {
        Self::learn_with_size(source, LUT_SIZE)
    }

    pub fn learn_with_size(source: &PixelBuffer, size: usize) -> Self {
        let started = Instant::now();
        let sample = source.resized_to_fit(MAX_SAMPLE_EDGE);
        let pixels = sample.pixels();
        let step = sample_stride(pixels.len());

        let lut = Self::from_samples(
            size,
            pixels
                .iter()
                .step_by(step)
                .map(|px| [px[0], px[1], px[2]].map(srgb_u8_to_linear)),
        );
        info!(
            source_width = source.width(),
            source_height = source.height(),
            samples = pixels.len().div_ceil(step),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "learned colour LUT"
        );
        lut
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Grid entries, red fastest.
    pub fn data(&self) -> &[[f32; 3]] {
        &self.data
    }

    /// Entry at grid node `(r, g, b)`.
    pub fn node(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        self.data[index(self.size, r, g, b)]
    }

    /// Trilinear lookup of a linear-RGB value, clamped to `[0, 1]`.
    pub fn sample(&self, rgb: [f32; 3]) -> [f32; 3] {
        let max = self.size - 1;
        let pos = rgb.map(|v| v.clamp(0.0, 1.0) * max as f32);
        let i0 = pos.map(|p| (p.floor() as usize).min(max));
        let i1 = i0.map(|i| (i + 1).min(max));
        let t = [
            pos[0] - i0[0] as f32,
            pos[1] - i0[1] as f32,
            pos[2] - i0[2] as f32,
        ];

        let c000 = self.node(i0[0], i0[1], i0[2]);
        let c100 = self.node(i1[0], i0[1], i0[2]);
        let c010 = self.node(i0[0], i1[1], i0[2]);
        let c110 = self.node(i1[0], i1[1], i0[2]);
        let c001 = self.node(i0[0], i0[1], i1[2]);
        let c101 = self.node(i1[0], i0[1], i1[2]);
        let c011 = self.node(i0[0], i1[1], i1[2]);
        let c111 = self.node(i1[0], i1[1], i1[2]);

        let mut out = [0.0_f32; 3];
        for c in 0..3 {
            let c00 = lerp(c000[c], c100[c], t[0]);
            let c10 = lerp(c010[c], c110[c], t[0]);
            let c01 = lerp(c001[c], c101[c], t[0]);
            let c11 = lerp(c011[c], c111[c], t[0]);
            let c0 = lerp(c00, c10, t[1]);
            let c1 = lerp(c01, c11, t[1]);
            out[c] = lerp(c0, c1, t[2]);
        }
        out
    }

    /// Grade a copy of `target` at `intensity` in `[0, 100]`.
    pub fn apply(&self, target: &PixelBuffer, intensity: f32) -> PixelBuffer {
        let mut out = target.clone();
        self.apply_in_place(&mut out, intensity);
        out
    }

    /// Grade `buffer` in place; alpha is untouched.
    pub fn apply_in_place(&self, buffer: &mut PixelBuffer, intensity: f32) {
        let strength = (intensity / 100.0).clamp(0.0, 1.0);
        if strength == 0.0 {
            return;
        }
        let started = Instant::now();
        for px in buffer.pixels_mut() {
            let linear = [px[0], px[1], px[2]].map(srgb_u8_to_linear);
            let graded = self.sample(linear);
            for c in 0..3 {
                let original = px[c] as f32;
                let mapped = linear_to_srgb_level(graded[c]);
                px[c] = lerp(original, mapped, strength).round().clamp(0.0, 255.0) as u8;
            }
        }
        debug!(
            width = buffer.width(),
            height = buffer.height(),
            intensity,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "applied colour LUT"
        );
    }

    /// Load a `.cube` file.
    pub fn load_cube(path: &Path) -> Result<Self, CoreError> {
        let file = File::open(path)?;
        Self::parse_cube(BufReader::new(file))
    }

    /// Save as a `.cube` file.
    pub fn save_cube(&self, path: &Path, title: Option<&str>) -> Result<(), CoreError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_cube(&mut writer, title)?;
        writer.flush()?;
        Ok(())
    }

    /// Parse `.cube` text. Only the default `[0, 1]` domain is accepted.
    pub fn parse_cube<R: BufRead>(reader: R) -> Result<Self, CoreError> {
        let mut size: Option<usize> = None;
        let mut data = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with("TITLE") {
                continue;
            } else if let Some(rest) = line.strip_prefix("LUT_3D_SIZE") {
                let n = rest
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| CoreError::Lut(format!("invalid LUT_3D_SIZE: {rest}")))?;
                if n > MAX_CUBE_SIZE {
                    return Err(CoreError::Lut(format!(
                        "LUT_3D_SIZE {n} exceeds the supported maximum of {MAX_CUBE_SIZE}"
                    )));
                }
                size = Some(n);
            } else if line.starts_with("LUT_1D_SIZE") {
                return Err(CoreError::Lut("expected a 3D LUT, found 1D".into()));
            } else if let Some(rest) = line.strip_prefix("DOMAIN_MIN") {
                if parse_triple(rest)? != [0.0; 3] {
                    return Err(CoreError::Lut("only DOMAIN_MIN 0 0 0 is supported".into()));
                }
            } else if let Some(rest) = line.strip_prefix("DOMAIN_MAX") {
                if parse_triple(rest)? != [1.0; 3] {
                    return Err(CoreError::Lut("only DOMAIN_MAX 1 1 1 is supported".into()));
                }
            } else {
                data.push(parse_triple(line)?);
            }
        }

        let size = size.ok_or_else(|| CoreError::Lut("missing LUT_3D_SIZE".into()))?;
        Self::from_data(size, data)
    }

    /// Write `.cube` text, red fastest.
    pub fn write_cube<W: Write>(&self, writer: &mut W, title: Option<&str>) -> Result<(), CoreError> {
        writeln!(writer, "# Generated by darkroom")?;
        if let Some(title) = title {
            writeln!(writer, "TITLE \"{}\"", title.replace('"', "'"))?;
        }
        writeln!(writer, "LUT_3D_SIZE {}", self.size)?;
        writeln!(writer)?;
        for rgb in &self.data {
            writeln!(writer, "{:.6} {:.6} {:.6}", rgb[0], rgb[1], rgb[2])?;
        }
        Ok(())
    }
}

/// Stride that keeps a read of `pixel_count` pixels within
/// [`MAX_SAMPLE_COUNT`].
fn sample_stride(pixel_count: usize) -> usize {
    pixel_count.div_ceil(MAX_SAMPLE_COUNT).max(1)
}

fn index(size: usize, r: usize, g: usize, b: usize) -> usize {
    (b * size + g) * size + r
}

fn nearest_filled(filled: &[(usize, usize, usize, usize)], r: usize, g: usize, b: usize) -> usize {
    let mut best = filled[0].3;
    let mut best_dist = usize::MAX;
    for &(fr, fg, fb, bin) in filled {
        let dist = fr.abs_diff(r).pow(2) + fg.abs_diff(g).pow(2) + fb.abs_diff(b).pow(2);
        if dist < best_dist {
            best_dist = dist;
            best = bin;
            if dist == 0 {
                break;
            }
        }
    }
    best
}

fn parse_triple(text: &str) -> Result<[f32; 3], CoreError> {
    let mut parts = text.split_whitespace().map(|p| {
        p.parse::<f32>()
            .map_err(|_| CoreError::Lut(format!("invalid number '{p}'")))
    });
    let mut next = || {
        parts
            .next()
            .unwrap_or_else(|| Err(CoreError::Lut(format!("expected three values: '{text}'"))))
    };
    Ok([next()?, next()?, next()?])
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
