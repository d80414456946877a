//! Filter pipeline: one per-pixel pass, then the detail convolutions.

use std::time::Instant;

use rand::Rng;
use tracing::debug;

use crate::image::PixelBuffer;
use crate::transform::convolve::{denoise, sharpen};
use crate::transform::evaluate::{FilterProgram, evaluate_pixel};
use crate::transform::params::EditParams;

/// Filter a copy of `working` with the thread-local RNG for grain.
pub fn apply_filters(working: &PixelBuffer, params: &EditParams) -> PixelBuffer {
    apply_filters_with_rng(working, params, &mut rand::rng())
}

/// Filter a copy of `working`, drawing grain noise from `rng`.
pub fn apply_filters_with_rng<R: Rng>(
    working: &PixelBuffer,
    params: &EditParams,
    rng: &mut R,
) -> PixelBuffer {
    let mut out = working.clone();
    filter_in_place(&mut out, params, rng);
    out
}

/// Filter `buffer` in place.
///
/// Grain is the only stage that reads `rng`; with `grain == 0` the result
/// is a pure function of the buffer and `params`.
pub fn filter_in_place<R: Rng>(buffer: &mut PixelBuffer, params: &EditParams, rng: &mut R) {
    if buffer.is_empty() {
        return;
    }
    let started = Instant::now();
    let (width, _) = buffer.dimensions();
    let program = FilterProgram::new(params, buffer.width(), buffer.height());
    let grain = program.uses_grain();

    for (i, px) in buffer.pixels_mut().iter_mut().enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let noise = if grain { rng.random::<f32>() } else { 0.0 };
        *px = evaluate_pixel(&program, *px, x, y, noise);
    }

    if params.detail.noise > 0.0 {
        denoise(buffer, params.detail.noise / 100.0);
    }
    if params.detail.sharpen > 0.0 {
        sharpen(buffer, params.detail.sharpen / 100.0);
    }

    debug!(
        width = buffer.width(),
        height = buffer.height(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "filters applied"
    );
}
