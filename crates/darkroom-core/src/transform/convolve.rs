//! 3×3 detail filters: denoise and sharpen.
//!
//! Both read from an immutable snapshot of the buffer, so results never
//! depend on traversal order, and both leave the one-pixel border and the
//! alpha channel untouched.

use crate::image::PixelBuffer;

/// Gaussian-like blur kernel, normalized by 16.
const DENOISE_KERNEL: [[f32; 3]; 3] = [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]];

/// Blend each interior pixel with its 3×3 blur by `amount` in `[0, 1]`.
///
/// ```text
/// out = in × (1 − amount) + blur × amount
/// ```
pub fn denoise(buffer: &mut PixelBuffer, amount: f32) {
    if amount <= 0.0 {
        return;
    }
    convolve(buffer, |snapshot, x, y, c| {
        let mut blur = 0.0;
        for (ky, row) in DENOISE_KERNEL.iter().enumerate() {
            for (kx, k) in row.iter().enumerate() {
                blur += k * snapshot.pixel(x + kx as u32 - 1, y + ky as u32 - 1)[c] as f32;
            }
        }
        blur *= 1.0 / 16.0;
        let center = snapshot.pixel(x, y)[c] as f32;
        center * (1.0 - amount) + blur * amount
    });
}

/// Four-neighbour sharpen with strength `amount` in `[0, 1]`.
///
/// ```text
/// out = (4a + 1)·centre − a·(up + down + left + right)
/// ```
pub fn sharpen(buffer: &mut PixelBuffer, amount: f32) {
    if amount <= 0.0 {
        return;
    }
    let k = -amount;
    let centre_weight = 4.0 * amount + 1.0;
    convolve(buffer, |snapshot, x, y, c| {
        let up = snapshot.pixel(x, y - 1)[c] as f32;
        let down = snapshot.pixel(x, y + 1)[c] as f32;
        let left = snapshot.pixel(x - 1, y)[c] as f32;
        let right = snapshot.pixel(x + 1, y)[c] as f32;
        let centre = snapshot.pixel(x, y)[c] as f32;
        (up + down + left + right) * k + centre * centre_weight
    });
}

/// Run `kernel` for each colour channel of each interior pixel, reading
/// from a snapshot and writing rounded, clamped results into `buffer`.
fn convolve(buffer: &mut PixelBuffer, kernel: impl Fn(&PixelBuffer, u32, u32, usize) -> f32) {
    let (width, height) = buffer.dimensions();
    if width < 3 || height < 3 {
        return;
    }
    let snapshot = buffer.clone();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut px = snapshot.pixel(x, y);
            for (c, channel) in px.iter_mut().take(3).enumerate() {
                *channel = kernel(&snapshot, x, y, c).round().clamp(0.0, 255.0) as u8;
            }
            buffer.set_pixel(x, y, px);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse() -> PixelBuffer {
        let mut buf = PixelBuffer::filled(5, 5, [0, 0, 0, 255]);
        buf.set_pixel(2, 2, [160, 160, 160, 255]);
        buf
    }

    #[test]
    fn test_zero_amount_is_noop() {
        let mut buf = impulse();
        denoise(&mut buf, 0.0);
        sharpen(&mut buf, 0.0);
        assert_eq!(buf, impulse());
    }

    #[test]
    fn test_flat_image_is_unchanged() {
        let flat = PixelBuffer::filled(6, 4, [90, 120, 30, 200]);
        let mut buf = flat.clone();
        denoise(&mut buf, 1.0);
        assert_eq!(buf, flat);
        sharpen(&mut buf, 1.0);
        assert_eq!(buf, flat);
    }

    #[test]
    fn test_full_denoise_spreads_impulse_with_kernel_weights() {
        let mut buf = impulse();
        denoise(&mut buf, 1.0);
        assert_eq!(buf.pixel(2, 2)[0], 40);
        assert_eq!(buf.pixel(1, 2)[0], 20);
        assert_eq!(buf.pixel(1, 1)[0], 10);
        // Borders are never written.
        assert_eq!(buf.pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_half_denoise_blends() {
        let mut buf = impulse();
        denoise(&mut buf, 0.5);
        assert_eq!(buf.pixel(2, 2)[0], 100);
    }

    #[test]
    fn test_sharpen_boosts_centre_and_darkens_neighbours() {
        let mut buf = PixelBuffer::filled(5, 5, [100, 100, 100, 255]);
        buf.set_pixel(2, 2, [150, 150, 150, 255]);
        sharpen(&mut buf, 0.5);
        // 3 × 150 − 0.5 × 400
        assert_eq!(buf.pixel(2, 2)[0], 250);
        // 3 × 100 − 0.5 × 450
        assert_eq!(buf.pixel(2, 1)[0], 75);
        assert_eq!(buf.pixel(2, 2)[3], 255);
    }

    #[test]
    fn test_reads_snapshot_not_partial_output() {
        // A left-to-right in-place pass would see its own writes; the
        // symmetric impulse must stay symmetric.
        let mut buf = impulse();
        sharpen(&mut buf, 1.0);
        assert_eq!(buf.pixel(1, 2), buf.pixel(3, 2));
        assert_eq!(buf.pixel(2, 1), buf.pixel(2, 3));
    }

    #[test]
    fn test_tiny_images_are_left_alone() {
        let src = PixelBuffer::from_fn(2, 7, |x, y| [x as u8 * 90, y as u8 * 30, 5, 255]);
        let mut buf = src.clone();
        sharpen(&mut buf, 1.0);
        denoise(&mut buf, 1.0);
        assert_eq!(buf, src);
    }
}
