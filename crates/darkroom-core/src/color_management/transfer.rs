//! sRGB transfer function (OETF/EOTF).
//!
//! The colour-transfer path works in linear light: source and target pixels
//! are decoded before bucketing/sampling and the result is re-encoded.

use std::sync::LazyLock;

/// sRGB transfer function per IEC 61966-2-1.
///
/// ```text
/// decode: V <= 0.04045   → V / 12.92
///         V >  0.04045   → ((V + 0.055) / 1.055) ^ 2.4
///
/// encode: L <= 0.0031308 → L × 12.92
///         L >  0.0031308 → 1.055 × L^(1/2.4) − 0.055
/// ```
fn decode(encoded: f64) -> f64 {
    if encoded <= 0.04045 {
        encoded / 12.92
    } else {
        ((encoded + 0.055) / 1.055).powf(2.4)
    }
}

fn encode(linear: f64) -> f64 {
    if linear <= 0.0031308 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

/// Decode a non-linear `[0, 1]` value to linear light.
#[inline]
pub fn srgb_to_linear(encoded: f32) -> f32 {
    decode(encoded as f64) as f32
}

/// Encode linear light to a non-linear `[0, 1]` value.
#[inline]
pub fn linear_to_srgb(linear: f32) -> f32 {
    encode(linear as f64) as f32
}

// f64 so that code 255 decodes to exactly 1.0.
static SRGB_DECODE: LazyLock<[f32; 256]> = LazyLock::new(|| {
    let mut table = [0.0_f32; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = decode(i as f64 / 255.0) as f32;
    }
    table
});

/// Linear value of an 8-bit sRGB code.
#[inline]
pub fn srgb_u8_to_linear(code: u8) -> f32 {
    SRGB_DECODE[code as usize]
}

/// Encode a linear value to an 8-bit sRGB code, clamping out-of-range input.
#[inline]
pub fn linear_to_srgb_u8(linear: f32) -> u8 {
    let encoded = linear_to_srgb(linear.clamp(0.0, 1.0));
    (encoded * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Encode a linear value to the sRGB 0..255 scale without rounding.
#[inline]
pub fn linear_to_srgb_level(linear: f32) -> f32 {
    linear_to_srgb(linear.clamp(0.0, 1.0)) * 255.0
}
