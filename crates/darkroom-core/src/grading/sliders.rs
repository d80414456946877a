//! Slider adjustments on the `0..255` scale: light, saturation, dehaze.
//!
//! These are the per-pixel building blocks of the filter pipeline. None of
//! them clamp; the pipeline clamps at the points where it indexes tables
//! and at the final store.

/// Rec. 601 luma weights.
pub const LUMA_REC601: [f32; 3] = [0.299, 0.587, 0.114];

/// Rec. 601 luma of an RGB triple.
#[inline]
pub fn luma(rgb: [f32; 3]) -> f32 {
    LUMA_REC601[0] * rgb[0] + LUMA_REC601[1] * rgb[1] + LUMA_REC601[2] * rgb[2]
}

/// Exposure multiplier, `2^stops`.
pub fn exposure_factor(stops: f32) -> f32 {
    stops.exp2()
}

/// Classic contrast factor for `contrast` in `[-100, 100]`.
///
/// ```text
/// f = 259·(c + 255) / (255·(259 − c))
/// ```
/// `c = 0` gives exactly `1.0`.
pub fn contrast_factor(contrast: f32) -> f32 {
    (259.0 * (contrast + 255.0)) / (255.0 * (259.0 - contrast))
}

/// Scale every channel around mid-gray: `f·(x − 128) + 128`.
#[inline]
pub fn apply_contrast(rgb: [f32; 3], factor: f32) -> [f32; 3] {
    rgb.map(|c| factor * (c - 128.0) + 128.0)
}

/// Uniform lift for the shadows/highlights sliders given the pixel luma.
///
/// ```text
/// luma < 128:  (1 − luma/128)       × shadows/100    × 50
/// otherwise:   ((luma − 128) / 127) × highlights/100 × 50
/// ```
pub fn shadows_highlights_boost(luma: f32, shadows: f32, highlights: f32) -> f32 {
    if luma < 128.0 {
        (1.0 - luma / 128.0) * (shadows / 100.0) * 50.0
    } else {
        ((luma - 128.0) / 127.0) * (highlights / 100.0) * 50.0
    }
}

/// Uniform lift for the whites/blacks sliders.
///
/// ```text
/// whites × luma/255 + blacks × (1 − luma/255)
/// ```
pub fn whites_blacks_offset(luma: f32, whites: f32, blacks: f32) -> f32 {
    let t = luma / 255.0;
    whites * t + blacks * (1.0 - t)
}

/// Scale chroma around luma: `luma + (x − luma)·factor`.
pub fn apply_saturation(rgb: [f32; 3], factor: f32) -> [f32; 3] {
    let l = luma(rgb);
    rgb.map(|c| l + (c - l) * factor)
}

/// Chroma factor for the saturation slider combined with dehaze.
///
/// ```text
/// 1 + saturation/100 + 0.3 × dehaze/100
/// ```
pub fn saturation_factor(saturation: f32, dehaze: f32) -> f32 {
    1.0 + saturation / 100.0 + (dehaze / 100.0) * 0.3
}

/// Dehaze contrast push: every channel moves by `(luma − 128)·d·0.5`
/// where `d = dehaze/100`.
pub fn apply_dehaze(rgb: [f32; 3], dehaze: f32) -> [f32; 3] {
    let push = (luma(rgb) - 128.0) * (dehaze / 100.0) * 0.5;
    rgb.map(|c| c + push)
}
