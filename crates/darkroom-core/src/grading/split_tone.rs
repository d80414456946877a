//! Shadow / midtone / highlight split toning.
//!
//! Lightness is partitioned around a pivot set by `balance`:
//! ```text
//! center = clamp(0.5 + balance/100 × 0.25, 0.2, 0.8)
//!
//! L < center:  t = L / center            wS = 1 − t, wM = t,     wH = 0
//! L ≥ center:  t = (L − center)/(1 − c)  wS = 0,     wM = 1 − t, wH = t
//! ```
//! Each tone colour with `s > 0` contributes
//! `(round(hsl_to_rgb(h, s, 50)) − 128) × w × s/100` to every channel.
//! Weights at or below 0.001 are ignored.

use crate::color_management::hsl::hsl_to_rgb;
use crate::transform::params::{ColorGrading, HslAdjust};

const MIN_WEIGHT: f32 = 0.001;

/// Weights of the three tonal ranges for one lightness value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToneWeights {
    pub shadows: f32,
    pub midtones: f32,
    pub highlights: f32,
}

/// Pivot in normalized lightness for a balance in `[-100, 100]`.
pub fn pivot(balance: f32) -> f32 {
    let balance = balance.clamp(-100.0, 100.0) / 100.0;
    (0.5 + balance * 0.25).clamp(0.2, 0.8)
}

/// Piecewise-linear weights for lightness `l` in `[0, 1]`.
pub fn tone_weights(center: f32, l: f32) -> ToneWeights {
    if l < center {
        let t = l / center.max(MIN_WEIGHT);
        ToneWeights {
            shadows: 1.0 - t,
            midtones: t,
            highlights: 0.0,
        }
    } else {
        let t = (l - center) / (1.0 - center).max(MIN_WEIGHT);
        ToneWeights {
            shadows: 0.0,
            midtones: 1.0 - t,
            highlights: t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tint {
    base: [f32; 3],
    strength: f32,
}

impl Tint {
    fn from_tone(tone: &HslAdjust) -> Option<Self> {
        if tone.s <= 0.0 {
            return None;
        }
        let rgb = hsl_to_rgb(tone.h, tone.s, 50.0);
        Some(Self {
            base: rgb.map(|c| c.round() - 128.0),
            strength: tone.s / 100.0,
        })
    }
}

/// Split-tone grading with the tint colours resolved once per frame.
///
/// `blending` is carried in [`ColorGrading`] but not read here: the
/// transition shape is fixed and only `balance` moves it.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitTone {
    center: f32,
    shadows: Option<Tint>,
    midtones: Option<Tint>,
    highlights: Option<Tint>,
}

impl SplitTone {
    pub fn new(grading: &ColorGrading) -> Self {
        Self {
            center: pivot(grading.balance),
            shadows: Tint::from_tone(&grading.shadows),
            midtones: Tint::from_tone(&grading.midtones),
            highlights: Tint::from_tone(&grading.highlights),
        }
    }

    /// No tone colour has positive saturation.
    pub fn is_neutral(&self) -> bool {
        self.shadows.is_none() && self.midtones.is_none() && self.highlights.is_none()
    }

    pub fn center(&self) -> f32 {
        self.center
    }

    /// Channel offsets for a pixel with HSL lightness `lightness` (`0..100`).
    pub fn offset(&self, lightness: f32) -> [f32; 3] {
        let l = lightness.clamp(0.0, 100.0) / 100.0;
        let w = tone_weights(self.center, l);

        let mut out = [0.0_f32; 3];
        for (tint, weight) in [
            (&self.shadows, w.shadows),
            (&self.midtones, w.midtones),
            (&self.highlights, w.highlights),
        ] {
            let Some(tint) = tint else { continue };
            if weight <= MIN_WEIGHT {
                continue;
            }
            let k = weight * tint.strength;
            for c in 0..3 {
                out[c] += tint.base[c] * k;
            }
        }
        out
    }

    /// Add the split-tone offset for `lightness` to `rgb`.
    pub fn apply(&self, rgb: [f32; 3], lightness: f32) -> [f32; 3] {
        let offset = self.offset(lightness);
        [rgb[0] + offset[0], rgb[1] + offset[1], rgb[2] + offset[2]]
    }
}
