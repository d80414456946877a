//! Eight-band HSL colour mixer.
//!
//! Each band has a fixed hue centre and half-width. A pixel's membership in
//! a band is a raised cosine of its angular distance to the centre:
//! ```text
//! d = min(|h − centre|, 360 − |h − centre|)
//! w = (cos(π·d / width) + 1) / 2     for d < width, else 0
//! ```
//! Band deltas are summed weighted, not averaged, so overlapping bands add.

use std::f32::consts::PI;

use crate::transform::params::ColorMixer;

/// A hue region of the colour wheel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueBand {
    pub name: &'static str,
    /// Centre hue in degrees.
    pub center: f32,
    /// Half-width in degrees; weight reaches 0 here.
    pub width: f32,
}

impl HueBand {
    const fn new(name: &'static str, center: f32, width: f32) -> Self {
        Self {
            name,
            center,
            width,
        }
    }

    /// Raised-cosine weight in `[0, 1]` for `hue` degrees.
    pub fn weight(&self, hue: f32) -> f32 {
        let mut diff = (hue - self.center).abs() % 360.0;
        if diff > 180.0 {
            diff = 360.0 - diff;
        }
        if diff >= self.width {
            return 0.0;
        }
        (((PI * diff / self.width).cos() + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Bands in the same order as [`ColorMixer::bands`].
pub const HUE_BANDS: [HueBand; 8] = [
    HueBand::new("red", 0.0, 25.0),
    HueBand::new("orange", 30.0, 25.0),
    HueBand::new("yellow", 60.0, 25.0),
    HueBand::new("green", 105.0, 35.0),
    HueBand::new("aqua", 150.0, 30.0),
    HueBand::new("blue", 210.0, 40.0),
    HueBand::new("purple", 270.0, 35.0),
    HueBand::new("magenta", 300.0, 35.0),
];

/// Weighted sum of band deltas for one hue.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MixerDelta {
    pub h: f32,
    pub s: f32,
    pub l: f32,
    pub total_weight: f32,
}

/// Accumulate the deltas of every band containing `hue`.
pub fn mixer_delta(mixer: &ColorMixer, hue: f32) -> MixerDelta {
    let mut delta = MixerDelta::default();
    for (band, adj) in HUE_BANDS.iter().zip(mixer.bands()) {
        let w = band.weight(hue);
        if w > 0.0 {
            delta.h += adj.h * w;
            delta.s += adj.s * w;
            delta.l += adj.l * w;
            delta.total_weight += w;
        }
    }
    delta
}

/// Apply the mixer to an HSL triple. Unchanged when no band covers `h`.
pub fn apply_mixer(mixer: &ColorMixer, (h, s, l): (f32, f32, f32)) -> (f32, f32, f32) {
    let delta = mixer_delta(mixer, h);
    if delta.total_weight <= 0.0 {
        return (h, s, l);
    }
    (
        (h + delta.h).rem_euclid(360.0),
        (s + delta.s).clamp(0.0, 100.0),
        (l + delta.l).clamp(0.0, 100.0),
    )
}
