//! Black-and-white conversion.
//!
//! Per pixel: luma (Rec. 709 or a plain average) is mixed with the colour
//! by `intensity`, then contrast and brightness are applied around mid-gray,
//! then a shared grain offset. Alpha passes through.

use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::grading::sliders::contrast_factor;
use crate::image::PixelBuffer;
use crate::transform::evaluate::store_channel;

/// Rec. 709 luma weights.
pub const LUMA_REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Grain slider units to peak-to-peak noise on the `0..255` scale.
const GRAIN_SCALE: f32 = 0.6;

/// Controls for the mono converter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonoParams {
    /// Mix toward gray, `[0, 100]`.
    pub intensity: f32,
    /// `[-40, 40]`.
    pub contrast: f32,
    /// Added after contrast, `[-30, 30]`.
    pub brightness: f32,
    /// `[0, 30]`.
    pub grain: f32,
    /// Rec. 709 luma when set, otherwise the channel average.
    pub weighted: bool,
}

impl Default for MonoParams {
    fn default() -> Self {
        Self {
            intensity: 100.0,
            contrast: 8.0,
            brightness: 4.0,
            grain: 6.0,
            weighted: true,
        }
    }
}

impl MonoParams {
    /// Parse a (possibly partial) JSON document.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy with every control clamped into its slider range.
    pub fn clamped(&self) -> Self {
        Self {
            intensity: self.intensity.clamp(0.0, 100.0),
            contrast: self.contrast.clamp(-40.0, 40.0),
            brightness: self.brightness.clamp(-30.0, 30.0),
            grain: self.grain.clamp(0.0, 30.0),
            weighted: self.weighted,
        }
    }
}

/// Named starting points. Applying one keeps the luma weighting choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonoPreset {
    Soft,
    Noir,
    Clean,
    High,
    Low,
    Steel,
    Silk,
}

impl MonoPreset {
    pub const ALL: [MonoPreset; 7] = [
        MonoPreset::Soft,
        MonoPreset::Noir,
        MonoPreset::Clean,
        MonoPreset::High,
        MonoPreset::Low,
        MonoPreset::Steel,
        MonoPreset::Silk,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Soft => "Soft Matte",
            Self::Noir => "Noir Punch",
            Self::Clean => "Clean Neutral",
            Self::High => "High Key",
            Self::Low => "Low Key",
            Self::Steel => "Steel Grain",
            Self::Silk => "Silk Fade",
        }
    }

    /// `(intensity, contrast, brightness, grain)`.
    fn controls(self) -> (f32, f32, f32, f32) {
        match self {
            Self::Soft => (100.0, -6.0, 8.0, 10.0),
            Self::Noir => (100.0, 25.0, -6.0, 14.0),
            Self::Clean => (90.0, 6.0, 2.0, 0.0),
            Self::High => (100.0, 12.0, 16.0, 4.0),
            Self::Low => (100.0, 18.0, -14.0, 12.0),
            Self::Steel => (100.0, 10.0, 0.0, 22.0),
            Self::Silk => (85.0, -10.0, 10.0, 2.0),
        }
    }

    pub fn apply_to(self, current: &MonoParams) -> MonoParams {
        let (intensity, contrast, brightness, grain) = self.controls();
        MonoParams {
            intensity,
            contrast,
            brightness,
            grain,
            weighted: current.weighted,
        }
    }
}

/// Gray level of `rgb` on the `0..255` scale.
#[inline]
pub fn mono_luma(rgb: [f32; 3], weighted: bool) -> f32 {
    if weighted {
        LUMA_REC709[0] * rgb[0] + LUMA_REC709[1] * rgb[1] + LUMA_REC709[2] * rgb[2]
    } else {
        (rgb[0] + rgb[1] + rgb[2]) / 3.0
    }
}

/// Resolved per-frame constants.
#[derive(Debug, Clone, Copy)]
struct MonoProgram {
    strength: f32,
    factor: f32,
    brightness: f32,
    grain: f32,
    weighted: bool,
}

impl MonoProgram {
    fn new(params: &MonoParams) -> Self {
        Self {
            strength: (params.intensity / 100.0).clamp(0.0, 1.0),
            factor: contrast_factor(params.contrast),
            brightness: params.brightness,
            grain: params.grain.max(0.0) * GRAIN_SCALE,
            weighted: params.weighted,
        }
    }

    fn convert(&self, px: [u8; 4], noise: f32) -> [u8; 4] {
        let rgb = [px[0] as f32, px[1] as f32, px[2] as f32];
        let lum = mono_luma(rgb, self.weighted);
        let offset = if self.grain > 0.0 {
            (noise - 0.5) * self.grain
        } else {
            0.0
        };
        let keep = 1.0 - self.strength;
        let out = rgb.map(|c| {
            let mixed = c * keep + lum * self.strength;
            self.factor * (mixed - 128.0) + 128.0 + self.brightness + offset
        });
        [
            store_channel(out[0]),
            store_channel(out[1]),
            store_channel(out[2]),
            px[3],
        ]
    }
}

/// Convert a copy of `src` with the thread-local RNG for grain.
pub fn apply_mono(src: &PixelBuffer, params: &MonoParams) -> PixelBuffer {
    apply_mono_with_rng(src, params, &mut rand::rng())
}

pub fn apply_mono_with_rng<R: Rng>(src: &PixelBuffer, params: &MonoParams, rng: &mut R) -> PixelBuffer {
    let mut out = src.clone();
    mono_in_place(&mut out, params, rng);
    out
}

/// Convert `buffer` in place. `rng` is only read when grain is on.
pub fn mono_in_place<R: Rng>(buffer: &mut PixelBuffer, params: &MonoParams, rng: &mut R) {
    let started = Instant::now();
    let program = MonoProgram::new(params);
    let grain = program.grain > 0.0;
    for px in buffer.pixels_mut() {
        let noise = if grain { rng.random::<f32>() } else { 0.0 };
        *px = program.convert(*px, noise);
    }
    debug!(
        width = buffer.width(),
        height = buffer.height(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "mono conversion applied"
    );
}
