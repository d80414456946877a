//! Core per-pixel evaluation: applies the full tone/colour chain to one pixel.
//!
//! Stage order is fixed:
//! 1. Exposure
//! 2. Contrast
//! 3. Highlights / shadows
//! 4. Whites / blacks
//! 5. Clamp, R/G/B curves, master curve
//! 6. Colour mixer (HSL) and split toning
//! 7. Saturation (with dehaze's chroma share)
//! 8. Dehaze contrast push
//! 9. Vignette
//! 10. Grain
//!
//! The caller rounds and clamps the result when storing it.

use crate::color_management::hsl::{hsl_to_rgb, lightness, rgb_to_hsl};
use crate::grading::curves::ToneCurveLut;
use crate::grading::mixer::apply_mixer;
use crate::grading::sliders::{
    apply_contrast, apply_dehaze, apply_saturation, contrast_factor, exposure_factor, luma,
    saturation_factor, shadows_highlights_boost, whites_blacks_offset,
};
use crate::grading::split_tone::SplitTone;
use crate::transform::params::{ColorMixer, EditParams};

/// Everything the per-pixel pass needs, resolved once per frame.
#[derive(Debug, Clone)]
pub struct FilterProgram {
    exposure: f32,
    contrast: f32,
    shadows: f32,
    highlights: f32,
    whites: f32,
    blacks: f32,
    curve_master: ToneCurveLut,
    curve_red: ToneCurveLut,
    curve_green: ToneCurveLut,
    curve_blue: ToneCurveLut,
    mixer: Option<ColorMixer>,
    split_tone: SplitTone,
    saturation: f32,
    dehaze: f32,
    vignette: f32,
    grain: f32,
    center: [f32; 2],
    max_dist: f32,
}

impl FilterProgram {
    /// Resolve `params` for a `width × height` working buffer.
    pub fn new(params: &EditParams, width: u32, height: u32) -> Self {
        let light = &params.light;
        let color = &params.color;
        let effects = &params.effects;
        let curves = &params.curves;

        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;

        Self {
            exposure: exposure_factor(light.exposure),
            contrast: contrast_factor(light.contrast),
            shadows: light.shadows,
            highlights: light.highlights,
            whites: light.whites,
            blacks: light.blacks,
            curve_master: ToneCurveLut::from_points(&curves.master),
            curve_red: ToneCurveLut::from_points(&curves.red),
            curve_green: ToneCurveLut::from_points(&curves.green),
            curve_blue: ToneCurveLut::from_points(&curves.blue),
            mixer: (!color.mixer.is_neutral()).then(|| color.mixer.clone()),
            split_tone: SplitTone::new(&color.grading),
            saturation: color.saturation,
            dehaze: effects.dehaze,
            vignette: effects.vignette / 100.0,
            grain: effects.grain,
            center: [cx, cy],
            max_dist: (cx * cx + cy * cy).sqrt(),
        }
    }

    /// Whether the grain stage draws random numbers.
    pub fn uses_grain(&self) -> bool {
        self.grain > 0.0
    }

    /// Run the per-pixel chain on `rgb` at integer position `(x, y)`.
    ///
    /// `noise` is a uniform sample in `[0, 1)`; it is only read when grain
    /// is enabled.
    pub fn evaluate(&self, rgb: [f32; 3], x: u32, y: u32, noise: f32) -> [f32; 3] {
        // Light.
        let mut rgb = rgb.map(|c| c * self.exposure);
        rgb = apply_contrast(rgb, self.contrast);
        let l = luma(rgb);
        let boost = shadows_highlights_boost(l, self.shadows, self.highlights);
        let lift = whites_blacks_offset(l, self.whites, self.blacks);
        rgb = rgb.map(|c| c + boost + lift);

        // Curves.
        rgb = rgb.map(|c| c.clamp(0.0, 255.0));
        rgb = [
            self.curve_red.apply_f32(rgb[0]),
            self.curve_green.apply_f32(rgb[1]),
            self.curve_blue.apply_f32(rgb[2]),
        ];
        rgb = rgb.map(|c| self.curve_master.apply_f32(c));

        // Colour.
        rgb = self.apply_hsl(rgb);
        if self.saturation != 0.0 || self.dehaze != 0.0 {
            rgb = apply_saturation(rgb, saturation_factor(self.saturation, self.dehaze));
        }

        // Effects.
        if self.dehaze != 0.0 {
            rgb = apply_dehaze(rgb, self.dehaze);
        }
        if self.vignette != 0.0 {
            rgb = self.apply_vignette(rgb, x, y);
        }
        if self.grain > 0.0 {
            let offset = (noise - 0.5) * self.grain;
            rgb = rgb.map(|c| c + offset);
        }
        rgb
    }

    fn apply_hsl(&self, rgb: [f32; 3]) -> [f32; 3] {
        if self.mixer.is_none() && self.split_tone.is_neutral() {
            return rgb;
        }

        let (mut out, lum) = match &self.mixer {
            Some(mixer) => {
                let hsl = rgb_to_hsl(rgb);
                let mixed = apply_mixer(mixer, hsl);
                if mixed == hsl {
                    (rgb, hsl.2)
                } else {
                    (hsl_to_rgb(mixed.0, mixed.1, mixed.2), mixed.2)
                }
            }
            None => (rgb, lightness(rgb)),
        };

        if !self.split_tone.is_neutral() {
            out = self.split_tone.apply(out, lum);
        }
        out
    }

    fn apply_vignette(&self, rgb: [f32; 3], x: u32, y: u32) -> [f32; 3] {
        let dx = x as f32 - self.center[0];
        let dy = y as f32 - self.center[1];
        let d = if self.max_dist > 0.0 {
            (dx * dx + dy * dy).sqrt() / self.max_dist
        } else {
            0.0
        };
        let v = self.vignette;
        if v < 0.0 {
            let falloff = 1.0 + v * d * d * d;
            rgb.map(|c| c * falloff)
        } else {
            let falloff = v * d * d;
            rgb.map(|c| c + (255.0 - c) * falloff)
        }
    }
}

/// Round and clamp a stage result to a stored channel value.
#[inline]
pub fn store_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Evaluate one RGBA pixel; alpha passes through.
pub fn evaluate_pixel(program: &FilterProgram, px: [u8; 4], x: u32, y: u32, noise: f32) -> [u8; 4] {
    let rgb = [px[0] as f32, px[1] as f32, px[2] as f32];
    let out = program.evaluate(rgb, x, y, noise);
    [
        store_channel(out[0]),
        store_channel(out[1]),
        store_channel(out[2]),
        px[3],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::params::{CurvePoint, HslAdjust};

    fn eval(params: &EditParams, px: [u8; 4]) -> [u8; 4] {
        let program = FilterProgram::new(params, 1, 1);
        evaluate_pixel(&program, px, 0, 0, 0.5)
    }

    #[test]
    fn test_defaults_are_identity_for_every_level() {
        let program = FilterProgram::new(&EditParams::default(), 1, 1);
        for v in 0..=255u8 {
            let px = [v, 255 - v, v / 2, 77];
            assert_eq!(evaluate_pixel(&program, px, 0, 0, 0.0), px);
        }
    }

    #[test]
    fn test_mid_gray_survives_default_pipeline() {
        assert_eq!(eval(&EditParams::default(), [128, 128, 128, 255]), [128, 128, 128, 255]);
    }

    #[test]
    fn test_exposure_one_stop() {
        let mut params = EditParams::default();
        params.light.exposure = 1.0;
        assert_eq!(eval(&params, [50, 100, 200, 255]), [100, 200, 255, 255]);
    }

    #[test]
    fn test_alpha_passes_through() {
        let mut params = EditParams::default();
        params.light.contrast = 60.0;
        params.color.saturation = 40.0;
        assert_eq!(eval(&params, [10, 200, 90, 33])[3], 33);
    }

    #[test]
    fn test_master_curve_applies_after_channel_curves() {
        let mut params = EditParams::default();
        // Red curve maps everything to 0.4, master inverts.
        params.curves.red = vec![CurvePoint::new(0.0, 0.4), CurvePoint::new(1.0, 0.4)];
        params.curves.master = vec![CurvePoint::new(0.0, 1.0), CurvePoint::new(1.0, 0.0)];
        let out = eval(&params, [0, 0, 255, 255]);
        assert_eq!(out, [153, 255, 0, 255]);
    }

    #[test]
    fn test_saturation_minus_100_is_gray() {
        let mut params = EditParams::default();
        params.color.saturation = -100.0;
        let out = eval(&params, [220, 40, 90, 255]);
        assert!(out[0].abs_diff(out[1]) <= 1 && out[1].abs_diff(out[2]) <= 1);
    }

    #[test]
    fn test_mixer_desaturates_only_its_band() {
        let mut params = EditParams::default();
        params.color.mixer.blue = HslAdjust::new(0.0, -100.0, 0.0);
        // Hue 210°, the blue band centre.
        let blue = eval(&params, [30, 125, 220, 255]);
        assert_eq!(blue[0], blue[1]);
        assert_eq!(blue[1], blue[2]);
        let red = eval(&params, [220, 30, 30, 255]);
        assert_eq!(red, [220, 30, 30, 255]);
    }

    #[test]
    fn test_split_tone_warms_shadows() {
        let mut params = EditParams::default();
        params.color.grading.shadows = HslAdjust::new(30.0, 80.0, 0.0);
        let out = eval(&params, [40, 40, 40, 255]);
        assert!(out[0] > 40 && out[2] < 40, "{out:?}");
    }

    #[test]
    fn test_vignette_darkens_corners_not_centre() {
        let mut params = EditParams::default();
        params.effects.vignette = -100.0;
        let program = FilterProgram::new(&params, 10, 10);
        let corner = evaluate_pixel(&program, [200, 200, 200, 255], 0, 0, 0.5);
        let centre = evaluate_pixel(&program, [200, 200, 200, 255], 5, 5, 0.5);
        assert_eq!(centre, [200, 200, 200, 255]);
        assert!(corner[0] < 10, "{corner:?}");
    }

    #[test]
    fn test_positive_vignette_lightens_corners() {
        let mut params = EditParams::default();
        params.effects.vignette = 50.0;
        let program = FilterProgram::new(&params, 10, 10);
        let corner = evaluate_pixel(&program, [100, 100, 100, 255], 0, 0, 0.5);
        // d = 1 at the corner: 100 + 155 × 0.5.
        assert_eq!(corner, [178, 178, 178, 255]);
    }

    #[test]
    fn test_grain_offset_is_shared_across_channels() {
        let mut params = EditParams::default();
        params.effects.grain = 40.0;
        let program = FilterProgram::new(&params, 1, 1);
        assert!(program.uses_grain());
        let out = evaluate_pixel(&program, [100, 120, 140, 255], 0, 0, 1.0);
        assert_eq!(out, [120, 140, 160, 255]);
        let out = evaluate_pixel(&program, [100, 120, 140, 255], 0, 0, 0.5);
        assert_eq!(out, [100, 120, 140, 255]);
    }
}
