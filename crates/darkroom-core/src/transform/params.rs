//! Central parameter struct that defines the entire edit.
//!
//! `EditParams` is the single source of truth for an edit session. Every
//! control writes here; the geometry stage and filter pipeline read it.
//! It is plain data: cloned into jobs, serialized into presets and
//! parameter files, never shared mutably across threads.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Current parameter document version.
pub const PARAMS_VERSION: u32 = 1;

/// Quarter-turn rotation applied by the geometry stage.
///
/// Serialized as the number of degrees; any other integer fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub const fn degrees(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Cw90 => 90,
            Self::Cw180 => 180,
            Self::Cw270 => 270,
        }
    }

    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Cw90 => 1,
            Self::Cw180 => 2,
            Self::Cw270 => 3,
        }
    }

    /// Odd quarter turns swap the output width and height.
    pub const fn swaps_dimensions(self) -> bool {
        self.quarter_turns() % 2 == 1
    }

    /// The next rotation clockwise, wrapping after 270.
    pub const fn rotated_cw(self) -> Self {
        match self {
            Self::None => Self::Cw90,
            Self::Cw90 => Self::Cw180,
            Self::Cw180 => Self::Cw270,
            Self::Cw270 => Self::None,
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = CoreError;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Self::None),
            90 => Ok(Self::Cw90),
            180 => Ok(Self::Cw180),
            270 => Ok(Self::Cw270),
            other => Err(CoreError::InvalidRotation(other)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Crop rectangle in normalized `[0, 1]` source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    #[serde(alias = "width")]
    pub w: f32,
    #[serde(alias = "height")]
    pub h: f32,
}

impl NormalizedRect {
    /// The whole frame.
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Clamp into the unit square.
    ///
    /// Returns `None` for a zero-area rectangle and for the full frame,
    /// both of which mean "no crop".
    pub fn normalized(&self) -> Option<Self> {
        let x = unit(self.x);
        let y = unit(self.y);
        let w = unit(self.w).min(1.0 - x);
        let h = unit(self.h).min(1.0 - y);
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        let rect = Self { x, y, w, h };
        if rect == Self::FULL {
            return None;
        }
        Some(rect)
    }
}

fn unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

/// Crop, quarter-turn rotation, straighten angle and flips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParams {
    pub rotate: Rotation,
    pub flip_h: bool,
    pub flip_v: bool,
    /// Fine rotation in degrees, `[-45, 45]`.
    pub straighten: f32,
    pub crop: Option<NormalizedRect>,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            rotate: Rotation::None,
            flip_h: false,
            flip_v: false,
            straighten: 0.0,
            crop: None,
        }
    }
}

impl GeometryParams {
    /// True when the geometry stage would return its input unchanged.
    pub fn is_identity(&self) -> bool {
        self.rotate == Rotation::None
            && !self.flip_h
            && !self.flip_v
            && self.straighten == 0.0
            && self.crop.and_then(|c| c.normalized()).is_none()
    }
}

/// Exposure and tonal range sliders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightParams {
    /// Stops, `[-5, 5]`.
    pub exposure: f32,
    pub contrast: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,
}

/// Hue, saturation and lightness offsets.
///
/// In the colour mixer all three are deltas in `[-100, 100]`. In the
/// split-tone grading colours `h` is an absolute hue in `[0, 360]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HslAdjust {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl HslAdjust {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    pub fn is_zero(&self) -> bool {
        self.h == 0.0 && self.s == 0.0 && self.l == 0.0
    }
}

/// Per-hue-band adjustments for the eight mixer bands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorMixer {
    pub red: HslAdjust,
    pub orange: HslAdjust,
    pub yellow: HslAdjust,
    pub green: HslAdjust,
    pub aqua: HslAdjust,
    pub blue: HslAdjust,
    pub purple: HslAdjust,
    pub magenta: HslAdjust,
}

impl ColorMixer {
    /// Adjustments in band order: red, orange, yellow, green, aqua, blue,
    /// purple, magenta.
    pub fn bands(&self) -> [&HslAdjust; 8] {
        [
            &self.red,
            &self.orange,
            &self.yellow,
            &self.green,
            &self.aqua,
            &self.blue,
            &self.purple,
            &self.magenta,
        ]
    }

    pub fn is_neutral(&self) -> bool {
        self.bands().iter().all(|b| b.is_zero())
    }
}

/// Shadow/midtone/highlight split toning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorGrading {
    pub shadows: HslAdjust,
    pub midtones: HslAdjust,
    pub highlights: HslAdjust,
    /// `[0, 100]`. Persisted, not read by the weight function.
    pub blending: f32,
    /// `[-100, 100]`, shifts the shadow/highlight pivot.
    pub balance: f32,
}

impl Default for ColorGrading {
    fn default() -> Self {
        Self {
            shadows: HslAdjust::default(),
            midtones: HslAdjust::default(),
            highlights: HslAdjust::default(),
            blending: 50.0,
            balance: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorParams {
    pub temperature: f32,
    pub tint: f32,
    pub saturation: f32,
    pub mixer: ColorMixer,
    pub grading: ColorGrading,
}

/// A tone curve control point in `[0, 1]²`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
}

impl CurvePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The identity curve: the two endpoints.
pub fn identity_curve() -> Vec<CurvePoint> {
    vec![CurvePoint::new(0.0, 0.0), CurvePoint::new(1.0, 1.0)]
}

/// Sort by x and synthesize the `(0,0)` / `(1,1)` endpoints when missing.
pub fn normalize_curve(points: &[CurvePoint]) -> Vec<CurvePoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
    if sorted.first().is_none_or(|p| p.x > 0.0) {
        sorted.insert(0, CurvePoint::new(0.0, 0.0));
    }
    if sorted.last().is_none_or(|p| p.x < 1.0) {
        sorted.push(CurvePoint::new(1.0, 1.0));
    }
    sorted
}

/// Master and per-channel tone curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveParams {
    pub master: Vec<CurvePoint>,
    pub red: Vec<CurvePoint>,
    pub green: Vec<CurvePoint>,
    pub blue: Vec<CurvePoint>,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            master: identity_curve(),
            red: identity_curve(),
            green: identity_curve(),
            blue: identity_curve(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsParams {
    pub texture: f32,
    pub clarity: f32,
    pub dehaze: f32,
    pub vignette: f32,
    /// `[0, 100]`.
    pub grain: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailParams {
    /// `[0, 100]`.
    pub sharpen: f32,
    /// Denoise strength, `[0, 100]`.
    pub noise: f32,
}

/// One resettable group of controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Geometry,
    Light,
    Color,
    Curves,
    Effects,
    Detail,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Geometry,
        Section::Light,
        Section::Color,
        Section::Curves,
        Section::Effects,
        Section::Detail,
    ];
}

/// The complete, versioned edit state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditParams {
    pub version: u32,
    pub geometry: GeometryParams,
    pub light: LightParams,
    pub color: ColorParams,
    pub curves: CurveParams,
    pub effects: EffectsParams,
    pub detail: DetailParams,
}

impl Default for EditParams {
    fn default() -> Self {
        Self {
            version: PARAMS_VERSION,
            geometry: GeometryParams::default(),
            light: LightParams::default(),
            color: ColorParams::default(),
            curves: CurveParams::default(),
            effects: EffectsParams::default(),
            detail: DetailParams::default(),
        }
    }
}

impl EditParams {
    /// Parse a (possibly partial) JSON parameter document.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether switching from `self` to `other` needs a new working buffer.
    pub fn geometry_changed(&self, other: &EditParams) -> bool {
        self.geometry != other.geometry
    }

    /// Copy with geometry cleared, as stored in a preset.
    pub fn style_only(&self) -> EditParams {
        EditParams {
            geometry: GeometryParams::default(),
            ..self.clone()
        }
    }

    /// Apply a preset: keep this edit's geometry, take everything else
    /// from `preset`.
    pub fn with_style_from(&self, preset: &EditParams) -> EditParams {
        EditParams {
            version: PARAMS_VERSION,
            geometry: self.geometry.clone(),
            ..preset.clone()
        }
    }

    /// Restore one group of controls to defaults.
    pub fn reset_section(&mut self, section: Section) {
        match section {
            Section::Geometry => self.geometry = GeometryParams::default(),
            Section::Light => self.light = LightParams::default(),
            Section::Color => self.color = ColorParams::default(),
            Section::Curves => self.curves = CurveParams::default(),
            Section::Effects => self.effects = EffectsParams::default(),
            Section::Detail => self.detail = DetailParams::default(),
        }
    }

    /// Copy with every slider clamped into its documented range.
    ///
    /// The pipeline tolerates out-of-range values; this is for parameter
    /// documents coming from outside.
    pub fn clamped(&self) -> EditParams {
        let mut p = self.clone();
        p.geometry.straighten = p.geometry.straighten.clamp(-45.0, 45.0);
        p.geometry.crop = p.geometry.crop.and_then(|c| c.normalized());

        p.light.exposure = p.light.exposure.clamp(-5.0, 5.0);
        for v in [
            &mut p.light.contrast,
            &mut p.light.highlights,
            &mut p.light.shadows,
            &mut p.light.whites,
            &mut p.light.blacks,
            &mut p.color.temperature,
            &mut p.color.tint,
            &mut p.color.saturation,
            &mut p.color.grading.balance,
            &mut p.effects.texture,
            &mut p.effects.clarity,
            &mut p.effects.dehaze,
            &mut p.effects.vignette,
        ] {
            *v = v.clamp(-100.0, 100.0);
        }
        for v in [
            &mut p.color.grading.blending,
            &mut p.effects.grain,
            &mut p.detail.sharpen,
            &mut p.detail.noise,
        ] {
            *v = v.clamp(0.0, 100.0);
        }

        let m = &mut p.color.mixer;
        for band in [
            &mut m.red,
            &mut m.orange,
            &mut m.yellow,
            &mut m.green,
            &mut m.aqua,
            &mut m.blue,
            &mut m.purple,
            &mut m.magenta,
        ] {
            band.h = band.h.clamp(-100.0, 100.0);
            band.s = band.s.clamp(-100.0, 100.0);
            band.l = band.l.clamp(-100.0, 100.0);
        }
        let g = &mut p.color.grading;
        for tone in [&mut g.shadows, &mut g.midtones, &mut g.highlights] {
            tone.h = tone.h.clamp(0.0, 360.0);
            tone.s = tone.s.clamp(-100.0, 100.0);
            tone.l = tone.l.clamp(-100.0, 100.0);
        }

        let c = &mut p.curves;
        for curve in [&mut c.master, &mut c.red, &mut c.green, &mut c.blue] {
            for point in curve.iter_mut() {
                point.x = unit(point.x);
                point.y = unit(point.y);
            }
        }
        p
    }
}
