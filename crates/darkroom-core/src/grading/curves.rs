//! Monotone cubic Hermite tone curves baked into 256-entry tables.
//!
//! # Algorithm
//! Points are sorted by x and the `(0,0)` / `(1,1)` endpoints synthesized
//! when missing. For each segment the secant slope is
//! ```text
//! m[i] = (y[i+1] − y[i]) / (x[i+1] − x[i])      (0 when dx == 0)
//! ```
//! Endpoint tangents take the adjacent secant. Interior tangents are 0 at
//! a local extremum (neighbouring secants of opposite sign, or either one
//! flat) and the mean of the two secants otherwise. A Fritsch–Carlson pass
//! then rescales any segment whose tangents satisfy `α² + β² > 9`, which
//! is what keeps the interpolant inside the monotone envelope.
//!
//! Each table entry `i` evaluates the Hermite basis at `x = i / 255`:
//! ```text
//! h00 = 2s³ − 3s² + 1     h10 = s³ − 2s² + s
//! h01 = −2s³ + 3s²        h11 = s³ − s²
//! y   = h00·y0 + h10·w·t0 + h01·y1 + h11·w·t1
//! ```
//!
//! # Complexity
//! O(N + 256): segments are walked forward once.

use crate::transform::params::{CurvePoint, normalize_curve};

/// Number of entries in a tone curve table.
pub const CURVE_LUT_SIZE: usize = 256;

/// A baked tone curve mapping an 8-bit level to an 8-bit level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneCurveLut {
    table: [u8; CURVE_LUT_SIZE],
}

impl Default for ToneCurveLut {
    fn default() -> Self {
        Self::identity()
    }
}

impl ToneCurveLut {
    /// `i ↦ i`.
    pub fn identity() -> Self {
        let mut table = [0u8; CURVE_LUT_SIZE];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self { table }
    }

    /// Bake control points into a table.
    ///
    /// Fewer than two points yields the identity ramp.
    pub fn from_points(points: &[CurvePoint]) -> Self {
        if points.len() < 2 {
            return Self::identity();
        }

        let pts = normalize_curve(points);
        let xs: Vec<f32> = pts.iter().map(|p| p.x).collect();
        let ys: Vec<f32> = pts.iter().map(|p| p.y).collect();
        let tangents = monotone_tangents(&xs, &ys);
        let n = xs.len();

        let mut table = [0u8; CURVE_LUT_SIZE];
        let mut seg = 0usize;
        for (i, slot) in table.iter_mut().enumerate() {
            let x = i as f32 / 255.0;
            while seg < n - 2 && x > xs[seg + 1] {
                seg += 1;
            }

            let (x0, x1) = (xs[seg], xs[seg + 1]);
            let (y0, y1) = (ys[seg], ys[seg + 1]);
            let width = x1 - x0;
            let y = if width == 0.0 {
                y0
            } else {
                let s = (x - x0) / width;
                hermite(s, y0, y1, width * tangents[seg], width * tangents[seg + 1])
            };
            *slot = to_level(y);
        }
        Self { table }
    }

    /// Look up an already-clamped level in `0..=255`.
    #[inline]
    pub fn apply(&self, level: u8) -> u8 {
        self.table[level as usize]
    }

    /// Round and clamp a float level, then look it up.
    #[inline]
    pub fn apply_f32(&self, level: f32) -> f32 {
        let idx = level.round().clamp(0.0, 255.0) as u8;
        self.table[idx as usize] as f32
    }

    pub fn is_identity(&self) -> bool {
        self.table.iter().enumerate().all(|(i, &v)| i == v as usize)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.table
    }
}

/// Bake control points straight into a table.
pub fn generate_tone_curve_lut(points: &[CurvePoint]) -> [u8; CURVE_LUT_SIZE] {
    ToneCurveLut::from_points(points).table
}

/// Tangents for sorted `xs`/`ys` (at least two points).
fn monotone_tangents(xs: &[f32], ys: &[f32]) -> Vec<f32> {
    let n = xs.len();
    let secants: Vec<f32> = (0..n - 1)
        .map(|i| {
            let dx = xs[i + 1] - xs[i];
            if dx == 0.0 { 0.0 } else { (ys[i + 1] - ys[i]) / dx }
        })
        .collect();

    let mut t = vec![0.0_f32; n];
    t[0] = secants[0];
    t[n - 1] = secants[n - 2];
    for i in 1..n - 1 {
        let (prev, next) = (secants[i - 1], secants[i]);
        t[i] = if prev * next <= 0.0 {
            0.0
        } else {
            (prev + next) * 0.5
        };
    }

    // Fritsch–Carlson limiter.
    for i in 0..n - 1 {
        let m = secants[i];
        if m == 0.0 {
            t[i] = 0.0;
            t[i + 1] = 0.0;
            continue;
        }
        let alpha = t[i] / m;
        let beta = t[i + 1] / m;
        let r2 = alpha * alpha + beta * beta;
        if r2 > 9.0 {
            let tau = 3.0 / r2.sqrt();
            t[i] = tau * alpha * m;
            t[i + 1] = tau * beta * m;
        }
    }
    t
}

/// Cubic Hermite basis; `m0`/`m1` are tangents pre-scaled by segment width.
fn hermite(s: f32, y0: f32, y1: f32, m0: f32, m1: f32) -> f32 {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * y0 + h10 * m0 + h01 * y1 + h11 * m1
}

fn to_level(y: f32) -> u8 {
    (y * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::params::identity_curve;

    fn pts(raw: &[(f32, f32)]) -> Vec<CurvePoint> {
        raw.iter().map(|&(x, y)| CurvePoint::new(x, y)).collect()
    }

    fn assert_non_decreasing(lut: &ToneCurveLut) {
        for w in lut.as_slice().windows(2) {
            assert!(w[0] <= w[1], "table decreases: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn test_identity_curve_bakes_to_identity() {
        let lut = ToneCurveLut::from_points(&identity_curve());
        assert!(lut.is_identity());
    }

    #[test]
    fn test_fewer_than_two_points_is_identity() {
        assert!(ToneCurveLut::from_points(&[]).is_identity());
        assert!(ToneCurveLut::from_points(&pts(&[(0.5, 0.9)])).is_identity());
    }

    #[test]
    fn test_missing_endpoints_are_synthesized() {
        // Only interior points: (0,0) and (1,1) are added around them.
        let lut = ToneCurveLut::from_points(&pts(&[(0.25, 0.25), (0.75, 0.75)]));
        assert_eq!(lut.apply(0), 0);
        assert_eq!(lut.apply(255), 255);
        assert_eq!(lut.apply(128), 128);
    }

    #[test]
    fn test_unsorted_input_matches_sorted() {
        let sorted = pts(&[(0.0, 0.0), (0.3, 0.5), (1.0, 1.0)]);
        let shuffled = pts(&[(1.0, 1.0), (0.0, 0.0), (0.3, 0.5)]);
        assert_eq!(
            ToneCurveLut::from_points(&sorted),
            ToneCurveLut::from_points(&shuffled)
        );
    }

    #[test]
    fn test_matte_curve_lifts_blacks_and_drops_whites() {
        let lut = ToneCurveLut::from_points(&pts(&[(0.0, 0.1), (1.0, 0.9)]));
        assert_eq!(lut.apply(0), 26);
        assert!((229..=230).contains(&lut.apply(255)));
        assert_non_decreasing(&lut);
    }

    #[test]
    fn test_duplicate_x_makes_a_step_not_a_nan() {
        let lut = ToneCurveLut::from_points(&pts(&[(0.5, 0.2), (0.5, 0.8)]));
        assert_eq!(lut.apply(0), 0);
        assert_eq!(lut.apply(127), 51);
        assert_eq!(lut.apply(128), 204);
        assert_eq!(lut.apply(255), 255);
    }

    #[test]
    fn test_monotone_input_stays_monotone() {
        // Mean tangents alone overshoot on this set; the limiter keeps it
        // non-decreasing.
        let cases = [
            pts(&[(0.0, 0.0), (0.1, 0.5), (0.5, 0.6), (1.0, 1.0)]),
            pts(&[(0.0, 0.0), (0.05, 0.9), (0.95, 0.92), (1.0, 1.0)]),
            pts(&[(0.0, 0.2), (0.4, 0.2), (0.6, 0.8), (1.0, 0.8)]),
            pts(&[(0.2, 0.0), (0.25, 1.0)]),
        ];
        for case in &cases {
            assert_non_decreasing(&ToneCurveLut::from_points(case));
        }
    }

    #[test]
    fn test_s_curve_darkens_shadows_and_brightens_highlights() {
        let lut = ToneCurveLut::from_points(&pts(&[
            (0.0, 0.0),
            (0.25, 0.15),
            (0.75, 0.85),
            (1.0, 1.0),
        ]));
        assert!(lut.apply(64) < 64);
        assert!(lut.apply(191) > 191);
        assert_non_decreasing(&lut);
    }

    #[test]
    fn test_apply_f32_rounds_and_clamps() {
        let lut = ToneCurveLut::identity();
        assert_eq!(lut.apply_f32(12.6), 13.0);
        assert_eq!(lut.apply_f32(-4.0), 0.0);
        assert_eq!(lut.apply_f32(300.0), 255.0);
    }
}
