//! Whole-pipeline properties: identity, clamping, curve monotonicity and
//! colour transfer round trips.

use darkroom_core::export::render_with_rng;
use darkroom_core::grading::curves::ToneCurveLut;
use darkroom_core::transform::params::{CurvePoint, HslAdjust, NormalizedRect};
use darkroom_core::{
    EditParams, GeometryParams, Lut3D, PixelBuffer, Rotation, apply_filters, apply_geometry,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// sRGB codes that decode closest to the sixteen grid nodes of a 16³ LUT.
const NODE_CODES: [u8; 16] = [
    0, 74, 103, 124, 142, 157, 170, 182, 194, 204, 214, 223, 232, 240, 248, 255,
];

fn noise_image(width: u32, height: u32, seed: u64) -> PixelBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    PixelBuffer::from_fn(width, height, |_, _| rng.random::<[u8; 4]>())
}

/// Every combination of [`NODE_CODES`] once, as a 64×64 image.
fn node_image() -> PixelBuffer {
    PixelBuffer::from_fn(64, 64, |x, y| {
        let i = (y * 64 + x) as usize;
        [NODE_CODES[i % 16], NODE_CODES[(i / 16) % 16], NODE_CODES[i / 256], 255]
    })
}

/// `size × size` gradient: red across, green down, blue their average.
fn gradient_image(size: u32) -> PixelBuffer {
    let max = size - 1;
    PixelBuffer::from_fn(size, size, |x, y| {
        let r = x * 255 / max;
        let g = y * 255 / max;
        [r as u8, g as u8, ((r + g) / 2) as u8, 255]
    })
}

fn extreme_params(sign: f32) -> EditParams {
    let mut p = EditParams::default();
    p.light.exposure = 5.0 * sign;
    p.light.contrast = 100.0 * sign;
    p.light.highlights = 100.0 * sign;
    p.light.shadows = -100.0 * sign;
    p.light.whites = 100.0 * sign;
    p.light.blacks = -100.0 * sign;
    p.color.saturation = 100.0 * sign;
    p.color.mixer.green = HslAdjust::new(100.0 * sign, 100.0, -100.0);
    p.color.grading.highlights = HslAdjust::new(200.0, 100.0, 0.0);
    p.color.grading.balance = 100.0 * sign;
    p.curves.master = vec![
        CurvePoint::new(0.0, 1.0),
        CurvePoint::new(0.3, 0.0),
        CurvePoint::new(1.0, 1.0),
    ];
    p.effects.dehaze = 100.0 * sign;
    p.effects.vignette = 100.0 * sign;
    p.effects.grain = 100.0;
    p.detail.sharpen = 100.0;
    p.detail.noise = 100.0;
    p
}

#[test]
fn test_default_params_are_bit_exact_identity() {
    let src = noise_image(37, 23, 1);
    let params = EditParams::default();
    let working = apply_geometry(&src, &params.geometry);
    assert_eq!(working, src);
    assert_eq!(apply_filters(&working, &params), src);
}

#[test]
fn test_uniform_gray_survives_default_pipeline() {
    let gray = PixelBuffer::filled(2, 2, [128, 128, 128, 255]);
    let out = render_with_rng(&gray, &EditParams::default(), &mut StdRng::seed_from_u64(3));
    assert_eq!(out, gray);
}

#[test]
fn test_extreme_params_keep_shape_and_alpha() {
    let src = noise_image(19, 11, 2);
    for sign in [1.0, -1.0] {
        let out = render_with_rng(&src, &extreme_params(sign), &mut StdRng::seed_from_u64(9));
        assert_eq!(out.dimensions(), src.dimensions());
        for (a, b) in out.pixels().iter().zip(src.pixels()) {
            assert_eq!(a[3], b[3]);
        }
    }
}

#[test]
fn test_geometry_group_laws() {
    let src = noise_image(7, 5, 4);
    let mut geometry = GeometryParams::default();

    geometry.rotate = Rotation::Cw90;
    let mut turned = src.clone();
    for _ in 0..4 {
        turned = apply_geometry(&turned, &geometry);
    }
    assert_eq!(turned, src);

    let flip = GeometryParams {
        flip_h: true,
        flip_v: true,
        ..GeometryParams::default()
    };
    let half_turn = GeometryParams {
        rotate: Rotation::Cw180,
        ..GeometryParams::default()
    };
    assert_eq!(apply_geometry(&src, &flip), apply_geometry(&src, &half_turn));
    assert_eq!(apply_geometry(&apply_geometry(&src, &flip), &flip), src);
}

#[test]
fn test_full_frame_crop_is_no_crop() {
    let src = noise_image(9, 6, 5);
    let geometry = GeometryParams {
        crop: Some(NormalizedRect::FULL),
        ..GeometryParams::default()
    };
    assert_eq!(apply_geometry(&src, &geometry), src);
}

#[test]
fn test_monotone_control_points_give_monotone_curves() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let n = rng.random_range(2..8);
        let mut xs: Vec<f32> = (0..n).map(|_| rng.random::<f32>()).collect();
        let mut ys: Vec<f32> = (0..n).map(|_| rng.random::<f32>()).collect();
        xs.sort_by(f32::total_cmp);
        ys.sort_by(f32::total_cmp);
        let points: Vec<_> = xs.iter().zip(&ys).map(|(&x, &y)| CurvePoint::new(x, y)).collect();

        let lut = ToneCurveLut::from_points(&points);
        for pair in lut.as_slice().windows(2) {
            assert!(pair[0] <= pair[1], "{points:?}");
        }
    }
}

#[test]
fn test_lut_reproduces_colours_that_sit_on_grid_nodes() {
    let reference = node_image();
    let lut = Lut3D::learn(&reference);
    let graded = lut.apply(&reference, 100.0);
    for (out, src) in graded.pixels().iter().zip(reference.pixels()) {
        for c in 0..3 {
            assert!(out[c].abs_diff(src[c]) <= 2, "{out:?} vs {src:?}");
        }
        assert_eq!(out[3], src[3]);
    }
}

/// Floor bucketing stores each cell's mean at the cell's lower node, so a
/// self-transfer lifts values by up to half a cell. The first cell spans
/// sRGB 0..72, which is where the error peaks.
#[test]
fn test_lut_gradient_self_transfer_error_is_bounded() {
    let reference = gradient_image(64);
    let lut = Lut3D::learn(&reference);
    let graded = lut.apply(&reference, 100.0);

    let mut worst = 0u8;
    let mut worst_above_first_cell = 0u8;
    for (out, src) in graded.pixels().iter().zip(reference.pixels()) {
        let err = (0..3).map(|c| out[c].abs_diff(src[c])).max().unwrap_or(0);
        worst = worst.max(err);
        if src[..3].iter().all(|&v| v >= 72) {
            worst_above_first_cell = worst_above_first_cell.max(err);
        }
        assert_eq!(out[3], src[3]);
    }
    assert!(worst <= 46, "worst error {worst}");
    assert!(worst_above_first_cell <= 19, "worst error above shadows {worst_above_first_cell}");
}

#[test]
fn test_lut_gray_ramp_self_transfer_stays_monotone() {
    let ramp = PixelBuffer::from_fn(256, 1, |x, _| [x as u8, x as u8, x as u8, 255]);
    let graded = Lut3D::learn(&ramp).apply(&ramp, 100.0);
    for pair in graded.pixels().windows(2) {
        assert!(pair[0][0] <= pair[1][0], "{pair:?}");
    }
    assert_eq!(graded.pixel(255, 0)[0], 255);
}

#[test]
fn test_lut_at_zero_intensity_returns_target() {
    let lut = Lut3D::learn(&PixelBuffer::filled(4, 4, [255, 0, 0, 255]));
    let target = noise_image(12, 8, 6);
    assert_eq!(lut.apply(&target, 0.0), target);
}

#[test]
fn test_lut_from_flat_colour_pulls_everything_toward_it() {
    let lut = Lut3D::learn(&PixelBuffer::filled(4, 4, [200, 40, 40, 255]));
    let target = PixelBuffer::filled(3, 3, [10, 220, 90, 255]);
    let graded = lut.apply(&target, 100.0);
    for px in graded.pixels() {
        assert!(px[0].abs_diff(200) <= 1 && px[1].abs_diff(40) <= 1, "{px:?}");
    }
}
