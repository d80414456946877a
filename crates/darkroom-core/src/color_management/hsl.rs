//! RGB ⇄ HSL on the editor's scales.
//!
//! RGB channels are `0..255`, hue is degrees in `[0, 360)`, saturation and
//! lightness are `0..100`. Inputs and outputs are unrounded `f32` so the
//! per-pixel pipeline can keep full precision between stages.

/// Convert RGB (`0..255`) to `(hue°, saturation%, lightness%)`.
pub fn rgb_to_hsl(rgb: [f32; 3]) -> (f32, f32, f32) {
    let r = rgb[0] / 255.0;
    let g = rgb[1] / 255.0;
    let b = rgb[2] / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lum = (max + min) * 0.5;

    if max == min {
        return (0.0, 0.0, lum * 100.0);
    }

    let d = max - min;
    let sat = if lum > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let hue = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (hue * 60.0, sat * 100.0, lum * 100.0)
}

/// Lightness only, `0..100`. Cheaper than a full conversion.
pub fn lightness(rgb: [f32; 3]) -> f32 {
    let max = rgb[0].max(rgb[1]).max(rgb[2]);
    let min = rgb[0].min(rgb[1]).min(rgb[2]);
    (max + min) * 0.5 / 255.0 * 100.0
}

/// Convert `(hue°, saturation%, lightness%)` to RGB on `0..255`.
pub fn hsl_to_rgb(hue: f32, sat: f32, lum: f32) -> [f32; 3] {
    let h = hue / 360.0;
    let s = sat / 100.0;
    let l = lum / 100.0;

    if s == 0.0 {
        let v = l * 255.0;
        return [v, v, v];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        hue_to_rgb(p, q, h + 1.0 / 3.0) * 255.0,
        hue_to_rgb(p, q, h) * 255.0,
        hue_to_rgb(p, q, h - 1.0 / 3.0) * 255.0,
    ]
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
