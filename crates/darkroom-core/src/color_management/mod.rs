//! Colour conversions: sRGB transfer and HSL.

pub mod hsl;
pub mod transfer;
