//! Transform pipeline: parameters, geometry, per-pixel evaluation, detail
//! filters and 3D LUT colour transfer.

pub mod convolve;
pub mod evaluate;
pub mod filter;
pub mod geometry;
pub mod lut;
pub mod params;
