//! Grading tools: sliders, tone curves, colour mixer, split toning and
//! black-and-white conversion.

pub mod curves;
pub mod mixer;
pub mod mono;
pub mod sliders;
pub mod split_tone;
