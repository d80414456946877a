//! Library half of the `darkroom` binary: configuration, image I/O, the
//! file-backed preset store and the subcommands.

pub mod commands;
pub mod config;
pub mod image_loader;
pub mod preset_store;
