//! CLI command implementations

pub mod edit;
pub mod mono;
pub mod params;
pub mod presets;
pub mod preview;
pub mod transfer;

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use darkroom_core::{EditParams, ExportFormat, PresetLibrary};
use tracing::warn;

use crate::config::AppConfig;
use crate::image_loader::{self, LoadedImage};
use crate::preset_store::FileStore;

/// Output container selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Png,
    #[value(alias = "jpg")]
    Jpeg,
    Webp,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Png => ExportFormat::Png,
            FormatArg::Jpeg => ExportFormat::Jpeg,
            FormatArg::Webp => ExportFormat::Webp,
        }
    }
}

/// Load image from path
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    image_loader::load_image(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Write encoded bytes to path
pub fn save_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    image_loader::write_bytes(path, bytes)
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Read a parameter document, clamping out-of-range sliders.
pub fn load_params(path: &Path) -> Result<EditParams> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameters: {}", path.display()))?;
    let parsed = EditParams::from_json(&text)
        .with_context(|| format!("Invalid parameters: {}", path.display()))?;
    let clamped = parsed.clamped();
    if clamped != parsed {
        warn!(path = %path.display(), "out-of-range parameter values were clamped");
    }
    Ok(clamped)
}

pub fn preset_library(config: &AppConfig) -> PresetLibrary<FileStore> {
    PresetLibrary::new(FileStore::new(&config.preset_dir))
}

/// Parameters from an optional document with an optional preset applied
/// on top; the document's geometry always survives the preset.
pub fn resolve_params(
    params: Option<&Path>,
    preset: Option<&str>,
    config: &AppConfig,
) -> Result<EditParams> {
    let base = match params {
        Some(path) => load_params(path)?,
        None => EditParams::default(),
    };
    let Some(name) = preset else {
        return Ok(base);
    };
    let Some(found) = preset_library(config).find(name)? else {
        bail!("Unknown preset: {name}");
    };
    Ok(found.apply_to(&base))
}
