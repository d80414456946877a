//! Black-and-white conversion.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use darkroom_core::grading::mono::{MonoParams, MonoPreset, apply_mono};
use darkroom_core::export::encode;
use darkroom_core::{ExportFormat, ExportOptions};
use tracing::{info, warn};

use super::FormatArg;
use crate::config::AppConfig;
use crate::image_loader::output_format;

#[derive(Args, Debug)]
pub struct MonoArgs {
    /// Input image
    pub input: PathBuf,

    /// Output image; `<name>-grayscale.<ext>` beside the input when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Control document (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Start from a named look
    #[arg(long, value_enum)]
    pub preset: Option<MonoPresetArg>,

    /// Mix toward gray, 0-100
    #[arg(long)]
    pub intensity: Option<f32>,

    /// Contrast, -40 to 40
    #[arg(long, allow_hyphen_values = true)]
    pub contrast: Option<f32>,

    /// Brightness, -30 to 30
    #[arg(long, allow_hyphen_values = true)]
    pub brightness: Option<f32>,

    /// Film grain, 0-30
    #[arg(long)]
    pub grain: Option<f32>,

    /// Plain channel average instead of Rec. 709 luma
    #[arg(long)]
    pub average: bool,

    /// Output format; inferred from the output name, then the input
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MonoPresetArg {
    Soft,
    Noir,
    Clean,
    High,
    Low,
    Steel,
    Silk,
}

impl From<MonoPresetArg> for MonoPreset {
    fn from(p: MonoPresetArg) -> Self {
        match p {
            MonoPresetArg::Soft => MonoPreset::Soft,
            MonoPresetArg::Noir => MonoPreset::Noir,
            MonoPresetArg::Clean => MonoPreset::Clean,
            MonoPresetArg::High => MonoPreset::High,
            MonoPresetArg::Low => MonoPreset::Low,
            MonoPresetArg::Steel => MonoPreset::Steel,
            MonoPresetArg::Silk => MonoPreset::Silk,
        }
    }
}

/// Controls in precedence order: defaults, document, preset, flags.
pub fn resolve_controls(args: &MonoArgs) -> Result<MonoParams> {
    let mut params = match &args.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read controls: {}", path.display()))?;
            MonoParams::from_json(&text)
                .with_context(|| format!("Invalid controls: {}", path.display()))?
        }
        None => MonoParams::default(),
    };
    if let Some(preset) = args.preset {
        params = MonoPreset::from(preset).apply_to(&params);
    }
    if let Some(v) = args.intensity {
        params.intensity = v;
    }
    if let Some(v) = args.contrast {
        params.contrast = v;
    }
    if let Some(v) = args.brightness {
        params.brightness = v;
    }
    if let Some(v) = args.grain {
        params.grain = v;
    }
    if args.average {
        params.weighted = false;
    }

    let clamped = params.clamped();
    if clamped != params {
        warn!("out-of-range mono controls were clamped");
    }
    Ok(clamped)
}

/// `photo.jpg` → `photo-grayscale.jpg` in the same directory.
pub fn default_output(input: &Path, format: ExportFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into());
    input.with_file_name(format!("{stem}-grayscale.{}", format.extension()))
}

pub fn run(args: MonoArgs, config: &AppConfig) -> Result<()> {
    let started = Instant::now();
    let source = super::load_image(&args.input)?;
    let controls = resolve_controls(&args)?;

    let explicit = args.format.map(ExportFormat::from);
    let (output, format) = match &args.output {
        Some(path) => (path.clone(), output_format(explicit, path, source.format)),
        None => {
            let format = explicit.or(source.format).unwrap_or_default();
            (default_output(&args.input, format), format)
        }
    };

    let converted = apply_mono(&source.buffer, &controls);
    let options = ExportOptions::new(format).with_quality(config.quality);
    let bytes = encode(&converted, &options).context("Export failed")?;
    super::save_bytes(&output, &bytes)?;

    info!(
        output = %output.display(),
        intensity = controls.intensity,
        contrast = controls.contrast,
        brightness = controls.brightness,
        grain = controls.grain,
        weighted = controls.weighted,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "converted to black and white"
    );
    Ok(())
}
