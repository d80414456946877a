//! Full-resolution render and export.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use darkroom_core::ExportOptions;
use darkroom_core::export::{encode, render};
use darkroom_core::transform::lut::{DEFAULT_INTENSITY, Lut3D};
use tracing::info;

use super::FormatArg;
use crate::config::AppConfig;
use crate::image_loader::output_format;

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Input image
    pub input: PathBuf,

    /// Output image
    #[arg(short, long)]
    pub output: PathBuf,

    /// Parameter document (JSON); defaults when omitted
    #[arg(short, long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Apply a named preset over the parameters (geometry is kept)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Output format; inferred from the output name, then the input
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Grade the result with a .cube LUT
    #[arg(long, value_name = "FILE")]
    pub lut: Option<PathBuf>,

    /// LUT strength, 0-100
    #[arg(long, default_value_t = DEFAULT_INTENSITY)]
    pub intensity: f32,
}

pub fn run(args: EditArgs, config: &AppConfig) -> Result<()> {
    let started = Instant::now();
    let source = super::load_image(&args.input)?;
    let params = super::resolve_params(args.params.as_deref(), args.preset.as_deref(), config)?;

    let mut rendered = render(&source.buffer, &params);
    if let Some(path) = &args.lut {
        let lut = Lut3D::load_cube(path)
            .with_context(|| format!("Failed to load LUT: {}", path.display()))?;
        lut.apply_in_place(&mut rendered, args.intensity);
    }

    let format = output_format(args.format.map(Into::into), &args.output, source.format);
    let options = ExportOptions::new(format).with_quality(config.quality);
    let bytes = encode(&rendered, &options).context("Export failed")?;
    super::save_bytes(&args.output, &bytes)?;

    info!(
        output = %args.output.display(),
        width = rendered.width(),
        height = rendered.height(),
        format = format.mime(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "exported"
    );
    Ok(())
}
