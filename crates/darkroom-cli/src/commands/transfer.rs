//! Colour transfer: learn a look from a reference image and grade a target.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use darkroom_core::ExportOptions;
use darkroom_core::export::encode;
use darkroom_core::transform::lut::{DEFAULT_INTENSITY, Lut3D};
use tracing::info;

use super::FormatArg;
use crate::config::AppConfig;
use crate::image_loader::output_format;

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("look").required(true).args(["reference", "lut"])))]
pub struct TransferArgs {
    /// Image whose colours are learned
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Previously saved .cube LUT to use instead of a reference
    #[arg(long, value_name = "FILE")]
    pub lut: Option<PathBuf>,

    /// Image to grade
    #[arg(short, long, requires = "output")]
    pub target: Option<PathBuf>,

    /// Graded output image
    #[arg(short, long, requires = "target")]
    pub output: Option<PathBuf>,

    /// Blend strength, 0-100
    #[arg(short, long, default_value_t = DEFAULT_INTENSITY)]
    pub intensity: f32,

    /// Also write the learned LUT as .cube
    #[arg(long, value_name = "FILE")]
    pub save_lut: Option<PathBuf>,

    /// Output format; inferred from the output name, then the target
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,
}

pub fn run(args: TransferArgs, config: &AppConfig) -> Result<()> {
    if args.output.is_none() && args.save_lut.is_none() {
        bail!("Nothing to do: pass --target/--output, --save-lut, or both");
    }

    let lut = match (&args.reference, &args.lut) {
        (Some(reference), _) => Lut3D::learn(&super::load_image(reference)?.buffer),
        (None, Some(path)) => Lut3D::load_cube(path)
            .with_context(|| format!("Failed to load LUT: {}", path.display()))?,
        (None, None) => bail!("Either --reference or --lut is required"),
    };

    if let Some(path) = &args.save_lut {
        let title = args
            .reference
            .as_deref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str());
        lut.save_cube(path, title)
            .with_context(|| format!("Failed to save LUT: {}", path.display()))?;
        info!(path = %path.display(), size = lut.size(), "LUT saved");
    }

    if let (Some(target), Some(output)) = (&args.target, &args.output) {
        let source = super::load_image(target)?;
        let graded = lut.apply(&source.buffer, args.intensity);
        let format = output_format(args.format.map(Into::into), output, source.format);
        let bytes = encode(&graded, &ExportOptions::new(format).with_quality(config.quality))
            .context("Export failed")?;
        super::save_bytes(output, &bytes)?;
        info!(
            output = %output.display(),
            intensity = args.intensity,
            "colour transfer written"
        );
    }
    Ok(())
}
