//! Interactive-style preview through the background worker.
//!
//! Each `--params` document is issued as a separate request, the way a
//! slider drag would issue them; only the newest one is rendered in full.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use darkroom_core::ExportOptions;
use darkroom_core::export::encode;
use darkroom_engine::Orchestrator;
use tracing::info;

use super::FormatArg;
use crate::config::AppConfig;
use crate::image_loader::output_format;

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Input image
    pub input: PathBuf,

    /// Output image
    #[arg(short, long)]
    pub output: PathBuf,

    /// Parameter documents, requested in order
    #[arg(short, long, value_name = "FILE")]
    pub params: Vec<PathBuf>,

    /// Apply a named preset over each parameter document
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Longer edge of the preview copy (defaults to the configured size)
    #[arg(long, value_name = "PX")]
    pub max_edge: Option<u32>,

    /// Write the geometry-only buffer instead of the edit
    #[arg(long)]
    pub show_original: bool,

    /// Output format; inferred from the output name, then the input
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,
}

pub fn run(args: PreviewArgs, config: &AppConfig) -> Result<()> {
    let source = super::load_image(&args.input)?;
    let edge = args.max_edge.filter(|&e| e > 0).unwrap_or(config.preview_edge);
    let preview = source.buffer.resized_to_fit(edge);

    let requests = if args.params.is_empty() {
        vec![super::resolve_params(None, args.preset.as_deref(), config)?]
    } else {
        args.params
            .iter()
            .map(|p| super::resolve_params(Some(p), args.preset.as_deref(), config))
            .collect::<Result<Vec<_>>>()?
    };

    let mut orchestrator = Orchestrator::new().context("Failed to start filter worker")?;
    orchestrator.load_image(preview);
    for params in &requests {
        orchestrator.request(params)?;
    }
    orchestrator.wait_until_idle()?;

    let Some(view) = orchestrator.view(args.show_original) else {
        bail!("Nothing to preview");
    };
    let format = output_format(args.format.map(Into::into), &args.output, source.format);
    let bytes = encode(view, &ExportOptions::new(format).with_quality(config.quality))
        .context("Preview encode failed")?;
    super::save_bytes(&args.output, &bytes)?;

    let stats = orchestrator.stats();
    info!(
        output = %args.output.display(),
        width = view.width(),
        height = view.height(),
        dispatched = stats.dispatched,
        delivered = stats.delivered,
        discarded = stats.discarded,
        coalesced = stats.coalesced,
        "preview written"
    );
    Ok(())
}
