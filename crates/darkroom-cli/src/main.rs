//! darkroom - non-destructive photo editing from the command line
//!
//! Light, colour, curve and effect adjustments, geometry, presets,
//! LUT-based colour transfer and black-and-white conversion.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use darkroom_cli::commands::{self, edit, mono, params, presets, preview, transfer};
use darkroom_cli::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "darkroom")]
#[command(author, version, about = "Non-destructive photo editing pipeline")]
#[command(long_about = "
Edits are described by a JSON parameter document (see `darkroom params init`).

Examples:
  darkroom edit in.jpg -o out.jpg -p look.json
  darkroom edit in.jpg -o out.webp --preset \"Warm Finish\"
  darkroom preview in.jpg -o preview.png -p step1.json -p step2.json
  darkroom transfer -r reference.jpg -t target.jpg -o graded.jpg -i 70
  darkroom transfer -r reference.jpg --save-lut look.cube
  darkroom mono portrait.jpg --preset noir
  darkroom presets save Moody -p look.json
  darkroom params reset look.json curves
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace); otherwise RUST_LOG or info
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Preset directory (overrides DARKROOM_PRESET_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    preset_dir: Option<PathBuf>,

    /// JPEG quality 1-100 (overrides DARKROOM_QUALITY)
    #[arg(short, long, global = true)]
    quality: Option<u8>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an edit at full resolution and export it
    #[command(visible_alias = "e")]
    Edit(edit::EditArgs),

    /// Render a downscaled preview through the background worker
    #[command(visible_alias = "p")]
    Preview(preview::PreviewArgs),

    /// Learn a colour look from one image and apply it to another
    #[command(visible_alias = "t")]
    Transfer(transfer::TransferArgs),

    /// Convert to black and white
    #[command(visible_alias = "m")]
    Mono(mono::MonoArgs),

    /// Manage presets
    #[command(subcommand)]
    Presets(presets::PresetsCommand),

    /// Create, check and reset parameter documents
    #[command(subcommand)]
    Params(params::ParamsCommand),
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::default().with_overrides(cli.preset_dir, None, cli.quality);
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Edit(args) => commands::edit::run(args, &config),
        Commands::Preview(args) => commands::preview::run(args, &config),
        Commands::Transfer(args) => commands::transfer::run(args, &config),
        Commands::Mono(args) => commands::mono::run(args, &config),
        Commands::Presets(command) => commands::presets::run(command, &config, &mut stdout),
        Commands::Params(command) => commands::params::run(command, &mut stdout),
    }
}
