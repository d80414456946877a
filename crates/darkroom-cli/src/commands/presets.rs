//! Preset management.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Subcommand;
use darkroom_core::presets::builtin_presets;

use crate::config::AppConfig;

#[derive(Subcommand, Debug)]
pub enum PresetsCommand {
    /// List built-in and saved presets
    List,

    /// Print a preset's parameters as JSON
    Show {
        name: String,
    },

    /// Save a parameter document as a preset (geometry is dropped)
    Save {
        name: String,

        /// Parameter document; defaults when omitted
        #[arg(short, long, value_name = "FILE")]
        params: Option<PathBuf>,
    },

    /// Delete saved presets with this name
    Delete {
        name: String,
    },
}

pub fn run(command: PresetsCommand, config: &AppConfig, out: &mut dyn Write) -> Result<()> {
    let library = super::preset_library(config);
    match command {
        PresetsCommand::List => {
            for p in builtin_presets() {
                writeln!(out, "built-in  {}", p.name)?;
            }
            for p in library.custom()? {
                writeln!(out, "saved     {}", p.name)?;
            }
        }
        PresetsCommand::Show { name } => {
            let Some(preset) = library.find(&name)? else {
                bail!("Unknown preset: {name}");
            };
            writeln!(out, "{}", preset.params.to_json_pretty()?)?;
        }
        PresetsCommand::Save { name, params } => {
            let params = super::resolve_params(params.as_deref(), None, config)?;
            let saved = library.save(&name, &params)?;
            writeln!(out, "Saved preset {:?}", saved.name)?;
        }
        PresetsCommand::Delete { name } => {
            let removed = library.remove(&name)?;
            if removed == 0 {
                bail!("No saved preset named {name:?}");
            }
            writeln!(out, "Deleted {removed} preset(s) named {name:?}")?;
        }
    }
    Ok(())
}
