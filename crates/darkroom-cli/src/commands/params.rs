//! Parameter document helpers.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use darkroom_core::EditParams;
use darkroom_core::transform::params::Section;

#[derive(Subcommand, Debug)]
pub enum ParamsCommand {
    /// Write a document with every control at its default
    Init {
        /// Destination; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a document and print it in canonical, clamped form
    Check {
        file: PathBuf,
    },

    /// Restore one section of a document to its defaults
    Reset {
        file: PathBuf,

        #[arg(value_enum)]
        section: SectionArg,

        /// Destination; overwrites the input when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SectionArg {
    Geometry,
    Light,
    Color,
    Curves,
    Effects,
    Detail,
}

impl From<SectionArg> for Section {
    fn from(s: SectionArg) -> Self {
        match s {
            SectionArg::Geometry => Section::Geometry,
            SectionArg::Light => Section::Light,
            SectionArg::Color => Section::Color,
            SectionArg::Curves => Section::Curves,
            SectionArg::Effects => Section::Effects,
            SectionArg::Detail => Section::Detail,
        }
    }
}

pub fn run(command: ParamsCommand, out: &mut dyn Write) -> Result<()> {
    match command {
        ParamsCommand::Init { output } => {
            let json = EditParams::default().to_json_pretty()?;
            emit(output.as_deref(), &json, out)
        }
        ParamsCommand::Check { file } => {
            let params = super::load_params(&file)?;
            writeln!(out, "{}", params.to_json_pretty()?)?;
            Ok(())
        }
        ParamsCommand::Reset {
            file,
            section,
            output,
        } => {
            let mut params = super::load_params(&file)?;
            params.reset_section(section.into());
            let json = params.to_json_pretty()?;
            emit(Some(output.as_deref().unwrap_or(file.as_path())), &json, out)
        }
    }
}

fn emit(path: Option<&Path>, json: &str, out: &mut dyn Write) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("Failed to write: {}", path.display())),
        None => {
            writeln!(out, "{json}")?;
            Ok(())
        }
    }
}
