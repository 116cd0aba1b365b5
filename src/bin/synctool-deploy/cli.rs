//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use synctool_deploy::util::shell::ColorChoice;

/// Build synctool in release mode, install it, and strip it.
///
/// With no arguments the full pipeline runs with the default settings.
#[derive(Parser, Debug)]
#[command(name = "synctool-deploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors and the command trace
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Read settings from this file (overrides global and project config)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the commands that would run and exit without running them
    #[arg(short, long)]
    pub print: bool,
}
