//! CLI command definitions for config-lifecycle
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{ConfigFormat, ConfigPaths};

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ShowFormat {
    #[default]
    Json,
    Yaml,
}

impl From<ShowFormat> for ConfigFormat {
    fn from(format: ShowFormat) -> Self {
        match format {
            ShowFormat::Json => ConfigFormat::Json,
            ShowFormat::Yaml => ConfigFormat::Yaml,
        }
    }
}

/// Load, validate and inspect application configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Explicit config file (skips well-known path discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the well-known config files (overrides env)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Config file name without extension (overrides env)
    #[arg(long, global = true)]
    pub stem: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and validate the configuration (default if no subcommand given)
    Check,

    /// Load the configuration and print the validated result
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Json)]
        format: ShowFormat,
    },

    /// Print the well-known config paths and which of them exist
    Paths,
}

impl Cli {
    /// Config paths from the environment with CLI overrides applied.
    pub fn config_paths(&self) -> ConfigPaths {
        let mut paths = ConfigPaths::discover();
        if let Some(ref dir) = self.dir {
            paths.dir = dir.clone();
        }
        if let Some(ref stem) = self.stem {
            paths.stem = stem.clone();
        }
        if let Some(ref config) = self.config {
            paths = paths.with_explicit(config.clone());
        }
        paths
    }
}
